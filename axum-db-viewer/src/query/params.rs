//! Request parameters for table queries
//!
//! Everything in here comes straight from the caller. Parsing is lenient:
//! values of the wrong shape turn into "not given" instead of failing the
//! request, and the engine validates what's left against table metadata.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::query::filter::AdvancedFilter;

/// Sort order for row queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive "asc"/"desc"; anything else is ascending
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Query parameters for fetching a page of rows
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    /// Global search text, matched against text-like columns
    #[serde(default)]
    pub search: Option<String>,

    /// Advanced filters: a list of `{column, operator, value}` objects or the
    /// same list JSON-encoded into a string
    #[serde(default)]
    pub advanced: Option<Value>,

    /// Column name to sort by
    #[serde(default)]
    pub sort: Option<String>,

    /// "asc" or "desc"
    #[serde(default)]
    pub direction: Option<String>,

    /// 1-based page number
    #[serde(default, deserialize_with = "lenient_integer")]
    pub page: Option<i64>,

    /// Requested page size
    #[serde(default, alias = "per_page", deserialize_with = "lenient_integer")]
    pub per_page: Option<i64>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort = Some(column.into());
        self.direction = Some(direction.into());
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_per_page(mut self, per_page: i64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Append an advanced filter entry
    pub fn with_filter(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let entry = serde_json::json!({
            "column": column.into(),
            "operator": operator.into(),
            "value": value.into(),
        });
        match &mut self.advanced {
            Some(Value::Array(entries)) => entries.push(entry),
            _ => self.advanced = Some(Value::Array(vec![entry])),
        }
        self
    }

    /// Trimmed search text, `None` when there is nothing to search for
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Well-formed advanced filters, in request order
    pub fn advanced_filters(&self) -> Vec<AdvancedFilter> {
        self.advanced
            .as_ref()
            .map(AdvancedFilter::parse_list)
            .unwrap_or_default()
    }

    pub fn sort_direction(&self) -> SortDirection {
        SortDirection::parse_lenient(self.direction.as_deref())
    }

    /// Requested page, clamped to at least 1
    pub fn effective_page(&self) -> u64 {
        self.page.unwrap_or(1).max(1) as u64
    }

    /// Echo of the request as it was applied
    pub fn applied(&self, per_page: u64, page: u64) -> AppliedParams {
        AppliedParams {
            search: self.search.clone().unwrap_or_default(),
            sort: self.sort.clone(),
            direction: self.direction.clone().unwrap_or_else(|| "asc".to_string()),
            per_page,
            page,
            advanced: self.advanced.clone(),
        }
    }
}

/// Request parameters echoed back with a page, so a client can rebuild its filter UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedParams {
    pub search: String,
    pub sort: Option<String>,
    pub direction: String,

    /// Effective page size
    pub per_page: u64,

    /// Effective page number
    pub page: u64,

    /// Advanced filters exactly as received
    pub advanced: Option<Value>,
}

/// Accept integers given as numbers or strings; anything else is `None`
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!(SortDirection::parse_lenient(Some("DESC")), SortDirection::Desc);
        assert_eq!(SortDirection::parse_lenient(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse_lenient(Some("sideways")), SortDirection::Asc);
        assert_eq!(SortDirection::parse_lenient(None), SortDirection::Asc);
    }

    #[test]
    fn test_lenient_numbers_from_json() {
        let params: QueryParams =
            serde_json::from_str(r#"{"page": "3", "perPage": 50, "search": " mac "}"#).unwrap();
        assert_eq!(params.page, Some(3));
        assert_eq!(params.per_page, Some(50));
        assert_eq!(params.search_term(), Some("mac"));

        let params: QueryParams = serde_json::from_str(r#"{"page": "abc", "perPage": null}"#).unwrap();
        assert_eq!(params.page, None);
        assert_eq!(params.per_page, None);
        assert_eq!(params.effective_page(), 1);
    }

    #[test]
    fn test_effective_page_clamps() {
        assert_eq!(QueryParams::new().with_page(-4).effective_page(), 1);
        assert_eq!(QueryParams::new().with_page(0).effective_page(), 1);
        assert_eq!(QueryParams::new().with_page(7).effective_page(), 7);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert_eq!(QueryParams::new().with_search("   ").search_term(), None);
        assert_eq!(QueryParams::new().search_term(), None);
    }

    #[test]
    fn test_with_filter_builds_list() {
        let params = QueryParams::new()
            .with_filter("price", ">=", "1000")
            .with_filter("name", "null", Value::Null);
        let filters = params.advanced_filters();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].column, "price");
    }

    #[test]
    fn test_applied_echoes_raw_values() {
        let params = QueryParams::new().with_sort("name", "DESC").with_search("x");
        let applied = params.applied(25, 2);
        assert_eq!(applied.direction, "DESC");
        assert_eq!(applied.search, "x");
        assert_eq!(applied.per_page, 25);
        assert_eq!(applied.page, 2);

        let applied = QueryParams::new().applied(10, 1);
        assert_eq!(applied.direction, "asc");
        assert_eq!(applied.sort, None);
    }
}
