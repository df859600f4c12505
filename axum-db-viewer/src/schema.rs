//! Schema types for dynamic database introspection
//!
//! These types represent database schema information discovered at runtime,
//! along with the paginated results and dashboard payloads built from it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query::AppliedParams;

/// A single result row, keyed by column name in select order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Name of a table that is visible through the viewer
///
/// Only [`SchemaIntrospector::resolve_table`](crate::SchemaIntrospector::resolve_table)
/// hands these out, so holding one means the name was checked against the
/// current table listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    pub(crate) fn verified(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalized column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Integer,
    Float,
    Boolean,
    Datetime,
    Json,
    String,
}

impl SemanticType {
    /// Map a raw driver type string (e.g. "VARCHAR(255)", "timestamptz") to a semantic type
    ///
    /// Matching is a case-insensitive substring test; the first rule that
    /// matches wins and unknown types fall back to [`SemanticType::String`].
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.to_lowercase();
        let contains_any = |needles: &[&str]| needles.iter().any(|n| raw.contains(n));

        if raw.contains("int") {
            Self::Integer
        } else if contains_any(&["float", "double", "decimal", "numeric"]) {
            Self::Float
        } else if raw.contains("bool") {
            Self::Boolean
        } else if contains_any(&["date", "time"]) {
            Self::Datetime
        } else if raw.contains("json") {
            Self::Json
        } else {
            // text, varchar, char and anything unrecognized
            Self::String
        }
    }

    /// Whether global search looks at columns of this type
    pub fn is_searchable(self) -> bool {
        matches!(self, Self::String | Self::Json)
    }
}

/// Information about a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,

    /// Normalized type
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,

    /// Whether the column allows NULL values
    pub nullable: bool,

    /// Default value expression (if any)
    #[serde(rename = "default")]
    pub default_value: Option<String>,
}

/// Table entry as reported by the database catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    pub name: String,

    /// Owning schema or database; `None` when the engine doesn't report one
    pub schema: Option<String>,
}

/// Column entry as reported by the database catalog, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,

    /// Driver type string, e.g. "INTEGER" or "character varying"
    pub raw_type: String,

    pub nullable: bool,

    pub default_value: Option<String>,
}

/// Index entry as reported by the database catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIndex {
    pub name: String,

    /// Indexed columns in key order
    pub columns: Vec<String>,

    pub is_primary: bool,

    pub unique: bool,
}

/// Information about a table (for listing)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// Table name
    pub name: String,

    /// Live row count, 0 when counting failed
    pub row_count: u64,
}

/// Response from listing tables
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesResponse {
    pub tables: Vec<TableInfo>,

    pub db_name: Option<String>,
}

/// One page of rows plus pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// The rows on this page
    pub rows: Vec<Row>,

    /// Number of rows matching the filters
    pub total: u64,

    pub per_page: u64,

    pub current_page: u64,

    /// Last page number, never below 1
    pub last_page: u64,

    /// 1-based index of the first row on this page (`None` when empty)
    pub from: Option<u64>,

    /// 1-based index of the last row on this page (`None` when empty)
    pub to: Option<u64>,
}

impl Page {
    pub fn new(rows: Vec<Row>, total: u64, per_page: u64, current_page: u64) -> Self {
        let last_page = total.div_ceil(per_page.max(1)).max(1);
        let from = current_page
            .saturating_sub(1)
            .checked_mul(per_page)
            .and_then(|skipped| skipped.checked_add(1))
            .filter(|_| !rows.is_empty());
        let to = from.and_then(|from| from.checked_add(rows.len() as u64 - 1));

        Self {
            rows,
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
        }
    }
}

/// Result of a table query: the page and the parameters that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    pub page: Page,

    pub applied: AppliedParams,
}

/// Full payload of the table view endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableViewResponse {
    pub table: TableName,
    pub columns: Vec<ColumnMetadata>,
    pub primary_key: Option<String>,
    pub rows: Vec<Row>,
    pub pagination: Pagination,
    pub filters: AppliedParams,
    pub per_page_options: Vec<u64>,
    pub db_name: Option<String>,
}

/// Pagination block of [`TableViewResponse`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl TableViewResponse {
    pub fn new(
        table: TableName,
        columns: Vec<ColumnMetadata>,
        primary_key: Option<String>,
        result: TablePage,
        per_page_options: Vec<u64>,
        db_name: Option<String>,
    ) -> Self {
        let TablePage { page, applied } = result;
        let pagination = Pagination {
            total: page.total,
            per_page: page.per_page,
            current_page: page.current_page,
            last_page: page.last_page,
            from: page.from,
            to: page.to,
        };

        Self {
            table,
            columns,
            primary_key,
            rows: page.rows,
            pagination,
            filters: applied,
            per_page_options,
            db_name,
        }
    }
}

/// Payload of the single row endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowResponse {
    pub table: TableName,
    pub primary_key: String,
    pub row: Row,
}

/// Single point of a daily time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Day, formatted as `YYYY-MM-DD`
    pub x: String,

    /// Rows on that day
    pub y: u64,
}

/// A configured dashboard chart with its data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub color: String,
    pub data: Vec<SeriesPoint>,
    pub total: u64,
}

/// Dashboard statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Driver identifier of the active connection
    pub driver: String,

    /// Name of the connected database, if it could be determined
    pub database: Option<String>,

    pub total_tables: usize,

    /// Sum of row counts over all visible tables
    pub total_records: u64,

    /// Largest tables by row count, biggest first
    pub table_stats: Vec<TableInfo>,

    pub charts: Vec<ChartSeries>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_precedence() {
        assert_eq!(SemanticType::from_raw("INTEGER"), SemanticType::Integer);
        assert_eq!(SemanticType::from_raw("bigint unsigned"), SemanticType::Integer);
        // plain substring match
        assert_eq!(SemanticType::from_raw("interval"), SemanticType::Integer);
        assert_eq!(SemanticType::from_raw("double precision"), SemanticType::Float);
        assert_eq!(SemanticType::from_raw("NUMERIC(10,2)"), SemanticType::Float);
        assert_eq!(SemanticType::from_raw("REAL"), SemanticType::String);
        assert_eq!(SemanticType::from_raw("tinyint(1)"), SemanticType::Integer);
        assert_eq!(SemanticType::from_raw("boolean"), SemanticType::Boolean);
        assert_eq!(SemanticType::from_raw("timestamp with time zone"), SemanticType::Datetime);
        assert_eq!(SemanticType::from_raw("DATETIME"), SemanticType::Datetime);
        assert_eq!(SemanticType::from_raw("jsonb"), SemanticType::Json);
        assert_eq!(SemanticType::from_raw("character varying"), SemanticType::String);
        assert_eq!(SemanticType::from_raw("uuid"), SemanticType::String);
        assert_eq!(SemanticType::from_raw(""), SemanticType::String);
    }

    #[test]
    fn test_page_metadata() {
        let row = Row::new();
        let page = Page::new(vec![row.clone(), row], 27, 25, 2);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.from, Some(26));
        assert_eq!(page.to, Some(27));

        let empty = Page::new(Vec::new(), 0, 25, 1);
        assert_eq!(empty.last_page, 1);
        assert_eq!(empty.from, None);
        assert_eq!(empty.to, None);
    }

    #[test]
    fn test_page_metadata_with_huge_page_number() {
        let empty = Page::new(Vec::new(), 5, 100, u64::MAX);
        assert_eq!(empty.from, None);
        assert_eq!(empty.current_page, u64::MAX);

        let overflowing = Page::new(vec![Row::new()], 5, 100, u64::MAX);
        assert_eq!(overflowing.from, None);
        assert_eq!(overflowing.to, None);
    }

    #[test]
    fn test_column_metadata_serialization() {
        let column = ColumnMetadata {
            name: "price".to_string(),
            semantic_type: SemanticType::Float,
            nullable: false,
            default_value: None,
        };
        let json = serde_json::to_value(&column).unwrap();
        assert_eq!(json["type"], "float");
        assert!(json["default"].is_null());
    }
}
