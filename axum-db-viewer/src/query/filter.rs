//! Advanced filter parsing and value coercion

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::database::SqlValue;
use crate::schema::SemanticType;

/// Comparison applied by an advanced filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    NotEq,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    NotLike,
    StartsWith,
    EndsWith,
    Null,
    NotNull,
}

impl FilterOperator {
    /// Parse an operator token such as ">=" or "starts_with"
    pub fn parse(raw: &str) -> Option<Self> {
        let operator = match raw.trim().to_lowercase().as_str() {
            "=" | "==" => Self::Eq,
            "!=" | "<>" => Self::NotEq,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Gte,
            "<=" => Self::Lte,
            "like" => Self::Like,
            "not_like" => Self::NotLike,
            "starts_with" => Self::StartsWith,
            "ends_with" => Self::EndsWith,
            "null" => Self::Null,
            "not_null" => Self::NotNull,
            _ => return None,
        };
        Some(operator)
    }

    /// SQL operator for plain comparisons, `None` for pattern and null checks
    pub fn comparison_sql(self) -> Option<&'static str> {
        match self {
            Self::Eq => Some("="),
            Self::NotEq => Some("!="),
            Self::Gt => Some(">"),
            Self::Lt => Some("<"),
            Self::Gte => Some(">="),
            Self::Lte => Some("<="),
            _ => None,
        }
    }

    /// Wrap an already escaped search text into the LIKE pattern for this operator
    pub fn like_pattern(self, escaped: &str) -> Option<String> {
        match self {
            Self::Like | Self::NotLike => Some(format!("%{}%", escaped)),
            Self::StartsWith => Some(format!("{}%", escaped)),
            Self::EndsWith => Some(format!("%{}", escaped)),
            _ => None,
        }
    }
}

/// A single `{column, operator, value}` entry from the request
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedFilter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl AdvancedFilter {
    /// Parse the advanced filter list
    ///
    /// Accepts a JSON array or a string holding one. Anything that doesn't
    /// decode to a list yields no filters; entries without a column or with
    /// an unknown operator are skipped. A missing operator means "=".
    pub fn parse_list(raw: &Value) -> Vec<Self> {
        let decoded;
        let entries = match raw {
            Value::Array(entries) => entries,
            Value::String(text) => {
                decoded = match serde_json::from_str::<Value>(text) {
                    Ok(value) => value,
                    Err(_) => return Vec::new(),
                };
                match &decoded {
                    Value::Array(entries) => entries,
                    _ => return Vec::new(),
                }
            }
            _ => return Vec::new(),
        };

        entries.iter().filter_map(Self::from_entry).collect()
    }

    fn from_entry(entry: &Value) -> Option<Self> {
        let object = entry.as_object()?;
        let column = object
            .get("column")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|column| !column.is_empty())?;
        let operator = match object.get("operator").and_then(Value::as_str) {
            Some(raw) => FilterOperator::parse(raw)?,
            None => FilterOperator::Eq,
        };

        Some(Self {
            column: column.to_string(),
            operator,
            value: object.get("value").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Text form of a filter value; `None` for null, empty strings and containers
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a filter value to a bind value matching the column type
///
/// Returns `None` for missing values and for values that can't be
/// interpreted for that type. Date/time values are bound as written.
pub fn coerce_value(value: &Value, semantic_type: SemanticType) -> Option<SqlValue> {
    let text = value_as_text(value)?;

    match semantic_type {
        SemanticType::Integer => match value {
            Value::Number(number) => number
                .as_i64()
                .map(SqlValue::Int)
                .or_else(|| number.as_f64().map(SqlValue::Float)),
            _ => {
                let text = text.trim();
                text.parse::<i64>()
                    .map(SqlValue::Int)
                    .ok()
                    .or_else(|| parse_finite(text).map(SqlValue::Float))
            }
        },
        SemanticType::Float => parse_finite(text.trim()).map(SqlValue::Float),
        SemanticType::Boolean => match value {
            Value::Bool(flag) => Some(SqlValue::Bool(*flag)),
            _ => parse_bool(&text).map(SqlValue::Bool),
        },
        SemanticType::Datetime => {
            let text = text.trim();
            is_datetime(text).then(|| SqlValue::Text(text.to_string()))
        }
        SemanticType::Json | SemanticType::String => Some(SqlValue::Text(text)),
    }
}

/// Escape LIKE wildcards using `!` as the escape character
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Whether `text` is an RFC 3339 timestamp, i.e. carries a UTC offset
pub fn has_utc_offset(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text.trim()).is_ok()
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS[.fff]]` (space or `T`) and RFC 3339
fn is_datetime(text: &str) -> bool {
    const FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(text, format).is_ok())
        || has_utc_offset(text)
}
