//! SQL dialect differences
//!
//! Everything engine-specific that leaks into generated SQL is decided here,
//! keyed by the driver of the active connection: identifier quoting,
//! placeholder syntax, text casts and the day-bucket expression used for
//! dashboard time series.

use serde::{Serialize, Serializer};
use std::fmt;

/// Database driver of the active connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Driver {
    Sqlite,
    Postgres,
    MySql,
    /// Any other engine, identified by its driver name
    Other(String),
}

impl Driver {
    /// Parse a driver identifier such as "sqlite", "pgsql" or "mysql"
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Self::Sqlite,
            "pgsql" | "postgres" | "postgresql" => Self::Postgres,
            "mysql" | "mariadb" => Self::MySql,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "pgsql",
            Self::MySql => "mysql",
            Self::Other(name) => name,
        }
    }

    /// Quote an identifier (table or column name)
    ///
    /// Embedded quote characters are doubled. Callers still only pass names
    /// that were found in the introspected schema.
    pub fn quote_identifier(&self, identifier: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", identifier.replace('`', "``")),
            _ => format!("\"{}\"", identifier.replace('"', "\"\"")),
        }
    }

    /// Placeholder for the bind parameter at 1-based `position`
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::Postgres => format!("${}", position),
            _ => "?".to_string(),
        }
    }

    /// Placeholder for a bound date/time string compared against a date/time column
    pub fn timestamp_placeholder(&self, position: usize) -> String {
        match self {
            Self::Postgres => format!("CAST(${} AS TIMESTAMP)", position),
            _ => self.placeholder(position),
        }
    }

    /// Like [`Driver::timestamp_placeholder`], for values carrying a UTC offset
    pub fn zoned_timestamp_placeholder(&self, position: usize) -> String {
        match self {
            Self::Postgres => format!("CAST(${} AS TIMESTAMPTZ)", position),
            _ => self.placeholder(position),
        }
    }

    /// Cast an SQL expression to text
    pub fn text_cast(&self, expression: &str) -> String {
        match self {
            Self::MySql => format!("CAST({} AS CHAR)", expression),
            _ => format!("CAST({} AS TEXT)", expression),
        }
    }

    /// Column side of a comparison against a bound text value
    ///
    /// Postgres has no implicit cast from text for types like `uuid` or enums.
    pub fn text_comparison_operand(&self, expression: &str) -> String {
        match self {
            Self::Postgres => self.text_cast(expression),
            _ => expression.to_string(),
        }
    }

    /// Expression truncating a date/time expression to its calendar day
    ///
    /// Unknown drivers get `DATE(..)`, which most engines understand.
    pub fn day_bucket_expression(&self, expression: &str) -> String {
        match self {
            Self::Sqlite => format!("strftime('%Y-%m-%d', {})", expression),
            Self::Postgres => format!("CAST({} AS DATE)", expression),
            Self::MySql | Self::Other(_) => format!("DATE({})", expression),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl Serialize for Driver {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.identifier())
    }
}
