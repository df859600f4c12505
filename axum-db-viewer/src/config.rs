//! Viewer configuration
//!
//! All options are read once when the viewer is built and validated up front,
//! so the request path never has to deal with a half-valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_CACHE_DURATION_SECS: u64 = 300;
pub const DEFAULT_PER_PAGE: u64 = 25;
pub const DEFAULT_PER_PAGE_OPTIONS: [u64; 4] = [10, 25, 50, 100];
pub const DEFAULT_DASHBOARD_TOP_TABLES: usize = 10;
pub const DEFAULT_CHART_COLOR: &str = "#8b5cf6";

/// Framework bookkeeping tables hidden unless the exclusion list is overridden.
pub const DEFAULT_EXCLUDED_TABLES: &[&str] = &[
    "migrations",
    "password_reset_tokens",
    "password_resets",
    "failed_jobs",
    "personal_access_tokens",
    "sessions",
    "cache",
    "cache_locks",
    "jobs",
    "job_batches",
];

/// A time-series chart shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDefinition {
    /// Table to aggregate
    pub table: String,

    /// Date/time column used for the daily buckets
    pub column: String,

    /// Display label, defaults to the table name
    #[serde(default)]
    pub label: Option<String>,

    /// Display color, defaults to [`DEFAULT_CHART_COLOR`]
    #[serde(default)]
    pub color: Option<String>,
}

impl ChartDefinition {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            label: None,
            color: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn label_or_default(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.table)
    }

    pub fn color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_CHART_COLOR)
    }
}

/// Configuration for the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// If not empty, ONLY these tables are shown
    pub include_tables: Vec<String>,

    /// Tables that are always hidden, even when listed in `include_tables`
    pub exclude_tables: Vec<String>,

    /// Seconds to cache table/column/primary key metadata (0 disables caching)
    pub cache_duration_seconds: u64,

    /// Page sizes a caller may request
    pub per_page_options: Vec<u64>,

    /// Page size used when the requested one isn't allowed
    pub default_per_page: u64,

    /// How many of the largest tables the dashboard lists
    pub dashboard_top_tables: usize,

    /// Time-series charts on the dashboard
    pub dashboard_charts: Vec<ChartDefinition>,

    /// Cache per-table row counts for the dashboard with the metadata TTL
    pub cache_dashboard_counts: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            include_tables: Vec::new(),
            exclude_tables: DEFAULT_EXCLUDED_TABLES.iter().map(|t| t.to_string()).collect(),
            cache_duration_seconds: DEFAULT_CACHE_DURATION_SECS,
            per_page_options: DEFAULT_PER_PAGE_OPTIONS.to_vec(),
            default_per_page: DEFAULT_PER_PAGE,
            dashboard_top_tables: DEFAULT_DASHBOARD_TOP_TABLES,
            dashboard_charts: Vec::new(),
            cache_dashboard_counts: false,
        }
    }
}

impl ViewerConfig {
    /// Metadata cache TTL; zero means "don't cache"
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_duration_seconds)
    }

    /// Pick the effective page size for a request
    ///
    /// Anything outside `per_page_options` (including no value at all) yields
    /// `default_per_page`.
    pub fn effective_per_page(&self, requested: Option<i64>) -> u64 {
        requested
            .and_then(|value| u64::try_from(value).ok())
            .filter(|value| self.per_page_options.contains(value))
            .unwrap_or(self.default_per_page)
    }

    /// Check the configuration for values the viewer can't work with
    pub fn validate(&self) -> Result<()> {
        if self.per_page_options.is_empty() {
            return Err(Error::InvalidConfig(
                "per_page_options must contain at least one page size".to_string(),
            ));
        }
        if self.per_page_options.contains(&0) {
            return Err(Error::InvalidConfig(
                "per_page_options must not contain 0".to_string(),
            ));
        }
        if !self.per_page_options.contains(&self.default_per_page) {
            return Err(Error::InvalidConfig(format!(
                "default_per_page ({}) must be one of per_page_options {:?}",
                self.default_per_page, self.per_page_options
            )));
        }
        for chart in &self.dashboard_charts {
            if chart.table.trim().is_empty() || chart.column.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "dashboard_charts entries need both a table and a column".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.exclude_tables.iter().any(|t| t == "migrations"));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_effective_per_page() {
        let config = ViewerConfig::default();
        assert_eq!(config.effective_per_page(Some(50)), 50);
        assert_eq!(config.effective_per_page(Some(7)), 25);
        assert_eq!(config.effective_per_page(Some(-10)), 25);
        assert_eq!(config.effective_per_page(None), 25);
    }

    #[test]
    fn test_validate_rejects_default_outside_options() {
        let config = ViewerConfig {
            per_page_options: vec![10, 20],
            default_per_page: 25,
            ..ViewerConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = ViewerConfig {
            per_page_options: Vec::new(),
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_incomplete_chart() {
        let config = ViewerConfig {
            dashboard_charts: vec![ChartDefinition::new("orders", " ")],
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ViewerConfig = serde_json::from_str(
            r#"{"include_tables": ["users"], "dashboard_charts": [{"table": "orders", "column": "created_at"}]}"#,
        )
        .unwrap();
        assert_eq!(config.include_tables, vec!["users".to_string()]);
        assert_eq!(config.default_per_page, DEFAULT_PER_PAGE);
        assert_eq!(config.dashboard_charts[0].label_or_default(), "orders");
        assert_eq!(config.dashboard_charts[0].color_or_default(), DEFAULT_CHART_COLOR);
    }
}
