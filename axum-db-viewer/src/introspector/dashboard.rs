//! Dashboard statistics and per-day time series

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use super::SchemaIntrospector;
use crate::cache::CacheKey;
use crate::database::DatabaseProvider;
use crate::query::SelectBuilder;
use crate::schema::{ChartSeries, DashboardStats, Row, SeriesPoint, TableInfo, TableName};
use crate::Result;

impl<DB: DatabaseProvider> SchemaIntrospector<DB> {
    /// Table totals, the largest tables and one chart per configured definition
    ///
    /// Charts whose table isn't visible are skipped. Row counts are live unless
    /// `cache_dashboard_counts` is set.
    pub async fn dashboard_stats(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DashboardStats> {
        let counts = if self.config.cache_dashboard_counts {
            self.cache
                .remember(CacheKey::row_counts(), || self.table_infos())
                .await?
        } else {
            self.table_infos().await?
        };

        let total_tables = counts.len();
        let total_records = counts.iter().map(|info| info.row_count).sum();
        let table_stats = top_tables(counts.clone(), self.config.dashboard_top_tables);

        let mut charts = Vec::with_capacity(self.config.dashboard_charts.len());
        for definition in &self.config.dashboard_charts {
            if !counts.iter().any(|info| info.name == definition.table) {
                debug!(table = %definition.table, "Skipping chart for hidden table");
                continue;
            }

            let table = TableName::verified(definition.table.as_str());
            let data = self.time_series(&table, &definition.column, start, end).await;
            let total = data.iter().map(|point| point.y).sum();

            charts.push(ChartSeries {
                label: definition.label_or_default().to_string(),
                color: definition.color_or_default().to_string(),
                data,
                total,
            });
        }

        Ok(DashboardStats {
            driver: self.driver().identifier().to_string(),
            database: self.database_name().await,
            total_tables,
            total_records,
            table_stats,
            charts,
        })
    }

    /// Rows per calendar day of `column`, oldest first
    ///
    /// `start` and `end` are inclusive days. The column must belong to the
    /// table; otherwise, and on any query failure, the series is empty.
    pub async fn time_series(
        &self,
        table: &TableName,
        column: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<SeriesPoint> {
        let columns = match self.columns(table).await {
            Ok(columns) => columns,
            Err(error) => {
                warn!(table = %table, %error, "Failed to read columns for time series");
                return Vec::new();
            }
        };
        let Some(column) = columns.iter().find(|candidate| candidate.name == column) else {
            warn!(table = %table, column, "Time series column not found");
            return Vec::new();
        };

        let mut builder = SelectBuilder::new(self.driver(), table);
        builder.where_day_range(column, start, end);

        match self
            .database
            .fetch_rows(&builder.day_bucket_statement(column))
            .await
        {
            Ok(rows) => rows.iter().filter_map(series_point).collect(),
            Err(error) => {
                warn!(table = %table, column = %column.name, %error, "Failed to build time series");
                Vec::new()
            }
        }
    }
}

/// Largest `limit` tables by row count; ties keep catalog order
fn top_tables(mut tables: Vec<TableInfo>, limit: usize) -> Vec<TableInfo> {
    tables.sort_by(|a, b| b.row_count.cmp(&a.row_count));
    tables.truncate(limit);
    tables
}

fn series_point(row: &Row) -> Option<SeriesPoint> {
    let x = match row.get("group_date")? {
        Value::String(day) => day.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };
    let y = match row.get("aggregate_count")? {
        Value::Number(count) => count.as_u64()?,
        Value::String(count) => count.parse().ok()?,
        _ => return None,
    };

    Some(SeriesPoint { x, y })
}
