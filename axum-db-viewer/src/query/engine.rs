//! Paginated, filtered and sorted row queries

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::ViewerConfig;
use crate::database::DatabaseProvider;
use crate::query::builder::SelectBuilder;
use crate::query::filter::FilterOperator;
use crate::query::params::QueryParams;
use crate::schema::{ColumnMetadata, Page, Row, TableName, TablePage};
use crate::Result;

/// Runs row queries against a verified table
///
/// Column names from the request are only used after they were found in the
/// table's column metadata; unknown names are ignored.
pub struct TableQueryEngine<DB: DatabaseProvider> {
    database: Arc<DB>,
    config: Arc<ViewerConfig>,
}

impl<DB: DatabaseProvider> Clone for TableQueryEngine<DB> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
            config: Arc::clone(&self.config),
        }
    }
}

impl<DB: DatabaseProvider> TableQueryEngine<DB> {
    pub fn new(database: Arc<DB>, config: Arc<ViewerConfig>) -> Self {
        Self { database, config }
    }

    /// Fetch one page of rows matching `params`
    pub async fn query(
        &self,
        table: &TableName,
        columns: &[ColumnMetadata],
        params: &QueryParams,
    ) -> Result<TablePage> {
        let builder = self.build_select(table, columns, params);
        let per_page = self.config.effective_per_page(params.per_page);
        let page = params.effective_page();

        let total = self.database.fetch_count(&builder.count_statement()).await?;
        // Pages past the last one are empty without asking the database
        let offset = (page - 1)
            .checked_mul(per_page)
            .filter(|offset| *offset < total);
        let rows = match offset {
            Some(offset) => {
                self.database
                    .fetch_rows(&builder.page_statement(per_page, offset))
                    .await?
            }
            None => Vec::new(),
        };

        debug!(
            table = %table,
            total,
            page,
            per_page,
            returned = rows.len(),
            "Queried table rows"
        );

        Ok(TablePage {
            page: Page::new(rows, total, per_page, page),
            applied: params.applied(per_page, page),
        })
    }

    /// Fetch the first row whose `pk_column` equals `pk_value`
    ///
    /// An unknown column or a value that doesn't fit the column type finds nothing.
    pub async fn find_row(
        &self,
        table: &TableName,
        columns: &[ColumnMetadata],
        pk_column: &str,
        pk_value: &Value,
    ) -> Result<Option<Row>> {
        let Some(column) = columns.iter().find(|column| column.name == pk_column) else {
            debug!(table = %table, column = pk_column, "Primary key column not in metadata");
            return Ok(None);
        };

        let mut builder = SelectBuilder::new(self.database.driver(), table);
        if !builder.where_filter(column, FilterOperator::Eq, pk_value) {
            return Ok(None);
        }

        let rows = self.database.fetch_rows(&builder.first_statement()).await?;
        Ok(rows.into_iter().next())
    }

    fn build_select(
        &self,
        table: &TableName,
        columns: &[ColumnMetadata],
        params: &QueryParams,
    ) -> SelectBuilder {
        let known: HashMap<&str, &ColumnMetadata> = columns
            .iter()
            .map(|column| (column.name.as_str(), column))
            .collect();
        let mut builder = SelectBuilder::new(self.database.driver(), table);

        if let Some(term) = params.search_term() {
            let searchable: Vec<&ColumnMetadata> = columns
                .iter()
                .filter(|column| column.semantic_type.is_searchable())
                .collect();
            builder.where_search(term, &searchable);
        }

        for filter in params.advanced_filters() {
            let Some(column) = known.get(filter.column.as_str()) else {
                debug!(table = %table, column = %filter.column, "Ignoring filter on unknown column");
                continue;
            };
            if !builder.where_filter(column, filter.operator, &filter.value) {
                debug!(
                    table = %table,
                    column = %filter.column,
                    operator = ?filter.operator,
                    "Ignoring filter without a value"
                );
            }
        }

        if let Some(column) = params
            .sort
            .as_deref()
            .and_then(|sort| known.get(sort))
        {
            builder.order_by(column, params.sort_direction());
        }

        builder
    }
}
