//! Table listing and table view endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use std::sync::Arc;

use super::{ApiError, ViewerState};
use crate::database::traits::DatabaseProvider;
use crate::query::QueryParams;
use crate::schema::{TableViewResponse, TablesResponse};

/// Handler for GET /api/tables
///
/// Returns every visible table with its live row count, plus the database name.
pub async fn list_tables_handler<DB: DatabaseProvider>(
    State(state): State<Arc<ViewerState<DB>>>,
) -> Result<Json<TablesResponse>, ApiError> {
    let tables = state.introspector.table_infos().await?;
    let db_name = state.introspector.database_name().await;

    Ok(Json(TablesResponse { tables, db_name }))
}

/// Handler for GET /api/tables/{table}
///
/// Returns one page of rows together with the column metadata and primary key.
///
/// Query parameters:
/// - search: Global search text over text and JSON columns
/// - advanced: JSON-encoded list of `{column, operator, value}` filters
/// - sort / direction: Column to sort by, "asc" or "desc"
/// - page / perPage: Pagination; page sizes outside the allowed set use the default
///
/// # Arguments
///
/// * `state` - Shared viewer state
/// * `table_name` - Requested table, checked against the visible tables
/// * `params` - Search, filter, sort and pagination parameters
pub async fn table_view_handler<DB: DatabaseProvider>(
    State(state): State<Arc<ViewerState<DB>>>,
    Path(table_name): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<TableViewResponse>, ApiError> {
    let table = state.introspector.resolve_table(&table_name).await?;
    let columns = state.introspector.columns(&table).await?;
    let primary_key = state.introspector.primary_key(&table).await;
    let result = state.engine.query(&table, &columns, &params).await?;
    let db_name = state.introspector.database_name().await;

    Ok(Json(TableViewResponse::new(
        table,
        columns,
        primary_key,
        result,
        state.config.per_page_options.clone(),
        db_name,
    )))
}
