//! Single row endpoint

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, ViewerState};
use crate::database::traits::DatabaseProvider;
use crate::schema::RowResponse;

/// Query parameters for the single row endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RowQuery {
    pub pk_value: Option<String>,
}

/// Handler for GET /api/tables/{table}/row?pk_value=...
///
/// Looks a row up by its primary key. Responds with 400 when the table has no
/// primary key or no value was given, and 404 when no row matches.
pub async fn get_row_handler<DB: DatabaseProvider>(
    State(state): State<Arc<ViewerState<DB>>>,
    Path(table_name): Path<String>,
    Query(query): Query<RowQuery>,
) -> Result<Json<RowResponse>, ApiError> {
    let table = state.introspector.resolve_table(&table_name).await?;

    let Some(primary_key) = state.introspector.primary_key(&table).await else {
        return Err(ApiError::BadRequest("No primary key available".to_string()));
    };
    let Some(pk_value) = query.pk_value.filter(|value| !value.is_empty()) else {
        return Err(ApiError::BadRequest("Missing primary key value".to_string()));
    };

    let columns = state.introspector.columns(&table).await?;
    let row = state
        .engine
        .find_row(&table, &columns, &primary_key, &Value::String(pk_value))
        .await?
        .ok_or_else(|| ApiError::NotFound("Row not found".to_string()))?;

    Ok(Json(RowResponse {
        table,
        primary_key,
        row,
    }))
}
