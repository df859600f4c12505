//! REST API endpoints
//!
//! This module contains all API endpoint handlers for the database viewer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::error;

use crate::config::ViewerConfig;
use crate::database::traits::DatabaseProvider;
use crate::introspector::SchemaIntrospector;
use crate::query::TableQueryEngine;
use crate::Error;

pub mod dashboard;
pub mod rows;
pub mod tables;

// Re-export handlers for convenience
pub use dashboard::dashboard_handler;
pub use rows::get_row_handler;
pub use tables::{list_tables_handler, table_view_handler};

/// Shared state of all API handlers
pub struct ViewerState<DB: DatabaseProvider> {
    pub introspector: SchemaIntrospector<DB>,
    pub engine: TableQueryEngine<DB>,
    pub config: Arc<ViewerConfig>,
}

/// Error returned by API handlers, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    Viewer(Error),
    BadRequest(String),
    NotFound(String),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::Viewer(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Viewer(error @ Error::TableNotFound(_)) => {
                (StatusCode::NOT_FOUND, error.to_string())
            }
            ApiError::Viewer(error) => {
                error!(%error, "Database viewer request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Create the API router with all endpoints
///
/// # Arguments
///
/// * `state` - Introspector, query engine and configuration shared by the handlers
///
/// # Returns
///
/// An Axum Router configured with all API routes
pub fn create_api_router<DB: DatabaseProvider>(state: Arc<ViewerState<DB>>) -> Router {
    // Axum 0.8 uses {param} syntax instead of :param
    Router::new()
        .route("/dashboard", get(dashboard_handler::<DB>))
        .route("/tables", get(list_tables_handler::<DB>))
        .route("/tables/{table}", get(table_view_handler::<DB>))
        .route("/tables/{table}/row", get(get_row_handler::<DB>))
        .with_state(state)
}
