//! # axum-db-viewer
//!
//! A read-only database browser, easily integrable as an Axum router.
//!
//! ## Features
//!
//! - Dynamic schema discovery with include/exclude table lists
//! - Column type normalization to a small set of semantic types
//! - Paginated table views with global search, advanced filters and sorting
//! - Dashboard statistics with per-day time series across SQL dialects
//! - TTL-based metadata caching through a pluggable cache store
//! - Support for SQLite and PostgreSQL
//!
//! ## Safety Model
//!
//! Table and column names supplied by callers are never embedded in SQL unless
//! they were first found in the introspected schema. Every value coming from a
//! request is bound as a query parameter.
//!
//! The viewer ships no authentication. Put it behind your own middleware.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use axum_db_viewer::{DbViewerLayer, ViewerConfig};
//! use sqlx::SqlitePool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = SqlitePool::connect("sqlite::memory:")
//!         .await
//!         .unwrap();
//!
//!     let viewer = DbViewerLayer::sqlite("/db-viewer", pool, ViewerConfig::default()).unwrap();
//!
//!     let app: Router = Router::new()
//!         .route("/", get(|| async { "Hello, World!" }))
//!         .merge(viewer.into_router());
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod introspector;
pub mod layer;
pub mod query;
pub mod schema;

// Public exports
pub use cache::{CacheStore, MemoryCache, NoopCache};
pub use config::{ChartDefinition, ViewerConfig};
pub use introspector::SchemaIntrospector;
pub use layer::DbViewerLayer;
pub use query::{QueryParams, TableQueryEngine};
pub use schema::{ColumnMetadata, Page, Row, SemanticType, TableName, TablePage};

// Re-export database providers
pub use database::dialect::Driver;
pub use database::traits::{DatabaseError, DatabaseProvider};

#[cfg(feature = "sqlite")]
pub use database::sqlite::SqliteProvider;

#[cfg(feature = "postgres")]
pub use database::postgres::PostgresProvider;

// Error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Table [{0}] not found or not allowed")]
    TableNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
