//! DbViewerLayer - Main Axum integration layer
//!
//! This module provides the main entry point for integrating axum-db-viewer
//! into an Axum application.

use crate::api::{create_api_router, ViewerState};
use crate::cache::{CacheStore, MemoryCache};
use crate::config::ViewerConfig;
use crate::database::traits::DatabaseProvider;
use crate::introspector::SchemaIntrospector;
use crate::query::TableQueryEngine;
use crate::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[cfg(feature = "sqlite")]
use crate::database::sqlite::SqliteProvider;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresProvider;

/// Main layer for integrating the database viewer into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use axum_db_viewer::{DbViewerLayer, ViewerConfig};
/// use sqlx::SqlitePool;
///
/// # async fn example() -> axum_db_viewer::Result<()> {
/// let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
/// let viewer = DbViewerLayer::sqlite("/db-viewer", pool, ViewerConfig::default())?;
/// let app: Router = Router::new().merge(viewer.into_router());
/// # Ok(())
/// # }
/// ```
pub struct DbViewerLayer<DB: DatabaseProvider> {
    base_path: String,
    database: Arc<DB>,
    config: Arc<ViewerConfig>,
    cache: Arc<dyn CacheStore>,
}

impl<DB: DatabaseProvider> DbViewerLayer<DB> {
    /// Create a new database viewer at the given base path
    ///
    /// The configuration is validated here. Metadata is cached in a
    /// [`MemoryCache`] unless another store is set with [`Self::with_cache`].
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the viewer will be mounted (e.g., "/db-viewer")
    /// * `database` - The database provider implementation
    /// * `config` - Table visibility, pagination, caching and dashboard settings
    pub fn new(base_path: impl Into<String>, database: DB, config: ViewerConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            base_path: base_path.into(),
            database: Arc::new(database),
            config: Arc::new(config),
            cache: Arc::new(MemoryCache::new()),
        })
    }

    /// Use a different cache store for metadata
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    /// Schema introspector sharing this layer's database, config and cache
    pub fn introspector(&self) -> SchemaIntrospector<DB> {
        SchemaIntrospector::new(
            Arc::clone(&self.database),
            Arc::clone(&self.config),
            Arc::clone(&self.cache),
        )
    }

    /// Query engine sharing this layer's database and config
    pub fn query_engine(&self) -> TableQueryEngine<DB> {
        TableQueryEngine::new(Arc::clone(&self.database), Arc::clone(&self.config))
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router serves the JSON API at `{base_path}/api/*` with
    /// permissive CORS.
    pub fn into_router(self) -> Router {
        let state = Arc::new(ViewerState {
            introspector: self.introspector(),
            engine: self.query_engine(),
            config: Arc::clone(&self.config),
        });
        let api_path = format!("{}/api", self.base_path.trim_end_matches('/'));

        Router::new()
            .nest(&api_path, create_api_router(state))
            .layer(CorsLayer::permissive())
    }
}

#[cfg(feature = "sqlite")]
impl DbViewerLayer<SqliteProvider> {
    /// Create a new database viewer for SQLite
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the viewer will be mounted
    /// * `pool` - The SQLite connection pool
    /// * `config` - Viewer configuration
    pub fn sqlite(
        base_path: impl Into<String>,
        pool: sqlx::SqlitePool,
        config: ViewerConfig,
    ) -> Result<Self> {
        Self::new(base_path, SqliteProvider::new(pool), config)
    }
}

#[cfg(feature = "postgres")]
impl DbViewerLayer<PostgresProvider> {
    /// Create a new database viewer for PostgreSQL
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the viewer will be mounted
    /// * `pool` - The PostgreSQL connection pool
    /// * `config` - Viewer configuration
    pub fn postgres(
        base_path: impl Into<String>,
        pool: sqlx::PgPool,
        config: ViewerConfig,
    ) -> Result<Self> {
        Self::new(base_path, PostgresProvider::new(pool), config)
    }
}
