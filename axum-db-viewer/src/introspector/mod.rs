//! Schema discovery
//!
//! [`SchemaIntrospector`] answers the metadata questions the rest of the
//! viewer needs: which tables are visible, what columns they have, which
//! column is the primary key and how many rows they hold. Table listings,
//! column lists and primary keys are cached for the configured TTL.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::cache::{CacheKey, CacheStore, MetadataCache};
use crate::config::ViewerConfig;
use crate::database::{DatabaseProvider, Driver};
use crate::query::SelectBuilder;
use crate::schema::{CatalogTable, ColumnMetadata, SemanticType, TableInfo, TableName};
use crate::{Error, Result};

mod dashboard;

/// Column treated as primary key when the catalog doesn't report one
const FALLBACK_PRIMARY_KEY: &str = "id";

/// Discovers tables and columns through a [`DatabaseProvider`]
pub struct SchemaIntrospector<DB: DatabaseProvider> {
    database: Arc<DB>,
    config: Arc<ViewerConfig>,
    cache: MetadataCache,
}

impl<DB: DatabaseProvider> Clone for SchemaIntrospector<DB> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
            config: Arc::clone(&self.config),
            cache: self.cache.clone(),
        }
    }
}

impl<DB: DatabaseProvider> SchemaIntrospector<DB> {
    pub fn new(database: Arc<DB>, config: Arc<ViewerConfig>, store: Arc<dyn CacheStore>) -> Self {
        let cache = MetadataCache::new(store, config.cache_ttl());
        Self {
            database,
            config,
            cache,
        }
    }

    pub fn driver(&self) -> Driver {
        self.database.driver()
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Names of all visible tables, in catalog order
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.cache
            .remember(CacheKey::tables(), || self.load_tables())
            .await
    }

    async fn load_tables(&self) -> Result<Vec<String>> {
        let schema = self.database.current_schema().await?;
        let catalog = self.database.list_tables().await?;
        Ok(self.visible_tables(schema.as_deref(), catalog))
    }

    fn visible_tables(&self, schema: Option<&str>, catalog: Vec<CatalogTable>) -> Vec<String> {
        let include = &self.config.include_tables;
        let exclude = &self.config.exclude_tables;
        let mut seen = HashSet::new();

        catalog
            .into_iter()
            .filter(|table| match (schema, table.schema.as_deref()) {
                (Some(active), Some(owner)) => active == owner,
                _ => true,
            })
            .map(|table| table.name)
            .filter(|name| !name.trim().is_empty())
            .filter(|name| seen.insert(name.clone()))
            .filter(|name| include.is_empty() || include.contains(name))
            .filter(|name| !exclude.contains(name))
            .collect()
    }

    /// Check a caller-supplied table name against the visible tables
    pub async fn resolve_table(&self, name: &str) -> Result<TableName> {
        let tables = self.list_tables().await?;
        if tables.iter().any(|table| table == name) {
            Ok(TableName::verified(name))
        } else {
            Err(Error::TableNotFound(name.to_string()))
        }
    }

    /// Columns of a table in ordinal order, with normalized types
    ///
    /// A table without columns is reported as [`Error::TableNotFound`]. A
    /// failing catalog lookup is logged and treated the same way.
    pub async fn columns(&self, table: &TableName) -> Result<Vec<ColumnMetadata>> {
        self.cache
            .remember(CacheKey::columns(table.as_str()), || async {
                let catalog = self
                    .database
                    .list_columns(table.as_str())
                    .await
                    .unwrap_or_else(|error| {
                        warn!(table = %table, %error, "Failed to list columns");
                        Vec::new()
                    });
                if catalog.is_empty() {
                    return Err(Error::TableNotFound(table.to_string()));
                }

                Ok(catalog
                    .into_iter()
                    .map(|column| ColumnMetadata {
                        semantic_type: SemanticType::from_raw(&column.raw_type),
                        name: column.name,
                        nullable: column.nullable,
                        default_value: column.default_value,
                    })
                    .collect())
            })
            .await
    }

    /// Primary key column of a table
    ///
    /// Uses the first column of the primary index. Without one, a column named
    /// `id` is assumed when it exists. Lookup failures yield `None`.
    pub async fn primary_key(&self, table: &TableName) -> Option<String> {
        let result = self
            .cache
            .remember(CacheKey::primary_key(table.as_str()), || async {
                Ok(self.load_primary_key(table).await)
            })
            .await;

        result.unwrap_or_else(|error| {
            warn!(table = %table, %error, "Failed to cache primary key");
            None
        })
    }

    async fn load_primary_key(&self, table: &TableName) -> Option<String> {
        match self.database.list_indexes(table.as_str()).await {
            Ok(indexes) => {
                let primary = indexes
                    .into_iter()
                    .find(|index| index.is_primary)
                    .and_then(|index| index.columns.into_iter().next());
                if primary.is_some() {
                    return primary;
                }
            }
            Err(error) => warn!(table = %table, %error, "Failed to read indexes"),
        }

        match self.columns(table).await {
            Ok(columns) => columns
                .iter()
                .any(|column| column.name == FALLBACK_PRIMARY_KEY)
                .then(|| FALLBACK_PRIMARY_KEY.to_string()),
            Err(error) => {
                warn!(table = %table, %error, "Failed to read columns for primary key fallback");
                None
            }
        }
    }

    /// Live row count; failures count as 0
    pub async fn row_count(&self, table: &TableName) -> u64 {
        let statement = SelectBuilder::new(self.driver(), table).count_statement();
        match self.database.fetch_count(&statement).await {
            Ok(count) => count,
            Err(error) => {
                warn!(table = %table, %error, "Failed to count rows");
                0
            }
        }
    }

    /// Every visible table with its live row count
    pub async fn table_infos(&self) -> Result<Vec<TableInfo>> {
        let tables = self.list_tables().await?;
        let mut infos = Vec::with_capacity(tables.len());
        for name in tables {
            let row_count = self.row_count(&TableName::verified(name.as_str())).await;
            infos.push(TableInfo { name, row_count });
        }
        Ok(infos)
    }

    /// Name of the connected database, `None` when it can't be determined
    pub async fn database_name(&self) -> Option<String> {
        match self.database.database_name().await {
            Ok(name) => name,
            Err(error) => {
                warn!(%error, "Failed to read database name");
                None
            }
        }
    }
}
