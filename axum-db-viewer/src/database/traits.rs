//! Database provider trait
//!
//! This trait defines the interface that all database implementations must provide.
//! Providers only expose catalog access and statement execution; all SQL that
//! involves caller input is built by the query layer and handed over as a
//! [`Statement`] with bound values.

use crate::database::dialect::Driver;
use crate::schema::{CatalogColumn, CatalogIndex, CatalogTable, Row};
use async_trait::async_trait;
use thiserror::Error;

/// A value bound to a statement placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// SQL text plus its bind values, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }
}

/// Database provider trait for catalog access and read-only execution
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// Driver of the underlying connection, used to pick dialect-specific SQL
    fn driver(&self) -> Driver;

    /// Name of the connected database (for display)
    async fn database_name(&self) -> Result<Option<String>, DatabaseError>;

    /// Schema whose tables are listed; `None` accepts every table
    async fn current_schema(&self) -> Result<Option<String>, DatabaseError>;

    /// List base tables in catalog order
    async fn list_tables(&self) -> Result<Vec<CatalogTable>, DatabaseError>;

    /// List the columns of a table in ordinal order
    ///
    /// An unknown table yields an empty list.
    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>, DatabaseError>;

    /// List the indexes of a table, including the primary key
    async fn list_indexes(&self, table: &str) -> Result<Vec<CatalogIndex>, DatabaseError>;

    /// Execute a statement whose first column is a row count
    async fn fetch_count(&self, statement: &Statement) -> Result<u64, DatabaseError>;

    /// Execute a statement and convert every row to a JSON map
    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Generic database error
    #[error("Database error: {0}")]
    Query(String),

    /// A value could not be converted to JSON
    #[error("Failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::Query(error.to_string())
    }
}
