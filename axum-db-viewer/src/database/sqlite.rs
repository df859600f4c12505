//! SQLite database provider implementation

use crate::database::dialect::Driver;
use crate::database::traits::{DatabaseError, DatabaseProvider, SqlValue, Statement};
use crate::schema::{CatalogColumn, CatalogIndex, CatalogTable, Row};
use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteColumn, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};
use std::path::Path;

/// Only the first bytes of a BLOB are rendered
const BLOB_PREVIEW_BYTES: usize = 64;

const MAIN_SCHEMA: &str = "main";

/// SQLite database provider
pub struct SqliteProvider {
    pool: SqlitePool,
}

impl SqliteProvider {
    /// Create a new SQLite provider
    ///
    /// # Arguments
    ///
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn bind_value<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        value: &SqlValue,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
        }
    }

    fn prepare(statement: &Statement) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        statement
            .bindings
            .iter()
            .fold(sqlx::query(&statement.sql), Self::bind_value)
    }

    /// Convert a SQLite row to a JSON object
    ///
    /// This handles all SQLite storage classes and converts them to appropriate JSON values.
    fn row_to_json(row: &SqliteRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let value = Self::extract_column_value(row, column)?;
            map.insert(column.name().to_string(), value);
        }

        Ok(map)
    }

    /// Extract a column value from a SQLite row and convert to JSON
    ///
    /// SQLite is dynamically typed, so the storage class of the actual value
    /// decides the conversion. The declared column type is only consulted to
    /// turn integers in BOOLEAN columns into JSON booleans.
    fn extract_column_value(row: &SqliteRow, column: &SqliteColumn) -> Result<Value, DatabaseError> {
        let index = column.ordinal();
        let raw = row.try_get_raw(index).map_err(|e| DatabaseError::Decode {
            column: column.name().to_string(),
            message: e.to_string(),
        })?;

        if raw.is_null() {
            return Ok(Value::Null);
        }

        let storage_class = raw.type_info().name().to_string();
        let declared_boolean = column.type_info().name().to_uppercase().contains("BOOL");

        match storage_class.as_str() {
            "INTEGER" | "BOOLEAN" => {
                if let Ok(value) = row.try_get::<i64, _>(index) {
                    if declared_boolean {
                        return Ok(Value::Bool(value != 0));
                    }
                    return Ok(Value::Number(value.into()));
                }
            }
            "REAL" => {
                if let Ok(value) = row.try_get::<f64, _>(index) {
                    return Ok(serde_json::Number::from_f64(value)
                        .map(Value::Number)
                        .unwrap_or(Value::Null));
                }
            }
            "BLOB" => {
                if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
                    return Ok(Value::String(blob_preview(&value)));
                }
            }
            _ => {}
        }

        // TEXT and anything the branches above couldn't decode
        if let Ok(value) = row.try_get::<String, _>(index) {
            return Ok(Value::String(value));
        }

        Ok(Value::Null)
    }
}

#[async_trait]
impl DatabaseProvider for SqliteProvider {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    async fn database_name(&self) -> Result<Option<String>, DatabaseError> {
        let file: Option<String> =
            sqlx::query_scalar("SELECT file FROM pragma_database_list WHERE name = 'main'")
                .fetch_optional(&self.pool)
                .await?;

        // In-memory and temporary databases have no file
        let name = file
            .filter(|path| !path.is_empty())
            .and_then(|path| {
                Path::new(&path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| MAIN_SCHEMA.to_string());

        Ok(Some(name))
    }

    async fn current_schema(&self) -> Result<Option<String>, DatabaseError> {
        Ok(Some(MAIN_SCHEMA.to_string()))
    }

    async fn list_tables(&self) -> Result<Vec<CatalogTable>, DatabaseError> {
        let query = "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<CatalogTable, DatabaseError> {
                Ok(CatalogTable {
                    name: row.try_get("name")?,
                    schema: Some(MAIN_SCHEMA.to_string()),
                })
            })
            .collect()
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>, DatabaseError> {
        // pragma_table_info returns: cid, name, type, notnull, dflt_value, pk
        let rows = sqlx::query("SELECT * FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<CatalogColumn, DatabaseError> {
                let not_null: i64 = row.try_get("notnull")?;
                Ok(CatalogColumn {
                    name: row.try_get("name")?,
                    raw_type: row.try_get("type")?,
                    nullable: not_null == 0,
                    default_value: row
                        .try_get::<Option<String>, _>("dflt_value")
                        .ok()
                        .flatten(),
                })
            })
            .collect()
    }

    async fn list_indexes(&self, table: &str) -> Result<Vec<CatalogIndex>, DatabaseError> {
        let mut indexes = Vec::new();

        // A rowid alias (INTEGER PRIMARY KEY) has no entry in index_list, so the
        // primary key is read from table_info instead
        let primary_key_columns: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        if !primary_key_columns.is_empty() {
            indexes.push(CatalogIndex {
                name: "primary".to_string(),
                columns: primary_key_columns,
                is_primary: true,
                unique: true,
            });
        }

        // pragma_index_list returns: seq, name, unique, origin, partial
        let index_rows = sqlx::query("SELECT * FROM pragma_index_list(?)")
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        for row in index_rows {
            let origin: String = row.try_get("origin")?;
            if origin == "pk" {
                continue;
            }

            let index_name: String = row.try_get("name")?;
            let unique: i64 = row.try_get("unique")?;

            // pragma_index_info returns: seqno, cid, name (NULL for expressions)
            let columns: Vec<Option<String>> =
                sqlx::query_scalar("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
                    .bind(index_name.as_str())
                    .fetch_all(&self.pool)
                    .await?;

            indexes.push(CatalogIndex {
                name: index_name,
                columns: columns.into_iter().flatten().collect(),
                is_primary: false,
                unique: unique != 0,
            });
        }

        Ok(indexes)
    }

    async fn fetch_count(&self, statement: &Statement) -> Result<u64, DatabaseError> {
        let row = Self::prepare(statement).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        let rows = Self::prepare(statement).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_json).collect()
    }
}

/// Render BLOB data as a short base64 preview
fn blob_preview(data: &[u8]) -> String {
    let limited_data = &data[..data.len().min(BLOB_PREVIEW_BYTES)];
    let mut encoded = base64::engine::general_purpose::STANDARD.encode(limited_data);
    if data.len() > BLOB_PREVIEW_BYTES {
        encoded.push_str("...");
    }
    format!("[BLOB: {} bytes, base64: {}]", data.len(), encoded)
}
