//! PostgreSQL database provider implementation

use crate::database::dialect::Driver;
use crate::database::traits::{DatabaseError, DatabaseProvider, SqlValue, Statement};
use crate::schema::{CatalogColumn, CatalogIndex, CatalogTable, Row};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{BigDecimal, Uuid};
use sqlx::{Column, PgPool, Postgres, Row as _, TypeInfo};
use tracing::warn;

const LIST_TABLES: &str = r#"
    SELECT
        table_name::text AS table_name,
        table_schema::text AS table_schema
    FROM information_schema.tables
    WHERE table_type = 'BASE TABLE'
      AND table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY table_schema, table_name
"#;

const LIST_COLUMNS: &str = r#"
    SELECT
        column_name::text AS column_name,
        data_type::text AS data_type,
        udt_name::text AS udt_name,
        is_nullable::text AS is_nullable,
        column_default::text AS column_default
    FROM information_schema.columns
    WHERE table_schema = current_schema()
      AND table_name = $1
    ORDER BY ordinal_position
"#;

const LIST_INDEXES: &str = r#"
    SELECT
        i.relname::text AS index_name,
        array_agg(a.attname::text ORDER BY array_position(ix.indkey, a.attnum)) AS column_names,
        ix.indisunique AS is_unique,
        ix.indisprimary AS is_primary
    FROM pg_index ix
    JOIN pg_class i ON i.oid = ix.indexrelid
    JOIN pg_class t ON t.oid = ix.indrelid
    JOIN pg_namespace n ON n.oid = t.relnamespace
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
    WHERE t.relname = $1
      AND n.nspname = current_schema()
    GROUP BY i.relname, ix.indisunique, ix.indisprimary
    ORDER BY ix.indisprimary DESC, i.relname
"#;

/// PostgreSQL database provider
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Create a new PostgreSQL provider
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn bind_value<'q>(
        query: Query<'q, Postgres, PgArguments>,
        value: &SqlValue,
    ) -> Query<'q, Postgres, PgArguments> {
        match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
        }
    }

    fn prepare(statement: &Statement) -> Query<'_, Postgres, PgArguments> {
        statement
            .bindings
            .iter()
            .fold(sqlx::query(&statement.sql), Self::bind_value)
    }

    /// Convert a PostgreSQL row to a JSON object
    fn row_to_json(row: &PgRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let column_name = column.name();
            let type_info = column.type_info();
            let type_name = type_info.name();
            let index = column.ordinal();

            let value: Value = match type_name {
                "BOOL" => {
                    let val: Option<bool> = row.try_get(index)?;
                    val.map(Value::Bool).unwrap_or(Value::Null)
                }
                "INT2" | "SMALLINT" | "SMALLSERIAL" => {
                    let val: Option<i16> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT4" | "INT" | "INTEGER" | "SERIAL" => {
                    let val: Option<i32> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT8" | "BIGINT" | "BIGSERIAL" => {
                    let val: Option<i64> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "FLOAT4" | "REAL" => {
                    let val: Option<f32> = row.try_get(index)?;
                    val.and_then(|v| serde_json::Number::from_f64(v as f64))
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "FLOAT8" | "DOUBLE PRECISION" => {
                    let val: Option<f64> = row.try_get(index)?;
                    val.and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "BPCHAR" => {
                    let val: Option<String> = row.try_get(index)?;
                    val.map(Value::String).unwrap_or(Value::Null)
                }
                "BYTEA" => {
                    let val: Option<Vec<u8>> = row.try_get(index)?;
                    val.map(|bytes| Value::String(format!("[BLOB: {} bytes]", bytes.len())))
                        .unwrap_or(Value::Null)
                }
                "DATE" => {
                    let val: Option<NaiveDate> = row.try_get(index)?;
                    val.map(|v| Value::String(v.format("%Y-%m-%d").to_string()))
                        .unwrap_or(Value::Null)
                }
                "TIMESTAMP" => {
                    let val: Option<NaiveDateTime> = row.try_get(index)?;
                    val.map(|v| Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string()))
                        .unwrap_or(Value::Null)
                }
                "TIMESTAMPTZ" => {
                    let val: Option<DateTime<Utc>> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_rfc3339()))
                        .unwrap_or(Value::Null)
                }
                "TIME" => {
                    let val: Option<NaiveTime> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null)
                }
                "NUMERIC" => numeric_value(row.try_get(index), column_name),
                "JSON" | "JSONB" => {
                    let val: Option<Value> = row.try_get(index)?;
                    val.unwrap_or(Value::Null)
                }
                "UUID" => {
                    let val: Option<Uuid> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null)
                }
                _ => {
                    // Fallback: try to get as string
                    let val: Option<String> = row.try_get::<Option<String>, _>(index).ok().flatten();
                    val.map(Value::String).unwrap_or(Value::Null)
                }
            };

            map.insert(column_name.to_string(), value);
        }

        Ok(map)
    }
}

#[async_trait]
impl DatabaseProvider for PostgresProvider {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    async fn database_name(&self) -> Result<Option<String>, DatabaseError> {
        let name: String = sqlx::query_scalar("SELECT current_database()::text")
            .fetch_one(&self.pool)
            .await?;
        Ok(Some(name))
    }

    async fn current_schema(&self) -> Result<Option<String>, DatabaseError> {
        let schema: Option<String> = sqlx::query_scalar("SELECT current_schema()::text")
            .fetch_one(&self.pool)
            .await?;
        Ok(schema)
    }

    async fn list_tables(&self) -> Result<Vec<CatalogTable>, DatabaseError> {
        let rows = sqlx::query(LIST_TABLES).fetch_all(&self.pool).await?;

        let tables = rows
            .iter()
            .map(|row| {
                Ok(CatalogTable {
                    name: row.try_get("table_name")?,
                    schema: row.try_get("table_schema")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(tables)
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>, DatabaseError> {
        let rows = sqlx::query(LIST_COLUMNS)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let columns = rows
            .iter()
            .map(|row| {
                let data_type: String = row.try_get("data_type")?;
                let udt_name: String = row.try_get("udt_name")?;
                let is_nullable: String = row.try_get("is_nullable")?;

                // Enums, domains and arrays report a generic data_type
                let raw_type = match data_type.as_str() {
                    "USER-DEFINED" | "ARRAY" => udt_name,
                    _ => data_type,
                };

                Ok(CatalogColumn {
                    name: row.try_get("column_name")?,
                    raw_type,
                    nullable: is_nullable == "YES",
                    default_value: row.try_get("column_default")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(columns)
    }

    async fn list_indexes(&self, table: &str) -> Result<Vec<CatalogIndex>, DatabaseError> {
        let rows = sqlx::query(LIST_INDEXES)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let indexes = rows
            .iter()
            .map(|row| {
                Ok(CatalogIndex {
                    name: row.try_get("index_name")?,
                    columns: row.try_get("column_names")?,
                    is_primary: row.try_get("is_primary")?,
                    unique: row.try_get("is_unique")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

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

/// NUMERIC values as exact decimal text; `NaN` fails to decode and becomes null
fn numeric_value(decoded: Result<Option<BigDecimal>, sqlx::Error>, column: &str) -> Value {
    match decoded {
        Ok(value) => value
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
        Err(error) => {
            warn!(column, %error, "Failed to decode NUMERIC value");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_numeric_value_keeps_exact_digits() {
        let price = BigDecimal::from_str("1999.99").unwrap();
        assert_eq!(
            numeric_value(Ok(Some(price)), "price"),
            Value::String("1999.99".to_string())
        );
        assert_eq!(numeric_value(Ok(None), "price"), Value::Null);
        assert_eq!(
            numeric_value(Err(sqlx::Error::ColumnNotFound("price".to_string())), "price"),
            Value::Null
        );
    }
}
