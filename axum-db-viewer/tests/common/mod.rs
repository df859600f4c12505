//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_db_viewer::database::Statement;
use axum_db_viewer::schema::{CatalogColumn, CatalogIndex, CatalogTable};
use axum_db_viewer::{DatabaseError, DatabaseProvider, Driver, Row, SqliteProvider};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Single-connection in-memory database, so every query sees the same data
pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database")
}

async fn execute(pool: &SqlitePool, sql: &str) {
    sqlx::query(sql)
        .execute(pool)
        .await
        .unwrap_or_else(|error| panic!("Fixture statement failed: {sql}: {error}"));
}

/// Create and fill the shop fixture
///
/// - `users` (3 rows), `products` (5 rows) with declared primary keys
/// - `orders` (8 rows) without a primary key but with an `id` column
/// - `migrations` (1 row), hidden by the default exclusion list
pub async fn seeded_pool() -> SqlitePool {
    let pool = memory_pool().await;

    execute(
        &pool,
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            bio TEXT,
            settings JSON,
            is_active BOOLEAN NOT NULL DEFAULT 1,
            created_at DATETIME
        )",
    )
    .await;
    execute(
        &pool,
        "INSERT INTO users (id, name, email, bio, settings, is_active, created_at) VALUES
            (1, 'Alice Johnson', 'alice@example.com', 'Loves databases', '{\"theme\": \"dark\"}', 1, '2024-03-01 09:00:00'),
            (2, 'Bob Smith', 'bob@example.com', NULL, '{\"theme\": \"light\"}', 0, '2024-03-02 12:30:00'),
            (3, 'Charlie Brown', 'charlie@example.com', NULL, NULL, 1, '2024-03-20 18:45:00')",
    )
    .await;

    execute(
        &pool,
        "CREATE TABLE products (
            id INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            price DECIMAL(10, 2) NOT NULL,
            stock INTEGER NOT NULL DEFAULT 0
        )",
    )
    .await;
    execute(
        &pool,
        "INSERT INTO products (id, name, price, stock) VALUES
            (1, 'MacBook Pro', 1999.99, 4),
            (2, 'Mac Mini', 699.00, 10),
            (3, 'Magic Mouse', 79.00, 25),
            (4, 'Desk_Lamp 100%', 25.50, 40),
            (5, 'Office Chair', 249.00, 7)",
    )
    .await;

    execute(
        &pool,
        "CREATE TABLE orders (
            id INTEGER NOT NULL,
            product_id INTEGER NOT NULL,
            total DECIMAL(10, 2) NOT NULL,
            created_at DATETIME
        )",
    )
    .await;
    execute(
        &pool,
        "INSERT INTO orders (id, product_id, total, created_at) VALUES
            (1, 1, 1999.99, '2024-03-01 10:00:00'),
            (2, 2, 699.00, '2024-03-01 15:20:00'),
            (3, 3, 79.00, '2024-03-02 08:00:00'),
            (4, 3, 158.00, '2024-03-05 09:10:00'),
            (5, 4, 25.50, '2024-03-05 11:00:00'),
            (6, 5, 249.00, '2024-03-05 23:59:59'),
            (7, 1, 1999.99, '2024-04-01 00:00:00'),
            (8, 2, 699.00, NULL)",
    )
    .await;

    execute(
        &pool,
        "CREATE TABLE migrations (id INTEGER PRIMARY KEY, migration TEXT NOT NULL, batch INTEGER NOT NULL)",
    )
    .await;
    execute(
        &pool,
        "INSERT INTO migrations (migration, batch) VALUES ('create_users_table', 1)",
    )
    .await;

    pool
}

/// Run a raw statement against the fixture, e.g. to change the schema mid-test
pub async fn run(pool: &SqlitePool, sql: &str) {
    execute(pool, sql).await;
}

/// SQLite provider that counts catalog lookups
pub struct CountingProvider {
    inner: SqliteProvider,
    catalog_calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            inner: SqliteProvider::new(pool),
            catalog_calls: AtomicUsize::new(0),
        }
    }

    pub fn catalog_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DatabaseProvider for CountingProvider {
    fn driver(&self) -> Driver {
        self.inner.driver()
    }

    async fn database_name(&self) -> Result<Option<String>, DatabaseError> {
        self.inner.database_name().await
    }

    async fn current_schema(&self) -> Result<Option<String>, DatabaseError> {
        self.inner.current_schema().await
    }

    async fn list_tables(&self) -> Result<Vec<CatalogTable>, DatabaseError> {
        self.record();
        self.inner.list_tables().await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<CatalogColumn>, DatabaseError> {
        self.record();
        self.inner.list_columns(table).await
    }

    async fn list_indexes(&self, table: &str) -> Result<Vec<CatalogIndex>, DatabaseError> {
        self.record();
        self.inner.list_indexes(table).await
    }

    async fn fetch_count(&self, statement: &Statement) -> Result<u64, DatabaseError> {
        self.inner.fetch_count(statement).await
    }

    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        self.inner.fetch_rows(statement).await
    }
}
