use axum_db_viewer::{ChartDefinition, ViewerConfig};
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use tracing::info;

/// Viewer settings used when no config file is given
pub fn demo_viewer_config() -> ViewerConfig {
    ViewerConfig {
        dashboard_charts: vec![
            ChartDefinition::new("orders", "created_at")
                .with_label("Orders")
                .with_color("#10b981"),
            ChartDefinition::new("users", "created_at").with_label("Sign-ups"),
        ],
        ..ViewerConfig::default()
    }
}

/// Parent directory of a file-backed SQLite URL, so it can be created up front
pub fn local_directory(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|parent| !parent.as_os_str().is_empty())
}

pub async fn setup(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            is_active BOOLEAN DEFAULT true,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(255) NOT NULL,
            price DECIMAL(10, 2) NOT NULL,
            stock INTEGER DEFAULT 0,
            category VARCHAR(100),
            attributes JSON
        )
        "#,
    )
    .execute(pool)
    .await?;

    // No declared primary key; the viewer falls back to the `id` column
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER NOT NULL,
            user_id INTEGER REFERENCES users(id),
            product_id INTEGER REFERENCES products(id),
            quantity INTEGER NOT NULL,
            total DECIMAL(10, 2) NOT NULL,
            status TEXT DEFAULT 'pending',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Hidden by the default exclusion list
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            migration TEXT NOT NULL,
            batch INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    seed_sample_data(pool).await?;

    Ok(())
}

async fn seed_sample_data(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count.0 > 0 {
        return Ok(());
    }

    let first_names = [
        "Alice", "Bob", "Charlie", "Diana", "Evan", "Fiona", "George", "Hannah", "Isaac",
        "Julia", "Kevin", "Laura", "Michael", "Nancy", "Oscar", "Patricia",
    ];
    let last_names = [
        "Johnson", "Smith", "Brown", "Prince", "Davis", "Wilson", "Taylor", "Anderson",
        "Thomas", "Jackson", "White", "Harris", "Martin",
    ];

    for index in 0..120 {
        let first = first_names[index % first_names.len()];
        let last = last_names[index % last_names.len()];
        let email = format!(
            "{}.{}{}@example.com",
            first.to_lowercase(),
            last.to_lowercase(),
            index
        );
        sqlx::query(
            "INSERT INTO users (name, email, is_active, created_at) VALUES (?, ?, ?, datetime('now', ?))",
        )
        .bind(format!("{} {}", first, last))
        .bind(email)
        .bind(index % 5 != 0)
        .bind(format!("-{} days", index % 28))
        .execute(pool)
        .await?;
    }

    let categories = ["Electronics", "Furniture", "Stationery", "Kitchen", "Garden"];
    let products = [
        "MacBook Pro", "Mac Mini", "Magic Mouse", "Standing Desk", "Office Chair",
        "Notebook", "Fountain Pen", "Chef Knife", "Garden Hose", "Monitor Arm",
    ];

    for (index, name) in products.iter().enumerate() {
        let price = 9.99 + (index as f64 * 210.0);
        let attributes = format!(r#"{{"sku": "SKU-{:04}", "featured": {}}}"#, index, index % 3 == 0);

        sqlx::query(
            "INSERT INTO products (name, price, stock, category, attributes) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(*name)
        .bind(price)
        .bind(((index * 7 + 5) % 50) as i32)
        .bind(categories[index % categories.len()])
        .bind(attributes)
        .execute(pool)
        .await?;
    }

    let statuses = ["pending", "processing", "shipped", "completed", "cancelled"];

    for index in 0..600 {
        let product_id = (index % products.len()) + 1;
        let quantity = (index % 4) + 1;
        let total = quantity as f64 * (9.99 + (product_id - 1) as f64 * 210.0);

        sqlx::query(
            "INSERT INTO orders (id, user_id, product_id, quantity, total, status, created_at) VALUES (?, ?, ?, ?, ?, ?, datetime('now', ?, ?))",
        )
        .bind((index + 1) as i64)
        .bind(((index % 120) + 1) as i64)
        .bind(product_id as i64)
        .bind(quantity as i64)
        .bind(total)
        .bind(statuses[index % statuses.len()])
        .bind(format!("-{} days", index % 30))
        .bind(format!("-{} hours", index % 24))
        .execute(pool)
        .await?;
    }

    sqlx::query("INSERT INTO migrations (migration, batch) VALUES ('create_demo_tables', 1)")
        .execute(pool)
        .await?;

    info!(users = 120, products = products.len(), orders = 600, "Seeded sample data");
    Ok(())
}
