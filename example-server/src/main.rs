use axum::{extract::State, http::StatusCode, routing::get, Router};
use axum_db_viewer::DbViewerLayer;
use clap::Parser;
use sqlx::sqlite::SqlitePool;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod database;

use config::Config;

#[derive(Clone)]
struct ApplicationState {
    pool: SqlitePool,
}

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer().with_target(true)).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    let viewer_config = config.viewer_config()?;

    if let Some(directory) = database::local_directory(&config.database_url) {
        std::fs::create_dir_all(directory)?;
    }
    let pool = SqlitePool::connect(&config.database_url).await?;

    // Run database setup and seed sample data
    database::setup(&pool).await?;

    let application_state = ApplicationState { pool: pool.clone() };
    let viewer = DbViewerLayer::sqlite(config.base_path.as_str(), pool, viewer_config)?;

    // The viewer router is stateless, so it is merged after with_state()
    let app = Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .with_state(application_state)
        .merge(viewer.into_router());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;

    info!(
        address = %config.bind,
        base_path = %config.base_path,
        "Starting example server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Dashboard at http://{}{}/api/dashboard", config.bind, config.base_path);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn root_handler() -> &'static str {
    "Welcome to the axum-db-viewer example server"
}

async fn health_handler(
    State(state): State<ApplicationState>,
) -> Result<(StatusCode, &'static str), StatusCode> {
    sqlx::query("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok((StatusCode::OK, "Server is healthy"))
}
