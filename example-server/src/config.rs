//! Command line configuration for the example server.

use axum_db_viewer::ViewerConfig;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/example.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_BASE_PATH: &str = "/db-viewer";

#[derive(Debug, Parser)]
#[command(
    name = "example-server",
    about = "Example Axum server with an embedded read-only database viewer",
    version
)]
pub struct Config {
    /// SQLite connection string; the demo schema is created and seeded on startup.
    #[arg(long, default_value = DEFAULT_DATABASE_URL, env = "DATABASE_URL")]
    pub database_url: String,

    /// JSON file with viewer settings (table lists, page sizes, dashboard charts).
    #[arg(long, value_name = "FILE", env = "DB_VIEWER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS, env = "BIND_ADDRESS")]
    pub bind: String,

    /// URL path the viewer is mounted under.
    #[arg(long, default_value = DEFAULT_BASE_PATH)]
    pub base_path: String,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Viewer settings from `--config`, or the demo defaults
    pub fn viewer_config(&self) -> Result<ViewerConfig, Box<dyn std::error::Error>> {
        match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&contents)?)
            }
            None => Ok(crate::database::demo_viewer_config()),
        }
    }
}
