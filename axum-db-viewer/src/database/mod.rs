//! Database abstraction layer
//!
//! This module provides a database-agnostic interface for catalog discovery
//! and read-only statement execution.

pub mod dialect;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-export the main trait
pub use dialect::Driver;
pub use traits::{DatabaseError, DatabaseProvider, SqlValue, Statement};
