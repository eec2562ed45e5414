//! Storage layer - SQLite
//!
//! Provides database management and migrations for tunecat.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//!
//! # Usage
//!
//! ```ignore
//! use tunecat_core::storage::{Database, DatabaseConfig};
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Or open the catalog file
//! let db = Database::new(DatabaseConfig::with_path("catalog.db")).await?;
//! ```

pub mod database;
pub mod migrations;

// Re-export commonly used types
pub use database::{
    DEFAULT_BUSY_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS, Database, DatabaseConfig,
    default_database_path,
};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
