//! Tunecat Core Library
//!
//! This crate provides the core functionality for tunecat, a music catalog
//! of artists and their tracks:
//! - Storage (SQLite pool bootstrap and schema migrations)
//! - Catalog domain (store contract, SQLite store, service rules)
//! - Configuration with file persistence
//! - Error taxonomy

pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::catalog::{
        CatalogService, CatalogStore, Criterion, SqliteCatalogStore, TrackGroups,
    };
    pub use crate::error::{Error, Result};
    pub use crate::storage::{Database, DatabaseConfig};
}
