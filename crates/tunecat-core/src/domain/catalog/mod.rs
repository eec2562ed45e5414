//! Catalog domain module
//!
//! Artists and their tracks.
//!
//! # Architecture
//!
//! - **Entities**: `Artist`, `Track`, `Criterion`, `Pagination`, `TrackGroups`
//! - **Repository trait**: `CatalogStore`, the storage contract
//! - **Repository**: `SqliteCatalogStore`, transactional SQLite implementation
//! - **Service**: `CatalogService`, duplicate rejection and caller-facing names
//!
//! # Example
//!
//! ```ignore
//! use tunecat_core::domain::catalog::{CatalogService, Criterion};
//! use tunecat_core::storage::Database;
//!
//! let db = Database::in_memory().await?;
//! let service = CatalogService::with_database(&db);
//!
//! service.add_track("Radiohead", "Kid A").await?;
//! let groups = service.search_by(Criterion::Artist, "Radiohead", 1, 10).await?;
//!
//! // Removing the last track also removes the artist
//! service.delete_track("Radiohead", "Kid A").await?;
//! ```

pub mod entity;
pub mod repository;
pub mod repository_trait;
pub mod service;

// Re-export main types
pub use entity::{
    Artist, ArtistId, Criterion, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Pagination, Track,
    TrackGroups, TrackId,
};
pub use repository::SqliteCatalogStore;
pub use repository_trait::CatalogStore;
pub use service::CatalogService;
