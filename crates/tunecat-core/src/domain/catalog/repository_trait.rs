//! Repository trait for catalog persistence
//!
//! This module defines the trait for catalog storage operations.
//! The trait abstracts over different storage backends (SQLite, test fakes).

use async_trait::async_trait;

use crate::error::Result;

use super::entity::TrackGroups;

/// Catalog storage contract
///
/// Every call is a potential suspension point: it may wait on the pool or on
/// a lock held by a concurrent writer. "Not found" and "already there" are
/// boolean outcomes; `Err` is reserved for infrastructural failures, which
/// leave the catalog unchanged.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // ========== Existence ==========

    /// Whether an artist row with exactly this name exists
    async fn artist_exists(&self, artist_name: &str) -> Result<bool>;

    /// Whether `title` exists under `artist_name`; false when the artist is unknown
    async fn track_exists(&self, artist_name: &str, title: &str) -> Result<bool>;

    // ========== Writes ==========

    /// Insert a track, creating the artist first when needed
    ///
    /// Returns `Ok(true)` on success. A pair that already exists fails with
    /// `Error::DuplicateTrack`.
    async fn insert_track(&self, artist_name: &str, title: &str) -> Result<bool>;

    /// Delete a track and, if it was the artist's last one, the artist
    ///
    /// Returns `Ok(false)` when the artist or the track does not exist.
    async fn delete_track(&self, artist_name: &str, title: &str) -> Result<bool>;

    // ========== Search ==========

    /// Tracks of one artist (`by_author`) or tracks whose title contains
    /// `criterion`, one page at a time
    async fn search_tracks(
        &self,
        by_author: bool,
        criterion: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TrackGroups>;

    /// Whether the page requested from `search_tracks` holds any row
    async fn has_more_results(
        &self,
        by_author: bool,
        criterion: &str,
        page: u32,
        page_size: u32,
    ) -> Result<bool>;

    /// Browse the whole catalog ordered by artist name
    async fn search(&self, page: u32, page_size: u32) -> Result<TrackGroups>;

    // ========== Stats ==========

    async fn count_artists(&self) -> Result<u64>;

    async fn count_tracks(&self) -> Result<u64>;
}
