//! Catalog service
//!
//! Business rules on top of a [`CatalogStore`]: duplicate inserts are
//! rejected, and store results are handed back under caller-facing names.

use std::sync::Arc;

use tracing::debug;

use super::entity::{Criterion, TrackGroups};
use super::repository::SqliteCatalogStore;
use super::repository_trait::CatalogStore;
use crate::error::{Error, Result};
use crate::storage::Database;

/// Service for adding, removing and finding tracks
///
/// Holds nothing but the shared store handle, so clones are cheap and can be
/// moved into concurrent tasks.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Create a new catalog service over any store implementation
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Create a service backed by the SQLite store on `db`
    pub fn with_database(db: &Database) -> Self {
        Self::new(Arc::new(SqliteCatalogStore::new(db)))
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Delete a track; `false` when the artist or track does not exist
    pub async fn delete_track(&self, artist_name: &str, title: &str) -> Result<bool> {
        self.store.delete_track(artist_name, title).await
    }

    /// Add a track unless the pair is already in the catalog
    ///
    /// Returns `Ok(false)` for a duplicate. The existence check only saves a
    /// write in the common case; a concurrent insert of the same pair is
    /// caught by the storage constraint and reported the same way.
    pub async fn add_track(&self, artist_name: &str, title: &str) -> Result<bool> {
        if artist_name.trim().is_empty() {
            return Err(Error::InvalidInput("artist name must not be empty".to_string()));
        }
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("track title must not be empty".to_string()));
        }

        if self.store.track_exists(artist_name, title).await? {
            debug!(artist = artist_name, title, "Rejected duplicate track");
            return Ok(false);
        }

        match self.store.insert_track(artist_name, title).await {
            Ok(inserted) => Ok(inserted),
            Err(Error::DuplicateTrack { .. }) => {
                debug!(artist = artist_name, title, "Lost insert race for duplicate track");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Search by exact artist name (`by_author`) or by title substring
    pub async fn search_track(
        &self,
        by_author: bool,
        criterion: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TrackGroups> {
        self.store
            .search_tracks(by_author, criterion, page, page_size)
            .await
    }

    /// Same as [`search_track`](Self::search_track) with a typed selector
    pub async fn search_by(
        &self,
        criterion: Criterion,
        value: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TrackGroups> {
        self.search_track(criterion.by_author(), value, page, page_size)
            .await
    }

    /// Whether the given search page holds any row
    pub async fn has_more_results(
        &self,
        criterion: Criterion,
        value: &str,
        page: u32,
        page_size: u32,
    ) -> Result<bool> {
        self.store
            .has_more_results(criterion.by_author(), value, page, page_size)
            .await
    }

    /// Browse the catalog one page at a time
    pub async fn show_tracks(&self, page: u32, page_size: u32) -> Result<TrackGroups> {
        self.store.search(page, page_size).await
    }

    /// Number of artists and tracks currently stored
    pub async fn stats(&self) -> Result<(u64, u64)> {
        let artists = self.store.count_artists().await?;
        let tracks = self.store.count_tracks().await?;
        Ok((artists, tracks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory store that records which operations were called
    #[derive(Default)]
    struct RecordingStore {
        tracks: Mutex<Vec<(String, String)>>,
        calls: Mutex<Vec<&'static str>>,
        /// Report every pair as absent and reject the insert, like a
        /// concurrent writer that got there first
        race_on_insert: bool,
    }

    impl RecordingStore {
        fn with_track(artist: &str, title: &str) -> Self {
            let store = Self::default();
            store
                .tracks
                .lock()
                .unwrap()
                .push((artist.to_string(), title.to_string()));
            store
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn contains(&self, artist: &str, title: &str) -> bool {
            self.tracks
                .lock()
                .unwrap()
                .iter()
                .any(|(a, t)| a == artist && t == title)
        }

        fn grouped(&self) -> TrackGroups {
            TrackGroups::from_rows(self.tracks.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl CatalogStore for RecordingStore {
        async fn artist_exists(&self, artist_name: &str) -> Result<bool> {
            self.record("artist_exists");
            Ok(self
                .tracks
                .lock()
                .unwrap()
                .iter()
                .any(|(a, _)| a == artist_name))
        }

        async fn track_exists(&self, artist_name: &str, title: &str) -> Result<bool> {
            self.record("track_exists");
            Ok(!self.race_on_insert && self.contains(artist_name, title))
        }

        async fn insert_track(&self, artist_name: &str, title: &str) -> Result<bool> {
            self.record("insert_track");
            if self.race_on_insert {
                return Err(Error::DuplicateTrack {
                    artist: artist_name.to_string(),
                    title: title.to_string(),
                });
            }
            self.tracks
                .lock()
                .unwrap()
                .push((artist_name.to_string(), title.to_string()));
            Ok(true)
        }

        async fn delete_track(&self, artist_name: &str, title: &str) -> Result<bool> {
            self.record("delete_track");
            let mut tracks = self.tracks.lock().unwrap();
            let before = tracks.len();
            tracks.retain(|(a, t)| !(a == artist_name && t == title));
            Ok(tracks.len() < before)
        }

        async fn search_tracks(
            &self,
            by_author: bool,
            _criterion: &str,
            _page: u32,
            _page_size: u32,
        ) -> Result<TrackGroups> {
            self.record(if by_author { "search_tracks:author" } else { "search_tracks:title" });
            Ok(self.grouped())
        }

        async fn has_more_results(
            &self,
            _by_author: bool,
            _criterion: &str,
            _page: u32,
            _page_size: u32,
        ) -> Result<bool> {
            self.record("has_more_results");
            Ok(false)
        }

        async fn search(&self, _page: u32, _page_size: u32) -> Result<TrackGroups> {
            self.record("search");
            Ok(self.grouped())
        }

        async fn count_artists(&self) -> Result<u64> {
            Ok(self.grouped().len() as u64)
        }

        async fn count_tracks(&self) -> Result<u64> {
            Ok(self.tracks.lock().unwrap().len() as u64)
        }
    }

    #[tokio::test]
    async fn test_add_existing_track_skips_insert() {
        let store = Arc::new(RecordingStore::with_track("Radiohead", "Kid A"));
        let service = CatalogService::new(store.clone());

        let added = service.add_track("Radiohead", "Kid A").await.unwrap();

        assert!(!added);
        assert_eq!(store.calls(), vec!["track_exists"]);
    }

    #[tokio::test]
    async fn test_add_new_track_inserts() {
        let store = Arc::new(RecordingStore::default());
        let service = CatalogService::new(store.clone());

        assert!(service.add_track("Radiohead", "Kid A").await.unwrap());
        assert_eq!(store.calls(), vec!["track_exists", "insert_track"]);
        assert!(store.contains("Radiohead", "Kid A"));
    }

    #[tokio::test]
    async fn test_add_maps_constraint_violation_to_false() {
        let store = Arc::new(RecordingStore {
            race_on_insert: true,
            ..Default::default()
        });
        let service = CatalogService::new(store.clone());

        assert!(!service.add_track("Radiohead", "Kid A").await.unwrap());
        assert_eq!(store.calls(), vec!["track_exists", "insert_track"]);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_input() {
        let store = Arc::new(RecordingStore::default());
        let service = CatalogService::new(store.clone());

        assert!(matches!(
            service.add_track("  ", "Kid A").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.add_track("Radiohead", "").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_passthroughs_reach_store() {
        let store = Arc::new(RecordingStore::with_track("Radiohead", "Kid A"));
        let service = CatalogService::new(store.clone());

        assert!(service.delete_track("Radiohead", "Kid A").await.unwrap());
        assert!(!service.delete_track("Radiohead", "Kid A").await.unwrap());
        service.search_track(true, "Radiohead", 1, 10).await.unwrap();
        service
            .search_by(Criterion::Track, "kid", 1, 10)
            .await
            .unwrap();
        service
            .has_more_results(Criterion::Artist, "Radiohead", 2, 10)
            .await
            .unwrap();
        service.show_tracks(1, 10).await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                "delete_track",
                "delete_track",
                "search_tracks:author",
                "search_tracks:title",
                "has_more_results",
                "search",
            ]
        );
    }

    #[tokio::test]
    async fn test_stats() {
        let store = Arc::new(RecordingStore::with_track("Radiohead", "Kid A"));
        let service = CatalogService::new(store);
        service.add_track("Radiohead", "Airbag").await.unwrap();
        service.add_track("Blur", "Song 2").await.unwrap();

        assert_eq!(service.stats().await.unwrap(), (2, 3));
    }

    #[tokio::test]
    async fn test_service_over_sqlite() {
        let db = Database::in_memory().await.unwrap();
        let service = CatalogService::with_database(&db);

        assert!(service.add_track("Radiohead", "Kid A").await.unwrap());
        assert!(!service.add_track("Radiohead", "Kid A").await.unwrap());

        let groups = service.show_tracks(1, 10).await.unwrap();
        assert_eq!(groups.get("Radiohead").unwrap(), &["Kid A".to_string()]);
    }
}
