//! Catalog repository for database operations
//!
//! Handles all database interactions for artists and tracks.
//!
//! The schema has no cascading delete: when the last track of an artist goes
//! away, the artist row is removed by [`SqliteCatalogStore::delete_track`]
//! in the same transaction. SQLite has no `SELECT ... FOR UPDATE`; writers
//! instead open with a no-op `UPDATE` on the artist row, which takes the
//! database write lock before anything is read, so two writers touching the
//! catalog run one after the other (the second waits up to the configured
//! busy timeout).

use async_trait::async_trait;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::entity::{ArtistId, Pagination, TrackGroups};
use super::repository_trait::CatalogStore;
use crate::error::{Error, Result};
use crate::storage::Database;

/// Resolve the artist and take the write lock in one statement
const LOCK_ARTIST_SQL: &str = "UPDATE artists SET name = name WHERE name = ? RETURNING id";

const SELECT_ROWS_SQL: &str = r#"
    SELECT a.name AS artist_name, t.title AS track_title
    FROM tracks t
    JOIN artists a ON t.artist_id = a.id
"#;

/// Repository for catalog database operations
#[derive(Debug, Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Create a new repository on an opened database
    pub fn new(db: &Database) -> Self {
        Self::from_pool(db.pool().clone())
    }

    /// Create a new repository with the given connection pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run the read query for one page of a criterion search
    async fn fetch_matching_page(
        conn: &mut SqliteConnection,
        by_author: bool,
        criterion: &str,
        pagination: Pagination,
    ) -> Result<Option<TrackGroups>> {
        let rows: Vec<(String, String)> = if by_author {
            let Some(artist_id) = artist_id_by_name(&mut *conn, criterion).await? else {
                return Ok(None);
            };
            sqlx::query_as(&format!(
                "{SELECT_ROWS_SQL} WHERE t.artist_id = ? ORDER BY t.id LIMIT ? OFFSET ?"
            ))
            .bind(artist_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&mut *conn)
            .await?
        } else {
            sqlx::query_as(&format!(
                "{SELECT_ROWS_SQL} WHERE t.title LIKE ? ESCAPE '\\' \
                 ORDER BY a.name, t.id LIMIT ? OFFSET ?"
            ))
            .bind(contains_pattern(criterion))
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&mut *conn)
            .await?
        };

        Ok(Some(TrackGroups::from_rows(rows)))
    }
}

/// Exact-match artist lookup on whatever connection or transaction the
/// caller is already holding
async fn artist_id_by_name<'e, E>(executor: E, artist_name: &str) -> Result<Option<ArtistId>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<(ArtistId,)> = sqlx::query_as("SELECT id FROM artists WHERE name = ?")
        .bind(artist_name)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|(id,)| id))
}

/// `LIKE` pattern matching `needle` anywhere, with wildcards taken literally
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn artist_exists(&self, artist_name: &str) -> Result<bool> {
        Ok(artist_id_by_name(&self.pool, artist_name).await?.is_some())
    }

    async fn track_exists(&self, artist_name: &str, title: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;

        let Some(artist_id) = artist_id_by_name(&mut *conn, artist_name).await? else {
            return Ok(false);
        };

        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM tracks WHERE title = ? AND artist_id = ?)",
        )
        .bind(title)
        .bind(artist_id)
        .fetch_one(&mut *conn)
        .await?;

        debug!(artist = artist_name, title, exists, "Checked track existence");
        Ok(exists)
    }

    async fn insert_track(&self, artist_name: &str, title: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(ArtistId,)> = sqlx::query_as(LOCK_ARTIST_SQL)
            .bind(artist_name)
            .fetch_optional(&mut *tx)
            .await?;

        let artist_id = match locked {
            Some((id,)) => id,
            None => {
                sqlx::query("INSERT INTO artists (name) VALUES (?)")
                    .bind(artist_name)
                    .execute(&mut *tx)
                    .await?;
                let id = artist_id_by_name(&mut *tx, artist_name).await?.ok_or_else(|| {
                    Error::Other(format!("artist '{}' vanished after insert", artist_name))
                })?;
                info!(artist = artist_name, artist_id = id, "Created artist");
                id
            }
        };

        let inserted = sqlx::query("INSERT INTO tracks (title, artist_id) VALUES (?, ?)")
            .bind(title)
            .bind(artist_id)
            .execute(&mut *tx)
            .await;

        if let Err(err) = inserted {
            // Dropping `tx` rolls back, including an artist created above
            if is_unique_violation(&err) {
                debug!(artist = artist_name, title, "Track already exists");
                return Err(Error::DuplicateTrack {
                    artist: artist_name.to_string(),
                    title: title.to_string(),
                });
            }
            warn!(artist = artist_name, title, error = %err, "Track insert rolled back");
            return Err(err.into());
        }

        tx.commit().await?;

        debug!(artist = artist_name, title, artist_id, "Inserted track");
        Ok(true)
    }

    async fn delete_track(&self, artist_name: &str, title: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result: Result<Option<bool>> = async {
            let locked: Option<(ArtistId,)> = sqlx::query_as(LOCK_ARTIST_SQL)
                .bind(artist_name)
                .fetch_optional(&mut *tx)
                .await?;
            let Some((artist_id,)) = locked else {
                return Ok(None);
            };

            let target: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM tracks WHERE title = ? AND artist_id = ?")
                    .bind(title)
                    .bind(artist_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let Some((track_id,)) = target else {
                return Ok(None);
            };

            sqlx::query("DELETE FROM tracks WHERE id = ?")
                .bind(track_id)
                .execute(&mut *tx)
                .await?;

            let (remaining,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM tracks WHERE artist_id = ?)")
                    .bind(artist_id)
                    .fetch_one(&mut *tx)
                    .await?;

            if !remaining {
                sqlx::query("DELETE FROM artists WHERE id = ?")
                    .bind(artist_id)
                    .execute(&mut *tx)
                    .await?;
            }

            Ok(Some(remaining))
        }
        .await;

        match result {
            Ok(Some(remaining)) => {
                tx.commit().await?;
                if remaining {
                    debug!(artist = artist_name, title, "Deleted track");
                } else {
                    info!(artist = artist_name, title, "Deleted last track and its artist");
                }
                Ok(true)
            }
            Ok(None) => {
                tx.rollback().await?;
                debug!(artist = artist_name, title, "Track to delete not found");
                Ok(false)
            }
            Err(err) => {
                warn!(artist = artist_name, title, error = %err, "Track delete rolled back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed delete also failed");
                }
                Err(err)
            }
        }
    }

    async fn search_tracks(
        &self,
        by_author: bool,
        criterion: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TrackGroups> {
        let pagination = Pagination::new(page, page_size)?;
        let mut conn = self.pool.acquire().await?;

        let groups = Self::fetch_matching_page(&mut conn, by_author, criterion, pagination)
            .await?
            .unwrap_or_default();

        debug!(
            by_author,
            criterion,
            page,
            page_size,
            artists = groups.len(),
            tracks = groups.track_count(),
            "Searched tracks"
        );
        Ok(groups)
    }

    async fn has_more_results(
        &self,
        by_author: bool,
        criterion: &str,
        page: u32,
        page_size: u32,
    ) -> Result<bool> {
        let pagination = Pagination::new(page, page_size)?;
        let mut conn = self.pool.acquire().await?;

        let (any,): (bool,) = if by_author {
            let Some(artist_id) = artist_id_by_name(&mut *conn, criterion).await? else {
                return Ok(false);
            };
            sqlx::query_as(
                "SELECT EXISTS (
                    SELECT 1 FROM tracks t
                    WHERE t.artist_id = ?
                    ORDER BY t.id LIMIT ? OFFSET ?
                )",
            )
            .bind(artist_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_one(&mut *conn)
            .await?
        } else {
            sqlx::query_as(
                "SELECT EXISTS (
                    SELECT 1 FROM tracks t
                    JOIN artists a ON t.artist_id = a.id
                    WHERE t.title LIKE ? ESCAPE '\\'
                    ORDER BY a.name, t.id LIMIT ? OFFSET ?
                )",
            )
            .bind(contains_pattern(criterion))
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_one(&mut *conn)
            .await?
        };

        Ok(any)
    }

    async fn search(&self, page: u32, page_size: u32) -> Result<TrackGroups> {
        let pagination = Pagination::new(page, page_size)?;

        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "{SELECT_ROWS_SQL} ORDER BY a.name, t.id LIMIT ? OFFSET ?"
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let groups = TrackGroups::from_rows(rows);
        debug!(page, page_size, artists = groups.len(), "Browsed catalog");
        Ok(groups)
    }

    async fn count_artists(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM artists")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn count_tracks(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
