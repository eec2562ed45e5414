//! Database migrations
//!
//! This module manages SQLite schema migrations for tunecat.
//! Migrations are versioned and applied automatically on database connection.

use crate::error::{Error, Result};
use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Artists and tracks
///
/// Tracks carry no ON DELETE CASCADE; the catalog store removes an artist
/// together with its last track.
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS artists (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS tracks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        artist_id INTEGER NOT NULL REFERENCES artists(id),
        UNIQUE (title, artist_id)
    );

    CREATE INDEX IF NOT EXISTS idx_tracks_artist_id ON tracks(artist_id);
"#;

/// Ordered list of (version, description, sql)
const MIGRATIONS: &[(i32, &str, &str)] = &[(1, "Artists and tracks", MIGRATION_V1)];

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(row.0.unwrap_or(0))
}

/// Run all pending migrations
///
/// Each migration and its bookkeeping row are committed together.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version > CURRENT_VERSION {
        return Err(Error::ConfigError(format!(
            "database schema version {} is newer than supported {}",
            current_version, CURRENT_VERSION
        )));
    }

    if current_version == CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    for &(version, description, sql) in MIGRATIONS {
        if version <= current_version {
            continue;
        }

        tracing::info!(version = version, "Applying migration: {}", description);
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check if the database needs migrations
pub async fn needs_migration(pool: &SqlitePool) -> Result<bool> {
    let current_version = get_current_version(pool).await?;
    Ok(current_version < CURRENT_VERSION)
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
        assert!(!needs_migration(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        for table in ["artists", "tracks"] {
            let result: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|_| panic!("Table {} should exist", table));
            assert_eq!(result.0, 0, "Table {} should be empty", table);
        }
    }

    #[tokio::test]
    async fn test_track_pair_is_unique() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        sqlx::query("INSERT INTO artists (name) VALUES ('Radiohead')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO tracks (title, artist_id) VALUES ('Kid A', 1)")
            .execute(&pool)
            .await
            .unwrap();

        let err = sqlx::query("INSERT INTO tracks (title, artist_id) VALUES ('Kid A', 1)")
            .execute(&pool)
            .await
            .expect_err("duplicate pair must be rejected");
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_newer_schema_is_rejected() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();
        sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
            .bind(CURRENT_VERSION + 1)
            .execute(&pool)
            .await
            .unwrap();

        let err = run_migrations(&pool).await.expect_err("newer schema must fail");
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
