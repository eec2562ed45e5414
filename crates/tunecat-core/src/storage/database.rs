//! SQLite database operations
//!
//! Provides connection pool management and database initialization for tunecat.

use crate::error::{Error, Result};
use crate::storage::migrations;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default maximum connections in the pool
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time a connection waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 30;

const MEMORY_PATH: &str = ":memory:";

/// Database configuration options
///
/// Built once at startup and handed to [`Database::new`]; the database keeps
/// its own copy and never mutates it.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// How long a connection waits for a write lock held by another one
    pub busy_timeout_secs: u64,
    /// Whether to run migrations automatically
    pub auto_migrate: bool,
    /// Journal mode (default: WAL for better concurrency)
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode (default: NORMAL for balance of safety/performance)
    pub synchronous: SqliteSynchronous,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
            auto_migrate: true,
            journal_mode: SqliteJournalMode::Wal,
            synchronous: SqliteSynchronous::Normal,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database config with the specified path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a config for an in-memory database (useful for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            max_connections: 1, // In-memory requires single connection
            ..Default::default()
        }
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the busy timeout in seconds
    pub fn busy_timeout_secs(mut self, secs: u64) -> Self {
        self.busy_timeout_secs = secs;
        self
    }

    /// Disable automatic migrations
    pub fn no_migrate(mut self) -> Self {
        self.auto_migrate = false;
        self
    }

    /// Whether this config points at a private in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

/// Get the default database path
pub fn default_database_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("tunecat").join("catalog.db")
    } else {
        PathBuf::from("catalog.db")
    }
}

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    config: DatabaseConfig,
}

impl Database {
    /// Create a new database connection with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(Error::ConfigError("max_connections must be at least 1".to_string()));
        }

        let in_memory = config.is_in_memory();

        // Ensure the directory exists
        if !in_memory {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let connection_str = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", config.path.display())
        };

        let connect_options = SqliteConnectOptions::from_str(&connection_str)?
            .journal_mode(config.journal_mode)
            .synchronous(config.synchronous)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if in_memory {
            // The database lives and dies with its only connection
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(connect_options).await?;

        tracing::info!(
            path = %config.path.display(),
            max_connections = config.max_connections,
            "Opened catalog database"
        );

        let db = Self {
            pool,
            config: config.clone(),
        };

        // Run migrations if auto_migrate is enabled
        if config.auto_migrate {
            db.migrate().await?;
        }

        Ok(db)
    }

    /// Create an in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the database configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}
