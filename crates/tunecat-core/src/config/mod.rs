//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::domain::catalog::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::storage::{
    DEFAULT_BUSY_TIMEOUT_SECS, DEFAULT_MAX_CONNECTIONS, DatabaseConfig, default_database_path,
};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "TUNECAT_CONFIG_DIR";

/// Environment variable overriding the database file
pub const DATABASE_ENV: &str = "TUNECAT_DATABASE";

const KEYS: &[&str] = &[
    "database.path",
    "database.max_connections",
    "database.busy_timeout_secs",
    "search.default_page_size",
];

/// Tunecat configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Catalog file; the platform data directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_page_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DatabaseSettings {
    /// Database file to open: `TUNECAT_DATABASE`, then the configured path,
    /// then the platform default
    pub fn resolved_path(&self) -> PathBuf {
        env::var_os(DATABASE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.path.clone())
            .unwrap_or_else(default_database_path)
    }

    /// Build the immutable database configuration used at startup
    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig::with_path(self.resolved_path())
            .max_connections(self.max_connections)
            .busy_timeout_secs(self.busy_timeout_secs)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("tunecat")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }
        if self.search.default_page_size == 0 || self.search.default_page_size > MAX_PAGE_SIZE {
            return Err(anyhow!(
                "search.default_page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            ));
        }
        Ok(())
    }

    /// All settable keys
    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(match &self.database.path {
                Some(path) => path.display().to_string(),
                None => format!("(default: {})", default_database_path().display()),
            }),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),
            "database.busy_timeout_secs" => Ok(self.database.busy_timeout_secs.to_string()),
            "search.default_page_size" => Ok(self.search.default_page_size.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                let value = value.trim();
                self.database.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "database.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.database.max_connections = max;
            }
            "database.busy_timeout_secs" => {
                self.database.busy_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid busy_timeout_secs value: {}", value))?;
            }
            "search.default_page_size" => {
                let size: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid default_page_size value: {}", value))?;
                if size == 0 || size > MAX_PAGE_SIZE {
                    return Err(anyhow!("Page size must be between 1 and {}", MAX_PAGE_SIZE));
                }
                self.search.default_page_size = size;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `tunecat config list` to see available keys.",
        key
    )
}
