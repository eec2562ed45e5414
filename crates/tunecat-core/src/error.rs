//! Error types for Tunecat

use thiserror::Error;

/// Result type alias using Tunecat's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Tunecat error types with helpful messages and suggestions
///
/// Logical outcomes of the catalog (a missing track, a duplicate insert seen
/// by the pre-check) are reported as booleans by the service, not as errors.
/// What remains here is either infrastructural or a caller mistake.
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors (E001-E099)
    #[error("Track '{title}' by '{artist}' already exists.")]
    DuplicateTrack { artist: String, title: String },

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateTrack { .. } => "E001",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::DuplicateTrack { artist, .. } => {
                Some(format!("tunecat search --by artist \"{}\"", artist))
            }
            Self::DatabaseError(_) => Some(
                "Check the database path with `tunecat config get database.path`".to_string(),
            ),
            Self::ConfigError(_) => Some("tunecat config list".to_string()),
            _ => None,
        }
    }

    /// Whether this is an infrastructural failure of the store
    ///
    /// Store errors leave the catalog in its pre-operation state; callers
    /// decide about retries.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let duplicate = Error::DuplicateTrack {
            artist: "Radiohead".to_string(),
            title: "Kid A".to_string(),
        };
        assert_eq!(duplicate.code(), "E001");
        assert_eq!(Error::DatabaseError(sqlx::Error::RowNotFound).code(), "E400");
        assert_eq!(Error::ConfigError("bad".to_string()).code(), "E600");
        assert_eq!(Error::InvalidInput("bad".to_string()).code(), "E800");
        assert_eq!(Error::Other("x".to_string()).code(), "E9999");
    }

    #[test]
    fn test_duplicate_message_and_suggestion() {
        let err = Error::DuplicateTrack {
            artist: "Radiohead".to_string(),
            title: "Kid A".to_string(),
        };
        assert_eq!(err.to_string(), "Track 'Kid A' by 'Radiohead' already exists.");
        assert!(err.suggestion().unwrap().contains("Radiohead"));
        assert!(!err.is_store_error());
    }

    #[test]
    fn test_store_errors_are_distinguishable() {
        assert!(Error::DatabaseError(sqlx::Error::PoolTimedOut).is_store_error());
        assert!(!Error::InvalidInput("page".to_string()).is_store_error());
    }
}
