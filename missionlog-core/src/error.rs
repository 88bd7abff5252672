//! Error types for missionlog-core
//!
//! Every failure carries a stable [`ErrorKind`] so transport layers can map it
//! without matching on messages:
//! - `not_found`: task/entry missing or owned by someone else
//! - `invalid_input`: bad date, title, description, state or order
//! - `conflict`: uniqueness violation
//! - `forbidden`: batch references an item the caller does not own
//! - `storage_unavailable`: SQLite failure, not locally recoverable

use thiserror::Error;

/// Main error type for missionlog operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Stable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Forbidden,
    StorageUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Conflict => "conflict",
            Self::Forbidden => "forbidden",
            Self::StorageUnavailable => "storage_unavailable",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Storage(_) | Error::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub fn task_not_found() -> Self {
        Error::NotFound("Task".to_string())
    }
}

/// Result type alias for missionlog operations
pub type Result<T> = std::result::Result<T, Error>;
