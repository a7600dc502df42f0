//! Error types for trafficlog.
//!
//! Every failure falls into one of the categories reported by [`Error::kind`]:
//! bad input, an unknown dataset id, a persistence failure, or a broken
//! configuration. None of them are retried by the library.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for trafficlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// Required input was missing or malformed.
    #[error("invalid dataset: {message}")]
    Validation {
        /// Human-readable description of the problem.
        message: String,
    },

    /// No dataset carries the requested id.
    #[error("dataset not found: {id}")]
    NotFound {
        /// The id that did not resolve.
        id: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// The dataset file could not be read.
    #[error("failed to read dataset file {path}: {source}")]
    StoreRead {
        /// Path to the dataset file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The dataset file could not be written.
    #[error("failed to write dataset file {path}: {source}")]
    StoreWrite {
        /// Path that was being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The dataset file exists but does not hold a valid collection.
    #[error("dataset file {path} is corrupt: {source}")]
    StoreDecode {
        /// Path to the dataset file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for trafficlog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by callers that map failures
/// onto their own responses (exit codes, status codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed input.
    Validation,
    /// The requested id does not exist.
    NotFound,
    /// Persistence read or write failure.
    Storage,
    /// Configuration could not be loaded or is invalid.
    Configuration,
    /// A bug.
    Internal,
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error for the given id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::StoreRead { .. }
            | Self::StoreWrite { .. }
            | Self::StoreDecode { .. }
            | Self::Io(_)
            | Self::DirectoryCreate { .. }
            | Self::Json(_) => ErrorKind::Storage,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorKind::Configuration,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this error means the dataset does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error came from the persistence layer.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}
