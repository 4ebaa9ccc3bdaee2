//! Error types for Wordbadge core operations.
//!
//! This module defines well-structured error types using `thiserror` for
//! library-level errors, while higher-level code can use `anyhow` for
//! convenient error handling.
//!
//! Only initialization and rebuild failures ever cross the public
//! [`StoreManager`](crate::StoreManager) boundary, and they do so as
//! [`WordbadgeError::StorageInit`]. Missing word list sources and lookup
//! failures are logged and absorbed where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using WordbadgeError
pub type Result<T> = std::result::Result<T, WordbadgeError>;

/// Core error types for Wordbadge operations.
#[derive(Error, Debug)]
pub enum WordbadgeError {
    // === Store Errors ===
    /// The store directory or one of its files is missing
    #[error("store not found at {path}")]
    StoreNotFound { path: PathBuf },

    /// The store file exists but is corrupted or unreadable
    #[error("store is corrupted: {reason}")]
    StoreCorrupted { reason: String },

    /// The store file format version is newer than this build understands
    #[error("store format version mismatch: found {found}, expected {expected}")]
    StoreVersionMismatch { found: u32, expected: u32 },

    /// The store was built for a different schema version or edition
    #[error("store is stale: built as {found}, expected {expected}")]
    StoreStale { found: String, expected: String },

    /// The backing medium could not be created or opened
    #[error("storage initialization failed at {path}: {reason}")]
    StorageInit { path: PathBuf, reason: String },

    // === Ingestion Errors ===
    /// A configured word list resource is absent
    #[error("word list source missing: {resource}")]
    SourceMissing { resource: String },

    // === Lookup Errors ===
    /// A read-path failure; always degraded to "not found" by callers
    #[error("lookup failed: {reason}")]
    Lookup { reason: String },

    // === Configuration Errors ===
    /// Configuration or settings file parsing failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    // === Internal Errors ===
    /// Internal error that should not happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl WordbadgeError {
    /// Returns true if this error indicates the store needs to be rebuilt
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            WordbadgeError::StoreNotFound { .. }
                | WordbadgeError::StoreCorrupted { .. }
                | WordbadgeError::StoreVersionMismatch { .. }
                | WordbadgeError::StoreStale { .. }
        )
    }

    /// Create a storage initialization error
    pub fn storage_init(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        WordbadgeError::StorageInit {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a corruption error
    pub fn corrupted(reason: impl Into<String>) -> Self {
        WordbadgeError::StoreCorrupted {
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        WordbadgeError::Serialization(reason.into())
    }
}

impl From<bincode::Error> for WordbadgeError {
    fn from(err: bincode::Error) -> Self {
        WordbadgeError::Serialization(err.to_string())
    }
}
