//! Core error types for clockout-core.
//!
//! Nothing in the shift core is fatal: most of these errors are logged and
//! degraded to a safe default by the caller. They exist so that the
//! degradation happens in one visible place instead of being swallowed
//! silently at the source.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::Phase;

/// Core error type for clockout-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An action that is not legal from the current phase
    #[error("Cannot {action} while {from:?}")]
    InvalidTransition { from: Phase, action: &'static str },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// In-memory store mutex was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// No custom reminder with this id
    #[error("No custom reminder with id '{0}'")]
    ReminderNotFound(String),

    /// Custom sound file rejected
    #[error("Custom sound rejected: {0}")]
    SoundRejected(String),
}

/// Validation errors raised before any boundary is computed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A clock field that does not parse as HH:MM
    #[error("Invalid time for '{field}': {value:?} (expected HH:MM)")]
    InvalidTime { field: String, value: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Delivery channel failures. Always handled locally by the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The host has no such capability
    #[error("channel not supported")]
    Unsupported,

    /// The user refused (or has not yet granted) permission
    #[error("permission not granted")]
    PermissionDenied,

    /// The channel exists but the delivery failed
    #[error("delivery failed: {0}")]
    Failed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
