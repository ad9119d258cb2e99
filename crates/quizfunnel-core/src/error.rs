//! Core error types for quizfunnel-core.
//!
//! Most funnel operations never surface these: storage failures on the hot
//! path are logged and replaced by defaults. They propagate from explicit
//! administrative calls (opening a store, loading config, validating a quiz).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quizfunnel-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// TOML parse errors
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store cannot be reached at all
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Writing the value would exceed the store's capacity
    #[error("quota exceeded writing '{key}': needs {needed} bytes, limit {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    /// SQLite backend failure
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// The data directory could not be resolved or created
    #[error("data directory error: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A quiz needs at least one question
    #[error("quiz definition has no questions")]
    EmptyQuiz,

    /// Two questions share an id
    #[error("duplicate question id '{0}'")]
    DuplicateQuestion(String),

    /// Two options of the same question share an id
    #[error("duplicate option id '{option}' in question '{question}'")]
    DuplicateOption { question: String, option: String },

    /// A question without options cannot be answered
    #[error("question '{0}' has no options")]
    NoOptions(String),

    /// Checkout link URL does not parse
    #[error("invalid checkout url for '{id}': {message}")]
    InvalidCheckoutUrl { id: String, message: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
