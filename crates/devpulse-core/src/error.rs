//! Core error types for devpulse-core.
//!
//! This module defines the error hierarchy using thiserror. Each engine
//! concern has its own error enum; `EngineError` is the top-level type
//! the host layer works with.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for devpulse-core.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Streak state machine errors
    #[error("Streak error: {0}")]
    Streak(#[from] StreakError),

    /// XP ledger errors
    #[error("XP error: {0}")]
    Xp(#[from] XpError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Streak state machine errors.
#[derive(Error, Debug)]
pub enum StreakError {
    /// Freeze consumption attempted with an empty balance.
    /// Surfaced to the caller as a user-visible failure, never retried.
    #[error("No freeze days available")]
    NoFreezeAvailable,
}

/// XP ledger errors.
#[derive(Error, Debug)]
pub enum XpError {
    /// Award amounts must be strictly positive; the ledger is never decremented.
    #[error("Invalid XP amount: {0} (must be > 0)")]
    InvalidAmount(i64),
}

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("Query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Optimistic version check failed: another writer updated the row.
    /// The caller should re-read state and retry the evaluation once.
    #[error("Concurrent update detected for user '{user}' (expected version {expected})")]
    ConflictingUpdate { user: String, expected: i64 },

    /// A stored column could not be decoded back into an engine value
    #[error("Corrupt column '{column}': {message}")]
    CorruptColumn { column: String, message: String },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for EngineError
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
