//! Core error types for avolve-core.
//!
//! This module defines the error hierarchy using thiserror. The streak bonus
//! calculator never fails; everything around it (storage, configuration,
//! ledger rules, onboarding gating) reports through these types.

use std::path::PathBuf;
use thiserror::Error;

use crate::onboarding::OnboardingStep;
use crate::rewards::TokenType;

/// Core error type for avolve-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Ledger rule violations
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Onboarding gating errors
    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored row could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: String, message: String },
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not locate the data directory
    #[error("Could not determine data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Amount must be strictly positive
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// Empty field
    #[error("'{0}' must not be empty")]
    Empty(String),

    /// Field too long
    #[error("'{field}' exceeds {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Ledger rule violations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Spend exceeds the cached balance
    #[error("Insufficient {token} balance for {user_id}: have {available}, need {requested}")]
    InsufficientBalance {
        user_id: String,
        token: TokenType,
        available: i64,
        requested: i64,
    },

    /// Sender and recipient are the same member
    #[error("Members cannot recognize themselves")]
    SelfRecognition,

    /// Sender exhausted today's recognitions
    #[error("Daily recognition limit of {limit} reached")]
    RecognitionLimit { limit: u32 },

    /// Balance arithmetic overflowed
    #[error("Balance overflow for {user_id} ({token})")]
    Overflow { user_id: String, token: TokenType },
}

/// Onboarding gating errors.
#[derive(Error, Debug)]
pub enum OnboardingError {
    /// Step attempted before its predecessors
    #[error("Cannot complete '{step}' before '{missing}'")]
    OutOfOrder {
        step: OnboardingStep,
        missing: OnboardingStep,
    },

    /// Unrecognized step identifier
    #[error("Unknown onboarding step: {0}")]
    UnknownStep(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
