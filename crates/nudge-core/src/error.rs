//! Core error types for nudge-core.
//!
//! This module defines the error hierarchy using thiserror. Notification
//! failures are local to one nudge type and are reported, never fatal.

use std::path::PathBuf;
use thiserror::Error;

use crate::nudge::NudgeType;
use crate::scheduler::NotificationHandle;

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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Ledger store errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger storage failed: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Corrupt ledger value under '{key}': {message}")]
    Corrupt { key: String, message: String },

    #[error("Ledger lock poisoned")]
    Poisoned,
}

/// Failures reported by the notification primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// OS notification permission is revoked. The type stays unscheduled.
    #[error("Notification permission denied while arming {nudge}")]
    PermissionDenied { nudge: NudgeType },

    /// Transient OS failure. Retried on the next natural trigger only.
    #[error("Failed to arm {nudge}: {message}")]
    ArmFailed { nudge: NudgeType, message: String },

    /// The OS no longer knows this handle. Treated as already cancelled.
    #[error("Stale notification handle: {0}")]
    StaleHandle(NotificationHandle),

    /// Cancel failed for a handle that may still be live.
    #[error("Failed to cancel {handle}: {message}")]
    CancelFailed {
        handle: NotificationHandle,
        message: String,
    },
}

/// Failure of a single type's reconciliation.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Facts unavailable: {0}")]
    Facts(String),
}

impl ReconcileError {
    /// `true` for permission problems the user has to fix in OS settings.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            ReconcileError::Notification(NotificationError::PermissionDenied { .. })
        )
    }
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Storage(err.into())
    }
}
