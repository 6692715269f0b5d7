//! Core error types for parentday-core.
//!
//! Validation errors are user-facing and abort a command before anything is
//! written. Store failures are surfaced as a generic "try again" condition;
//! nothing is retried or buffered.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for parentday-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Teacher login errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Validation errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Reset removed some records but not all of them.
    #[error("Reset incomplete: {failed} of {total} deletions failed, please retry")]
    ResetIncomplete { failed: usize, total: usize },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// True for errors caused by the request itself rather than the store.
    pub fn is_user_error(&self) -> bool {
        matches!(self, CoreError::Validation(_) | CoreError::Auth(_))
    }
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

    /// A stored row could not be decoded
    #[error("Corrupt record in '{table}': {message}")]
    CorruptRecord { table: &'static str, message: String },

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

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Teacher console login errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Wrong password")]
    WrongPassword,

    #[error("Teacher password is not configured (set teacher.password)")]
    NotConfigured,
}

/// Validation errors. Messages are shown to the operator as-is.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required form field is empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Student already holds a waiting or current ticket
    #[error("Student \"{student}\" is already in the queue (ticket {number})")]
    DuplicateStudent { student: String, number: i64 },

    /// This device has already submitted or skipped the intake form
    #[error("This device has already registered")]
    AlreadyRegistered,

    /// Student is not on the configured class roster
    #[error("Student \"{0}\" is not on the class roster")]
    UnknownStudent(String),

    /// Booking has not opened yet
    #[error("Booking is not open yet")]
    BookingClosed,

    /// No ticket matches the lookup
    #[error("No ticket found for {0}; please take a number first")]
    TicketNotFound(String),

    /// Operation needs an interview in progress
    #[error("No interview in progress")]
    NoCurrentInterview,

    /// Advance with nothing to finish and nobody waiting
    #[error("Queue is empty")]
    QueueEmpty,

    /// Priority bump target is not eligible
    #[error("Ticket {number} cannot be moved up: {reason}")]
    CannotBump { number: i64, reason: &'static str },

    /// Malformed date or time in the settings form
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    /// Nothing to export
    #[error("No {0} to export")]
    EmptyExport(&'static str),

    /// Reset attempted without the explicit confirmation steps
    #[error("Reset must be confirmed twice")]
    ResetNotConfirmed,
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_user_errors() {
        let err: CoreError = ValidationError::QueueEmpty.into();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "Queue is empty");
    }

    #[test]
    fn store_errors_are_not_user_errors() {
        let err: CoreError = DatabaseError::Locked.into();
        assert!(!err.is_user_error());
    }

    #[test]
    fn duplicate_message_names_student_and_number() {
        let err = ValidationError::DuplicateStudent {
            student: "Ada".into(),
            number: 3004,
        };
        assert_eq!(
            err.to_string(),
            "Student \"Ada\" is already in the queue (ticket 3004)"
        );
    }
}
