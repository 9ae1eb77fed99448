//! Error types for the data layer.
//!
//! All fallible operations return [`DbError`], which wraps the underlying
//! [`sqlx`] errors and the record validation errors from
//! `ourcolumbus-types` with context about what failed.

use std::time::Duration;

use ourcolumbus_types::RecordError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into a report.
    #[error("invalid report row: {0}")]
    Record(#[from] RecordError),

    /// A backend call did not finish within its time budget.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that was cut off.
        operation: &'static str,
        /// The budget that elapsed.
        after: Duration,
    },

    /// A caller-supplied argument was rejected before reaching the backend.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
