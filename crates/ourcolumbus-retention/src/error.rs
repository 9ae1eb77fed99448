//! Error types for the retention job.

use ourcolumbus_db::DbError;

/// Errors that stop the retention job.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    /// The report store failed (configuration, connection, migration or
    /// a sweep in run-once mode).
    #[error(transparent)]
    Db(#[from] DbError),

    /// Job configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}
