//! Retention sweeper: bulk deletion of reports past their age limit.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::DbError;
use crate::postgres::{DEFAULT_QUERY_TIMEOUT_SECS, bounded};
use crate::window::days_before;

/// Age limit applied when a caller does not pick one.
pub const DEFAULT_RETENTION_DAYS: u32 = 90;

/// Deletes old reports on the privileged pool.
pub struct RetentionSweeper<'a> {
    pool: &'a PgPool,
    timeout: Duration,
}

impl<'a> RetentionSweeper<'a> {
    /// Create a sweeper bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Set the per-call time budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delete every report whose `scraped_at` is strictly older than
    /// `days` days before now, returning how many rows went.
    ///
    /// `days = 0` removes everything scraped before this instant. Ages too
    /// large to represent match nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] / [`DbError::Timeout`] on failure. The
    /// delete is a single statement, so a failure removes nothing.
    pub async fn delete_old_reports(&self, days: u32) -> Result<u64, DbError> {
        let cutoff = days_before(Utc::now(), days);
        let deleted = self.delete_before(cutoff).await?;
        tracing::info!(deleted, days, %cutoff, "Deleted old reports");
        Ok(deleted)
    }

    /// Delete every report scraped strictly before `cutoff`.
    ///
    /// # Errors
    ///
    /// Same as [`RetentionSweeper::delete_old_reports`].
    pub async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
        bounded(self.timeout, "delete_old_reports", async {
            let result = sqlx::query("DELETE FROM reports WHERE scraped_at < $1")
                .bind(cutoff)
                .execute(self.pool)
                .await?;
            Ok(result.rows_affected())
        })
        .await
    }
}
