//! Dedup resolver: which `(source, source_id)` keys are already stored.
//!
//! The seen-set is an advisory pre-filter for ingesters. Two ingestion
//! runs can both miss a key and both try to store it; the upsert in
//! [`crate::report_store`] absorbs that race, so no duplicate row is
//! ever created.

use std::collections::HashSet;
use std::time::Duration;

use ourcolumbus_types::{Report, Source};
use sqlx::PgPool;

use crate::error::DbError;
use crate::postgres::{DEFAULT_QUERY_TIMEOUT_SECS, bounded};

/// Lookups of stored composite keys on the privileged pool.
pub struct SeenIds<'a> {
    pool: &'a PgPool,
    timeout: Duration,
}

impl<'a> SeenIds<'a> {
    /// Create a resolver bound to a connection pool.
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

    /// Return every stored key as `"source:source_id"`, optionally
    /// restricted to one source.
    ///
    /// The whole key set is loaded into memory.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails or
    /// [`DbError::Timeout`] if it exceeds the budget.
    pub async fn get_seen_ids(&self, source: Option<Source>) -> Result<HashSet<String>, DbError> {
        let rows = bounded(self.timeout, "get_seen_ids", async {
            let rows: Vec<(String, String)> = match source {
                Some(source) => {
                    sqlx::query_as(
                        r"SELECT source::TEXT, source_id FROM reports
                          WHERE source = $1::report_source",
                    )
                    .bind(source.as_str())
                    .fetch_all(self.pool)
                    .await?
                }
                None => {
                    sqlx::query_as("SELECT source::TEXT, source_id FROM reports")
                        .fetch_all(self.pool)
                        .await?
                }
            };
            Ok(rows)
        })
        .await?;

        let seen: HashSet<String> = rows
            .into_iter()
            .map(|(source, source_id)| format!("{source}:{source_id}"))
            .collect();

        tracing::debug!(
            count = seen.len(),
            source = source.map(Source::as_str),
            "Loaded seen report keys"
        );
        Ok(seen)
    }
}

/// Drop candidates that are already stored or repeat an earlier
/// candidate's key.
///
/// The first occurrence of a key within `candidates` wins. Order of the
/// survivors is preserved.
pub fn filter_unseen(candidates: Vec<Report>, seen: &HashSet<String>) -> Vec<Report> {
    let mut batch_keys: HashSet<String> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|report| {
            let key = report.key().to_string();
            !seen.contains(&key) && batch_keys.insert(key)
        })
        .collect()
}
