//! Bulk store: upsert batches of reports keyed on `(source, source_id)`.
//!
//! A batch is first written as one multi-row upsert inside a single
//! transaction. If that fails for any reason the store degrades to one
//! upsert per report so that a single bad row cannot sink the rest of the
//! batch. The outcome of every row is reported back in [`StoreOutcome`];
//! this path never returns an error.
//!
//! Reports are serialized through [`Report::to_record`] before binding, so
//! rows without a `scraped_at` are stamped with the client's clock and
//! timestamps cross the wire as RFC 3339 text.

use std::future::Future;
use std::time::Duration;

use ourcolumbus_types::{Report, ReportKey, ReportRecord};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::DbError;
use crate::postgres::{DEFAULT_QUERY_TIMEOUT_SECS, bounded};

/// Default number of rows per multi-row `INSERT` statement.
///
/// Each row binds 14 parameters; `PostgreSQL` caps a statement at 65,535.
const DEFAULT_CHUNK_SIZE: usize = 500;

/// Column list of every upsert, in bind order.
const INSERT_HEAD: &str = "INSERT INTO reports (source, source_id, source_url, content, author, \
     image_urls, location_text, latitude, longitude, location_confidence, matched_keywords, \
     created_at, scraped_at, is_verified) ";

/// Conflict clause: the incoming row overwrites every stored field.
const UPSERT_TAIL: &str = " ON CONFLICT (source, source_id) DO UPDATE SET \
     source_url = EXCLUDED.source_url, \
     content = EXCLUDED.content, \
     author = EXCLUDED.author, \
     image_urls = EXCLUDED.image_urls, \
     location_text = EXCLUDED.location_text, \
     latitude = EXCLUDED.latitude, \
     longitude = EXCLUDED.longitude, \
     location_confidence = EXCLUDED.location_confidence, \
     matched_keywords = EXCLUDED.matched_keywords, \
     created_at = EXCLUDED.created_at, \
     scraped_at = EXCLUDED.scraped_at, \
     is_verified = EXCLUDED.is_verified";

/// A report that could not be stored on the per-row path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    /// Composite key of the rejected report.
    pub key: ReportKey,
    /// Backend error message.
    pub reason: String,
}

/// Result of [`ReportStore::store_reports`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOutcome {
    /// Rows the backend reported as inserted or updated.
    pub stored: u64,
    /// Rows skipped on the per-row path, in input order.
    pub failures: Vec<StoreFailure>,
}

impl StoreOutcome {
    /// True when no row was skipped.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_success(&mut self, rows: u64) {
        self.stored = self.stored.saturating_add(rows);
    }

    fn record_failure(&mut self, key: ReportKey, reason: String) {
        self.failures.push(StoreFailure { key, reason });
    }
}

/// Writes to the `reports` table on the privileged pool.
pub struct ReportStore<'a> {
    pool: &'a PgPool,
    chunk_size: usize,
    timeout: Duration,
}

impl<'a> ReportStore<'a> {
    /// Create a new report store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Set the number of rows per multi-row statement. Zero is treated as one.
    #[must_use]
    pub const fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = if size == 0 { 1 } else { size };
        self
    }

    /// Set the per-call time budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upsert a batch of reports.
    ///
    /// Empty input returns an empty outcome without touching the backend.
    /// Otherwise the whole batch is attempted as one transaction; on any
    /// failure each report is retried on its own and failures are collected
    /// instead of raised. Callers detect partial success by comparing
    /// [`StoreOutcome::stored`] with the input length.
    pub async fn store_reports(&self, reports: &[Report]) -> StoreOutcome {
        if reports.is_empty() {
            return StoreOutcome::default();
        }

        let records: Vec<ReportRecord> = reports.iter().map(Report::to_record).collect();

        match bounded(self.timeout, "store_reports", self.upsert_batch(&records)).await {
            Ok(stored) => {
                tracing::info!(stored, batch = reports.len(), "Stored reports in database");
                return StoreOutcome {
                    stored,
                    failures: Vec::new(),
                };
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    batch = reports.len(),
                    "Batch upsert failed, falling back to per-row upserts"
                );
            }
        }

        let outcome = store_each(reports, &records, |record| {
            bounded(self.timeout, "store_report", self.upsert_one(record))
        })
        .await;

        tracing::info!(
            stored = outcome.stored,
            failed = outcome.failures.len(),
            batch = reports.len(),
            "Stored reports row by row"
        );
        outcome
    }

    /// One transaction, one multi-row statement per chunk.
    async fn upsert_batch(&self, records: &[ReportRecord]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut affected: u64 = 0;

        for chunk in records.chunks(self.chunk_size) {
            let result = upsert_query(chunk).build().execute(&mut *tx).await?;
            affected = affected.saturating_add(result.rows_affected());
        }

        tx.commit().await?;
        Ok(affected)
    }

    async fn upsert_one(&self, record: &ReportRecord) -> Result<u64, DbError> {
        let result = upsert_query(core::slice::from_ref(record))
            .build()
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Build `INSERT ... VALUES (...), (...) ON CONFLICT ... DO UPDATE`.
fn upsert_query(records: &[ReportRecord]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(INSERT_HEAD);
    qb.push_values(records, |mut row, record| {
        row.push_bind(record.source.clone())
            .push_unseparated("::report_source")
            .push_bind(record.source_id.clone())
            .push_bind(record.source_url.clone())
            .push_bind(record.content.clone())
            .push_bind(record.author.clone())
            .push_bind(record.image_urls.clone())
            .push_bind(record.location_text.clone())
            .push_bind(record.latitude)
            .push_bind(record.longitude)
            .push_bind(record.location_confidence.clone())
            .push_unseparated("::location_confidence")
            .push_bind(record.matched_keywords.clone())
            .push_bind(record.created_at.clone())
            .push_unseparated("::timestamptz")
            .push_bind(record.scraped_at.clone())
            .push_unseparated("::timestamptz")
            .push_bind(record.is_verified);
    });
    qb.push(UPSERT_TAIL);
    qb
}

/// Per-row fallback: run `upsert` for each record in order, counting
/// successes and collecting failures.
async fn store_each<'r, F, Fut>(
    reports: &[Report],
    records: &'r [ReportRecord],
    mut upsert: F,
) -> StoreOutcome
where
    F: FnMut(&'r ReportRecord) -> Fut,
    Fut: Future<Output = Result<u64, DbError>>,
{
    let mut outcome = StoreOutcome::default();

    for (report, record) in reports.iter().zip(records) {
        match upsert(record).await {
            Ok(rows) => outcome.record_success(rows),
            Err(e) => {
                tracing::warn!(
                    source = report.source.as_str(),
                    source_id = report.source_id.as_str(),
                    error = %e,
                    "Failed to store report"
                );
                outcome.record_failure(report.key(), e.to_string());
            }
        }
    }

    outcome
}
