//! Paired connection pools and the store handles built on them.
//!
//! [`ReportsDb`] owns one privileged pool and one read-only pool and hands
//! out borrowed store handles, each already routed to the right pool and
//! carrying the configured query budget. Handles are cheap; build one per
//! call site.

use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::report_query::ReportQueries;
use crate::report_store::ReportStore;
use crate::retention::RetentionSweeper;
use crate::seen::SeenIds;

/// Both connection pools for the report store.
#[derive(Clone)]
pub struct ReportsDb {
    service: PostgresPool,
    reader: PostgresPool,
    query_timeout: Duration,
}

impl ReportsDb {
    /// Open both pools.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if either pool cannot connect. A privileged pool
    /// that did connect is closed again before returning.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let service = PostgresPool::connect(&config.service).await?;
        let reader = match PostgresPool::connect(&config.reader).await {
            Ok(pool) => pool,
            Err(e) => {
                service.close().await;
                return Err(e);
            }
        };

        tracing::info!(
            query_timeout_secs = config.query_timeout.as_secs(),
            "Report store pools ready"
        );

        Ok(Self {
            service,
            reader,
            query_timeout: config.query_timeout,
        })
    }

    /// The privileged pool.
    pub const fn service(&self) -> &PostgresPool {
        &self.service
    }

    /// The read-only pool.
    pub const fn reader(&self) -> &PostgresPool {
        &self.reader
    }

    /// Dedup resolver on the privileged pool.
    pub const fn seen_ids(&self) -> SeenIds<'_> {
        SeenIds::new(self.service.pool()).with_timeout(self.query_timeout)
    }

    /// Bulk store on the privileged pool.
    pub const fn store(&self) -> ReportStore<'_> {
        ReportStore::new(self.service.pool()).with_timeout(self.query_timeout)
    }

    /// Query engine on the read-only pool.
    pub const fn queries(&self) -> ReportQueries<'_> {
        ReportQueries::new(self.reader.pool()).with_timeout(self.query_timeout)
    }

    /// Retention sweeper on the privileged pool.
    pub const fn retention(&self) -> RetentionSweeper<'_> {
        RetentionSweeper::new(self.service.pool()).with_timeout(self.query_timeout)
    }

    /// Apply pending schema migrations through the privileged pool.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if any migration fails.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        self.service.run_migrations().await
    }

    /// Close both pools.
    pub async fn close(&self) {
        self.reader.close().await;
        self.service.close().await;
    }
}
