//! Persistence layer for geotagged `OurColumbus` community reports.
//!
//! Ingesters push batches of scraped posts through the bulk store, which
//! upserts on the natural key `(source, source_id)`. Readers list, count and
//! radius-search stored reports over a separate read-only credential. A
//! retention sweep bounds table growth.
//!
//! # Architecture
//!
//! ```text
//! Ingester
//!     |
//!     +-- get_seen_ids ------> SeenIds          (privileged pool)
//!     +-- store_reports -----> ReportStore      (privileged pool)
//!                                 |-- batch upsert, one transaction
//!                                 +-- per-row fallback on failure
//!
//! Reader
//!     |
//!     +-- get_reports / get_report_count / get_reports_in_radius
//!                          -> ReportQueries    (read-only pool)
//!
//! Retention job
//!     +-- delete_old_reports -> RetentionSweeper (privileged pool)
//! ```
//!
//! # Modules
//!
//! - [`clients`] -- Both pools and the handles routed to them
//! - [`config`] -- Environment configuration for both credentials
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`seen`] -- Dedup resolver
//! - [`report_store`] -- Batch upsert with per-row fallback
//! - [`report_query`] -- Filtered listing, counts, radius search
//! - [`retention`] -- Age-based deletion
//! - [`window`] -- Cutoff arithmetic for time windows
//! - [`error`] -- Shared error types

pub mod clients;
pub mod config;
pub mod error;
pub mod postgres;
pub mod report_query;
pub mod report_store;
pub mod retention;
pub mod row;
pub mod seen;
pub mod window;

// Re-export primary types for convenience.
pub use clients::ReportsDb;
pub use config::DatabaseConfig;
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use report_query::{
    DEFAULT_PAGE_LIMIT, DEFAULT_RADIUS_LIMIT, METERS_PER_MILE, ReportQueries, ReportQuery,
    miles_to_meters,
};
pub use report_store::{ReportStore, StoreFailure, StoreOutcome};
pub use retention::{DEFAULT_RETENTION_DAYS, RetentionSweeper};
pub use row::ReportRow;
pub use seen::{SeenIds, filter_unseen};
