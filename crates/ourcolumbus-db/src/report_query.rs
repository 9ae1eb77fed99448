//! Query engine: filtered listing, counts, and radius lookups.
//!
//! Every method runs on the read-only pool and propagates backend
//! failures to the caller unchanged; there is no retry or suppression on
//! the read path. A row that fails validation aborts the whole read with
//! [`DbError::Record`] rather than being silently dropped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ourcolumbus_types::{Report, ReportId, Source};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::DbError;
use crate::postgres::{DEFAULT_QUERY_TIMEOUT_SECS, bounded};
use crate::row::{REPORT_COLUMNS, ReportRow, into_reports};
use crate::window::hours_before;

/// Page size used when a caller does not pick one.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Maximum rows returned by a radius lookup when a caller does not pick one.
pub const DEFAULT_RADIUS_LIMIT: u32 = 100;

/// Meters in one statute mile, as used for radius conversion.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Convert a radius in miles to meters.
pub const fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Filter and page selection for [`ReportQueries::get_reports`].
///
/// Filters combine conjunctively. `limit = None` returns every match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    /// Maximum rows to return; `None` for no limit.
    pub limit: Option<u32>,
    /// Rows to skip before the window starts.
    pub offset: u32,
    /// Only reports from this source.
    pub source: Option<Source>,
    /// Only reports scraped within the last `hours` hours.
    pub hours: Option<u32>,
    /// Only reports flagged as verified.
    pub verified_only: bool,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            limit: Some(DEFAULT_PAGE_LIMIT),
            offset: 0,
            source: None,
            hours: None,
            verified_only: false,
        }
    }
}

impl ReportQuery {
    /// A query matching every report, with no limit.
    pub const fn all() -> Self {
        Self {
            limit: None,
            offset: 0,
            source: None,
            hours: None,
            verified_only: false,
        }
    }

    /// Set the page size; `None` removes the limit.
    #[must_use]
    pub const fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Set the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Restrict to one source.
    #[must_use]
    pub const fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    /// Restrict to reports scraped within the last `hours` hours.
    ///
    /// Zero is applied literally and matches only rows stamped at or after
    /// `now`. Leave the filter unset to match every age.
    #[must_use]
    pub const fn within_hours(mut self, hours: u32) -> Self {
        self.hours = Some(hours);
        self
    }

    /// Restrict to verified reports.
    #[must_use]
    pub const fn verified_only(mut self) -> Self {
        self.verified_only = true;
        self
    }

    /// Append the `WHERE` conditions shared by listing and counting.
    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        qb.push(" WHERE TRUE");
        if let Some(source) = self.source {
            qb.push(" AND source = ");
            qb.push_bind(source.as_str());
            qb.push("::report_source");
        }
        if let Some(hours) = self.hours {
            qb.push(" AND scraped_at >= ");
            qb.push_bind(hours_before(now, hours));
        }
        if self.verified_only {
            qb.push(" AND is_verified = TRUE");
        }
    }

    fn list_sql(&self, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {REPORT_COLUMNS} FROM reports"));
        self.push_filters(&mut qb, now);
        qb.push(" ORDER BY scraped_at DESC, id DESC");
        if let Some(limit) = self.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }
        if self.offset > 0 {
            qb.push(" OFFSET ");
            qb.push_bind(i64::from(self.offset));
        }
        qb
    }

    fn count_sql(&self, now: DateTime<Utc>) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM reports");
        self.push_filters(&mut qb, now);
        qb
    }
}

/// Read-side operations on the read-only pool.
pub struct ReportQueries<'a> {
    pool: &'a PgPool,
    timeout: Duration,
}

impl<'a> ReportQueries<'a> {
    /// Create a query engine bound to a connection pool.
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

    /// List reports matching `query`, most recently scraped first.
    ///
    /// Returns the half-open window `[offset, offset + limit)` of the
    /// ordered matches. No match yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] / [`DbError::Timeout`] on backend
    /// failure and [`DbError::Record`] if any returned row is malformed.
    pub async fn get_reports(&self, query: &ReportQuery) -> Result<Vec<Report>, DbError> {
        let rows: Vec<ReportRow> = bounded(self.timeout, "get_reports", async {
            let mut qb = query.list_sql(Utc::now());
            let rows = qb.build_query_as::<ReportRow>().fetch_all(self.pool).await?;
            Ok(rows)
        })
        .await?;

        let reports = into_reports(rows)?;
        tracing::debug!(count = reports.len(), ?query, "Fetched reports from database");
        Ok(reports)
    }

    /// Fetch a single report by its backend id.
    ///
    /// # Errors
    ///
    /// Same as [`ReportQueries::get_reports`].
    pub async fn get_report(&self, id: ReportId) -> Result<Option<Report>, DbError> {
        let row: Option<ReportRow> = bounded(self.timeout, "get_report", async {
            let row = sqlx::query_as::<_, ReportRow>(&format!(
                "SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"
            ))
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?;
            Ok(row)
        })
        .await?;

        Ok(row.map(ReportRow::into_report).transpose()?)
    }

    /// Reports within `radius_miles` of a center point.
    ///
    /// The radius is converted to meters and handed to the backend's
    /// `get_reports_in_radius` procedure, which performs the distance test
    /// and caps the result at `limit` rows. Reports without coordinates
    /// never match. Result order is whatever the procedure returns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidArgument`] for a negative or non-finite
    /// radius or coordinate, without contacting the backend. Otherwise as
    /// [`ReportQueries::get_reports`].
    pub async fn get_reports_in_radius(
        &self,
        center_lat: f64,
        center_lng: f64,
        radius_miles: f64,
        limit: u32,
    ) -> Result<Vec<Report>, DbError> {
        validate_radius_args(center_lat, center_lng, radius_miles)?;
        let radius_meters = miles_to_meters(radius_miles);
        let max_results = i32::try_from(limit).unwrap_or(i32::MAX);

        let rows: Vec<ReportRow> = bounded(self.timeout, "get_reports_in_radius", async {
            let rows = sqlx::query_as::<_, ReportRow>(&format!(
                "SELECT {REPORT_COLUMNS} FROM get_reports_in_radius($1, $2, $3, $4)"
            ))
            .bind(center_lat)
            .bind(center_lng)
            .bind(radius_meters)
            .bind(max_results)
            .fetch_all(self.pool)
            .await?;
            Ok(rows)
        })
        .await?;

        let reports = into_reports(rows)?;
        tracing::debug!(
            count = reports.len(),
            center_lat,
            center_lng,
            radius_meters,
            "Fetched reports in radius"
        );
        Ok(reports)
    }

    /// Exact number of reports, optionally for one source.
    ///
    /// Equals the length of [`ReportQueries::get_reports`] for the same
    /// source with no limit.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] / [`DbError::Timeout`] on failure.
    pub async fn get_report_count(&self, source: Option<Source>) -> Result<u64, DbError> {
        let query = ReportQuery {
            source,
            ..ReportQuery::all()
        };
        self.count_reports(&query).await
    }

    /// Exact number of reports matching the filters of `query`.
    ///
    /// `limit` and `offset` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] / [`DbError::Timeout`] on failure.
    pub async fn count_reports(&self, query: &ReportQuery) -> Result<u64, DbError> {
        let count: i64 = bounded(self.timeout, "count_reports", async {
            let mut qb = query.count_sql(Utc::now());
            let count = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
            Ok(count)
        })
        .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn validate_radius_args(center_lat: f64, center_lng: f64, radius_miles: f64) -> Result<(), DbError> {
    if !center_lat.is_finite() || !(-90.0..=90.0).contains(&center_lat) {
        return Err(DbError::InvalidArgument(format!(
            "center latitude out of range: {center_lat}"
        )));
    }
    if !center_lng.is_finite() || !(-180.0..=180.0).contains(&center_lng) {
        return Err(DbError::InvalidArgument(format!(
            "center longitude out of range: {center_lng}"
        )));
    }
    if !radius_miles.is_finite() || radius_miles < 0.0 {
        return Err(DbError::InvalidArgument(format!(
            "radius must be a non-negative number of miles: {radius_miles}"
        )));
    }
    Ok(())
}
