//! Row mapping between the `reports` table and [`Report`].
//!
//! Mandatory columns are read as `Option` so that a row missing one (for
//! example from a misbehaving procedure) surfaces as a named
//! [`RecordError`] rather than a decode failure deep inside `sqlx`.

use chrono::{DateTime, Utc};
use ourcolumbus_types::{RecordError, Report, ReportRecord, format_timestamp};
use uuid::Uuid;

/// Column list for every `SELECT` that feeds [`ReportRow`].
///
/// Enum columns are cast to text so they decode as plain strings.
pub(crate) const REPORT_COLUMNS: &str = "id, source::TEXT AS source, source_id, source_url, \
     content, author, image_urls, location_text, latitude, longitude, \
     location_confidence::TEXT AS location_confidence, matched_keywords, created_at, \
     scraped_at, is_verified";

/// A row from the `reports` table (or the radius procedure).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    /// Backend-assigned id.
    pub id: Option<Uuid>,
    /// Source tag.
    pub source: Option<String>,
    /// Identifier within the source.
    pub source_id: Option<String>,
    /// Permalink.
    pub source_url: Option<String>,
    /// Post body.
    pub content: Option<String>,
    /// Author handle.
    pub author: Option<String>,
    /// Image URLs.
    pub image_urls: Option<Vec<String>>,
    /// Free-text location.
    pub location_text: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
    /// Confidence tag.
    pub location_confidence: Option<String>,
    /// Matched keywords.
    pub matched_keywords: Option<Vec<String>>,
    /// Platform creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Ingestion time.
    pub scraped_at: Option<DateTime<Utc>>,
    /// Verification flag.
    pub is_verified: Option<bool>,
}

impl ReportRow {
    /// Validate the row and rebuild the [`Report`] it stores.
    ///
    /// # Errors
    ///
    /// Returns the [`RecordError`] from [`Report::from_record`].
    pub fn into_report(self) -> Result<Report, RecordError> {
        Report::from_record(self.into())
    }
}

impl From<ReportRow> for ReportRecord {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            source: row.source,
            source_id: row.source_id,
            source_url: row.source_url,
            content: row.content,
            author: row.author,
            image_urls: row.image_urls.unwrap_or_default(),
            location_text: row.location_text,
            latitude: row.latitude,
            longitude: row.longitude,
            location_confidence: row.location_confidence,
            matched_keywords: row.matched_keywords.unwrap_or_default(),
            created_at: row.created_at.map(format_timestamp),
            scraped_at: row.scraped_at.map(format_timestamp),
            is_verified: row.is_verified.unwrap_or_default(),
        }
    }
}

/// Convert a full result set, failing on the first malformed row.
pub(crate) fn into_reports(rows: Vec<ReportRow>) -> Result<Vec<Report>, RecordError> {
    rows.into_iter().map(ReportRow::into_report).collect()
}
