//! The [`Report`] entity and its composite [`ReportKey`].

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{LocationConfidence, Source};
use crate::record::RecordError;

/// Backend-assigned identity of a stored report.
///
/// `PostgreSQL` generates these with `gen_random_uuid()` on insert; a
/// report built by an ingester has no id until it has been persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReportId(pub Uuid);

impl ReportId {
    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ReportId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A latitude/longitude pair in decimal degrees (WGS 84).
///
/// Latitude and longitude are either both known or both absent, so a
/// report carries `Option<Coordinates>` rather than two independent
/// optional floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Degrees north of the equator.
    pub latitude: f64,
    /// Degrees east of the prime meridian.
    pub longitude: f64,
}

impl Coordinates {
    /// Build a coordinate pair.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Combine two independently stored columns.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::PartialCoordinates`] when exactly one of the
    /// two values is present.
    pub const fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, RecordError> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Ok(Some(Self::new(latitude, longitude))),
            (None, None) => Ok(None),
            _ => Err(RecordError::PartialCoordinates),
        }
    }
}

/// Composite `(source, source_id)` key identifying a report across sources.
///
/// Rendered as `"source:source_id"`, which is the form returned by the
/// dedup resolver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportKey {
    /// Platform the post came from.
    pub source: Source,
    /// Identifier assigned by that platform.
    pub source_id: String,
}

impl ReportKey {
    /// Build a key from its two halves.
    pub fn new(source: Source, source_id: impl Into<String>) -> Self {
        Self {
            source,
            source_id: source_id.into(),
        }
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.source_id)
    }
}

impl FromStr for ReportKey {
    type Err = RecordError;

    /// Parse a `"source:source_id"` string. Only the first colon splits;
    /// source ids may themselves contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, source_id) = s
            .split_once(':')
            .ok_or(RecordError::MalformedRecord { field: "source_id" })?;
        Ok(Self::new(source.parse()?, source_id))
    }
}

/// One harvested post describing reported activity.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Backend-assigned identity, `None` until persisted.
    pub id: Option<ReportId>,
    /// Platform the post came from.
    pub source: Source,
    /// Identifier unique within `source`.
    pub source_id: String,
    /// Permalink to the original post.
    pub source_url: String,
    /// Post body.
    pub content: String,
    /// Author handle, when the platform exposes one.
    pub author: Option<String>,
    /// Attached image URLs in post order.
    pub image_urls: Vec<String>,
    /// Free-text location mentioned in the post.
    pub location_text: Option<String>,
    /// Resolved position, if any.
    pub coordinates: Option<Coordinates>,
    /// Precision of `coordinates` / `location_text`.
    pub location_confidence: LocationConfidence,
    /// Keywords that caused the post to be harvested, in match order.
    pub matched_keywords: Vec<String>,
    /// Creation time reported by the platform.
    pub created_at: Option<DateTime<Utc>>,
    /// Ingestion time. Filled in by the store when absent.
    pub scraped_at: Option<DateTime<Utc>>,
    /// Set by the external verification workflow.
    pub is_verified: bool,
}

impl Report {
    /// Create an unpersisted report with only the mandatory fields set.
    pub fn new(
        source: Source,
        source_id: impl Into<String>,
        source_url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            source,
            source_id: source_id.into(),
            source_url: source_url.into(),
            content: content.into(),
            author: None,
            image_urls: Vec::new(),
            location_text: None,
            coordinates: None,
            location_confidence: LocationConfidence::None,
            matched_keywords: Vec::new(),
            created_at: None,
            scraped_at: None,
            is_verified: false,
        }
    }

    /// The composite dedup/upsert key of this report.
    pub fn key(&self) -> ReportKey {
        ReportKey::new(self.source, self.source_id.clone())
    }

    /// Set the author handle.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the attached image URLs.
    #[must_use]
    pub fn with_image_urls(mut self, urls: Vec<String>) -> Self {
        self.image_urls = urls;
        self
    }

    /// Set the free-text location and its confidence.
    #[must_use]
    pub fn with_location_text(
        mut self,
        text: impl Into<String>,
        confidence: LocationConfidence,
    ) -> Self {
        self.location_text = Some(text.into());
        self.location_confidence = confidence;
        self
    }

    /// Set the resolved coordinates.
    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates::new(latitude, longitude));
        self
    }

    /// Set the location confidence without touching the location text.
    #[must_use]
    pub fn with_location_confidence(mut self, confidence: LocationConfidence) -> Self {
        self.location_confidence = confidence;
        self
    }

    /// Set the keywords that matched this post.
    #[must_use]
    pub fn with_matched_keywords(mut self, keywords: Vec<String>) -> Self {
        self.matched_keywords = keywords;
        self
    }

    /// Set the platform-reported creation time.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set the ingestion time explicitly.
    #[must_use]
    pub fn with_scraped_at(mut self, scraped_at: DateTime<Utc>) -> Self {
        self.scraped_at = Some(scraped_at);
        self
    }

    /// Mark the report as verified.
    #[must_use]
    pub fn verified(mut self, is_verified: bool) -> Self {
        self.is_verified = is_verified;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_renders_source_and_id() {
        let report = Report::new(
            Source::Reddit,
            "abc123",
            "https://reddit.com/r/Columbus/abc123",
            "sighting A",
        );
        assert_eq!(report.key().to_string(), "reddit:abc123");
    }

    #[test]
    fn key_parse_splits_on_first_colon() {
        let key: Result<ReportKey, _> = "facebook:123:456".parse();
        assert_eq!(key, Ok(ReportKey::new(Source::Facebook, "123:456")));
    }

    #[test]
    fn key_parse_rejects_missing_separator() {
        assert!("reddit".parse::<ReportKey>().is_err());
        assert!("myspace:1".parse::<ReportKey>().is_err());
    }

    #[test]
    fn coordinates_must_be_paired() {
        assert_eq!(
            Coordinates::from_parts(Some(39.96), None),
            Err(RecordError::PartialCoordinates)
        );
        assert_eq!(Coordinates::from_parts(None, None), Ok(None));
        assert!(matches!(
            Coordinates::from_parts(Some(39.96), Some(-82.99)),
            Ok(Some(_))
        ));
    }

    #[test]
    fn new_report_has_spec_defaults() {
        let report = Report::new(Source::Facebook, "p1", "https://fb.com/p1", "text");
        assert!(report.id.is_none());
        assert!(report.image_urls.is_empty());
        assert!(report.matched_keywords.is_empty());
        assert_eq!(report.location_confidence, LocationConfidence::None);
        assert!(!report.is_verified);
        assert!(report.scraped_at.is_none());
    }
}
