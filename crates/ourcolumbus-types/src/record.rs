//! Persisted representation of a [`Report`] and its validation.
//!
//! [`ReportRecord`] is the flat schema exchanged with storage and with
//! read-side consumers: enum fields travel as their lowercase tags,
//! timestamps as RFC 3339 text and lists as JSON arrays. Every field is
//! optional at this level so that a row with missing mandatory columns
//! can be represented and rejected with a named [`RecordError`] instead
//! of failing somewhere inside serde.
//!
//! Serialization and deserialization differ for `scraped_at`:
//! [`Report::to_record`] stamps the current time when the field is unset,
//! while [`Report::from_record`] leaves a missing value as `None`.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{LocationConfidence, Source};
use crate::report::{Coordinates, Report, ReportId};

/// Errors raised while turning a [`ReportRecord`] back into a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A mandatory column (`source`, `source_id`, `source_url`, `content`)
    /// is missing or null.
    #[error("malformed record: missing mandatory field `{field}`")]
    MalformedRecord {
        /// Name of the missing field.
        field: &'static str,
    },

    /// An enum column holds a tag outside its closed set.
    #[error("unknown {field} tag: {value:?}")]
    UnknownTag {
        /// Name of the enum field.
        field: &'static str,
        /// The offending tag.
        value: String,
    },

    /// A timestamp column is not valid RFC 3339 text.
    #[error("invalid {field} timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// Name of the timestamp field.
        field: &'static str,
        /// The offending text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Exactly one of latitude/longitude is present.
    #[error("latitude and longitude must both be present or both absent")]
    PartialCoordinates,
}

/// Flat, storage-shaped view of a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReportRecord {
    /// Backend-assigned identity; omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<Uuid>,
    /// Source tag (`"reddit"` or `"facebook"`).
    #[serde(default)]
    pub source: Option<String>,
    /// Identifier unique within the source.
    #[serde(default)]
    pub source_id: Option<String>,
    /// Permalink to the original post.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Post body.
    #[serde(default)]
    pub content: Option<String>,
    /// Author handle.
    #[serde(default)]
    pub author: Option<String>,
    /// Image URLs; null or missing reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub image_urls: Vec<String>,
    /// Free-text location.
    #[serde(default)]
    pub location_text: Option<String>,
    /// Latitude in decimal degrees.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Confidence tag (`"exact"`, `"approximate"`, `"none"`).
    #[serde(default)]
    pub location_confidence: Option<String>,
    /// Matched keywords; null or missing reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub matched_keywords: Vec<String>,
    /// Platform creation time as RFC 3339 text.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Ingestion time as RFC 3339 text.
    #[serde(default)]
    pub scraped_at: Option<String>,
    /// Verification flag.
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_verified: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Offset-less ISO-8601 form accepted on read.
const NAIVE_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Render a timestamp in the text form used by [`ReportRecord`].
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RecordError> {
    let Some(text) = value else {
        return Ok(None);
    };
    let parsed = DateTime::parse_from_rfc3339(&text)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|rfc_err| {
            // ISO-8601 without an offset, as older ingesters wrote it; read as UTC.
            NaiveDateTime::parse_from_str(&text, NAIVE_ISO_FORMAT)
                .map(|naive| naive.and_utc())
                .map_err(|_naive_err| rfc_err)
        });
    parsed.map(Some).map_err(|e| RecordError::InvalidTimestamp {
        field,
        reason: e.to_string(),
        value: text,
    })
}

fn require(field: &'static str, value: Option<String>) -> Result<String, RecordError> {
    value.ok_or(RecordError::MalformedRecord { field })
}

impl Report {
    /// Serialize into the persisted representation, stamping `scraped_at`
    /// with the current time when unset.
    pub fn to_record(&self) -> ReportRecord {
        self.to_record_at(Utc::now())
    }

    /// Serialize with an explicit clock reading used as the `scraped_at`
    /// default.
    pub fn to_record_at(&self, now: DateTime<Utc>) -> ReportRecord {
        ReportRecord {
            id: self.id.map(ReportId::into_inner),
            source: Some(self.source.as_str().to_owned()),
            source_id: Some(self.source_id.clone()),
            source_url: Some(self.source_url.clone()),
            content: Some(self.content.clone()),
            author: self.author.clone(),
            image_urls: self.image_urls.clone(),
            location_text: self.location_text.clone(),
            latitude: self.coordinates.map(|c| c.latitude),
            longitude: self.coordinates.map(|c| c.longitude),
            location_confidence: Some(self.location_confidence.as_str().to_owned()),
            matched_keywords: self.matched_keywords.clone(),
            created_at: self.created_at.map(format_timestamp),
            scraped_at: Some(format_timestamp(self.scraped_at.unwrap_or(now))),
            is_verified: self.is_verified,
        }
    }

    /// Rebuild a report from its persisted representation.
    ///
    /// # Errors
    ///
    /// - [`RecordError::MalformedRecord`] if `source`, `source_id`,
    ///   `source_url` or `content` is missing.
    /// - [`RecordError::UnknownTag`] for an enum tag outside its set.
    /// - [`RecordError::InvalidTimestamp`] for unparseable timestamp text.
    /// - [`RecordError::PartialCoordinates`] if only one coordinate is set.
    pub fn from_record(record: ReportRecord) -> Result<Self, RecordError> {
        let source: Source = require("source", record.source)?.parse()?;
        let source_id = require("source_id", record.source_id)?;
        let source_url = require("source_url", record.source_url)?;
        let content = require("content", record.content)?;

        let location_confidence = match record.location_confidence.as_deref() {
            None | Some("") => LocationConfidence::None,
            Some(tag) => tag.parse()?,
        };

        Ok(Self {
            id: record.id.map(ReportId),
            source,
            source_id,
            source_url,
            content,
            author: record.author,
            image_urls: record.image_urls,
            location_text: record.location_text,
            coordinates: Coordinates::from_parts(record.latitude, record.longitude)?,
            location_confidence,
            matched_keywords: record.matched_keywords,
            created_at: parse_timestamp("created_at", record.created_at)?,
            scraped_at: parse_timestamp("scraped_at", record.scraped_at)?,
            is_verified: record.is_verified,
        })
    }
}

impl TryFrom<ReportRecord> for Report {
    type Error = RecordError;

    fn try_from(record: ReportRecord) -> Result<Self, Self::Error> {
        Self::from_record(record)
    }
}

impl From<&Report> for ReportRecord {
    fn from(report: &Report) -> Self {
        report.to_record()
    }
}
