//! Shared report types for the `OurColumbus` report store.
//!
//! Everything that crosses the boundary between ingesters, the data layer
//! and read-side consumers is defined here. Types that a dashboard or map
//! view consumes are exported to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`enums`] -- Closed-set tags ([`Source`], [`LocationConfidence`])
//! - [`report`] -- The [`Report`] entity, [`ReportId`] and [`ReportKey`]
//! - [`record`] -- Persisted representation ([`ReportRecord`]) and [`RecordError`]

pub mod enums;
pub mod record;
pub mod report;

pub use enums::{LocationConfidence, Source};
pub use record::{format_timestamp, RecordError, ReportRecord};
pub use report::{Coordinates, Report, ReportId, ReportKey};
