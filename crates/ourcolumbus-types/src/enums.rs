//! Closed-set enumerations carried by every report.
//!
//! Both enums cross the persistence boundary as their lowercase string
//! tags (`"reddit"`, `"exact"`, ...). The `PostgreSQL` schema declares
//! matching enum types, so the tag strings here must stay in sync with
//! the migrations in `ourcolumbus-db`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::record::RecordError;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Social platform a report was harvested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Source {
    /// A Reddit post or comment.
    Reddit,
    /// A Facebook post.
    Facebook,
}

impl Source {
    /// Every supported source, in tag order.
    pub const ALL: [Self; 2] = [Self::Reddit, Self::Facebook];

    /// The lowercase tag used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reddit => "reddit",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reddit" => Ok(Self::Reddit),
            "facebook" => Ok(Self::Facebook),
            other => Err(RecordError::UnknownTag {
                field: "source",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// LocationConfidence
// ---------------------------------------------------------------------------

/// How precisely the location attached to a report is known.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum LocationConfidence {
    /// Street address or precise coordinates.
    Exact,
    /// Neighborhood or general area.
    Approximate,
    /// No location could be determined.
    #[default]
    None,
}

impl LocationConfidence {
    /// The lowercase tag used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Approximate => "approximate",
            Self::None => "none",
        }
    }
}

impl fmt::Display for LocationConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationConfidence {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "approximate" => Ok(Self::Approximate),
            "none" => Ok(Self::None),
            other => Err(RecordError::UnknownTag {
                field: "location_confidence",
                value: other.to_owned(),
            }),
        }
    }
}
