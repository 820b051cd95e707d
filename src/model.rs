//! Domain records fetched from the Readwise APIs.
//!
//! These structs double as the wire DTOs: the upstream list endpoints are
//! decoded straight into them via serde, with renames where the API field
//! name differs from ours. Everything is held in memory for the duration of
//! one run only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// One archived reading item from the Reader API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Enum-like category string: article, book, tweet, pdf, ...
    #[serde(default = "default_channel")]
    pub category: String,
    /// Ingestion channel, e.g. reader_rss, import, reader_ios.
    #[serde(default = "default_channel")]
    pub source: String,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// The instant the item was moved to its current location; for archived
    /// items this is the archival time.
    #[serde(rename = "last_moved_at", default)]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

fn default_title() -> String {
    "Untitled".to_string()
}

fn default_channel() -> String {
    "unknown".to_string()
}

impl Document {
    /// Hours between creation and archival, when both instants are known and
    /// ordered. A document violating `archived_at >= created_at` is treated
    /// as having no measurable archive delay.
    pub fn hours_to_archive(&self) -> Option<f64> {
        match (self.created_at, self.archived_at) {
            (Some(created), Some(archived)) if archived >= created => {
                Some((archived - created).num_seconds() as f64 / 3600.0)
            }
            _ => None,
        }
    }
}

/// Reading list location of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    New,
    Later,
    Archive,
    Feed,
    /// Forward compatibility: any location this version does not know.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::New => "new",
            Location::Later => "later",
            Location::Archive => "archive",
            Location::Feed => "feed",
            Location::Unknown => "unknown",
        }
    }
}

/// One user-made highlight from the main Readwise API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Highlight {
    pub id: u64,
    /// Weak reference to the parent document; may point outside the window.
    #[serde(rename = "book_id", default, deserialize_with = "opt_id_string")]
    pub document_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "highlighted_at", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The highlights endpoint serializes the parent id as a number; the Reader
/// endpoint uses string ids. Normalize both to a string.
fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}
