// src/feeds/types.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const NO_TITLE: &str = "No title";
pub const NO_LINK: &str = "#";
pub const NO_DESCRIPTION: &str = "No description available";

/// Unparsed body of one source plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFeedDocument {
    pub url: String,
    pub body: String,
}

/// One normalized job posting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobListingEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(rename = "pubDate", serialize_with = "serialize_iso_millis")]
    pub published_at: DateTime<Utc>,
    #[serde(rename = "source")]
    pub source_host: String,
}

impl JobListingEntry {
    pub fn has_title(&self) -> bool {
        self.title != NO_TITLE
    }

    pub fn has_link(&self) -> bool {
        self.link != NO_LINK
    }
}

/// Sorted, truncated entries plus per-request counters.
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    pub entries: Vec<JobListingEntry>,
    pub total_collected: usize,
    pub displayed_count: usize,
    pub successful_sources: usize,
    pub failed_sources: usize,
    pub total_sources: usize,
}

/// `2024-05-01T10:00:00.000Z`, the shape browsers produce for `toISOString()`.
pub fn iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn serialize_iso_millis<S>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&iso_millis(ts))
}
