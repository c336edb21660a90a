// src/feeds/envelope.rs
use serde::Serialize;

use crate::feeds::types::{AggregationResult, JobListingEntry};

/// JSON body of a successful `/api/rss-jobs` call.
#[derive(Debug, Clone, Serialize)]
pub struct RssJobsEnvelope {
    pub jobs: Vec<JobListingEntry>,
    pub meta: RssJobsMeta,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RssJobsMeta {
    pub total_jobs: usize,
    pub displayed_jobs: usize,
    pub successful_feeds: usize,
    pub failed_feeds: usize,
    pub total_feeds: usize,
}

pub fn build_envelope(result: AggregationResult) -> RssJobsEnvelope {
    RssJobsEnvelope {
        meta: RssJobsMeta {
            total_jobs: result.total_collected,
            displayed_jobs: result.displayed_count,
            successful_feeds: result.successful_sources,
            failed_feeds: result.failed_sources,
            total_feeds: result.total_sources,
        },
        jobs: result.entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn serializes_to_external_shape() {
        let result = AggregationResult {
            entries: vec![JobListingEntry {
                title: "Accountant".into(),
                link: "https://bayt.com/j/1".into(),
                description: "Full time".into(),
                published_at: Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(),
                source_host: "bayt.com".into(),
            }],
            total_collected: 7,
            displayed_count: 1,
            successful_sources: 2,
            failed_sources: 1,
            total_sources: 3,
        };

        let v = serde_json::to_value(build_envelope(result)).unwrap();
        assert_eq!(
            v,
            json!({
                "jobs": [{
                    "title": "Accountant",
                    "link": "https://bayt.com/j/1",
                    "description": "Full time",
                    "pubDate": "2025-05-01T10:00:00.000Z",
                    "source": "bayt.com"
                }],
                "meta": {
                    "totalJobs": 7,
                    "displayedJobs": 1,
                    "successfulFeeds": 2,
                    "failedFeeds": 1,
                    "totalFeeds": 3
                }
            })
        );
    }
}
