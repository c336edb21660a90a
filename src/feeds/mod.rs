// src/feeds/mod.rs
pub mod aggregator;
pub mod envelope;
pub mod fetcher;
pub mod parser;
pub mod types;

pub use aggregator::{AggregateError, Aggregator};
pub use envelope::{build_envelope, RssJobsEnvelope, RssJobsMeta};
pub use fetcher::{FeedFetcher, FetchError, HttpFeedFetcher};
pub use parser::FeedParser;
pub use types::{AggregationResult, JobListingEntry, RawFeedDocument};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "rss_feed_fetch_total",
            "Feed fetch attempts, labelled by outcome."
        );
        describe_histogram!("rss_feed_fetch_ms", "Single feed fetch time in milliseconds.");
        describe_histogram!(
            "rss_aggregation_ms",
            "Whole country aggregation time in milliseconds."
        );
        describe_counter!("rss_aggregations_total", "Completed country aggregations.");
        describe_counter!(
            "rss_jobs_collected_total",
            "Usable job entries collected before the result cap."
        );
        describe_counter!(
            "rss_invalid_country_total",
            "Requests rejected for an unknown country key."
        );
    });
}
