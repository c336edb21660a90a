// src/feeds/aggregator.rs
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, histogram};
use thiserror::Error;

use crate::config::{AggregatorSettings, EntryFilter, FeedCatalog};
use crate::feeds::ensure_metrics_described;
use crate::feeds::fetcher::{FeedFetcher, FetchError};
use crate::feeds::parser::FeedParser;
use crate::feeds::types::{AggregationResult, JobListingEntry};

#[derive(Debug, Error)]
pub enum AggregateError {
    /// The key has no configured sources. Nothing was fetched.
    #[error("invalid country: {0:?}")]
    InvalidCountry(String),
    #[error("{0}")]
    Internal(String),
}

/// Fans out one fetch+parse task per source and merges whatever settles OK.
#[derive(Clone)]
pub struct Aggregator {
    catalog: Arc<FeedCatalog>,
    fetcher: Arc<dyn FeedFetcher>,
    settings: AggregatorSettings,
}

impl Aggregator {
    pub fn new(
        catalog: Arc<FeedCatalog>,
        fetcher: Arc<dyn FeedFetcher>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            settings,
        }
    }

    pub fn catalog(&self) -> &FeedCatalog {
        &self.catalog
    }

    pub async fn aggregate(&self, country: &str) -> Result<AggregationResult, AggregateError> {
        ensure_metrics_described();

        let Some(source) = self.catalog.get(country) else {
            counter!("rss_invalid_country_total").increment(1);
            return Err(AggregateError::InvalidCountry(country.to_string()));
        };

        let t0 = Instant::now();
        let parser = FeedParser::new(self.settings.description_cap);

        let handles = source
            .urls
            .iter()
            .map(|url| {
                let fetcher = Arc::clone(&self.fetcher);
                let url = url.clone();
                tokio::spawn(async move {
                    let doc = fetcher.fetch(&url).await?;
                    Ok::<_, FetchError>(parser.entries(&doc).collect::<Vec<_>>())
                })
            })
            .collect::<Vec<_>>();

        // All-settle: every slot gets its own outcome, in source order.
        let settled = join_all(handles).await;

        let mut collected = Vec::new();
        let mut ok = 0usize;
        let mut failed = 0usize;
        for (url, outcome) in source.urls.iter().zip(settled) {
            match outcome {
                Ok(Ok(entries)) => {
                    tracing::debug!(target: "rss_jobs", %country, %url, entries = entries.len(), "feed parsed");
                    ok += 1;
                    collected.extend(entries);
                }
                Ok(Err(e)) => {
                    tracing::warn!(target: "rss_jobs", %country, %url, error = %e, "feed failed");
                    failed += 1;
                }
                Err(join_err) if join_err.is_panic() => {
                    tracing::error!(target: "rss_jobs", %country, %url, "feed task panicked");
                    return Err(AggregateError::Internal(format!(
                        "feed task for {url} panicked"
                    )));
                }
                Err(join_err) => {
                    tracing::warn!(target: "rss_jobs", %country, %url, error = %join_err, "feed task cancelled");
                    failed += 1;
                }
            }
        }

        let (entries, total_collected) = finalize(collected, &self.settings);
        let result = AggregationResult {
            displayed_count: entries.len(),
            entries,
            total_collected,
            successful_sources: ok,
            failed_sources: failed,
            total_sources: source.urls.len(),
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("rss_aggregation_ms").record(ms);
        counter!("rss_aggregations_total").increment(1);
        counter!("rss_jobs_collected_total").increment(total_collected as u64);

        tracing::info!(
            target: "rss_jobs",
            %country,
            successful = ok,
            failed = failed,
            total_jobs = total_collected,
            displayed = result.displayed_count,
            elapsed_ms = ms as u64,
            "rss fetch summary"
        );

        Ok(result)
    }
}

/// Filter, optional dedup, newest-first sort, cap.
/// Returns (kept, count before the cap).
pub fn finalize(
    mut entries: Vec<JobListingEntry>,
    settings: &AggregatorSettings,
) -> (Vec<JobListingEntry>, usize) {
    if settings.entry_filter == EntryFilter::Strict {
        entries.retain(|e| e.has_title() && e.has_link());
    }

    if settings.dedup {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        entries.retain(|e| seen.insert((e.title.clone(), e.link.clone())));
    }

    entries.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let total = entries.len();
    entries.truncate(settings.max_results);
    (entries, total)
}
