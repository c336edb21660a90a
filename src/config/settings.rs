// src/config/settings.rs
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RESULTS: usize = 50;
pub const DEFAULT_DESCRIPTION_CAP: usize = 200;
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Some providers reject empty or library user agents, so we look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml";

/// Which parsed entries count as usable in an aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryFilter {
    /// Drop entries with the `#` link OR the `No title` title.
    #[default]
    Strict,
    /// Keep whatever the parser kept (it only drops entries missing both).
    Lenient,
}

/// Internal knobs for fetch + aggregation. Not driven by request input.
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub accept: String,
    pub max_body_bytes: usize,
    pub max_results: usize,
    pub description_cap: usize,
    pub entry_filter: EntryFilter,
    /// Drop repeated (title, link) pairs across sources. Off by default.
    pub dedup: bool,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept: FEED_ACCEPT.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_results: DEFAULT_MAX_RESULTS,
            description_cap: DEFAULT_DESCRIPTION_CAP,
            entry_filter: EntryFilter::Strict,
            dedup: false,
        }
    }
}

impl AggregatorSettings {
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_entry_filter(mut self, filter: EntryFilter) -> Self {
        self.entry_filter = filter;
        self
    }

    pub fn with_dedup(mut self, on: bool) -> Self {
        self.dedup = on;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}
