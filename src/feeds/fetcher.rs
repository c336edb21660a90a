// src/feeds/fetcher.rs
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::header::{ACCEPT, USER_AGENT};
use thiserror::Error;

use crate::config::AggregatorSettings;
use crate::feeds::types::RawFeedDocument;

/// Why a single source produced nothing. All variants mean "source unavailable"
/// to the aggregator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS, body read, ...
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("response larger than {0} bytes")]
    ResponseTooLarge(usize),
}

impl FetchError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::HttpStatus(_) => "status",
            FetchError::Timeout(_) => "timeout",
            FetchError::ResponseTooLarge(_) => "too_large",
        }
    }
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawFeedDocument, FetchError>;
}

/// reqwest-backed fetcher: one GET, one attempt, hard timeout.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
    accept: String,
    user_agent: String,
    max_body_bytes: usize,
}

impl HttpFeedFetcher {
    pub fn new(settings: &AggregatorSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.fetch_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: reqwest::Client, settings: &AggregatorSettings) -> Self {
        Self {
            client,
            timeout: settings.fetch_timeout,
            accept: settings.accept.clone(),
            user_agent: settings.user_agent.clone(),
            max_body_bytes: settings.max_body_bytes,
        }
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let mut resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, &self.accept)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if resp
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes as u64)
        {
            return Err(FetchError::ResponseTooLarge(self.max_body_bytes));
        }

        // Chunked read: Content-Length may be absent or wrong.
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if buf.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::ResponseTooLarge(self.max_body_bytes));
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<RawFeedDocument, FetchError> {
        let t0 = Instant::now();
        // Dropping the future on timeout cancels the in-flight request.
        let res = match tokio::time::timeout(self.timeout, self.get_body(url)).await {
            Ok(r) => r,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("rss_feed_fetch_ms").record(ms);

        match res {
            Ok(body) => {
                counter!("rss_feed_fetch_total", "outcome" => "ok").increment(1);
                tracing::debug!(target: "rss_jobs", %url, bytes = body.len(), elapsed_ms = ms as u64, "feed fetched");
                Ok(RawFeedDocument {
                    url: url.to_string(),
                    body,
                })
            }
            Err(e) => {
                counter!("rss_feed_fetch_total", "outcome" => e.kind()).increment(1);
                tracing::warn!(target: "rss_jobs", %url, error = %e, elapsed_ms = ms as u64, "feed fetch failed");
                Err(e)
            }
        }
    }
}

// --- Test helper ---

/// Canned reply for one URL of [`MockFetcher`].
#[cfg(test)]
#[derive(Debug, Clone)]
pub enum MockReply {
    Body(String),
    Status(u16),
    Timeout,
    /// Simulates a programming fault inside the source task.
    Panic,
}

/// In-memory fetcher keyed by URL; unknown URLs answer 404.
#[cfg(test)]
pub struct MockFetcher {
    replies: std::collections::HashMap<String, MockReply>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockFetcher {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = (S, MockReply)>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(|(u, r)| (u.into(), r)).collect(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl FeedFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<RawFeedDocument, FetchError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.replies.get(url) {
            Some(MockReply::Body(body)) => Ok(RawFeedDocument {
                url: url.to_string(),
                body: body.clone(),
            }),
            Some(MockReply::Status(code)) => Err(FetchError::HttpStatus(*code)),
            Some(MockReply::Timeout) => Err(FetchError::Timeout(Duration::from_millis(10_000))),
            Some(MockReply::Panic) => panic!("mock fetcher asked to panic for {url}"),
            None => Err(FetchError::HttpStatus(404)),
        }
    }
}
