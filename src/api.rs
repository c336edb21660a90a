// src/api.rs
use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{load_catalog_default, AggregatorSettings, FeedCatalog};
use crate::error::ApiError;
use crate::feeds::{build_envelope, Aggregator, FeedFetcher, HttpFeedFetcher, RssJobsEnvelope};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

impl AppState {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }

    /// Catalog + fetcher as wired for a given settings set.
    pub fn with_fetcher(
        catalog: FeedCatalog,
        fetcher: Arc<dyn FeedFetcher>,
        settings: AggregatorSettings,
    ) -> Self {
        Self::new(Aggregator::new(Arc::new(catalog), fetcher, settings))
    }

    /// Production wiring: catalog from disk/env, reqwest fetcher, default settings.
    pub fn from_env() -> anyhow::Result<Self> {
        let catalog = load_catalog_default()?;
        let settings = AggregatorSettings::default();
        let fetcher = HttpFeedFetcher::new(&settings)?;
        tracing::info!(target: "rss_jobs", countries = catalog.len(), "feed catalog loaded");
        Ok(Self::with_fetcher(catalog, Arc::new(fetcher), settings))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/rss-jobs", get(rss_jobs))
        .route("/api/rss-jobs/countries", get(list_countries))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn rss_jobs(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<RssJobsEnvelope>, ApiError> {
    let country = q
        .get("country")
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .ok_or(ApiError::InvalidCountry)?;

    let result = state.aggregator.aggregate(country).await?;
    Ok(Json(build_envelope(result)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountryOut {
    key: String,
    label: String,
    description: String,
    total_feeds: usize,
}

async fn list_countries(State(state): State<AppState>) -> Json<Vec<CountryOut>> {
    let out = state
        .aggregator
        .catalog()
        .iter()
        .map(|s| CountryOut {
            key: s.country.clone(),
            label: s.label.clone(),
            description: s.description.clone(),
            total_feeds: s.urls.len(),
        })
        .collect::<Vec<_>>();
    Json(out)
}
