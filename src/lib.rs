// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod feeds;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::error::ApiError;
pub use crate::feeds::{AggregateError, Aggregator, JobListingEntry};

use axum::Router;

/// Build the full in-process app: API routes plus `/metrics` when
/// `METRICS_ROUTES=1`. Used by the Shuttle entrypoint and by tests.
pub async fn app() -> anyhow::Result<Router> {
    let state = AppState::from_env()?;
    let mut router = api::create_router(state);
    if telemetry::metrics_routes_enabled() {
        router = router.merge(telemetry::Metrics::global()?.router());
    }
    Ok(router)
}
