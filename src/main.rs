//! RSS jobs aggregator: binary entrypoint.
//! Boots the Axum HTTP server with the feed catalog, fetcher and routes.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    rss_jobs_aggregator::telemetry::init_tracing();

    let router = rss_jobs_aggregator::app().await?;

    Ok(router.into())
}
