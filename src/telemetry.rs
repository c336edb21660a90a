// src/telemetry.rs
//! Tracing subscriber setup and the Prometheus `/metrics` exporter.

use anyhow::Context;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_METRICS_ROUTES: &str = "METRICS_ROUTES";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Install the global subscriber. Filter from `RUST_LOG`, JSON lines when
/// `LOG_FORMAT=json`. A no-op if something already installed one.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rss_jobs=info,tower_http=info,warn"));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// `/metrics` is only mounted with METRICS_ROUTES=1.
pub fn metrics_routes_enabled() -> bool {
    std::env::var(ENV_METRICS_ROUTES).ok().as_deref() == Some("1")
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Process-wide recorder; installed on first call.
    pub fn global() -> anyhow::Result<&'static Metrics> {
        static METRICS: OnceCell<Metrics> = OnceCell::new();
        METRICS.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .context("prometheus: install recorder")?;
            Ok(Metrics { handle })
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
