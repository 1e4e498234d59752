//! Pull-based scrape endpoint
//!
//! Serves the current registry state on `GET /metrics` (and `/`). Reads never
//! block ingest and are unaffected by classification errors.

use crate::infrastructure::observability::metrics::PrometheusRegistry;
use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use prometheus::{Encoder, TextEncoder};
use tokio::net::TcpListener;
use tracing::info;

pub fn router(registry: PrometheusRegistry) -> Router {
    Router::new()
        .route("/", get(scrape))
        .route("/metrics", get(scrape))
        .route("/health", get(health))
        .with_state(registry)
}

async fn scrape(State(registry): State<PrometheusRegistry>) -> impl IntoResponse {
    let content_type = TextEncoder::new().format_type().to_string();
    ([(header::CONTENT_TYPE, content_type)], registry.render())
}

async fn health() -> &'static str {
    "ok"
}

/// Serve the scrape endpoint on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, registry: PrometheusRegistry) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Metrics endpoint listening on http://{}/metrics", addr);
    }
    axum::serve(listener, router(registry)).await
}
