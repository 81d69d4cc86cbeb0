use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::encode_metrics;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "gf-free-proxy";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub config: HealthConfig,
    pub cache_entries: usize,
}

#[derive(Serialize)]
pub struct HealthConfig {
    pub min_age_hours: u32,
    pub max_pages: u32,
    pub results_limit: u32,
    pub cache_ttl_secs: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.sanitized_config();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        config: HealthConfig {
            min_age_hours: config.filter.min_age_hours,
            max_pages: config.filter.max_pages,
            results_limit: config.filter.results_limit,
            cache_ttl_secs: config.cache.ttl_secs,
        },
        cache_entries: state.cache().len().await,
    })
}

pub async fn root(State(state): State<Arc<AppState>>) -> String {
    format!(
        "GF-Free Proxy\n\
         Torznab endpoint: /api?t=caps\n\
         Health: /health\n\
         Only torrents older than {}h are listed.\n",
        state.config().filter.min_age_hours
    )
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
