use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::corpus::{CacheStats, CorpusCache};

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}

/// Current corpus cache state (populated, scans, invalidations)
pub async fn corpus_stats(State(cache): State<Arc<CorpusCache>>) -> Json<CacheStats> {
    Json(cache.stats())
}
