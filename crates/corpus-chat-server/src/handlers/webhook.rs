use crate::corpus::CorpusCache;
use crate::models::webhook::WebhookAck;
use crate::utils::error::ApiError;
use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Inbound notification from the workflow service.
///
/// The payload is only parsed, never interpreted: any well-formed JSON
/// clears the corpus cache so the next chat request reloads from disk.
pub async fn n8n_webhook(
    State(cache): State<Arc<CorpusCache>>,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON payload: {}", e)))?;

    if let Some(file_path) = payload.get("file_path").and_then(Value::as_str) {
        debug!("Webhook reports new file: {}", file_path);
    }
    if let Some(messages) = payload.get("messages").and_then(Value::as_array) {
        debug!("Webhook reports {} new messages", messages.len());
    }

    cache.invalidate();
    info!("Corpus cache cleared by webhook");

    Ok(Json(WebhookAck::cache_cleared()))
}
