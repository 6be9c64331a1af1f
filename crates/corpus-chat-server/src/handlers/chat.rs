use crate::models::chat::*;
use crate::services::ChatService;
use crate::utils::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::sync::Arc;

pub async fn chat_handler(
    State(chat_service): State<Arc<ChatService>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let response = chat_service
        .respond(request.session_id, &request.message)
        .await?;

    Ok(Json(response))
}

pub async fn history_handler(
    State(chat_service): State<Arc<ChatService>>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = chat_service
        .conversations()
        .history(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", session_id)))?;

    Ok(Json(HistoryResponse { session_id, messages }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChatConfig, CorpusConfig};
    use crate::corpus::CorpusCache;
    use crate::server::build_chat_router;
    use crate::services::llm_service::MockLlmProvider;
    use crate::services::workflow::MockWorkflowTrigger;
    use crate::state::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app_state(dir: &TempDir, workflow_ok: bool) -> AppState {
        let corpus_cache = Arc::new(CorpusCache::new(&CorpusConfig {
            root_dir: dir.path().to_path_buf(),
            ..CorpusConfig::default()
        }));

        let mut llm = MockLlmProvider::new();
        llm.expect_generate()
            .returning(|messages| Ok(format!("answered with {} messages", messages.len())));

        let mut workflow = MockWorkflowTrigger::new();
        workflow.expect_trigger().returning(move |_| workflow_ok);

        let chat_service = Arc::new(ChatService::new(
            Arc::new(llm),
            Arc::new(workflow),
            Arc::clone(&corpus_cache),
            ChatConfig::default(),
        ));

        AppState { chat_service, corpus_cache }
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_chat_then_history() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let app = build_chat_router(app_state(&dir, true));

        let (status, json) = send(
            app.clone(),
            chat_request(serde_json::json!({"message": "hi", "session_id": "abc"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["session_id"], "abc");
        assert_eq!(json["answer"], "answered with 2 messages");
        assert_eq!(json["workflow_triggered"], true);
        assert_eq!(json["documents_used"], 1);

        let request = Request::builder()
            .uri("/api/chat/abc/history")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_workflow_failure_surfaces_warning() {
        let dir = TempDir::new().unwrap();
        let app = build_chat_router(app_state(&dir, false));

        let (status, json) = send(app, chat_request(serde_json::json!({"message": "hi"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["workflow_triggered"], false);
        assert_eq!(json["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_history_is_404() {
        let dir = TempDir::new().unwrap();
        let app = build_chat_router(app_state(&dir, true));

        let request = Request::builder()
            .uri("/api/chat/missing/history")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "NotFound");
    }

    #[tokio::test]
    async fn test_blank_message_is_400() {
        let dir = TempDir::new().unwrap();
        let app = build_chat_router(app_state(&dir, true));

        let (status, _) = send(app, chat_request(serde_json::json!({"message": ""}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_shape() {
        let dir = TempDir::new().unwrap();
        let app = build_chat_router(app_state(&dir, true));

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, json) = send(app.clone(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "BadRequest");
        assert!(json["message"].is_string());

        // Missing `message` field is rejected the same way
        let (status, json) = send(app, chat_request(serde_json::json!({"session_id": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "BadRequest");
    }
}
