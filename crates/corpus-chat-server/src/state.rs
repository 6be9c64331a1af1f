use std::sync::Arc;
use axum::extract::FromRef;

use crate::corpus::CorpusCache;
use crate::services::ChatService;

/// Application state shared across chat handlers
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub corpus_cache: Arc<CorpusCache>,
}

impl FromRef<AppState> for Arc<ChatService> {
    fn from_ref(state: &AppState) -> Self {
        state.chat_service.clone()
    }
}

impl FromRef<AppState> for Arc<CorpusCache> {
    fn from_ref(state: &AppState) -> Self {
        state.corpus_cache.clone()
    }
}
