use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::ChatConfig;
use crate::corpus::{Corpus, CorpusCache};
use crate::models::chat::{ChatMessage, ChatResponse, SessionId};
use crate::services::conversation::ConversationStore;
use crate::services::llm_service::LlmProvider;
use crate::services::workflow::WorkflowTrigger;
use crate::utils::error::ApiError;

/// Handles one user interaction end to end:
/// history → workflow trigger → corpus load → prompt → llm → history
pub struct ChatService {
    llm: Arc<dyn LlmProvider>,
    workflow: Arc<dyn WorkflowTrigger>,
    corpus: Arc<CorpusCache>,
    conversations: ConversationStore,
    config: ChatConfig,
}

impl ChatService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        workflow: Arc<dyn WorkflowTrigger>,
        corpus: Arc<CorpusCache>,
        config: ChatConfig,
    ) -> Self {
        Self {
            llm,
            workflow,
            corpus,
            conversations: ConversationStore::new(),
            config,
        }
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub async fn respond(
        &self,
        session_id: Option<SessionId>,
        message: &str,
    ) -> Result<ChatResponse, ApiError> {
        let start_time = Instant::now();

        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::BadRequest("Message must not be empty".to_string()));
        }

        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        info!("Chat request: session={}, message_len={}", session_id, message.len());

        self.conversations.append(&session_id, ChatMessage::user(message));

        let mut warnings = Vec::new();
        let workflow_triggered = self.workflow.trigger(message).await;
        if !workflow_triggered {
            warn!("Workflow trigger failed for session {}", session_id);
            warnings.push(self.config.workflow_warning.clone());
        }

        // May rescan if the webhook just cleared the cache
        let corpus = self.corpus.load().await?;
        let documents_used = corpus.len().min(self.config.max_documents);

        let messages = self.build_messages(&corpus, message);

        let answer = self
            .llm
            .generate(&messages)
            .await
            .map_err(|e| ApiError::LlmError(e.to_string()))?;

        self.conversations.append(&session_id, ChatMessage::assistant(answer.clone()));

        info!(
            "Chat completed in {}ms (documents={}, workflow_triggered={})",
            start_time.elapsed().as_millis(),
            documents_used,
            workflow_triggered
        );

        Ok(ChatResponse {
            session_id,
            answer,
            workflow_triggered,
            warnings,
            documents_used,
            timestamp: Utc::now(),
        })
    }

    /// System prompt plus one user message carrying the transcripts and the question
    pub fn build_messages(&self, corpus: &Corpus, question: &str) -> Vec<ChatMessage> {
        let docs = corpus
            .texts(self.config.max_documents)
            .collect::<Vec<_>>()
            .join("\n\n");

        let user_content = format!(
            "{}\n\n---\n\n{}{}",
            docs, self.config.question_prefix, question
        );

        vec![
            ChatMessage::system(self.config.system_prompt.clone()),
            ChatMessage::user(user_content),
        ]
    }
}
