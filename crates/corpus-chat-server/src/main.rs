use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use corpus_chat_server::config::Settings;
use corpus_chat_server::corpus::CorpusCache;
use corpus_chat_server::server::{shutdown_signal, HttpServer};
use corpus_chat_server::services::{ChatService, LlmService, WorkflowClient};
use corpus_chat_server::state::AppState;
use corpus_chat_server::utils::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    init_logger(&settings.logging)?;

    info!("🚀 Starting corpus chat server...");
    info!("✅ Configuration loaded");

    // Single cache instance, shared by the webhook listener and the chat path
    let corpus_cache = Arc::new(CorpusCache::new(&settings.corpus));

    // Initialize services
    let llm_service = Arc::new(LlmService::new(settings.llm.clone())?);
    let workflow_client = Arc::new(WorkflowClient::from_config(&settings.workflow)?);

    let chat_service = Arc::new(ChatService::new(
        llm_service,
        workflow_client,
        corpus_cache.clone(),
        settings.chat.clone(),
    ));

    let state = AppState {
        chat_service,
        corpus_cache: corpus_cache.clone(),
    };

    // Bind both listeners before spawning so address errors fail startup
    let webhook_server = HttpServer::webhook(
        settings.webhook.socket_addr()?,
        &settings.webhook.path,
        corpus_cache,
    )
    .await?;
    let chat_server = HttpServer::chat(settings.server.socket_addr()?, state).await?;

    let webhook_task = tokio::spawn(webhook_server.serve(shutdown_signal()));
    let chat_task = tokio::spawn(chat_server.serve(shutdown_signal()));

    let (webhook_result, chat_result) = tokio::join!(webhook_task, chat_task);

    for result in [webhook_result?, chat_result?] {
        if let Err(e) = &result {
            error!("Server exited with error: {:#}", e);
        }
        result?;
    }

    info!("👋 Corpus chat server stopped");
    Ok(())
}
