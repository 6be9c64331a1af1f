use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use crate::corpus::CorpusCache;
use crate::handlers;
use crate::state::AppState;

/// Chat API routes (the request path)
pub fn build_chat_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check));

    let api_routes = Router::new()
        .route("/api/chat", post(handlers::chat::chat_handler))
        .route("/api/chat/{session_id}/history", get(handlers::chat::history_handler))
        .route("/api/corpus/stats", get(handlers::health::corpus_stats));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
}

/// Invalidation listener routes: a single webhook endpoint
pub fn build_webhook_router(path: &str, cache: Arc<CorpusCache>) -> Router {
    Router::new()
        .route(path, post(handlers::webhook::n8n_webhook))
        .with_state(cache)
        .layer(TraceLayer::new_for_http())
}

/// A bound HTTP server, ready to be spawned on its own task
pub struct HttpServer {
    name: &'static str,
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    pub async fn bind(name: &'static str, addr: SocketAddr, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { name, listener, router })
    }

    /// Invalidation listener bound to `addr`, serving `path`
    pub async fn webhook(addr: SocketAddr, path: &str, cache: Arc<CorpusCache>) -> Result<Self> {
        anyhow::ensure!(path.starts_with('/'), "webhook path must start with '/': {}", path);
        Self::bind("webhook", addr, build_webhook_router(path, cache)).await
    }

    /// Chat API bound to `addr`
    pub async fn chat(addr: SocketAddr, state: AppState) -> Result<Self> {
        Self::bind("chat", addr, build_chat_router(state)).await
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("🎯 {} server listening on {}", self.name, self.listener.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("{} server stopped", self.name);
        Ok(())
    }
}

/// Resolves on Ctrl-C. Every caller is notified independently.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
