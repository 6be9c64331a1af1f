use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::WorkflowConfig;
use crate::utils::error::ApiError;

/// Outbound notification to the workflow-automation service.
///
/// Implementations never fail: any problem is reported as `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    async fn trigger(&self, message: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct TriggerPayload<'a> {
    message: &'a str,
}

#[derive(Clone)]
pub struct WorkflowClient {
    client: Client,
    trigger_url: String,
}

impl WorkflowClient {
    pub fn new(trigger_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            trigger_url: trigger_url.into(),
        })
    }

    pub fn from_config(config: &WorkflowConfig) -> Result<Self, ApiError> {
        Self::new(config.trigger_url.clone(), config.timeout())
    }
}

#[async_trait]
impl WorkflowTrigger for WorkflowClient {
    async fn trigger(&self, message: &str) -> bool {
        let result = self
            .client
            .post(&self.trigger_url)
            .json(&TriggerPayload { message })
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!("Workflow triggered at {}", self.trigger_url);
                true
            }
            Ok(response) => {
                warn!("Workflow trigger returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Workflow trigger failed: {}", e);
                false
            }
        }
    }
}
