use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub corpus: CorpusConfig,
    pub llm: LlmConfig,
    pub workflow: WorkflowConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

/// Chat API listener
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::from((self.host.parse::<IpAddr>()?, self.port)))
    }
}

/// Cache invalidation listener
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WebhookConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            path: "/n8n_webhook".to_string(),
        }
    }
}

impl WebhookConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::from((self.host.parse::<IpAddr>()?, self.port)))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    pub root_dir: PathBuf,
    pub extensions: Vec<String>, // compared case-insensitively, without the dot
    pub follow_links: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data/messenger"),
            extensions: vec!["txt".to_string()],
            follow_links: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<usize>,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout_seconds: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Outbound trigger for the workflow-automation service
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct WorkflowConfig {
    pub trigger_url: String,
    pub timeout_seconds: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            trigger_url: "http://n8n:5678/webhook/trigger-workflow".to_string(),
            timeout_seconds: 5,
        }
    }
}

impl WorkflowConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub max_documents: usize,
    pub system_prompt: String,
    pub question_prefix: String,
    pub workflow_warning: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_documents: 20,
            system_prompt: "You are a customer-service analytics assistant. \
                All conversation data is in Vietnamese. \
                Classify sentiment (Positive|Neutral|Negative) \
                and answer the user's question."
                .to_string(),
            question_prefix: "Question: ".to_string(),
            workflow_warning: "Unable to trigger the workflow. Please check the workflow URL or network."
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "pretty" | "json"
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,corpus_chat_server=debug".to_string(),
            format: "pretty".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl Settings {
    /// Load `config/settings.toml` (optional) overlaid with `APP__SECTION__KEY` env vars.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.apply_api_key_fallback();
        Ok(settings)
    }

    /// Load a specific settings file, without environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    fn apply_api_key_fallback(&mut self) {
        if self.llm.api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.llm.api_key = key;
            }
        }
    }
}
