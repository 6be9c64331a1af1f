pub mod settings;

pub use settings::{
    ChatConfig, CorpusConfig, LlmConfig, LoggingConfig, ServerConfig, Settings, WebhookConfig,
    WorkflowConfig,
};
