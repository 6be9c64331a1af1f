pub mod chat_service;
pub mod conversation;
pub mod llm_service;
pub mod workflow;

pub use chat_service::ChatService;
pub use conversation::ConversationStore;
pub use llm_service::{LlmProvider, LlmService};
pub use workflow::{WorkflowClient, WorkflowTrigger};
