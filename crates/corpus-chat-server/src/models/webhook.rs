use serde::{Deserialize, Serialize};

/// Acknowledgment returned to the invalidation caller
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub status: String,
}

impl WebhookAck {
    pub fn cache_cleared() -> Self {
        Self { status: "cache_cleared".to_string() }
    }
}
