use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::models::chat::{ChatMessage, SessionId};

/// Thread-safe in-memory chat history, keyed by session
#[derive(Clone, Default)]
pub struct ConversationStore {
    storage: Arc<DashMap<SessionId, Vec<ChatMessage>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, creating the session on first use
    pub fn append(&self, session_id: &str, message: ChatMessage) {
        let mut entry = self.storage.entry(session_id.to_string()).or_default();
        entry.push(message);
        debug!("Session {} now has {} messages", session_id, entry.len());
    }

    /// Full history of a session, oldest first
    pub fn history(&self, session_id: &str) -> Option<Vec<ChatMessage>> {
        self.storage.get(session_id).map(|entry| entry.value().clone())
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_history() {
        let store = ConversationStore::new();
        assert!(store.history("s1").is_none());

        store.append("s1", ChatMessage::user("hi"));
        store.append("s1", ChatMessage::assistant("hello"));
        store.append("s2", ChatMessage::user("other"));

        let history = store.history("s1").unwrap();
        assert_eq!(history, vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")]);
        assert_eq!(store.len(), 2);
    }
}
