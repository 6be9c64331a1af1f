//! Conversation corpus loaded from flat text files
//!
//! Provides:
//! - `Corpus`: identifier (file stem) -> full transcript text
//! - `CorpusScanner`: recursive directory scan
//! - `CorpusCache`: memoized corpus with explicit invalidation

mod cache;
mod scanner;

pub use cache::{CacheStats, CorpusCache};
pub use scanner::{CorpusScanner, CorpusSource, ScanOutcome};

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Corpus scan task failed: {0}")]
    ScanTask(#[from] tokio::task::JoinError),
}

/// Mapping of conversation identifier to transcript text.
///
/// Ordered by identifier so iteration (and therefore prompt construction)
/// does not depend on directory listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Corpus {
    entries: BTreeMap<String, String>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the text it replaced (if any)
    pub fn insert(&mut self, identifier: impl Into<String>, text: impl Into<String>) -> Option<String> {
        self.entries.insert(identifier.into(), text.into())
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// First `limit` transcripts in iteration order
    pub fn texts(&self, limit: usize) -> impl Iterator<Item = &str> {
        self.entries.values().take(limit).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Corpus
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
