//! Process-wide shared state, passed explicitly through [`crate::services`].
//!
//! Both stores are in-memory only: contents are lost on restart and not shared
//! across instances. Each is a narrow type so an external cache could replace
//! it without touching the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Marks content hashes whose documents have already been indexed.
///
/// Guarantees at-most-once indexing per hash within one process lifetime.
#[derive(Clone, Default)]
pub struct DedupCache {
    inner: Arc<RwLock<HashSet<String>>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, hash: &str) -> bool {
        self.inner.read().await.contains(hash)
    }

    pub async fn mark(&self, hash: String) {
        self.inner.write().await.insert(hash);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// Conversation histories keyed by an explicit session identifier.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<HashMap<String, Vec<Turn>>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session's history, oldest turn first.
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        self.inner
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn append(&self, session_id: &str, turn: Turn) {
        self.inner
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(turn);
    }
}
