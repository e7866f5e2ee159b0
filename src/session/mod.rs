//! Per-session conversation history.
//!
//! Only the user text and the final assistant answer of each exchange are kept.
//! Tool request and tool response turns live for the duration of one turn and are
//! never handed to a [`SessionStore`]. History is bounded by the store capacity;
//! the oldest turns go first.

pub mod memory;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreError;
use crate::llm::provider::{Message, MessageRole};

pub const DEFAULT_SESSION_CAPACITY: usize = 20;
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_invocation_id: Option<String>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            related_invocation_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            related_invocation_id: None,
        }
    }

    pub fn to_message(&self) -> Message {
        match (self.role, &self.related_invocation_id) {
            (MessageRole::Tool, Some(id)) => Message::tool(id.clone(), String::new(), self.content.clone()),
            (MessageRole::System, _) => Message::system(self.content.clone()),
            (MessageRole::Assistant, _) => Message::assistant(self.content.clone()),
            _ => Message::user(self.content.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(rename = "messageCount")]
    pub turn_count: usize,
    pub last_activity: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    fn capacity(&self) -> usize;

    /// Stored history in chronological order; empty for an unseen session.
    async fn load(&self, session_id: &str) -> Result<Vec<ConversationTurn>, StoreError>;

    /// Appends exactly the `(user, assistant)` pair, then evicts down to capacity.
    async fn append(
        &self,
        session_id: &str,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<(), StoreError>;

    /// Idempotent.
    async fn clear(&self, session_id: &str) -> Result<(), StoreError>;

    async fn list_active(&self) -> Result<Vec<SessionSummary>, StoreError>;
}

/// One async mutex per session id, so turns against the same session run one at a time.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops the entry unless a turn currently holds or waits on it.
    pub async fn forget(&self, session_id: &str) {
        let mut locks = self.locks.lock().await;
        if let Some(lock) = locks.get(session_id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(session_id);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
