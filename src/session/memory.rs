use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::session::{ConversationTurn, SessionStore, SessionSummary, DEFAULT_SESSION_CAPACITY};

struct SessionEntry {
    turns: VecDeque<ConversationTurn>,
    last_activity: DateTime<Utc>,
}

/// Process-local history; everything is gone on restart.
pub struct InMemorySessionStore {
    capacity: usize,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn load(&self, session_id: &str) -> Result<Vec<ConversationTurn>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .map(|entry| entry.turns.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn append(
        &self,
        session_id: &str,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                turns: VecDeque::with_capacity(self.capacity),
                last_activity: Utc::now(),
            });
        entry.turns.push_back(user);
        entry.turns.push_back(assistant);
        while entry.turns.len() > self.capacity {
            entry.turns.pop_front();
        }
        entry.last_activity = Utc::now();
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut out: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, entry)| SessionSummary {
                session_id: id.clone(),
                turn_count: entry.turns.len(),
                last_activity: entry.last_activity,
            })
            .collect();
        out.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(out)
    }
}
