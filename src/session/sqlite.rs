use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::{AppError, StoreError};
use crate::session::{ConversationTurn, SessionStore, SessionSummary};

/// Durable history in a `session_turns` table. Each call opens its own connection on
/// the blocking pool.
pub struct SqliteSessionStore {
    db_path: PathBuf,
    capacity: usize,
}

impl SqliteSessionStore {
    pub fn new(db_path: PathBuf, capacity: usize) -> Result<Self, AppError> {
        init_db(&db_path)?;
        Ok(Self { db_path, capacity })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&db_path)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn load(&self, session_id: &str) -> Result<Vec<ConversationTurn>, StoreError> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT data_json FROM session_turns WHERE session_id=?1 ORDER BY sequence;",
            )?;
            let rows = stmt.query_map(params![session_id], |row| row.get::<_, String>(0))?;
            let mut turns = Vec::new();
            for row in rows {
                let json = row?;
                turns.push(serde_json::from_str(&json)?);
            }
            Ok(turns)
        })
        .await
    }

    async fn append(
        &self,
        session_id: &str,
        user: ConversationTurn,
        assistant: ConversationTurn,
    ) -> Result<(), StoreError> {
        let session_id = session_id.to_string();
        let capacity = i64::try_from(self.capacity).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let next: Option<i64> = tx.query_row(
                "SELECT MAX(sequence) + 1 FROM session_turns WHERE session_id=?1;",
                params![session_id],
                |row| row.get(0),
            )?;
            let mut sequence = next.unwrap_or(1);
            let now = Utc::now().timestamp_millis();

            for turn in [&user, &assistant] {
                tx.execute(
                    r#"
                    INSERT INTO session_turns(id, session_id, sequence, data_json, created_at)
                    VALUES(?1, ?2, ?3, ?4, ?5);
                    "#,
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        session_id,
                        sequence,
                        serde_json::to_string(turn)?,
                        now
                    ],
                )?;
                sequence += 1;
            }

            tx.execute(
                r#"
                DELETE FROM session_turns
                WHERE session_id=?1 AND sequence NOT IN (
                    SELECT sequence FROM session_turns
                    WHERE session_id=?1
                    ORDER BY sequence DESC
                    LIMIT ?2
                );
                "#,
                params![session_id, capacity],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM session_turns WHERE session_id=?1;", params![session_id])?;
            Ok(())
        })
        .await
    }

    async fn list_active(&self) -> Result<Vec<SessionSummary>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT session_id, COUNT(*), MAX(created_at)
                FROM session_turns
                GROUP BY session_id
                ORDER BY session_id;
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?;
            let mut out = Vec::new();
            for row in rows {
                let (session_id, count, last_ms) = row?;
                out.push(SessionSummary {
                    session_id,
                    turn_count: usize::try_from(count).unwrap_or(0),
                    last_activity: DateTime::from_timestamp_millis(last_ms).unwrap_or_default(),
                });
            }
            Ok(out)
        })
        .await
    }
}

fn init_db(db_path: &Path) -> Result<(), AppError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;

        CREATE TABLE IF NOT EXISTS session_turns (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            data_json TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_session_turns_session_seq
        ON session_turns (session_id, sequence);
        "#,
    )?;
    Ok(())
}
