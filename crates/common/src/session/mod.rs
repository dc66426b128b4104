//! Session and progress store
//!
//! Holds the per-session matching run state polled by callers while the
//! pipeline runs in the background. Progress writes are monotonic: a
//! concurrently polling caller can never observe progress move backwards.

use crate::errors::{AppError, Result};
use crate::models::{MatchResult, MatchSession, MatchStatus};
use async_trait::async_trait;
use chrono::Utc;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Maximum characters of an error message surfaced to callers
pub const ERROR_MESSAGE_MAX_CHARS: usize = 100;

/// Truncate a failure message for user-visible session state.
pub fn truncate_error(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}

/// Contract for session state persistence.
///
/// Implementations provide `get`/`put`; the run-state transitions are
/// provided methods so every backend applies the same progress clamp and
/// finalization rules.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<MatchSession>>;

    async fn put(&self, session_id: &str, session: &MatchSession) -> Result<()>;

    /// Record a milestone. Progress is clamped to 0–100 and never
    /// regresses; missing sessions are ignored.
    async fn update_progress(&self, session_id: &str, progress: u8, step: &str) -> Result<()> {
        if let Some(mut session) = self.get(session_id).await? {
            session.match_progress = session.match_progress.max(progress.min(100));
            session.current_step = Some(step.to_string());
            self.put(session_id, &session).await?;
        }
        Ok(())
    }

    /// Transition to `completed` with results attached and total run time
    /// recorded.
    async fn complete_run(&self, session_id: &str, results: &[MatchResult]) -> Result<()> {
        if let Some(mut session) = self.get(session_id).await? {
            if let Some(start) = session.match_start_time {
                let elapsed = Utc::now() - start;
                session.total_match_time_secs =
                    Some(elapsed.num_milliseconds() as f64 / 1000.0);
            }
            session.match_status = MatchStatus::Completed;
            session.match_progress = 100;
            session.current_step = Some("Complete".to_string());
            session.match_results = results.to_vec();
            self.put(session_id, &session).await?;
        }
        Ok(())
    }

    /// Transition to `failed` with a truncated message; progress stays at
    /// its last reported value.
    async fn fail_run(&self, session_id: &str, error: &str) -> Result<()> {
        if let Some(mut session) = self.get(session_id).await? {
            session.match_status = MatchStatus::Failed;
            session.current_step = Some(format!(
                "Error: {}",
                truncate_error(error, ERROR_MESSAGE_MAX_CHARS)
            ));
            self.put(session_id, &session).await?;
        }
        Ok(())
    }
}

/// Redis-backed session store
pub struct RedisSessionStore {
    connection: RwLock<MultiplexedConnection>,
    key_prefix: String,
    ttl_secs: u64,
}

impl RedisSessionStore {
    /// Connect to Redis and build the store.
    pub async fn connect(url: &str, key_prefix: &str, ttl_secs: u64) -> Result<Self> {
        let client = Client::open(url).map_err(|e| AppError::SessionStore {
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::SessionStore {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self {
            connection: RwLock::new(connection),
            key_prefix: key_prefix.to_string(),
            ttl_secs,
        })
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}:session:{}", self.key_prefix, session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<MatchSession>> {
        let key = self.key(session_id);
        let mut conn = self.connection.write().await;

        let raw: Option<String> = conn.get(&key).await?;
        match raw {
            Some(json) => {
                let session = serde_json::from_str(&json)?;
                debug!(key = %key, "Session hit");
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, session_id: &str, session: &MatchSession) -> Result<()> {
        let key = self.key(session_id);
        let json = serde_json::to_string(session)?;

        let mut conn = self.connection.write().await;
        conn.set_ex::<_, _, ()>(&key, &json, self.ttl_secs).await?;

        debug!(key = %key, progress = session.match_progress, "Session stored");
        Ok(())
    }
}

/// In-memory session store for tests and development
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, MatchSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<MatchSession>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn put(&self, session_id: &str, session: &MatchSession) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), session.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn progress_never_regresses() {
        let store = MemorySessionStore::new();
        store.put("s1", &MatchSession::new()).await.unwrap();

        store.update_progress("s1", 70, "Analyzing research alignment").await.unwrap();
        store.update_progress("s1", 30, "Retrieving publication data").await.unwrap();

        let session = store.get("s1").await.unwrap().unwrap();
        assert_eq!(session.match_progress, 70);
        assert_eq!(
            session.current_step.as_deref(),
            Some("Retrieving publication data")
        );
    }

    #[tokio::test]
    async fn failure_truncates_message_and_freezes_progress() {
        let store = MemorySessionStore::new();
        let mut session = MatchSession::new();
        session.match_status = MatchStatus::Processing;
        session.match_progress = 25;
        store.put("s1", &session).await.unwrap();

        let long_error = "x".repeat(500);
        store.fail_run("s1", &long_error).await.unwrap();

        let session = store.get("s1").await.unwrap().unwrap();
        assert_eq!(session.match_status, MatchStatus::Failed);
        assert_eq!(session.match_progress, 25);
        let step = session.current_step.unwrap();
        assert_eq!(step.len(), "Error: ".len() + ERROR_MESSAGE_MAX_CHARS);
    }

    #[tokio::test]
    async fn completion_attaches_results_and_total_time() {
        let store = MemorySessionStore::new();
        let mut session = MatchSession::new();
        session.match_status = MatchStatus::Processing;
        session.match_start_time = Some(Utc::now() - chrono::Duration::seconds(3));
        store.put("s1", &session).await.unwrap();

        store.complete_run("s1", &[]).await.unwrap();

        let session = store.get("s1").await.unwrap().unwrap();
        assert_eq!(session.match_status, MatchStatus::Completed);
        assert_eq!(session.match_progress, 100);
        assert!(session.total_match_time_secs.unwrap() >= 3.0);
    }

    #[tokio::test]
    async fn updates_on_missing_sessions_are_ignored() {
        let store = MemorySessionStore::new();
        store.update_progress("ghost", 50, "Filtering candidates").await.unwrap();
        assert!(store.get("ghost").await.unwrap().is_none());
    }
}
