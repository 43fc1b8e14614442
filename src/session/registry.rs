//! C9 — session registry. Owns every live [`Session`] by `game_id`, enforces the
//! concurrency cap, and periodically sweeps completed sessions whose grace period
//! has elapsed so long-running deployments don't leak memory.
//!
//! Uses the familiar table-manager shape: `Arc<RwLock<HashMap<Id, Handle>>>` with a
//! capacity check before insertion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::agents::llm::LlmGateway;
use crate::config::CreateGameConfig;
use crate::entities::SessionStatus;
use crate::error::CoreError;
use crate::rules_engine::RulesEngine;
use crate::session::orchestrator::Session;

/// How long a `Completed`/`Error` session is kept around after it stops changing,
/// before [`SessionRegistry::sweep`] evicts it. Long enough for a final `get_state`
/// poll to land after the terminal event fires.
pub const DEFAULT_GC_GRACE: Duration = Duration::from_secs(60);

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Session>>,
    capacity: usize,
    gc_grace: Duration,
    created_count: AtomicU64,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), capacity, gc_grace: DEFAULT_GC_GRACE, created_count: AtomicU64::new(0) }
    }

    #[must_use]
    pub fn with_gc_grace(capacity: usize, gc_grace: Duration) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), capacity, gc_grace, created_count: AtomicU64::new(0) }
    }

    /// Validates `config`, checks the registry isn't at capacity, then builds and
    /// inserts a new [`Session`] wrapping `engine`.
    pub async fn create_game(
        &self,
        config: CreateGameConfig,
        engine: Box<dyn RulesEngine>,
        llm_gateway: Option<Arc<dyn LlmGateway>>,
    ) -> Result<Uuid, CoreError> {
        config.validate()?;

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.capacity {
            return Err(CoreError::Overloaded);
        }

        let game_id = Uuid::new_v4();
        let seed = self.created_count.fetch_add(1, Ordering::Relaxed);
        let all_non_human = config.seats.iter().all(|s| !matches!(s, crate::config::AgentSpec::Human { .. }));
        let auto_start = config.auto_start || all_non_human;
        let session = Session::new(game_id, &config, engine, llm_gateway, seed);
        sessions.insert(game_id, session.clone());
        drop(sessions);

        if auto_start {
            if let Err(e) = session.advance().await {
                log::warn!("session {game_id}: auto-start advance failed: {e}");
            }
        }
        Ok(game_id)
    }

    pub async fn get(&self, game_id: Uuid) -> Result<Session, CoreError> {
        self.sessions.read().await.get(&game_id).cloned().ok_or(CoreError::GameNotFound)
    }

    pub async fn remove(&self, game_id: Uuid) -> Result<(), CoreError> {
        self.sessions.write().await.remove(&game_id).map(|_| ()).ok_or(CoreError::GameNotFound)
    }

    #[must_use]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[must_use]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Evicts every session that is `Completed`/`Error` and whose `updated_at` is
    /// older than the configured grace period. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::from_std(self.gc_grace).unwrap_or(chrono::Duration::zero());
        let mut to_remove = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                let state = session.snapshot().await;
                if matches!(state.status, SessionStatus::Completed | SessionStatus::Error) && state.updated_at < cutoff {
                    to_remove.push(*id);
                }
            }
        }
        let removed = to_remove.len();
        if removed > 0 {
            let mut sessions = self.sessions.write().await;
            for id in to_remove {
                sessions.remove(&id);
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentSpec;
    use crate::rules_engine::simple::SimpleEngine;

    fn two_humans() -> CreateGameConfig {
        CreateGameConfig {
            seats: vec![
                AgentSpec::Human { display_name: "alice".into() },
                AgentSpec::Human { display_name: "bob".into() },
            ],
            ..CreateGameConfig::default()
        }
    }

    #[tokio::test]
    async fn create_and_fetch_round_trips() {
        let registry = SessionRegistry::new(10);
        let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 1));
        let game_id = registry.create_game(two_humans(), engine, None).await.unwrap();
        assert!(registry.get(game_id).await.is_ok());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn rejects_invalid_config_before_touching_capacity() {
        let registry = SessionRegistry::new(10);
        let mut config = two_humans();
        config.seats.truncate(1);
        let engine = Box::new(SimpleEngine::new(2, 1000, 10, 20, 1));
        assert!(registry.create_game(config, engine, None).await.is_err());
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn enforces_capacity() {
        let registry = SessionRegistry::new(1);
        let engine_a = Box::new(SimpleEngine::new(2, 1000, 10, 20, 1));
        registry.create_game(two_humans(), engine_a, None).await.unwrap();
        let engine_b = Box::new(SimpleEngine::new(2, 1000, 10, 20, 2));
        let result = registry.create_game(two_humans(), engine_b, None).await;
        assert_eq!(result.unwrap_err(), CoreError::Overloaded);
    }

    #[tokio::test]
    async fn get_unknown_game_errors() {
        let registry = SessionRegistry::new(10);
        assert_eq!(registry.get(Uuid::new_v4()).await.unwrap_err(), CoreError::GameNotFound);
    }
}
