//! Whole-session operations over an injected [`SessionStore`].
//!
//! Every mutation goes through [`SessionOrchestrator::atomic_update`]: read
//! the session with its version, run a pure transition, write back only if
//! the version is unchanged, and start over on conflict.

use crate::config::RotationConfig;
use crate::core::{lifecycle, roster};
use crate::core::matchmaking::MatchmakingEngine;
use crate::domain::model::{
    GameHistoryEntry, ParticipantId, Round, ScoreInput, Session, SessionId,
};
use crate::domain::ports::{SessionStore, WriteOutcome};
use crate::utils::error::{Result, RotationError};
use crate::utils::validation::validate_court_count;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const ACTIVE_SESSION_KEY: &str = "active_session";

pub fn session_key(id: SessionId) -> String {
    format!("session:{}", id)
}

pub struct SessionOrchestrator<S: SessionStore> {
    store: S,
    config: RotationConfig,
    engine: MatchmakingEngine,
    rng: Mutex<StdRng>,
}

impl<S: SessionStore> SessionOrchestrator<S> {
    pub fn new(store: S, config: RotationConfig) -> Self {
        Self::with_rng(store, config, StdRng::from_entropy())
    }

    /// Reproducible shuffles, pairings and serve choices.
    pub fn with_seed(store: S, config: RotationConfig, seed: u64) -> Self {
        Self::with_rng(store, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: S, config: RotationConfig, rng: StdRng) -> Self {
        let engine = MatchmakingEngine::new(config.matchmaking.max_pool_size);
        Self {
            store,
            config,
            engine,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub async fn create_session(&self, names: &[String], num_courts: Option<usize>) -> Result<Session> {
        let courts = num_courts.unwrap_or(self.config.session.default_courts);
        let participants = roster::build_roster(names)?;
        validate_court_count(courts, participants.len(), self.config.court_limit())?;

        let session = Session::new(participants, courts, Utc::now());
        let key = session_key(session.id);
        let payload = serde_json::to_string(&session)?;
        let ttl = self.config.session_ttl();

        let outcome = self
            .with_timeout("conditional_set", self.store.conditional_set(&key, payload, None, ttl))
            .await?;
        if outcome == WriteOutcome::Conflict {
            return Err(RotationError::Store {
                message: format!("session key '{}' already exists", key),
            });
        }

        self.with_timeout(
            "set",
            self.store.set(ACTIVE_SESSION_KEY, session.id.to_string(), ttl),
        )
        .await?;

        tracing::info!(
            "Created session {} with {} participants on {} courts",
            session.id,
            session.participants.len(),
            session.num_courts
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<Session> {
        self.read_session(session_id).await.map(|(session, _)| session)
    }

    pub async fn get_active_session(&self) -> Result<Option<Session>> {
        let Some(pointer) = self
            .with_timeout("get", self.store.get(ACTIVE_SESSION_KEY))
            .await?
        else {
            return Ok(None);
        };

        let session_id = match Uuid::parse_str(pointer.value.trim()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Discarding corrupted active session pointer: {}", e);
                self.with_timeout("delete", self.store.delete(ACTIVE_SESSION_KEY))
                    .await?;
                return Err(RotationError::CorruptedState {
                    key: ACTIVE_SESSION_KEY.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        match self.get_session(session_id).await {
            Ok(session) => Ok(Some(session)),
            Err(RotationError::SessionNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn add_participant(&self, session_id: SessionId, name: &str) -> Result<Session> {
        self.atomic_update(session_id, "add_participant", |session| {
            roster::add_participant(session, name)
        })
        .await
    }

    pub async fn remove_participant(&self, session_id: SessionId, participant_id: ParticipantId) -> Result<Session> {
        self.atomic_update(session_id, "remove_participant", |session| {
            roster::remove_participant(session, participant_id)
        })
        .await
    }

    pub async fn rename_participant(
        &self,
        session_id: SessionId,
        participant_id: ParticipantId,
        name: &str,
    ) -> Result<Session> {
        self.atomic_update(session_id, "rename_participant", |session| {
            roster::rename_participant(session, participant_id, name)
        })
        .await
    }

    pub async fn toggle_sit_out(&self, session_id: SessionId, participant_id: ParticipantId) -> Result<Session> {
        self.atomic_update(session_id, "toggle_sit_out", |session| {
            roster::toggle_sit_out(session, participant_id)
        })
        .await
    }

    pub async fn update_court_count(&self, session_id: SessionId, courts: usize) -> Result<Session> {
        let max_courts = self.config.court_limit();
        self.atomic_update(session_id, "update_court_count", |session| {
            roster::update_court_count(session, courts, max_courts)
        })
        .await
    }

    pub async fn start_round(&self, session_id: SessionId) -> Result<Session> {
        self.atomic_update(session_id, "start_round", |session| {
            let mut rng = self.lock_rng();
            lifecycle::start_round(session, &self.engine, &mut *rng, Utc::now())
        })
        .await
    }

    pub async fn cancel_round(&self, session_id: SessionId) -> Result<Session> {
        self.atomic_update(session_id, "cancel_round", lifecycle::cancel_round)
            .await
    }

    pub async fn complete_round(&self, session_id: SessionId, scores: &[ScoreInput]) -> Result<Session> {
        self.atomic_update(session_id, "complete_round", |session| {
            lifecycle::complete_round(session, scores, Utc::now())
        })
        .await
    }

    pub async fn end_session(&self, session_id: SessionId) -> Result<Session> {
        self.atomic_update(session_id, "end_session", lifecycle::end_session)
            .await
    }

    pub async fn get_current_round(&self, session_id: SessionId) -> Result<Option<Round>> {
        Ok(self.get_session(session_id).await?.current_round)
    }

    pub async fn get_history(&self, session_id: SessionId) -> Result<Vec<GameHistoryEntry>> {
        Ok(self.get_session(session_id).await?.game_history)
    }

    pub async fn delete_session(&self, session_id: SessionId) -> Result<()> {
        let key = session_key(session_id);
        if self.with_timeout("get", self.store.get(&key)).await?.is_none() {
            return Err(RotationError::SessionNotFound { session_id });
        }
        self.with_timeout("delete", self.store.delete(&key)).await?;

        let pointer = self
            .with_timeout("get", self.store.get(ACTIVE_SESSION_KEY))
            .await?;
        if pointer.is_some_and(|p| p.value.trim() == session_id.to_string()) {
            self.with_timeout("delete", self.store.delete(ACTIVE_SESSION_KEY))
                .await?;
        }

        tracing::info!("Deleted session {}", session_id);
        Ok(())
    }

    /// Read-mutate-conditional-write with bounded retries. Only version
    /// conflicts are retried; errors from `mutate` are returned as-is.
    /// The first attempt always runs, so a deadline only cuts off retries.
    pub async fn atomic_update<F>(&self, session_id: SessionId, operation: &str, mutate: F) -> Result<Session>
    where
        F: FnMut(Session) -> Result<Session> + Send,
    {
        let span = tracing::info_span!("session_update", session_id = %session_id, operation);
        self.retry_update(session_id, mutate).instrument(span).await
    }

    async fn retry_update<F>(&self, session_id: SessionId, mut mutate: F) -> Result<Session>
    where
        F: FnMut(Session) -> Result<Session> + Send,
    {
        let key = session_key(session_id);
        let max_attempts = self.config.concurrency.max_attempts.max(1);
        let started = Instant::now();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                if let Some(deadline) = self.config.deadline() {
                    if started.elapsed() >= deadline {
                        tracing::warn!(
                            "Hit the {:?} deadline after {} attempts",
                            deadline,
                            attempt - 1
                        );
                        return Err(RotationError::ConcurrencyExhausted {
                            attempts: attempt - 1,
                        });
                    }
                }
            }

            let (session, version) = self.read_session(session_id).await?;
            let candidate = mutate(session)?;
            let payload = serde_json::to_string(&candidate)?;

            let outcome = self
                .with_timeout(
                    "conditional_set",
                    self.store
                        .conditional_set(&key, payload, Some(version), self.config.session_ttl()),
                )
                .await?;

            match outcome {
                WriteOutcome::Written { version } => {
                    tracing::debug!("Committed at version {} (attempt {})", version, attempt);
                    return Ok(candidate);
                }
                WriteOutcome::Conflict => {
                    tracing::debug!("Version conflict (attempt {}/{})", attempt, max_attempts);
                    if attempt < max_attempts {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        tracing::warn!("Gave up after {} conflicting attempts", max_attempts);
        Err(RotationError::ConcurrencyExhausted {
            attempts: max_attempts,
        })
    }

    async fn read_session(&self, session_id: SessionId) -> Result<(Session, u64)> {
        let key = session_key(session_id);
        let stored = self
            .with_timeout("get", self.store.get(&key))
            .await?
            .ok_or(RotationError::SessionNotFound { session_id })?;

        match serde_json::from_str::<Session>(&stored.value) {
            Ok(session) => Ok((session, stored.version)),
            Err(e) => {
                tracing::warn!("Discarding corrupted session {}: {}", session_id, e);
                self.with_timeout("delete", self.store.delete(&key)).await?;
                Err(RotationError::CorruptedState {
                    key,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn with_timeout<T, Fut>(&self, operation: &str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.config.store_timeout(), fut)
            .await
            .map_err(|_| RotationError::StoreTimeout {
                operation: operation.to_string(),
            })?
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let base = self.config.retry_backoff();
        if base.is_zero() {
            return base;
        }
        let jitter_ms = self.lock_rng().gen_range(0..=base.as_millis() as u64);
        base * attempt as u32 + Duration::from_millis(jitter_ms)
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
