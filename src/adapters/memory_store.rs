use crate::domain::ports::{SessionStore, Versioned, WriteOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Entry {
    value: String,
    version: u64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<String, Entry>,
    last_version: u64,
}

impl StoreState {
    /// Live entry for `key`; expired entries are dropped on access.
    fn live(&mut self, key: &str) -> Option<&Entry> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at <= Instant::now());
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }

    /// Drops every expired entry, so keys that are never read again do not
    /// accumulate.
    fn sweep_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);
    }

    fn write(&mut self, key: &str, value: String, ttl: Duration) -> u64 {
        self.sweep_expired();
        self.last_version += 1;
        let version = self.last_version;
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                version,
                expires_at: Instant::now() + ttl,
            },
        );
        version
    }
}

/// Versioned key-value store held in process memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        state.live(key).is_some()
    }

    /// Entries currently held, expired ones included until the next write.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>> {
        let mut state = self.state.lock().await;
        Ok(state.live(key).map(|e| Versioned {
            value: e.value.clone(),
            version: e.version,
        }))
    }

    async fn conditional_set(
        &self,
        key: &str,
        value: String,
        expected_version: Option<u64>,
        ttl: Duration,
    ) -> Result<WriteOutcome> {
        let mut state = self.state.lock().await;
        let current = state.live(key).map(|e| e.version);
        if current != expected_version {
            tracing::debug!(
                "Conditional write to '{}' rejected: expected {:?}, found {:?}",
                key,
                expected_version,
                current
            );
            return Ok(WriteOutcome::Conflict);
        }

        let version = state.write(key, value, ttl);
        Ok(WriteOutcome::Written { version })
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<u64> {
        let mut state = self.state.lock().await;
        Ok(state.write(key, value, ttl))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.entries.remove(key);
        Ok(())
    }
}
