use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A stored value together with the version token it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { version: u64 },
    Conflict,
}

/// Key-value store the orchestrator persists sessions through.
///
/// `conditional_set` with `expected_version: None` only succeeds when the key
/// is absent. Expired keys behave as absent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Versioned>>;

    async fn conditional_set(
        &self,
        key: &str,
        value: String,
        expected_version: Option<u64>,
        ttl: Duration,
    ) -> Result<WriteOutcome>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<u64>;

    async fn delete(&self, key: &str) -> Result<()>;
}
