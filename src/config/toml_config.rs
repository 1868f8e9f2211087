use crate::core::matchmaking::PLAYERS_PER_COURT;
use crate::utils::error::{Result, RotationError};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub session: SessionConfig,
    pub concurrency: ConcurrencyConfig,
    pub matchmaking: MatchmakingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_courts: usize,
    pub max_courts: usize,
    pub ttl_hours: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_courts: 1,
            max_courts: 12,
            ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub max_attempts: usize,
    pub retry_backoff_ms: u64,
    pub store_timeout_ms: u64,
    /// Wall-clock ceiling for one atomic update, on top of the attempt cap.
    pub deadline_ms: Option<u64>,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 10,
            store_timeout_ms: 2_000,
            deadline_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    pub max_pool_size: usize,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            max_pool_size: crate::core::matchmaking::DEFAULT_MAX_POOL_SIZE,
        }
    }
}

impl RotationConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| RotationError::Config {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value, leaving unknown ones as-is.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static env var pattern")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_hours * 3600)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.concurrency.store_timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.concurrency.retry_backoff_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.concurrency.deadline_ms.map(Duration::from_millis)
    }

    /// Largest court count a session may use: `max_courts`, capped by how
    /// many full courts the matchmaking pool can fill.
    pub fn court_limit(&self) -> usize {
        self.session
            .max_courts
            .min(self.matchmaking.max_pool_size / PLAYERS_PER_COURT)
    }
}

impl Validate for RotationConfig {
    fn validate(&self) -> Result<()> {
        validate_range("session.max_courts", self.session.max_courts, 1, 64)?;
        validate_range(
            "session.default_courts",
            self.session.default_courts,
            1,
            self.session.max_courts,
        )?;
        validate_positive_number("session.ttl_hours", self.session.ttl_hours, 1)?;
        validate_range("concurrency.max_attempts", self.concurrency.max_attempts, 1, 20)?;
        validate_positive_number("concurrency.store_timeout_ms", self.concurrency.store_timeout_ms, 1)?;
        if let Some(deadline) = self.concurrency.deadline_ms {
            validate_positive_number("concurrency.deadline_ms", deadline, 1)?;
        }
        validate_range("matchmaking.max_pool_size", self.matchmaking.max_pool_size, 4, 96)?;
        if self.session.max_courts * PLAYERS_PER_COURT > self.matchmaking.max_pool_size {
            return Err(RotationError::Config {
                field: "session.max_courts".to_string(),
                message: format!(
                    "{} courts need {} players but matchmaking.max_pool_size is {}",
                    self.session.max_courts,
                    self.session.max_courts * PLAYERS_PER_COURT,
                    self.matchmaking.max_pool_size
                ),
            });
        }
        Ok(())
    }
}
