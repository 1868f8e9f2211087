pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::InMemoryStore;
pub use config::RotationConfig;
pub use crate::core::{
    history::PairHistory,
    matchmaking::MatchmakingEngine,
    orchestrator::SessionOrchestrator,
};
pub use utils::error::{ErrorKind, Result, RotationError};
