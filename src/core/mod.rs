pub mod history;
pub mod lifecycle;
pub mod matchmaking;
pub mod orchestrator;
pub mod roster;

pub use crate::domain::model::{
    GameHistoryEntry, Match, Participant, ParticipantId, Round, ScoreInput, Session, SessionId, Team,
};
pub use crate::domain::ports::{SessionStore, Versioned, WriteOutcome};
pub use crate::utils::error::Result;
