use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RotationError {
    // Validation
    #[error("Not enough participants: {required} needed for the configured courts, {available} registered")]
    InsufficientParticipants { required: usize, available: usize },

    #[error("Not enough available participants: {required} needed, {available} not sitting out")]
    InsufficientAvailableParticipants { required: usize, available: usize },

    #[error("Too many available participants for matchmaking: {available} exceeds limit of {limit}")]
    PoolTooLarge { available: usize, limit: usize },

    #[error("No scores provided")]
    NoScoresProvided,

    #[error("Tied score for match {match_id}: ties are not allowed")]
    TieNotAllowed { match_id: Uuid },

    #[error("Negative score for match {match_id}")]
    NegativeScore { match_id: Uuid },

    #[error("Score for match {match_id} exceeds the maximum of {max}")]
    ScoreOutOfRange { match_id: Uuid, max: i32 },

    #[error("Invalid participant name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("A participant named '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Invalid court count {courts}: {reason}")]
    InvalidCourtCount { courts: usize, reason: String },

    #[error("Configuration error in '{field}': {message}")]
    Config { field: String, message: String },

    // State
    #[error("A round is already in progress")]
    RoundInProgress,

    #[error("No active round")]
    NoActiveRound,

    #[error("Cannot cancel a round that has been fully scored")]
    CannotCancelCompleted,

    #[error("Session has ended")]
    SessionEnded,

    #[error("Participant {participant_id} is playing or benched in the current round")]
    ParticipantInActiveRound { participant_id: Uuid },

    #[error("Matchmaking selected {selected} of {required} courts")]
    MatchmakingFailed { selected: usize, required: usize },

    // Not found
    #[error("Session {session_id} not found")]
    SessionNotFound { session_id: Uuid },

    #[error("Participant {participant_id} not found")]
    ParticipantNotFound { participant_id: Uuid },

    #[error("Match {match_id} not found in the current round")]
    MatchNotFound { match_id: Uuid },

    // Concurrency
    #[error("Gave up after {attempts} conflicting write attempts")]
    ConcurrencyExhausted { attempts: usize },

    // Storage
    #[error("Stored value for '{key}' is corrupted and was discarded: {reason}")]
    CorruptedState { key: String, reason: String },

    #[error("Store operation '{operation}' timed out")]
    StoreTimeout { operation: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    NotFound,
    Concurrency,
    Storage,
}

impl RotationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientParticipants { .. }
            | Self::InsufficientAvailableParticipants { .. }
            | Self::PoolTooLarge { .. }
            | Self::NoScoresProvided
            | Self::TieNotAllowed { .. }
            | Self::NegativeScore { .. }
            | Self::ScoreOutOfRange { .. }
            | Self::InvalidName { .. }
            | Self::DuplicateName { .. }
            | Self::InvalidCourtCount { .. }
            | Self::Config { .. } => ErrorKind::Validation,

            Self::RoundInProgress
            | Self::NoActiveRound
            | Self::CannotCancelCompleted
            | Self::SessionEnded
            | Self::ParticipantInActiveRound { .. }
            | Self::MatchmakingFailed { .. } => ErrorKind::State,

            Self::SessionNotFound { .. }
            | Self::ParticipantNotFound { .. }
            | Self::MatchNotFound { .. } => ErrorKind::NotFound,

            Self::ConcurrencyExhausted { .. } => ErrorKind::Concurrency,

            Self::CorruptedState { .. }
            | Self::StoreTimeout { .. }
            | Self::Store { .. }
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Storage,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "Check the input values and try again",
            ErrorKind::State => "Refresh the session; the round state has changed",
            ErrorKind::NotFound => "The session may have expired; create a new one",
            ErrorKind::Concurrency => "Another device is updating this session; retry shortly",
            ErrorKind::Storage => "Check the session store connection; the session may need to be recreated",
        }
    }
}

pub type Result<T> = std::result::Result<T, RotationError>;
