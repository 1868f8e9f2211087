use crate::core::history::PairHistory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ParticipantId = Uuid;
pub type MatchId = Uuid;
pub type SessionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub point_differential: i32,
    pub rounds_sat_out: u32,
    pub consecutive_rounds_sat_out: u32,
    /// One-shot request to be benched in the next generated round.
    pub sit_out_next_round: bool,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            games_played: 0,
            wins: 0,
            losses: 0,
            point_differential: 0,
            rounds_sat_out: 0,
            consecutive_rounds_sat_out: 0,
            sit_out_next_round: false,
        }
    }
}

/// Two distinct participants playing on the same side. Order carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub player1: ParticipantId,
    pub player2: ParticipantId,
}

impl Team {
    pub fn new(player1: ParticipantId, player2: ParticipantId) -> Self {
        Self { player1, player2 }
    }

    pub fn players(&self) -> [ParticipantId; 2] {
        [self.player1, self.player2]
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.player1 == id || self.player2 == id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServingTeam {
    Team1,
    Team2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub court: usize,
    pub team1: Team,
    pub team2: Team,
    pub team1_score: Option<i32>,
    pub team2_score: Option<i32>,
    pub completed: bool,
    pub serving_team: ServingTeam,
}

impl Match {
    pub fn players(&self) -> [ParticipantId; 4] {
        [
            self.team1.player1,
            self.team1.player2,
            self.team2.player1,
            self.team2.player2,
        ]
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.team1.contains(id) || self.team2.contains(id)
    }

    pub fn scores(&self) -> Option<(i32, i32)> {
        match (self.team1_score, self.team2_score) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub round_number: u32,
    pub matches: Vec<Match>,
    pub benched: Vec<ParticipantId>,
    /// True only once every match in the round carries a score.
    pub completed: bool,
    pub started_at: DateTime<Utc>,
}

impl Round {
    pub fn find_match(&self, match_id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn involves(&self, id: ParticipantId) -> bool {
        self.benched.contains(&id) || self.matches.iter().any(|m| m.contains(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistoryEntry {
    pub round_number: u32,
    pub court: usize,
    pub match_id: MatchId,
    pub team1: [ParticipantId; 2],
    pub team1_names: [String; 2],
    pub team2: [ParticipantId; 2],
    pub team2_names: [String; 2],
    pub team1_score: i32,
    pub team2_score: i32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    pub match_id: MatchId,
    pub team1_score: i32,
    pub team2_score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub participants: Vec<Participant>,
    pub current_round: Option<Round>,
    pub game_history: Vec<GameHistoryEntry>,
    pub history: PairHistory,
    pub num_courts: usize,
    pub ended: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(participants: Vec<Participant>, num_courts: usize, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            participants,
            current_round: None,
            game_history: Vec::new(),
            history: PairHistory::default(),
            num_courts,
            ended: false,
            created_at,
        }
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Current round that still awaits scores, if any.
    pub fn active_round(&self) -> Option<&Round> {
        self.current_round.as_ref().filter(|r| !r.completed)
    }
}
