//! Greedy foursome selection.
//!
//! Every 4-subset of the available pool is scored, so the cost grows with
//! `C(n, 4)`. That is fine for club sessions (48 available players is about
//! 195k candidates) and the engine refuses pools above `max_pool_size`
//! rather than degrade silently.

use crate::core::history::PairHistory;
use crate::domain::model::{Match, Participant, ParticipantId, ServingTeam, Team};
use crate::utils::error::{Result, RotationError};
use rand::Rng;
use uuid::Uuid;

pub const PLAYERS_PER_COURT: usize = 4;
pub const DEFAULT_MAX_POOL_SIZE: usize = 48;

const PARTNER_REPEAT_PENALTY: i64 = 10;
const OPPONENT_REPEAT_PENALTY: i64 = 5;
const GAMES_PLAYED_PENALTY: i64 = 8;
const SAT_OUT_CREDIT: i64 = 20;
const CONSECUTIVE_SIT_OUT_CREDIT: i64 = 100;

/// Iterative generator of `K`-element index combinations of `0..n` in
/// lexicographic order.
#[derive(Debug, Clone)]
pub struct Combinations<const K: usize> {
    n: usize,
    next: Option<[usize; K]>,
}

impl<const K: usize> Combinations<K> {
    pub fn new(n: usize) -> Self {
        let mut combos = Self { n, next: None };
        combos.reset();
        combos
    }

    /// Rewinds to the first combination.
    pub fn reset(&mut self) {
        self.next = if K <= self.n {
            Some(std::array::from_fn(|i| i))
        } else {
            None
        };
    }
}

impl<const K: usize> Iterator for Combinations<K> {
    type Item = [usize; K];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        let mut successor = current;
        self.next = None;
        for i in (0..K).rev() {
            if successor[i] < self.n - K + i {
                successor[i] += 1;
                for j in i + 1..K {
                    successor[j] = successor[j - 1] + 1;
                }
                self.next = Some(successor);
                break;
            }
        }

        Some(current)
    }
}

/// Number of `k`-subsets of `n` items.
pub fn combination_count(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u64;
    let n = n as u64;
    (0..k).fold(1u64, |acc, i| acc * (n - i) / (i + 1))
}

#[derive(Debug, Clone)]
pub struct GeneratedRound {
    pub matches: Vec<Match>,
    pub benched: Vec<ParticipantId>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    members: [usize; 4],
    team1: [usize; 2],
    team2: [usize; 2],
    score: i64,
}

#[derive(Debug, Clone)]
pub struct MatchmakingEngine {
    max_pool_size: usize,
}

impl Default for MatchmakingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POOL_SIZE)
    }
}

impl MatchmakingEngine {
    pub fn new(max_pool_size: usize) -> Self {
        Self { max_pool_size }
    }

    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }

    pub fn generate_round<R: Rng + ?Sized>(
        &self,
        participants: &[Participant],
        history: &PairHistory,
        num_courts: usize,
        rng: &mut R,
    ) -> Result<GeneratedRound> {
        let required = num_courts * PLAYERS_PER_COURT;
        if participants.len() < required {
            return Err(RotationError::InsufficientParticipants {
                required,
                available: participants.len(),
            });
        }

        let (forced_out, available): (Vec<&Participant>, Vec<&Participant>) =
            participants.iter().partition(|p| p.sit_out_next_round);

        if available.len() < required {
            return Err(RotationError::InsufficientAvailableParticipants {
                required,
                available: available.len(),
            });
        }

        if available.len() > self.max_pool_size {
            return Err(RotationError::PoolTooLarge {
                available: available.len(),
                limit: self.max_pool_size,
            });
        }

        let mut candidates: Vec<Candidate> = Combinations::<4>::new(available.len())
            .map(|members| score_subset(&available, history, members))
            .collect();

        tracing::debug!(
            "Scoring {} candidate foursomes from {} available participants",
            candidates.len(),
            available.len()
        );

        // Stable: equal scores keep enumeration order.
        candidates.sort_by_key(|c| c.score);

        let mut used = vec![false; available.len()];
        let mut selected = Vec::with_capacity(num_courts);
        for candidate in &candidates {
            if selected.len() == num_courts {
                break;
            }
            if candidate.members.iter().any(|&i| used[i]) {
                continue;
            }
            for &i in &candidate.members {
                used[i] = true;
            }
            selected.push(*candidate);
        }

        if selected.len() < num_courts {
            return Err(RotationError::MatchmakingFailed {
                selected: selected.len(),
                required: num_courts,
            });
        }

        let matches = selected
            .iter()
            .enumerate()
            .map(|(i, c)| Match {
                id: Uuid::new_v4(),
                court: i + 1,
                team1: Team::new(available[c.team1[0]].id, available[c.team1[1]].id),
                team2: Team::new(available[c.team2[0]].id, available[c.team2[1]].id),
                team1_score: None,
                team2_score: None,
                completed: false,
                serving_team: if rng.gen_bool(0.5) {
                    ServingTeam::Team1
                } else {
                    ServingTeam::Team2
                },
            })
            .collect();

        let benched = forced_out
            .iter()
            .map(|p| p.id)
            .chain(
                available
                    .iter()
                    .zip(&used)
                    .filter(|(_, playing)| !**playing)
                    .map(|(p, _)| p.id),
            )
            .collect();

        Ok(GeneratedRound { matches, benched })
    }
}

fn score_subset(pool: &[&Participant], history: &PairHistory, members: [usize; 4]) -> Candidate {
    let [a, b, c, d] = members;
    let splits = [([a, b], [c, d]), ([a, c], [b, d]), ([a, d], [b, c])];

    let fairness: i64 = members.iter().map(|&i| fairness_score(pool[i])).sum();

    let (team1, team2, pairing) = splits
        .iter()
        .map(|&(t1, t2)| (t1, t2, pairing_score(pool, history, t1, t2)))
        .min_by_key(|&(_, _, score)| score)
        .unwrap_or(([a, b], [c, d], 0));

    Candidate {
        members,
        team1,
        team2,
        score: pairing + fairness,
    }
}

fn pairing_score(pool: &[&Participant], history: &PairHistory, t1: [usize; 2], t2: [usize; 2]) -> i64 {
    let mut score = 0;
    for team in [t1, t2] {
        score += PARTNER_REPEAT_PENALTY
            * i64::from(history.partnership_count(pool[team[0]].id, pool[team[1]].id));
    }
    for &x in &t1 {
        for &y in &t2 {
            score += OPPONENT_REPEAT_PENALTY * i64::from(history.opponent_count(pool[x].id, pool[y].id));
        }
    }
    score
}

fn fairness_score(p: &Participant) -> i64 {
    let mut score = GAMES_PLAYED_PENALTY * i64::from(p.games_played)
        - SAT_OUT_CREDIT * i64::from(p.rounds_sat_out);
    if p.consecutive_rounds_sat_out > 0 {
        score -= CONSECUTIVE_SIT_OUT_CREDIT;
    }
    score
}
