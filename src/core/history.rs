//! Pair history ledger: how often two participants partnered, opposed each
//! other, and how often a participant was placed on a given court.

use crate::domain::model::{Match, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counter map keyed by a canonical pair key. Zero counts are never stored.
pub type HistoryMap = BTreeMap<String, u32>;

/// Order-independent key for two participants.
pub fn pair_key(a: ParticipantId, b: ParticipantId) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{}|{}", lo, hi)
}

pub fn court_key(court: usize, participant: ParticipantId) -> String {
    format!("{}|{}", court, participant)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairHistory {
    pub partnership: HistoryMap,
    pub opponent: HistoryMap,
    pub court: HistoryMap,
}

impl PairHistory {
    pub fn partnership_count(&self, a: ParticipantId, b: ParticipantId) -> u32 {
        self.partnership.get(&pair_key(a, b)).copied().unwrap_or(0)
    }

    pub fn opponent_count(&self, a: ParticipantId, b: ParticipantId) -> u32 {
        self.opponent.get(&pair_key(a, b)).copied().unwrap_or(0)
    }

    pub fn court_count(&self, court: usize, participant: ParticipantId) -> u32 {
        self.court.get(&court_key(court, participant)).copied().unwrap_or(0)
    }

    /// Records each match once. Calling this twice for the same completed
    /// match double counts it.
    pub fn apply<'a, I>(&self, matches: I) -> Self
    where
        I: IntoIterator<Item = &'a Match>,
    {
        let mut next = self.clone();
        for m in matches {
            next.visit(m, increment);
        }
        next
    }

    /// Inverse of [`PairHistory::apply`]. Counters floor at zero.
    pub fn reverse<'a, I>(&self, matches: I) -> Self
    where
        I: IntoIterator<Item = &'a Match>,
    {
        let mut next = self.clone();
        for m in matches {
            next.visit(m, decrement);
        }
        next
    }

    fn visit(&mut self, m: &Match, op: fn(&mut HistoryMap, String)) {
        for team in [&m.team1, &m.team2] {
            op(&mut self.partnership, pair_key(team.player1, team.player2));
        }

        for a in m.team1.players() {
            for b in m.team2.players() {
                op(&mut self.opponent, pair_key(a, b));
            }
        }

        for p in m.players() {
            op(&mut self.court, court_key(m.court, p));
        }
    }
}

fn increment(map: &mut HistoryMap, key: String) {
    *map.entry(key).or_insert(0) += 1;
}

fn decrement(map: &mut HistoryMap, key: String) {
    if let Some(count) = map.get_mut(&key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ServingTeam, Team};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn make_match(court: usize, p: &[ParticipantId]) -> Match {
        Match {
            id: Uuid::new_v4(),
            court,
            team1: Team::new(p[0], p[1]),
            team2: Team::new(p[2], p[3]),
            team1_score: None,
            team2_score: None,
            completed: false,
            serving_team: ServingTeam::Team1,
        }
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        let p = ids(2);
        assert_eq!(pair_key(p[0], p[1]), pair_key(p[1], p[0]));
    }

    #[test]
    fn test_apply_counts_partners_opponents_and_courts() {
        let p = ids(4);
        let m = make_match(2, &p);
        let history = PairHistory::default().apply([&m]);

        assert_eq!(history.partnership_count(p[1], p[0]), 1);
        assert_eq!(history.partnership_count(p[2], p[3]), 1);
        assert_eq!(history.partnership_count(p[0], p[2]), 0);
        assert_eq!(history.partnership.len(), 2);

        assert_eq!(history.opponent.len(), 4);
        assert_eq!(history.opponent_count(p[0], p[3]), 1);
        assert_eq!(history.opponent_count(p[0], p[1]), 0);

        assert_eq!(history.court_count(2, p[3]), 1);
        assert_eq!(history.court_count(1, p[3]), 0);
    }

    #[test]
    fn test_reverse_undoes_apply() {
        let p = ids(8);
        let earlier = [make_match(1, &p[0..4]), make_match(2, &p[4..8])];
        let base = PairHistory::default().apply(earlier.iter()).apply([&earlier[0]]);

        let reshuffled = [p[0], p[4], p[1], p[5], p[2], p[6], p[3], p[7]];
        let round = [make_match(1, &reshuffled[0..4]), make_match(2, &reshuffled[4..8])];

        let applied = base.apply(round.iter());
        assert_ne!(applied, base);
        assert_eq!(applied.reverse(round.iter()), base);
    }

    #[test]
    fn test_reverse_floors_at_zero() {
        let p = ids(4);
        let m = make_match(1, &p);
        let history = PairHistory::default().reverse([&m]);
        assert_eq!(history, PairHistory::default());

        let once = PairHistory::default().apply([&m]);
        let drained = once.reverse([&m]).reverse([&m]);
        assert_eq!(drained.partnership_count(p[0], p[1]), 0);
        assert!(drained.opponent.is_empty());
    }

    /// Random disjoint foursomes drawn from `players`, one per court.
    fn random_round(players: &[ParticipantId], courts: usize, rng: &mut StdRng) -> Vec<Match> {
        let mut shuffled = players.to_vec();
        shuffled.shuffle(rng);
        shuffled
            .chunks_exact(4)
            .take(courts)
            .enumerate()
            .map(|(i, four)| make_match(i + 1, four))
            .collect()
    }

    fn assert_no_zero_counts(history: &PairHistory) {
        for map in [&history.partnership, &history.opponent, &history.court] {
            assert!(map.values().all(|&count| count > 0));
        }
    }

    #[test]
    fn test_reverse_undoes_apply_over_random_histories() {
        let mut rng = StdRng::seed_from_u64(17);

        for trial in 0..50 {
            let p = ids(rng.gen_range(4..=16));
            let courts = p.len() / 4;

            let mut base = PairHistory::default();
            for _ in 0..rng.gen_range(0..6) {
                base = base.apply(random_round(&p, courts, &mut rng).iter());
            }

            let round = random_round(&p, rng.gen_range(1..=courts), &mut rng);
            let applied = base.apply(round.iter());
            assert_no_zero_counts(&applied);
            assert_eq!(applied.reverse(round.iter()), base, "trial {}", trial);

            // Reversing matches that were never applied floors at zero.
            let unrelated = random_round(&p, courts, &mut rng);
            let floored = base.reverse(unrelated.iter()).reverse(unrelated.iter());
            assert_no_zero_counts(&floored);
            for (key, count) in &floored.partnership {
                assert!(*count <= base.partnership[key]);
            }
        }
    }
}
