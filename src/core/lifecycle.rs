//! Round lifecycle transitions.
//!
//! Each transition takes the session by value and returns the next session,
//! so a caller that has to retry can simply drop a candidate and start again
//! from a fresh read.

use crate::core::matchmaking::MatchmakingEngine;
use crate::domain::model::{
    GameHistoryEntry, Match, MatchId, ParticipantId, Round, ScoreInput, Session,
};
use crate::utils::error::{Result, RotationError};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

/// Highest score accepted for one side of a match.
pub const MAX_SCORE: i32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Apply,
    Revert,
}

/// Round number the next started round will carry.
pub fn next_round_number(session: &Session) -> u32 {
    let current = session
        .current_round
        .as_ref()
        .map(|r| r.round_number)
        .unwrap_or(0);
    let logged = session
        .game_history
        .iter()
        .map(|e| e.round_number)
        .max()
        .unwrap_or(0);
    current.max(logged) + 1
}

pub fn start_round<R: Rng + ?Sized>(
    mut session: Session,
    engine: &MatchmakingEngine,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Session> {
    ensure_not_ended(&session)?;
    if session.active_round().is_some() {
        return Err(RotationError::RoundInProgress);
    }

    let round_number = next_round_number(&session);

    let generated = if round_number == 1 {
        let mut seating = session.participants.clone();
        seating.shuffle(rng);
        engine.generate_round(&seating, &session.history, session.num_courts, rng)?
    } else {
        engine.generate_round(&session.participants, &session.history, session.num_courts, rng)?
    };

    for p in session.participants.iter_mut() {
        if generated.benched.contains(&p.id) {
            p.rounds_sat_out += 1;
            p.consecutive_rounds_sat_out += 1;
        } else {
            p.consecutive_rounds_sat_out = 0;
        }
        p.sit_out_next_round = false;
    }

    tracing::info!(
        "Session {}: round {} started on {} courts, {} benched",
        session.id,
        round_number,
        generated.matches.len(),
        generated.benched.len()
    );

    session.current_round = Some(Round {
        round_number,
        matches: generated.matches,
        benched: generated.benched,
        completed: false,
        started_at: now,
    });

    Ok(session)
}

pub fn cancel_round(mut session: Session) -> Result<Session> {
    ensure_not_ended(&session)?;
    let round = session
        .current_round
        .as_ref()
        .ok_or(RotationError::NoActiveRound)?;
    if round.completed {
        return Err(RotationError::CannotCancelCompleted);
    }

    // Scores already recorded for part of the round go away with it.
    revert_round_results(&mut session);

    let Some(round) = session.current_round.take() else {
        return Err(RotationError::NoActiveRound);
    };

    for id in &round.benched {
        if let Some(p) = session.participant_mut(*id) {
            p.rounds_sat_out = p.rounds_sat_out.saturating_sub(1);
            p.consecutive_rounds_sat_out = p.consecutive_rounds_sat_out.saturating_sub(1);
        }
    }

    tracing::info!("Session {}: round {} canceled", session.id, round.round_number);
    Ok(session)
}

/// Records scores for the current round. A round that is already fully
/// scored has its previous results replaced.
pub fn complete_round(session: Session, scores: &[ScoreInput], now: DateTime<Utc>) -> Result<Session> {
    ensure_not_ended(&session)?;
    let round = session
        .current_round
        .as_ref()
        .ok_or(RotationError::NoActiveRound)?;

    if round.completed {
        return resubmit_round(session, scores, now);
    }
    record_scores(session, scores, now)
}

/// Throws away every recorded result of the current round, then records
/// `scores` as if the round had never been scored.
pub fn resubmit_round(mut session: Session, scores: &[ScoreInput], now: DateTime<Utc>) -> Result<Session> {
    ensure_not_ended(&session)?;
    if session.current_round.is_none() {
        return Err(RotationError::NoActiveRound);
    }
    if scores.is_empty() {
        return Err(RotationError::NoScoresProvided);
    }

    revert_round_results(&mut session);
    record_scores(session, scores, now)
}

pub fn end_session(mut session: Session) -> Result<Session> {
    if session.ended {
        return Ok(session);
    }
    if session.active_round().is_some() {
        return Err(RotationError::RoundInProgress);
    }

    session.ended = true;
    tracing::info!(
        "Session {} ended after {} games",
        session.id,
        session.game_history.len()
    );
    Ok(session)
}

fn ensure_not_ended(session: &Session) -> Result<()> {
    if session.ended {
        return Err(RotationError::SessionEnded);
    }
    Ok(())
}

fn record_scores(mut session: Session, scores: &[ScoreInput], now: DateTime<Utc>) -> Result<Session> {
    if scores.is_empty() {
        return Err(RotationError::NoScoresProvided);
    }

    let mut round = session
        .current_round
        .take()
        .ok_or(RotationError::NoActiveRound)?;

    let mut newly_completed: Vec<MatchId> = Vec::new();

    for input in scores {
        let idx = round
            .matches
            .iter()
            .position(|m| m.id == input.match_id)
            .ok_or(RotationError::MatchNotFound {
                match_id: input.match_id,
            })?;

        if input.team1_score == input.team2_score {
            return Err(RotationError::TieNotAllowed {
                match_id: input.match_id,
            });
        }
        if input.team1_score < 0 || input.team2_score < 0 {
            return Err(RotationError::NegativeScore {
                match_id: input.match_id,
            });
        }
        if input.team1_score > MAX_SCORE || input.team2_score > MAX_SCORE {
            return Err(RotationError::ScoreOutOfRange {
                match_id: input.match_id,
                max: MAX_SCORE,
            });
        }

        let new_scores = (input.team1_score, input.team2_score);
        let current = &round.matches[idx];

        if current.completed {
            if current.scores() == Some(new_scores) {
                continue;
            }
            revert_match(&mut session, round.round_number, current);
        } else {
            newly_completed.push(current.id);
        }

        let m = &mut round.matches[idx];
        m.team1_score = Some(new_scores.0);
        m.team2_score = Some(new_scores.1);
        m.completed = true;

        let entry = apply_match(&mut session, round.round_number, m, now);
        session.game_history.push(entry);
    }

    session.history = session.history.apply(
        round
            .matches
            .iter()
            .filter(|m| m.completed && newly_completed.contains(&m.id)),
    );

    round.completed = round.matches.iter().all(|m| m.completed);

    tracing::info!(
        "Session {}: round {} scored {} of {} matches",
        session.id,
        round.round_number,
        round.matches.iter().filter(|m| m.completed).count(),
        round.matches.len()
    );

    session.current_round = Some(round);
    Ok(session)
}

/// Undoes stats, pair history and log entries of every scored match in the
/// current round and leaves the round unscored.
fn revert_round_results(session: &mut Session) {
    let Some(mut round) = session.current_round.take() else {
        return;
    };

    let scored: Vec<&Match> = round.matches.iter().filter(|m| m.completed).collect();
    for m in &scored {
        if let Some((s1, s2)) = m.scores() {
            adjust_stats(session, m, s1, s2, Effect::Revert);
        }
    }
    session.history = session.history.reverse(scored);
    session
        .game_history
        .retain(|e| e.round_number != round.round_number);

    for m in round.matches.iter_mut() {
        m.team1_score = None;
        m.team2_score = None;
        m.completed = false;
    }
    round.completed = false;

    session.current_round = Some(round);
}

fn revert_match(session: &mut Session, round_number: u32, m: &Match) {
    if let Some((s1, s2)) = m.scores() {
        adjust_stats(session, m, s1, s2, Effect::Revert);
    }
    session
        .game_history
        .retain(|e| !(e.round_number == round_number && e.match_id == m.id));
}

fn apply_match(session: &mut Session, round_number: u32, m: &Match, now: DateTime<Utc>) -> GameHistoryEntry {
    let (s1, s2) = m.scores().unwrap_or((0, 0));
    adjust_stats(session, m, s1, s2, Effect::Apply);

    GameHistoryEntry {
        round_number,
        court: m.court,
        match_id: m.id,
        team1: m.team1.players(),
        team1_names: m.team1.players().map(|id| display_name(session, id)),
        team2: m.team2.players(),
        team2_names: m.team2.players().map(|id| display_name(session, id)),
        team1_score: s1,
        team2_score: s2,
        recorded_at: now,
    }
}

fn display_name(session: &Session, id: ParticipantId) -> String {
    session
        .participant(id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn adjust_stats(session: &mut Session, m: &Match, s1: i32, s2: i32, effect: Effect) {
    let team1_won = s1 > s2;
    let sides = [(m.team1, team1_won, s1 - s2), (m.team2, !team1_won, s2 - s1)];

    for (team, won, margin) in sides {
        for id in team.players() {
            let Some(p) = session.participant_mut(id) else {
                tracing::warn!("Participant {} from match {} no longer in session", id, m.id);
                continue;
            };
            match effect {
                Effect::Apply => {
                    p.games_played += 1;
                    if won {
                        p.wins += 1;
                    } else {
                        p.losses += 1;
                    }
                    p.point_differential = p.point_differential.saturating_add(margin);
                }
                Effect::Revert => {
                    p.games_played = p.games_played.saturating_sub(1);
                    if won {
                        p.wins = p.wins.saturating_sub(1);
                    } else {
                        p.losses = p.losses.saturating_sub(1);
                    }
                    p.point_differential = p.point_differential.saturating_sub(margin);
                }
            }
        }
    }
}
