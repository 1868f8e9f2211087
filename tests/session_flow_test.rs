use court_rotation::domain::model::{Round, ScoreInput, Session};
use court_rotation::{ErrorKind, InMemoryStore, RotationConfig, RotationError, SessionOrchestrator};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Player {}", i + 1)).collect()
}

fn orchestrator() -> SessionOrchestrator<InMemoryStore> {
    SessionOrchestrator::with_seed(InMemoryStore::new(), RotationConfig::default(), 2024)
}

fn current(session: &Session) -> &Round {
    session.current_round.as_ref().expect("round should be present")
}

fn team1_wins(round: &Round, losing: &[i32]) -> Vec<ScoreInput> {
    round
        .matches
        .iter()
        .zip(losing)
        .map(|(m, &l)| ScoreInput {
            match_id: m.id,
            team1_score: 11,
            team2_score: l,
        })
        .collect()
}

#[tokio::test]
async fn test_two_court_round_records_results() {
    let orch = orchestrator();
    let session = orch.create_session(&names(8), Some(2)).await.unwrap();

    let session = orch.start_round(session.id).await.unwrap();
    let round = current(&session).clone();
    assert_eq!(round.round_number, 1);
    assert_eq!(round.matches.len(), 2);
    assert!(round.benched.is_empty());

    let session = orch
        .complete_round(session.id, &team1_wins(&round, &[5, 8]))
        .await
        .unwrap();

    for m in &round.matches {
        for id in m.team1.players() {
            let p = session.participant(id).unwrap();
            assert_eq!((p.wins, p.games_played), (1, 1));
        }
        for id in m.team2.players() {
            let p = session.participant(id).unwrap();
            assert_eq!((p.losses, p.games_played), (1, 1));
        }
    }

    let history = orch.get_history(session.id).await.unwrap();
    assert_eq!(history.iter().filter(|e| e.round_number == 1).count(), 2);
    assert!(history.iter().all(|e| e.team1_score == 11));

    let stored_round = orch.get_current_round(session.id).await.unwrap().unwrap();
    assert!(stored_round.completed);
}

#[tokio::test]
async fn test_benched_players_play_next_round() {
    let orch = orchestrator();
    let session = orch.create_session(&names(6), Some(1)).await.unwrap();

    let session = orch.start_round(session.id).await.unwrap();
    let first = current(&session).clone();
    assert_eq!(first.benched.len(), 2);
    orch.complete_round(session.id, &team1_wins(&first, &[7]))
        .await
        .unwrap();

    let session = orch.start_round(session.id).await.unwrap();
    let second = current(&session);
    assert_eq!(second.round_number, 2);
    for id in &first.benched {
        assert!(second.matches[0].contains(*id));
    }
    for id in &second.benched {
        let p = session.participant(*id).unwrap();
        assert_eq!(p.consecutive_rounds_sat_out, 1);
    }
}

#[tokio::test]
async fn test_sit_out_request_applies_to_one_round() {
    let orch = orchestrator();
    let session = orch.create_session(&names(5), Some(1)).await.unwrap();
    let resting = session.participants[3].id;

    let session = orch.toggle_sit_out(session.id, resting).await.unwrap();
    assert!(session.participant(resting).unwrap().sit_out_next_round);

    let session = orch.start_round(session.id).await.unwrap();
    assert_eq!(current(&session).benched, vec![resting]);
    assert!(!session.participant(resting).unwrap().sit_out_next_round);
}

#[tokio::test]
async fn test_round_lifecycle_errors() {
    let orch = orchestrator();
    let session = orch.create_session(&names(4), Some(1)).await.unwrap();

    let err = orch.complete_round(session.id, &[]).await.unwrap_err();
    assert!(matches!(err, RotationError::NoActiveRound));

    let session = orch.start_round(session.id).await.unwrap();
    let err = orch.start_round(session.id).await.unwrap_err();
    assert!(matches!(err, RotationError::RoundInProgress));
    assert_eq!(err.kind(), ErrorKind::State);

    let err = orch.end_session(session.id).await.unwrap_err();
    assert!(matches!(err, RotationError::RoundInProgress));

    let m = &current(&session).matches[0];
    let tie = ScoreInput {
        match_id: m.id,
        team1_score: 11,
        team2_score: 11,
    };
    let err = orch.complete_round(session.id, &[tie]).await.unwrap_err();
    assert!(matches!(err, RotationError::TieNotAllowed { .. }));

    let negative = ScoreInput {
        match_id: m.id,
        team1_score: -1,
        team2_score: 5,
    };
    let err = orch.complete_round(session.id, &[negative]).await.unwrap_err();
    assert!(matches!(err, RotationError::NegativeScore { .. }));

    let runaway = ScoreInput {
        match_id: m.id,
        team1_score: i32::MAX,
        team2_score: 0,
    };
    let err = orch.complete_round(session.id, &[runaway]).await.unwrap_err();
    assert!(matches!(err, RotationError::ScoreOutOfRange { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Rejected submissions left the stored session untouched.
    assert_eq!(orch.get_session(session.id).await.unwrap(), session);
}

#[tokio::test]
async fn test_cancel_then_restart_round() {
    let orch = orchestrator();
    let session = orch.create_session(&names(5), Some(1)).await.unwrap();

    let session = orch.start_round(session.id).await.unwrap();
    let benched = current(&session).benched[0];
    assert_eq!(session.participant(benched).unwrap().rounds_sat_out, 1);

    let session = orch.cancel_round(session.id).await.unwrap();
    assert!(session.current_round.is_none());
    assert_eq!(session.participant(benched).unwrap().rounds_sat_out, 0);

    let session = orch.start_round(session.id).await.unwrap();
    assert_eq!(current(&session).round_number, 1);
}

#[tokio::test]
async fn test_resubmitting_scores_replaces_results() {
    let orch = orchestrator();
    let session = orch.create_session(&names(4), Some(1)).await.unwrap();
    let session = orch.start_round(session.id).await.unwrap();
    let round = current(&session).clone();

    orch.complete_round(session.id, &team1_wins(&round, &[3]))
        .await
        .unwrap();

    let m = &round.matches[0];
    let corrected = ScoreInput {
        match_id: m.id,
        team1_score: 8,
        team2_score: 11,
    };
    let session = orch.complete_round(session.id, &[corrected]).await.unwrap();

    let p = session.participant(m.team1.player1).unwrap();
    assert_eq!((p.wins, p.losses, p.games_played), (0, 1, 1));
    assert_eq!(p.point_differential, -3);

    let history = orch.get_history(session.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!((history[0].team1_score, history[0].team2_score), (8, 11));
    assert_eq!(session.history.partnership_count(m.team1.player1, m.team1.player2), 1);
}

#[tokio::test]
async fn test_roster_changes_during_session() {
    let orch = orchestrator();
    let session = orch.create_session(&names(4), Some(1)).await.unwrap();

    let session = orch.add_participant(session.id, "  Newcomer ").await.unwrap();
    assert_eq!(session.participants.len(), 5);
    let newcomer = session.participants[4].id;

    let err = orch.add_participant(session.id, "newcomer").await.unwrap_err();
    assert!(matches!(err, RotationError::DuplicateName { .. }));
    let err = orch.add_participant(session.id, "<b>").await.unwrap_err();
    assert!(matches!(err, RotationError::InvalidName { .. }));

    let session = orch
        .rename_participant(session.id, newcomer, "Late Arrival")
        .await
        .unwrap();
    assert_eq!(session.participant(newcomer).unwrap().name, "Late Arrival");

    let session = orch.start_round(session.id).await.unwrap();
    let err = orch
        .remove_participant(session.id, newcomer)
        .await
        .unwrap_err();
    assert!(matches!(err, RotationError::ParticipantInActiveRound { .. }));

    let round = current(&session).clone();
    orch.complete_round(session.id, &team1_wins(&round, &[9]))
        .await
        .unwrap();

    let session = orch.remove_participant(session.id, newcomer).await.unwrap();
    assert_eq!(session.participants.len(), 4);

    let err = orch.update_court_count(session.id, 2).await.unwrap_err();
    assert!(matches!(err, RotationError::InsufficientParticipants { .. }));
}

#[tokio::test]
async fn test_court_limit_follows_matchmaking_pool() {
    let orch = orchestrator();
    assert_eq!(orch.config().court_limit(), 12);
    let err = orch.create_session(&names(52), Some(13)).await.unwrap_err();
    assert!(matches!(err, RotationError::InvalidCourtCount { courts: 13, .. }));

    let mut config = RotationConfig::default();
    config.matchmaking.max_pool_size = 20;
    let orch = SessionOrchestrator::with_seed(InMemoryStore::new(), config, 2024);
    let limit = orch.config().court_limit();
    assert_eq!(limit, 5);

    let err = orch.create_session(&names(24), Some(6)).await.unwrap_err();
    assert!(matches!(err, RotationError::InvalidCourtCount { .. }));

    let session = orch.create_session(&names(20), Some(limit)).await.unwrap();
    let session = orch.start_round(session.id).await.unwrap();
    assert_eq!(current(&session).matches.len(), limit);
    assert!(current(&session).benched.is_empty());

    let err = orch
        .update_court_count(session.id, limit + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, RotationError::InvalidCourtCount { .. }));
}

#[tokio::test]
async fn test_end_session_is_terminal() {
    let orch = orchestrator();
    let session = orch.create_session(&names(4), Some(1)).await.unwrap();

    let session = orch.end_session(session.id).await.unwrap();
    assert!(session.ended);

    let err = orch.start_round(session.id).await.unwrap_err();
    assert!(matches!(err, RotationError::SessionEnded));

    // Ended sessions can still be read until they expire or are deleted.
    assert!(orch.get_session(session.id).await.unwrap().ended);
    orch.delete_session(session.id).await.unwrap();
    assert!(matches!(
        orch.get_session(session.id).await,
        Err(RotationError::SessionNotFound { .. })
    ));
}

#[tokio::test]
async fn test_many_rounds_keep_play_fair() {
    let orch = orchestrator();
    let session = orch.create_session(&names(10), Some(2)).await.unwrap();

    for round_number in 1..=5 {
        let session = orch.start_round(session.id).await.unwrap();
        let round = current(&session).clone();
        assert_eq!(round.round_number, round_number);
        assert_eq!(round.matches.len(), 2);
        assert_eq!(round.benched.len(), 2);
        orch.complete_round(session.id, &team1_wins(&round, &[4, 6]))
            .await
            .unwrap();
    }

    let session = orch.get_session(session.id).await.unwrap();
    assert_eq!(session.game_history.len(), 10);
    for p in &session.participants {
        assert_eq!(p.games_played + p.rounds_sat_out, 5);
        assert!(p.rounds_sat_out <= 2, "{} sat out {} times", p.name, p.rounds_sat_out);
        assert!(p.consecutive_rounds_sat_out <= 1);
    }
}
