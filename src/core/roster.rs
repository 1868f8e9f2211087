use crate::domain::model::{Participant, ParticipantId, Session};
use crate::utils::error::{Result, RotationError};
use crate::utils::validation::{ensure_unique_name, validate_court_count, validate_participant_name};

/// Validates a roster of names and builds fresh participants from it.
pub fn build_roster(names: &[String]) -> Result<Vec<Participant>> {
    let mut participants: Vec<Participant> = Vec::with_capacity(names.len());
    for raw in names {
        let name = validate_participant_name(raw)?;
        ensure_unique_name(participants.iter().map(|p| p.name.as_str()), &name)?;
        participants.push(Participant::new(name));
    }
    Ok(participants)
}

pub fn add_participant(mut session: Session, name: &str) -> Result<Session> {
    let name = validate_participant_name(name)?;
    ensure_unique_name(session.participants.iter().map(|p| p.name.as_str()), &name)?;

    tracing::info!("Session {}: adding participant '{}'", session.id, name);
    session.participants.push(Participant::new(name));
    Ok(session)
}

pub fn remove_participant(mut session: Session, participant_id: ParticipantId) -> Result<Session> {
    let idx = session
        .participants
        .iter()
        .position(|p| p.id == participant_id)
        .ok_or(RotationError::ParticipantNotFound { participant_id })?;

    if session
        .active_round()
        .is_some_and(|round| round.involves(participant_id))
    {
        return Err(RotationError::ParticipantInActiveRound { participant_id });
    }

    let removed = session.participants.remove(idx);
    tracing::info!("Session {}: removed participant '{}'", session.id, removed.name);
    Ok(session)
}

pub fn rename_participant(mut session: Session, participant_id: ParticipantId, name: &str) -> Result<Session> {
    let name = validate_participant_name(name)?;
    ensure_unique_name(
        session
            .participants
            .iter()
            .filter(|p| p.id != participant_id)
            .map(|p| p.name.as_str()),
        &name,
    )?;

    let participant = session
        .participant_mut(participant_id)
        .ok_or(RotationError::ParticipantNotFound { participant_id })?;
    participant.name = name;
    Ok(session)
}

pub fn toggle_sit_out(mut session: Session, participant_id: ParticipantId) -> Result<Session> {
    let participant = session
        .participant_mut(participant_id)
        .ok_or(RotationError::ParticipantNotFound { participant_id })?;
    participant.sit_out_next_round = !participant.sit_out_next_round;

    tracing::debug!(
        "Participant {} sit-out flag now {}",
        participant_id,
        participant.sit_out_next_round
    );
    Ok(session)
}

pub fn update_court_count(mut session: Session, courts: usize, max_courts: usize) -> Result<Session> {
    validate_court_count(courts, session.participants.len(), max_courts)?;
    session.num_courts = courts;
    Ok(session)
}
