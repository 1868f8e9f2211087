use crate::utils::error::{Result, RotationError};

pub const MAX_NAME_LENGTH: usize = 30;
const FORBIDDEN_NAME_CHARS: [char; 4] = ['<', '>', '"', '\''];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Trims and checks a participant name, returning the trimmed form.
pub fn validate_participant_name(name: &str) -> Result<String> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(RotationError::InvalidName {
            name: name.to_string(),
            reason: "Name cannot be empty".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(RotationError::InvalidName {
            name: trimmed.to_string(),
            reason: format!("Name must be at most {} characters", MAX_NAME_LENGTH),
        });
    }

    if let Some(c) = trimmed.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(RotationError::InvalidName {
            name: trimmed.to_string(),
            reason: format!("Name cannot contain '{}'", c),
        });
    }

    Ok(trimmed.to_string())
}

/// Case-insensitive duplicate check against the names already taken.
pub fn ensure_unique_name<'a, I>(existing: I, name: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let lowered = name.to_lowercase();
    if existing.into_iter().any(|n| n.to_lowercase() == lowered) {
        return Err(RotationError::DuplicateName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn validate_court_count(courts: usize, participants: usize, max_courts: usize) -> Result<()> {
    if courts == 0 {
        return Err(RotationError::InvalidCourtCount {
            courts,
            reason: "At least one court is required".to_string(),
        });
    }

    if courts > max_courts {
        return Err(RotationError::InvalidCourtCount {
            courts,
            reason: format!("At most {} courts are supported", max_courts),
        });
    }

    if courts * 4 > participants {
        return Err(RotationError::InsufficientParticipants {
            required: courts * 4,
            available: participants,
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(RotationError::Config {
            field: field_name.to_string(),
            message: format!("Value {} must be at least {}", value, min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RotationError::Config {
            field: field_name.to_string(),
            message: format!("Value {} must be between {} and {}", value, min, max),
        });
    }
    Ok(())
}
