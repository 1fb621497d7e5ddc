//! # Domain Invariants
//!
//! Pre-flight checks run before any transaction is built.

use chrono::{DateTime, NaiveDate, Utc};

use super::errors::InviteError;
use super::value_objects::{MAX_COMMENT_TEXT, MAX_EVENT_NAME};

/// Event names are 1..=32 bytes.
pub fn validate_event_name(name: &str) -> Result<(), InviteError> {
    if name.is_empty() || name.len() > MAX_EVENT_NAME {
        return Err(InviteError::Validation(format!(
            "Event name must be 1-{} characters",
            MAX_EVENT_NAME
        )));
    }
    Ok(())
}

/// Names for new events must also contain something other than whitespace.
pub fn validate_new_event_name(name: &str) -> Result<(), InviteError> {
    validate_event_name(name)?;
    if name.trim().is_empty() {
        return Err(InviteError::Validation(
            "Event name is required".to_string(),
        ));
    }
    Ok(())
}

/// Event dates must be strictly after `now`.
pub fn validate_event_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), InviteError> {
    if date <= now {
        return Err(InviteError::Validation(
            "Please select a future date".to_string(),
        ));
    }
    Ok(())
}

/// Comments must contain something other than whitespace and fit in 500 characters.
pub fn validate_comment(text: &str) -> Result<(), InviteError> {
    if text.trim().is_empty() || text.chars().count() > MAX_COMMENT_TEXT {
        return Err(InviteError::Validation(format!(
            "Comment must be 1-{} characters",
            MAX_COMMENT_TEXT
        )));
    }
    Ok(())
}

/// Parse a date string from a form field.
///
/// `YYYY-MM-DD` is read as UTC midnight; anything else must be RFC 3339.
pub fn parse_event_date(text: &str) -> Result<DateTime<Utc>, InviteError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InviteError::Validation("Event date is required".to_string()));
    }

    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| InviteError::Validation(format!("Invalid event date: {}", text)))
}
