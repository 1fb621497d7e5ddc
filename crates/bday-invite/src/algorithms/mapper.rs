//! # View Model Mapper
//!
//! Pure mapping from raw accounts to display models. Numeric fields are
//! normalized at this boundary; anything that cannot be normalized is a
//! mapping error, never a silent zero.

use chrono::{DateTime, Utc};
use solana_program::pubkey::Pubkey;
use std::str::FromStr;

use crate::domain::{BirthdayEvent, Comment, InviteError};
use crate::ports::{RawComment, RawEventRecord};

/// Parse a base58 identity field.
pub fn parse_identity(field: &'static str, text: &str) -> Result<Pubkey, InviteError> {
    Pubkey::from_str(text).map_err(|e| InviteError::Mapping {
        field,
        reason: format!("{}: {:?}", e, text),
    })
}

/// Map one event record.
pub fn map_event(record: &RawEventRecord) -> Result<BirthdayEvent, InviteError> {
    let account = &record.account;
    let address = record.address.to_string();

    Ok(BirthdayEvent {
        id: address.clone(),
        address,
        name: account.event_name.clone(),
        date_seconds: account.event_date.to_i64("eventDate")?,
        creator: parse_identity("creator", &account.creator)?,
        coming: account.coming_count.to_u64("comingCount")?,
        busy: account.busy_count.to_u64("busyCount")?,
        total_comments: account.comment_count() as u64,
    })
}

/// Outcome of mapping an event list.
#[derive(Debug, Default)]
pub struct MappedEvents {
    /// Mapped events, in record order
    pub events: Vec<BirthdayEvent>,
    /// Records left out, with the reason
    pub skipped: Vec<(Pubkey, InviteError)>,
}

/// Map a list of event records. A record that cannot be mapped is set aside
/// and the rest are still returned.
pub fn map_events(records: &[RawEventRecord]) -> MappedEvents {
    let mut mapped = MappedEvents::default();
    for record in records {
        match map_event(record) {
            Ok(event) => mapped.events.push(event),
            Err(e) => mapped.skipped.push((record.address, e)),
        }
    }
    mapped
}

/// Map the comments of an event.
///
/// `observed_at` stamps every comment; a missing list maps to an empty one.
/// Comments without a sequence number take their position instead.
pub fn map_comments(
    comments: Option<&[RawComment]>,
    observed_at: DateTime<Utc>,
) -> Result<Vec<Comment>, InviteError> {
    let Some(comments) = comments else {
        return Ok(Vec::new());
    };

    comments
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let id = match &raw.comment_id {
                Some(n) => n.to_u64("commentId")?,
                None => index as u64,
            };
            Ok(Comment {
                id,
                author: parse_identity("commentAuthor", &raw.comment_author)?,
                text: raw.content.clone(),
                observed_at,
            })
        })
        .collect()
}
