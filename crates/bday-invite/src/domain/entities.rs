//! # Domain Entities
//!
//! Display-ready view models. The ledger owns the real records; these are
//! transient copies replaced wholesale on every re-fetch.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use super::value_objects::{serde_pubkey, TransactionId};
use super::InviteError;

/// A birthday event as shown to users.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayEvent {
    /// Derived address as base58 text.
    pub id: String,
    /// Same as `id`; kept separate so presentation code can key on either.
    pub address: String,
    /// Event name (≤ 32 bytes).
    pub name: String,
    /// Event date in seconds since the Unix epoch.
    pub date_seconds: i64,
    /// Identity that created the event and keys its address.
    #[serde(with = "serde_pubkey")]
    pub creator: Pubkey,
    /// Confirmed attendees.
    pub coming: u64,
    /// Declined attendees.
    pub busy: u64,
    /// Comments stored on the event.
    pub total_comments: u64,
}

impl BirthdayEvent {
    /// Event date as a UTC timestamp, `None` if out of chrono's range.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.date_seconds, 0).single()
    }

    /// Everyone who answered, either way.
    pub fn total_attendees(&self) -> u64 {
        self.coming.saturating_add(self.busy)
    }

    /// Whether the event date is still ahead of `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.date_seconds > now.timestamp()
    }
}

/// A comment on an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Sequence number assigned by the program.
    pub id: u64,
    /// Comment author.
    #[serde(with = "serde_pubkey")]
    pub author: Pubkey,
    /// Comment body (≤ 500 characters).
    pub text: String,
    /// Local wall-clock time of the fetch that produced this copy.
    /// Not authoritative.
    pub observed_at: DateTime<Utc>,
}

/// Summary of the selected event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventStats {
    /// Event name.
    pub event_name: String,
    /// `coming + busy`.
    pub total_attendees: u64,
    /// Confirmed attendees.
    pub coming: u64,
    /// Declined attendees.
    pub busy: u64,
    /// Comment count from the event record.
    pub comments: u64,
    /// Comments currently loaded for the event.
    pub comments_list: Vec<Comment>,
}

impl EventStats {
    /// Build stats from an event and its loaded comments.
    pub fn new(event: &BirthdayEvent, comments: Vec<Comment>) -> Self {
        Self {
            event_name: event.name.clone(),
            total_attendees: event.total_attendees(),
            coming: event.coming,
            busy: event.busy,
            comments: event.total_comments,
            comments_list: comments,
        }
    }
}

/// Non-throwing result handed to the presentation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    /// Whether the operation went through.
    pub success: bool,
    /// Error text on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Transaction signature on success (or on an unconfirmed write).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl OperationResult {
    /// Successful submission.
    pub fn ok(tx: &TransactionId) -> Self {
        Self {
            success: true,
            error: None,
            tx_hash: Some(tx.to_string()),
        }
    }

    /// Failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            tx_hash: None,
        }
    }
}

impl From<InviteError> for OperationResult {
    fn from(err: InviteError) -> Self {
        let tx_hash = match &err {
            InviteError::UnconfirmedWrite { tx, .. } => Some(tx.to_string()),
            _ => None,
        };
        Self {
            success: false,
            error: Some(err.to_string()),
            tx_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> BirthdayEvent {
        BirthdayEvent {
            id: "addr".to_string(),
            address: "addr".to_string(),
            name: "Alice's 30th".to_string(),
            date_seconds: 4_070_908_800,
            creator: Pubkey::new_unique(),
            coming: 3,
            busy: 2,
            total_comments: 1,
        }
    }

    #[test]
    fn test_total_attendees() {
        assert_eq!(sample_event().total_attendees(), 5);
    }

    #[test]
    fn test_date_conversion() {
        let date = sample_event().date().unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2099-01-01");
    }

    #[test]
    fn test_is_upcoming() {
        let event = sample_event();
        assert!(event.is_upcoming(Utc::now()));
        let later = Utc.timestamp_opt(event.date_seconds, 0).unwrap();
        assert!(!event.is_upcoming(later));
    }

    #[test]
    fn test_stats_from_event() {
        let stats = EventStats::new(&sample_event(), Vec::new());
        assert_eq!(stats.event_name, "Alice's 30th");
        assert_eq!(stats.total_attendees, 5);
        assert_eq!(stats.comments, 1);
        assert!(stats.comments_list.is_empty());
    }

    #[test]
    fn test_operation_result_from_unconfirmed_keeps_tx() {
        let result = OperationResult::from(InviteError::UnconfirmedWrite {
            tx: TransactionId::new("sig"),
            attempts: 3,
        });
        assert!(!result.success);
        assert_eq!(result.tx_hash.as_deref(), Some("sig"));
    }

    #[test]
    fn test_event_serializes_creator_as_text() {
        let event = sample_event();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["creator"], event.creator.to_string());
        let back: BirthdayEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
