//! # Raw Records
//!
//! Account shapes exactly as a gateway hands them over, before mapping.
//! Field names follow the camelCase an account client emits.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::domain::value_objects::serde_pubkey;
use crate::domain::InviteError;

/// A numeric field in one of the shapes a gateway may produce.
///
/// Machine-sized values arrive as JSON numbers; 64-bit values from some
/// clients arrive wrapped as big-integer text (decimal or `0x` hex).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    /// Plain machine-sized number.
    Int(i64),
    /// Big-integer wrapper rendered as text.
    Big(String),
    /// Anything else. Always a mapping failure unless it is a JSON number
    /// that fits `u64`.
    Other(serde_json::Value),
}

impl RawNumber {
    /// Normalize to an unsigned integer.
    pub fn to_u64(&self, field: &'static str) -> Result<u64, InviteError> {
        match self {
            Self::Int(n) => u64::try_from(*n).map_err(|_| InviteError::Mapping {
                field,
                reason: format!("negative value {}", n),
            }),
            Self::Big(text) => parse_big(text)
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| InviteError::Mapping {
                    field,
                    reason: format!("not an unsigned 64-bit integer: {:?}", text),
                }),
            Self::Other(value) => value.as_u64().ok_or_else(|| unrecognized(field, value)),
        }
    }

    /// Normalize to a signed integer.
    pub fn to_i64(&self, field: &'static str) -> Result<i64, InviteError> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Big(text) => parse_big(text)
                .and_then(|n| i64::try_from(n).ok())
                .ok_or_else(|| InviteError::Mapping {
                    field,
                    reason: format!("not a signed 64-bit integer: {:?}", text),
                }),
            Self::Other(value) => value.as_i64().ok_or_else(|| unrecognized(field, value)),
        }
    }
}

impl From<u64> for RawNumber {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(small) => Self::Int(small),
            Err(_) => Self::Big(n.to_string()),
        }
    }
}

impl From<i64> for RawNumber {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

fn parse_big(text: &str) -> Option<i128> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn unrecognized(field: &'static str, value: &serde_json::Value) -> InviteError {
    InviteError::Mapping {
        field,
        reason: format!("unrecognized numeric shape {}", value),
    }
}

/// A comment inside an event account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    /// Sequence number; older accounts may omit it.
    #[serde(default)]
    pub comment_id: Option<RawNumber>,
    /// Author identity, base58.
    pub comment_author: String,
    /// Comment body.
    pub content: String,
}

/// Body of a `BirthdayEvent` account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventAccount {
    /// Event name.
    pub event_name: String,
    /// Event date, seconds since epoch.
    pub event_date: RawNumber,
    /// Creator identity, base58.
    pub creator: String,
    /// Confirmed attendees.
    pub coming_count: RawNumber,
    /// Declined attendees.
    pub busy_count: RawNumber,
    /// Comments; absent means none.
    #[serde(default)]
    pub comments: Option<Vec<RawComment>>,
}

impl RawEventAccount {
    /// Number of comments present, treating a missing list as empty.
    pub fn comment_count(&self) -> usize {
        self.comments.as_ref().map_or(0, Vec::len)
    }
}

/// An event account together with its address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Account address.
    #[serde(with = "serde_pubkey")]
    pub address: Pubkey,
    /// Account body.
    pub account: RawEventAccount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_native_number_deserializes_as_int() {
        let n: RawNumber = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(n, RawNumber::Int(42));
        assert_eq!(n.to_u64("x").unwrap(), 42);
    }

    #[test]
    fn test_big_integer_text_normalizes() {
        let n: RawNumber = serde_json::from_value(json!("4070908800")).unwrap();
        assert_eq!(n.to_i64("eventDate").unwrap(), 4_070_908_800);

        let hex: RawNumber = serde_json::from_value(json!("0xf2a3b500")).unwrap();
        assert_eq!(hex.to_u64("eventDate").unwrap(), 0xf2a3_b500);
    }

    #[test]
    fn test_large_json_number_falls_back() {
        let n: RawNumber = serde_json::from_value(json!(u64::MAX)).unwrap();
        assert_eq!(n.to_u64("x").unwrap(), u64::MAX);
        assert!(n.to_i64("x").is_err());
    }

    #[test]
    fn test_unrecognized_shape_is_mapping_error() {
        let n: RawNumber = serde_json::from_value(json!({"words": [1, 2]})).unwrap();
        assert!(matches!(
            n.to_u64("comingCount"),
            Err(InviteError::Mapping { field: "comingCount", .. })
        ));
    }

    #[test]
    fn test_negative_count_rejected() {
        assert!(RawNumber::Int(-1).to_u64("busyCount").is_err());
        assert_eq!(RawNumber::Big("-5".into()).to_i64("eventDate").unwrap(), -5);
    }

    #[test]
    fn test_from_u64_wraps_large_values() {
        assert_eq!(RawNumber::from(7u64), RawNumber::Int(7));
        assert_eq!(
            RawNumber::from(u64::MAX),
            RawNumber::Big(u64::MAX.to_string())
        );
    }

    #[test]
    fn test_account_without_comments() {
        let account: RawEventAccount = serde_json::from_value(json!({
            "eventName": "Party",
            "eventDate": "4070908800",
            "creator": "11111111111111111111111111111111",
            "comingCount": 0,
            "busyCount": 0
        }))
        .unwrap();
        assert!(account.comments.is_none());
        assert_eq!(account.comment_count(), 0);
    }
}
