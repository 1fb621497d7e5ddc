//! # Domain Value Objects
//!
//! Constants and small immutable types shared across the layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum event name length, in bytes (the ledger's seed-length limit).
pub const MAX_EVENT_NAME: usize = 32;

/// Maximum comment length, in characters.
pub const MAX_COMMENT_TEXT: usize = 500;

/// Salt mixed into every event address derivation.
pub const EVENT_SEED: &[u8] = b"EVENT_SEED";

/// Local RSVP status for the selected event.
///
/// Not read from the ledger; reset whenever the selection changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    /// No answer given in this session.
    #[default]
    None,
    /// Attendance confirmed.
    Coming,
    /// Attendance declined.
    Busy,
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Coming => "coming",
            Self::Busy => "busy",
        };
        f.write_str(label)
    }
}

/// Signature returned by a successful submission.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a signature string.
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }

    /// Borrow the signature text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serde helpers that write a `Pubkey` as base58 text.
pub(crate) mod serde_pubkey {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_program::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let text = String::deserialize(deserializer)?;
        Pubkey::from_str(&text).map_err(D::Error::custom)
    }
}
