//! # Domain Errors
//!
//! Error taxonomy for the invite access layer. The `Display` text of each
//! variant is what ends up in the `error` side-channel and in
//! `OperationResult::error`.

use super::value_objects::TransactionId;
use thiserror::Error;

/// Invite access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InviteError {
    /// Local precondition failed. No ledger call was made.
    #[error("{0}")]
    Validation(String),

    /// Program handle or wallet is unavailable.
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Signer rejection or network failure while writing.
    #[error("{0}")]
    Submission(String),

    /// Read failure.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Account does not exist at the derived address.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Raw record could not be mapped into a view model.
    #[error("Cannot map field `{field}`: {reason}")]
    Mapping {
        /// Raw field name
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// The write was submitted but never became visible.
    #[error("Transaction {tx} submitted but not visible after {attempts} checks")]
    UnconfirmedWrite {
        /// Signature of the submitted transaction
        tx: TransactionId,
        /// Visibility checks performed
        attempts: u32,
    },

    /// Configuration value rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl InviteError {
    /// Whether the error was raised before anything was sent to the ledger.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotInitialized(_) | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = InviteError::Validation("Event name must be 1-32 characters".to_string());
        assert_eq!(err.to_string(), "Event name must be 1-32 characters");
    }

    #[test]
    fn test_submission_message_is_verbatim() {
        let err = InviteError::Submission("User rejected the request.".to_string());
        assert_eq!(err.to_string(), "User rejected the request.");
    }

    #[test]
    fn test_mapping_error_names_field() {
        let err = InviteError::Mapping {
            field: "comingCount",
            reason: "negative value -1".to_string(),
        };
        assert!(err.to_string().contains("comingCount"));
    }

    #[test]
    fn test_unconfirmed_write_display() {
        let err = InviteError::UnconfirmedWrite {
            tx: TransactionId::new("5xSig"),
            attempts: 5,
        };
        assert!(err.to_string().contains("5xSig"));
        assert!(err.to_string().contains("5 checks"));
    }

    #[test]
    fn test_is_local() {
        assert!(InviteError::Validation(String::new()).is_local());
        assert!(InviteError::NotInitialized(String::new()).is_local());
        assert!(!InviteError::Submission(String::new()).is_local());
        assert!(!InviteError::Fetch(String::new()).is_local());
    }
}
