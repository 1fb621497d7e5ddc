//! # Outbound Ports
//!
//! What the access layer needs from the outside: a ledger gateway, a signer
//! and a wallet that may or may not be connected.

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;
use std::sync::Arc;

use super::records::{RawEventAccount, RawEventRecord};
use crate::domain::{InviteError, TransactionId};

/// A write against the on-chain program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramOperation {
    /// `initializeBdayEvent(name, dateSeconds)`
    InitializeBdayEvent {
        /// Event name
        name: String,
        /// Event date, seconds since epoch
        date_seconds: i64,
        /// Derived event address
        event: Pubkey,
    },
    /// `confirmAttendance(name)`
    ConfirmAttendance {
        /// Event name
        name: String,
        /// Derived event address
        event: Pubkey,
    },
    /// `declineAttendance(name)`
    DeclineAttendance {
        /// Event name
        name: String,
        /// Derived event address
        event: Pubkey,
    },
    /// `addComment(name, text)`
    AddComment {
        /// Event name
        name: String,
        /// Comment body
        text: String,
        /// Derived event address
        event: Pubkey,
    },
}

impl ProgramOperation {
    /// On-chain method name.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::InitializeBdayEvent { .. } => "initializeBdayEvent",
            Self::ConfirmAttendance { .. } => "confirmAttendance",
            Self::DeclineAttendance { .. } => "declineAttendance",
            Self::AddComment { .. } => "addComment",
        }
    }

    /// Address of the event account the operation touches.
    pub fn event(&self) -> &Pubkey {
        match self {
            Self::InitializeBdayEvent { event, .. }
            | Self::ConfirmAttendance { event, .. }
            | Self::DeclineAttendance { event, .. }
            | Self::AddComment { event, .. } => event,
        }
    }

    /// Event name argument.
    pub fn event_name(&self) -> &str {
        match self {
            Self::InitializeBdayEvent { name, .. }
            | Self::ConfirmAttendance { name, .. }
            | Self::DeclineAttendance { name, .. }
            | Self::AddComment { name, .. } => name,
        }
    }
}

/// Ledger gateway - outbound port.
///
/// No retries happen here; callers decide.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Identifier of the program whose accounts this gateway reads.
    fn program_id(&self) -> Pubkey;

    /// Fetch one event account. `Ok(None)` when nothing lives at `address`.
    async fn fetch_event(&self, address: &Pubkey) -> Result<Option<RawEventAccount>, InviteError>;

    /// Fetch every event account of the program. Empty when there are none.
    async fn fetch_all_events(&self) -> Result<Vec<RawEventRecord>, InviteError>;

    /// Sign and submit one operation.
    ///
    /// Fails with [`InviteError::Submission`] on signer rejection or network
    /// failure.
    async fn submit(
        &self,
        operation: &ProgramOperation,
        signer: &dyn TransactionSigner,
    ) -> Result<TransactionId, InviteError>;
}

/// Something that can sign transaction messages.
pub trait TransactionSigner: Send + Sync {
    /// Signing identity.
    fn pubkey(&self) -> Pubkey;

    /// Sign serialized message bytes.
    fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], InviteError>;
}

/// Wallet connection - outbound port.
pub trait WalletProvider: Send + Sync {
    /// The connected signer, if any.
    fn current_signer(&self) -> Option<Arc<dyn TransactionSigner>>;

    /// Whether a signer is connected.
    fn is_connected(&self) -> bool {
        self.current_signer().is_some()
    }
}
