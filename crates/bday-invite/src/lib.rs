//! # Birthday Invite Data Access
//!
//! Client-side access layer for an on-chain birthday invitation program.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Talk to an invite program that already exists on chain:
//! - Derive event account addresses from `(name, "EVENT_SEED", creator)`
//! - Read event accounts and map them into view models
//! - Submit writes and reconcile them by polling until they are visible
//! - Keep selection, RSVP and polling state for a presentation layer
//!
//! ## Write Protocol
//!
//! | Phase | What happens |
//! |-------|--------------|
//! | Validate | Name, date and comment checks; nothing is sent on failure |
//! | Submit | Derive the event address, sign, send |
//! | Reconcile | Settle delay, then exponential backoff until visible or `UnconfirmedWrite` |
//!
//! ## Module Structure
//!
//! ```text
//! bday-invite/
//! ├── domain/          # Events, comments, RSVP status, errors, validation
//! ├── algorithms/      # Address derivation, mapping, reconciliation, formatting
//! ├── ports/           # Feature API (inbound) + ledger, signer, wallet (outbound)
//! ├── adapters/        # In-memory ledger, JSON-RPC gateway, keypair wallet
//! ├── application/     # DataAccessService, FeatureService, shared state
//! └── config.rs        # InviteConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryLedger, KeypairSigner, LocalWallet, RpcLedgerGateway};
pub use algorithms::{
    await_visible, derive_event_address, event_seeds, map_comments, map_event, map_events,
    ReconcilePolicy,
};
pub use application::{DataAccessService, FeatureService, InviteState, SharedState};
pub use config::InviteConfig;
pub use domain::{
    BirthdayEvent, Comment, EventStats, InviteError, OperationResult, RsvpStatus, TransactionId,
    EVENT_SEED, MAX_COMMENT_TEXT, MAX_EVENT_NAME,
};
pub use ports::{
    InviteFeatureApi, LedgerGateway, ProgramOperation, RawComment, RawEventAccount,
    RawEventRecord, RawNumber, TransactionSigner, WalletProvider,
};

pub use solana_program::pubkey::Pubkey;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
