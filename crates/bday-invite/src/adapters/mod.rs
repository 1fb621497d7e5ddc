//! # Adapters Layer
//!
//! - `InMemoryLedger`: local ledger with visibility lag, for tests and demos
//! - `RpcLedgerGateway`: JSON-RPC ledger node client
//! - `KeypairSigner` / `LocalWallet`: signing and wallet connection

pub mod codec;
pub mod in_memory;
pub mod rpc_gateway;
mod rpc_types;
pub mod wallet;

pub use in_memory::InMemoryLedger;
pub use rpc_gateway::{RpcError, RpcLedgerGateway};
pub use wallet::{KeypairSigner, LocalWallet};
