//! # Application Layer
//!
//! - `DataAccessService`: validated ledger operations with reconciliation
//! - `FeatureService`: selection, RSVP and polling for a presentation layer
//! - `InviteState`: the state both share

pub mod data_access;
pub mod feature;
pub mod state;

pub use data_access::DataAccessService;
pub use feature::FeatureService;
pub use state::{InviteState, LoadingGuard, SharedState};
