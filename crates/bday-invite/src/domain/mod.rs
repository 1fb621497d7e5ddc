//! # Domain Module
//!
//! Core types for the invite access layer.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::{
    RsvpStatus, TransactionId, EVENT_SEED, MAX_COMMENT_TEXT, MAX_EVENT_NAME,
};
