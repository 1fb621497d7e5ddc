//! # Algorithms Module
//!
//! - `address`: program-derived event addresses
//! - `mapper`: raw account → view model
//! - `reconcile`: poll-until-visible after a write
//! - `format`: display helpers

pub mod address;
pub mod format;
pub mod mapper;
pub mod reconcile;

pub use address::{derive_event_address, event_seeds};
pub use format::{explorer_link, format_date, format_time, truncate_address};
pub use mapper::{map_comments, map_event, map_events, parse_identity, MappedEvents};
pub use reconcile::{await_visible, ReconcilePolicy};
