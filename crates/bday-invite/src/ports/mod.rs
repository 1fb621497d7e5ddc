//! # Ports Module
//!
//! Hexagonal architecture ports (inbound API, outbound dependencies) and the
//! raw record shapes that cross the outbound boundary.

pub mod inbound;
pub mod outbound;
pub mod records;

pub use inbound::*;
pub use outbound::*;
pub use records::*;
