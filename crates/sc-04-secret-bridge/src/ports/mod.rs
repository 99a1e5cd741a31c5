//! # Ports Layer
//!
//! Hexagonal architecture ports for the Secret Bridge.

pub mod inbound;
pub mod outbound;

pub use inbound::BridgeApi;
pub use outbound::{CounterpartEscrow, InterchangeLog};
