//! # Ports Layer
//!
//! Hexagonal architecture ports for the HTLC Coordinator.

pub mod inbound;
pub mod outbound;

pub use inbound::HtlcApi;
pub use outbound::ChainEscrow;
