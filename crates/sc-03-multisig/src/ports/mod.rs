//! # Ports Layer
//!
//! Hexagonal architecture ports for the Multisig Gatekeeper.

pub mod inbound;
pub mod outbound;

pub use inbound::MultisigApi;
pub use outbound::TransactionTarget;
