//! # Ports Module
//!
//! Inbound API of the Intent Ledger.

pub mod inbound;

pub use inbound::*;
