//! Cross-subsystem integration tests.

pub mod multisig;
pub mod restart;
pub mod scenarios;
pub mod swap_flow;
