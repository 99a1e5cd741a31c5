//! # Algorithms
//!
//! Lock id derivation and BTC script construction.

pub mod btc_script;
pub mod lock_id;

pub use btc_script::{build_htlc_script, escrow_address, owner_address};
pub use lock_id::derive_lock_id;
