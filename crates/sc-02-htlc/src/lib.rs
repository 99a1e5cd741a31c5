//! # SC-02 HTLC Coordinator
//!
//! Hash-time-locked escrows on the ETH and BTC legs of a swap.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Each lock escrows an amount from a sender, commits to the hash of a
//! preimage and an absolute timelock, and ends in exactly one of:
//! - **Withdrawn**: the recipient presented the preimage (keccak256 on ETH,
//!   sha256 on BTC).
//! - **Refunded**: the timelock was reached and the sender took the funds back.
//!
//! Both legs of one trade commit to the same preimage, so a withdraw on one
//! chain publishes what the counterparty needs on the other.
//!
//! ## Safety Rules
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Single terminal transition | per-lock async mutex + `LockState::can_transition_to` |
//! | Timelock ordering | leg claimed second expires after leg claimed first + margin |
//! | Chain-confirmed state | lock recorded after escrow, settled after payout |
//! | BTC script limits | locktime fits nLockTime, amount fits satoshi |
//!
//! ## Module Structure
//!
//! ```text
//! sc-02-htlc/
//! ├── domain/          # Lock, LockState, Participant, errors, invariants
//! ├── algorithms/      # Lock ids, BTC redeem script
//! ├── ports/           # HtlcApi, ChainEscrow
//! ├── adapters/        # In-memory ETH and BTC escrows
//! └── service.rs       # HtlcCoordinator
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryBtcEscrow, InMemoryEthEscrow};
pub use algorithms::{build_htlc_script, derive_lock_id, escrow_address, owner_address};
pub use domain::{
    invariant_pairing, invariant_timelock_ordering, EscrowReceipt, HtlcError, Lock, LockId,
    LockParams, LockState, Participant, Settlement, Utxo,
};
pub use ports::{ChainEscrow, HtlcApi};
pub use service::{HtlcConfig, HtlcCoordinator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
