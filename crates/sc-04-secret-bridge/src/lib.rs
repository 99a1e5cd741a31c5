//! # SC-04 Cross-Chain Secret Bridge
//!
//! Generates the base secret of each buy-intent batch and hands out the hash
//! pair every lock of the batch commits to: keccak256 for the ETH leg, sha256
//! for the BTC leg.
//!
//! **Subsystem ID:** 4
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Secret Policies
//!
//! | Policy | Preimage of trade `i` | One reveal opens |
//! |--------|-----------------------|------------------|
//! | `SharedHash` | `baseSecret` | every lock of the batch |
//! | `PerTradeSalted` | `baseSecret ‖ be64(i)` | trade `i` only |
//!
//! The policy is declared when a batch is seeded and never changes.
//!
//! ## Interchange Log
//!
//! The only synchronization point between the ETH and BTC sides. It is an
//! append-only event log keyed by buy intent; the interchange document is the
//! fold of a batch's events. Seeding is read-modify-append inside the store,
//! so a re-read batch always keeps its first base secret.
//!
//! ## Module Structure
//!
//! ```text
//! sc-04-secret-bridge/
//! ├── domain/          # SecureSecret, SecretPolicy, InterchangeDocument, events
//! ├── algorithms/      # Secret generation and derivation
//! ├── ports/           # BridgeApi, InterchangeLog, CounterpartEscrow
//! ├── adapters/        # In-memory and JSON-lines logs
//! └── service.rs       # SecretBridge
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{FileInterchangeLog, InMemoryInterchangeLog};
pub use algorithms::{generate_base_secret, hash_lock_for, preimage_for, verify_document};
pub use domain::{
    BridgeError, BuyIntentId, HtlcRecord, InterchangeDocument, InterchangeEvent, SecretPolicy,
    SecureSecret, TradeIndex,
};
pub use ports::{BridgeApi, CounterpartEscrow, InterchangeLog};
pub use service::SecretBridge;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
