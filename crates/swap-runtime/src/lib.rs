//! # Swap Coordinator Runtime
//!
//! Wires the subsystems of the BTC <-> ETH swap coordinator and serves the
//! operator API.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and subsystem wiring
//! - `adapters/` - multisig call targets and the BTC counterpart check
//! - `handlers/` - the swap flow and operator method dispatch
//! - `server` - axum routes
//!
//! ## Swap Flow
//!
//! ```text
//! intent_submitBuy / intent_submitSell
//!          │
//!          ↓
//! intent_match ──→ MatchedTrades (one batch per buy intent)
//!          │
//!          ↓
//! htlc_openBatch ──→ seed secret (4) ──→ multisig NewLock (3→2)
//!          │                              multisig AssociateLock (3→1)
//!          ↓
//! htlc_openBtcLeg ──→ BTC P2SH lock, timelock after the ETH lock
//!          │
//!          ↓
//! htlc_withdraw ──→ reveal once BTC is escrowed (4) ──→ multisig Withdraw
//!          │
//!          ↓
//! htlc_claimBtc ──→ preimage read off the ETH leg ──→ BTC withdraw
//! ```
//!
//! Refunds are available on either leg once its timelock has passed.

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod server;

pub use container::{load_config, ContainerError, RuntimeConfig, SwapContainer};
pub use handlers::{OperatorApi, OperatorRequest, OperatorResponse, SwapFlow};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
