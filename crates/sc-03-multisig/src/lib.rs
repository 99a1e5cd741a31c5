//! # SC-03 Multisig Gatekeeper
//!
//! k-of-n approval in front of every privileged call.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Workflow
//!
//! ```text
//! submit ──→ confirm × k ──→ execute ──→ TransactionTarget::invoke
//!              (set add)      (one-shot)
//! ```
//!
//! `executed` flips true the first time the gate opens, whatever the wrapped
//! call returns. The call's own outcome is reported in the
//! [`ExecutionReceipt`].
//!
//! ## Module Structure
//!
//! ```text
//! sc-03-multisig/
//! ├── domain/          # OwnerSet, MultisigTransaction, receipts, errors
//! ├── ports/           # MultisigApi, TransactionTarget
//! └── service.rs       # MultisigWallet
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{
    CallContext, CallFailure, ExecutionReceipt, MultisigError, MultisigTransaction, OwnerSet,
    SignerId, TxId,
};
pub use ports::{MultisigApi, TransactionTarget};
pub use service::MultisigWallet;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
