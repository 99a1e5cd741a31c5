//! # Algorithms
//!
//! Pure secret derivation logic.

pub mod secret;

pub use secret::{generate_base_secret, hash_lock_for, preimage_for, verify_document};
