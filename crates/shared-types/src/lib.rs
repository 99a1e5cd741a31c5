//! # Shared Types Crate
//!
//! Types shared by every subsystem of the swap coordinator.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: amounts, identifiers and hash locks crossing a
//!   subsystem boundary are defined here and nowhere else.
//! - **Absolute Time**: every deadline is an absolute Unix timestamp in
//!   seconds, read through a [`TimeSource`] so tests can drive the clock.
//! - **Classified Errors**: each subsystem error maps onto one [`ErrorClass`].

pub mod entities;
pub mod errors;
pub mod hashing;
pub mod hex_serde;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use hashing::{keccak256, sha256, HashLock};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
