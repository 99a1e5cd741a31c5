//! # Error Types
//!
//! The error taxonomy shared by every subsystem. Each subsystem keeps its own
//! `thiserror` enum and reports which class a variant belongs to through
//! [`Classify`], so callers decide how to react without matching strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse error classes a caller reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Malformed or out-of-range parameters. Rejected before any effect.
    Validation,
    /// The target is not in a state that allows the operation.
    /// Recover by re-querying; never retry blindly.
    StateConflict,
    /// The presented preimage does not hash to the committed value.
    /// The lock is unchanged and the caller may retry.
    HashMismatch,
    /// Custody balance below the aggregate requirement of a batch.
    LiquidityShortfall,
    /// The chain backend could not be reached or refused the call.
    ChainUnavailable,
}

impl ErrorClass {
    /// Whether the same call may be repeated after the caller fixes its input.
    pub fn is_retryable_by_caller(&self) -> bool {
        matches!(self, ErrorClass::HashMismatch | ErrorClass::ChainUnavailable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Validation => "ValidationError",
            ErrorClass::StateConflict => "StateConflict",
            ErrorClass::HashMismatch => "HashMismatch",
            ErrorClass::LiquidityShortfall => "LiquidityShortfall",
            ErrorClass::ChainUnavailable => "ChainUnavailable",
        };
        f.write_str(name)
    }
}

/// Maps a subsystem error onto its [`ErrorClass`].
pub trait Classify {
    /// The class of this error.
    fn class(&self) -> ErrorClass;
}
