//! # Algorithms
//!
//! Pure matching logic, free of locking and storage.

pub mod matching;

pub use matching::*;
