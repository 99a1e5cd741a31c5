//! # Adapters
//!
//! Interchange log backends.

pub mod file_log;
pub mod memory_log;

pub use file_log::FileInterchangeLog;
pub use memory_log::InMemoryInterchangeLog;
