//! # Subsystem Container
//!
//! Configuration and the dependency-injected subsystem instances.

pub mod config;
pub mod subsystems;

pub use config::{contracts, load_config, load_config_from, ConfigError, RuntimeConfig};
pub use subsystems::{ContainerError, SwapContainer};
