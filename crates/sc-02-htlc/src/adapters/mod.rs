//! # Adapters
//!
//! In-memory chain escrows for the ETH and BTC legs.

pub mod btc_escrow;
pub mod eth_escrow;

pub use btc_escrow::InMemoryBtcEscrow;
pub use eth_escrow::InMemoryEthEscrow;
