//! # Handlers
//!
//! - `swap_flow` - drives a batch through the four subsystems
//! - `operator_api` - method dispatch for the operator surface

pub mod operator_api;
pub mod swap_flow;

pub use operator_api::{ApiError, OperatorApi, OperatorRequest, OperatorResponse};
pub use swap_flow::{
    BatchReport, FlowError, GatedCall, SwapFlow, TradeReport, TradeStatus,
};
