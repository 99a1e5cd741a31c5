//! # Adapters
//!
//! Port implementations connecting the subsystems to one another.
//!
//! - [`HtlcTarget`] and [`IntentTarget`] are the multisig's call targets.
//! - [`BtcCounterpart`] lets the secret bridge observe the BTC leg.

pub mod counterpart;
pub mod htlc_target;
pub mod intent_target;

pub use counterpart::BtcCounterpart;
pub use htlc_target::{HtlcCall, HtlcTarget};
pub use intent_target::{IntentCall, IntentTarget};

use sc_03_multisig::{CallContext, CallFailure};
use shared_types::{Classify, ErrorClass, U256};

fn call_failure<E: Classify + std::fmt::Display>(err: E) -> CallFailure {
    CallFailure::new(err.class(), err.to_string())
}

fn decode_failure(err: serde_json::Error) -> CallFailure {
    CallFailure::new(ErrorClass::Validation, format!("malformed payload: {}", err))
}

fn reject_value(context: &CallContext) -> Result<(), CallFailure> {
    if context.value != U256::zero() {
        return Err(CallFailure::new(
            ErrorClass::Validation,
            "call is not payable",
        ));
    }
    Ok(())
}
