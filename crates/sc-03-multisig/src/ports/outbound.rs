//! # Outbound Ports
//!
//! Destinations a multisig transaction can call.

use crate::domain::{CallContext, CallFailure};
use async_trait::async_trait;

/// A callable destination - outbound port.
#[async_trait]
pub trait TransactionTarget: Send + Sync {
    /// Decode `payload` and run it with the wallet as caller.
    async fn invoke(
        &self,
        context: CallContext,
        payload: &[u8],
    ) -> Result<serde_json::Value, CallFailure>;
}
