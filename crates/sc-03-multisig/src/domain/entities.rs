//! # Domain Entities
//!
//! Transactions awaiting approval and the receipts of executed ones.

use super::value_objects::{SignerId, TxId};
use serde::{Deserialize, Serialize};
use shared_types::{hex_serde, Address, ErrorClass, Timestamp, U256};
use std::collections::BTreeSet;
use std::fmt;

/// A privileged call awaiting k-of-n approval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigTransaction {
    /// Sequential id.
    pub tx_id: TxId,
    /// Target of the call.
    #[serde(with = "hex_serde")]
    pub destination: Address,
    /// Value forwarded with the call.
    pub value: U256,
    /// Opaque call data handed to the target.
    #[serde(with = "hex_serde::vec")]
    pub payload: Vec<u8>,
    /// Owners who confirmed. A set, so repeats cannot double count.
    #[serde(with = "signer_set")]
    pub confirmations: BTreeSet<SignerId>,
    /// Flips true exactly once, on the first execution attempt past the gate.
    pub executed: bool,
    /// Submitting owner.
    #[serde(with = "hex_serde")]
    pub submitted_by: SignerId,
    /// Submission time.
    pub submitted_at: Timestamp,
    /// Outcome of the wrapped call, once executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ExecutionReceipt>,
}

impl MultisigTransaction {
    /// Number of distinct confirmations.
    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    /// Whether `signer` confirmed.
    pub fn is_confirmed_by(&self, signer: &SignerId) -> bool {
        self.confirmations.contains(signer)
    }
}

/// What the wrapped call reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    /// Owner who fired the gate.
    #[serde(with = "hex_serde")]
    pub executed_by: SignerId,
    /// Whether the wrapped call succeeded.
    pub success: bool,
    /// Structured output of a successful call.
    pub output: serde_json::Value,
    /// Failure message of an unsuccessful call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure class of an unsuccessful call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    /// Execution time.
    pub executed_at: Timestamp,
}

/// Who is calling the target, and with what.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// The wallet's custody address.
    pub caller: Address,
    /// Value forwarded.
    pub value: U256,
    /// Transaction being executed.
    pub tx_id: TxId,
}

/// A wrapped call that did not succeed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFailure {
    /// Message from the target.
    pub reason: String,
    /// Class of the underlying error.
    pub class: ErrorClass,
}

impl CallFailure {
    /// Build a failure.
    pub fn new(class: ErrorClass, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            class,
        }
    }
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.reason)
    }
}

mod signer_set {
    use super::SignerId;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::collections::BTreeSet;

    pub fn serialize<S: Serializer>(set: &BTreeSet<SignerId>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(set.iter().map(|a| format!("0x{}", hex::encode(a))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<SignerId>, D::Error> {
        let raw: Vec<String> = Vec::deserialize(d)?;
        raw.iter()
            .map(|s| {
                shared_types::parse_address(s)
                    .ok_or_else(|| de::Error::custom(format!("invalid signer {}", s)))
            })
            .collect()
    }
}
