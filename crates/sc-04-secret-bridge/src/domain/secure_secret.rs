//! Batch base secret held in a zeroize-on-drop buffer.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a generated base secret.
pub const SECRET_LEN: usize = 32;

/// Base secret of a batch. `Debug` never prints the bytes.
///
/// Serializes as `0x`-prefixed hex so the interchange log stays readable;
/// that log is the only place the value is written out.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecureSecret {
    bytes: [u8; SECRET_LEN],
}

impl SecureSecret {
    /// Take ownership of raw secret bytes.
    pub fn new(bytes: [u8; SECRET_LEN]) -> Self {
        Self { bytes }
    }

    /// `None` unless `slice` is exactly [`SECRET_LEN`] long.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; SECRET_LEN]>::try_from(slice).ok().map(Self::new)
    }

    /// Raw bytes, for hashing.
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecureSecret(***)")
    }
}

impl TryFrom<String> for SecureSecret {
    type Error = String;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        let digits = encoded.strip_prefix("0x").unwrap_or(&encoded);
        let raw = hex::decode(digits).map_err(|e| format!("secret is not hex: {e}"))?;
        Self::from_slice(&raw)
            .ok_or_else(|| format!("secret must be {SECRET_LEN} bytes, got {}", raw.len()))
    }
}

impl From<SecureSecret> for String {
    fn from(secret: SecureSecret) -> Self {
        format!("0x{}", hex::encode(secret.as_bytes()))
    }
}
