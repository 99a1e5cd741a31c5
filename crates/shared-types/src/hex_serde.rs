//! Serde helpers rendering fixed-size byte arrays as `0x`-prefixed hex.
//!
//! Use with `#[serde(with = "shared_types::hex_serde")]`.

use serde::{de, Deserialize, Deserializer, Serializer};

/// Serialize a byte array as `0x…` hex.
pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

/// Deserialize a byte array from hex, with or without the `0x` prefix.
pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let raw = hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom)?;
    let len = raw.len();
    raw.try_into()
        .map_err(|_| de::Error::custom(format!("expected {} bytes, got {}", N, len)))
}

/// Same encoding for `Vec<u8>` fields.
pub mod vec {
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize bytes as `0x…` hex.
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    /// Deserialize bytes from hex.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom)
    }
}

/// Same encoding for optional fixed-size arrays; `None` serializes as null.
pub mod option {
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize an optional byte array.
    pub fn serialize<S, const N: usize>(
        value: &Option<[u8; N]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => super::serialize(bytes, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional byte array.
    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<Option<[u8; N]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| -> Result<[u8; N], D::Error> {
            let bytes = hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom)?;
            let len = bytes.len();
            bytes
                .try_into()
                .map_err(|_| de::Error::custom(format!("expected {} bytes, got {}", N, len)))
        })
        .transpose()
    }
}
