//! 32-byte keccak256 digest type

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;

/// A 32-byte keccak256 digest
///
/// Serializes as a `0x`-prefixed hex string, the form the persisted
/// tree document and every external verifier use.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; 32]);

impl Hash {
    /// The zero hash (used as a fill value during tree construction)
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Create a hash from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// keccak256 of arbitrary data
    pub fn keccak256(data: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        Hash(hasher.finalize().into())
    }

    /// keccak256 of multiple concatenated pieces of data
    pub fn keccak256_many(parts: &[&[u8]]) -> Self {
        let mut hasher = Keccak256::new();
        for part in parts {
            hasher.update(part);
        }
        Hash(hasher.finalize().into())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a `0x`-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from a hex string, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| crate::Error::InvalidHash(format!("{}: {}", s, e)))?;
        if bytes.len() != 32 {
            return Err(crate::Error::InvalidHash(format!(
                "expected 32 bytes, found {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }

    /// Get a short prefix for display (first 8 hex digits)
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(de::Error::custom)
    }
}
