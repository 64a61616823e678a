//! Leaf values and their type signature

use crate::{Error, Result};
use std::fmt;

/// One leaf record: an ordered tuple of JSON scalars, one per declared
/// field of the tree's type signature
///
/// JSON scalars are the canonical in-memory form because the persisted
/// document stores values as JSON; the encoder parses each scalar under
/// its declared [`LeafType`].
pub type LeafValue = Vec<serde_json::Value>;

/// A declared field type, parsed from a signature tag like `"address"`
/// or `"uint256"`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafType {
    /// 20-byte address, `0x` + 40 hex digits
    Address,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8)
    Uint(u16),
    /// Boolean
    Bool,
    /// UTF-8 string (dynamic)
    String,
    /// Arbitrary byte string, `0x`-hex encoded (dynamic)
    Bytes,
    /// Fixed byte string of the given length (1..=32)
    FixedBytes(u8),
}

impl LeafType {
    /// Parse a single signature tag
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "address" => return Ok(LeafType::Address),
            "bool" => return Ok(LeafType::Bool),
            "string" => return Ok(LeafType::String),
            "bytes" => return Ok(LeafType::Bytes),
            "uint" => return Ok(LeafType::Uint(256)),
            _ => {}
        }
        if let Some(rest) = tag.strip_prefix("uint") {
            let bits: u16 = rest
                .parse()
                .map_err(|_| Error::Encoding(format!("unsupported type tag: {}", tag)))?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(Error::Encoding(format!("invalid uint width: {}", tag)));
            }
            return Ok(LeafType::Uint(bits));
        }
        if let Some(rest) = tag.strip_prefix("bytes") {
            let len: u8 = rest
                .parse()
                .map_err(|_| Error::Encoding(format!("unsupported type tag: {}", tag)))?;
            if len == 0 || len > 32 {
                return Err(Error::Encoding(format!("invalid bytes length: {}", tag)));
            }
            return Ok(LeafType::FixedBytes(len));
        }
        Err(Error::Encoding(format!("unsupported type tag: {}", tag)))
    }

    /// Whether this type uses the dynamic (offset + tail) encoding
    pub fn is_dynamic(&self) -> bool {
        matches!(self, LeafType::String | LeafType::Bytes)
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafType::Address => write!(f, "address"),
            LeafType::Uint(bits) => write!(f, "uint{}", bits),
            LeafType::Bool => write!(f, "bool"),
            LeafType::String => write!(f, "string"),
            LeafType::Bytes => write!(f, "bytes"),
            LeafType::FixedBytes(len) => write!(f, "bytes{}", len),
        }
    }
}

/// Parse an ordered list of signature tags
pub fn parse_signature<S: AsRef<str>>(tags: &[S]) -> Result<Vec<LeafType>> {
    if tags.is_empty() {
        return Err(Error::Encoding("empty type signature".into()));
    }
    tags.iter().map(|t| LeafType::parse(t.as_ref())).collect()
}

/// Render a tuple for error messages
pub(crate) fn display_tuple(value: &[serde_json::Value]) -> String {
    serde_json::Value::Array(value.to_vec()).to_string()
}
