//! Canonical ABI tuple encoding for leaf values
//!
//! Leaves are encoded exactly as Solidity's `abi.encode` would encode
//! the same tuple, so leaf hashes (and therefore proofs and roots) are
//! interchangeable with independently built verifiers, on-chain ones
//! included. Each field owns one 32-byte head word; dynamic fields
//! (`string`, `bytes`) put the byte offset of their tail in the head
//! and append a length-prefixed, right-padded tail.

use crate::model::{LeafType, LeafValue};
use crate::{Error, Result};
use serde_json::Value;

const WORD: usize = 32;

/// Encode a value tuple under its type signature
pub fn encode_tuple(signature: &[LeafType], value: &LeafValue) -> Result<Vec<u8>> {
    if signature.len() != value.len() {
        return Err(Error::Encoding(format!(
            "arity mismatch: signature has {} fields, value has {}",
            signature.len(),
            value.len()
        )));
    }

    let head_size = WORD * signature.len();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (ty, field) in signature.iter().zip(value.iter()) {
        if ty.is_dynamic() {
            let data = dynamic_bytes(ty, field)?;
            head.extend_from_slice(&usize_word(head_size + tail.len()));
            tail.extend_from_slice(&usize_word(data.len()));
            tail.extend_from_slice(&data);
            // Right-pad the data to a word boundary
            let rem = data.len() % WORD;
            if rem != 0 {
                tail.resize(tail.len() + WORD - rem, 0);
            }
        } else {
            head.extend_from_slice(&static_word(ty, field)?);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Encode a static field into its 32-byte word
fn static_word(ty: &LeafType, field: &Value) -> Result<[u8; WORD]> {
    match ty {
        LeafType::Address => {
            let s = expect_str(ty, field)?;
            let bytes = parse_hex_bytes(s)?;
            if bytes.len() != 20 {
                return Err(Error::Encoding(format!("invalid address: {}", s)));
            }
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(&bytes);
            Ok(word)
        }
        LeafType::Uint(bits) => {
            let word = parse_uint(field)?;
            check_width(&word, *bits, field)?;
            Ok(word)
        }
        LeafType::Bool => {
            let b = match field {
                Value::Bool(b) => *b,
                Value::String(s) if s == "true" => true,
                Value::String(s) if s == "false" => false,
                other => {
                    return Err(Error::Encoding(format!("invalid bool: {}", other)));
                }
            };
            let mut word = [0u8; WORD];
            word[WORD - 1] = b as u8;
            Ok(word)
        }
        LeafType::FixedBytes(len) => {
            let s = expect_str(ty, field)?;
            let bytes = parse_hex_bytes(s)?;
            if bytes.len() != *len as usize {
                return Err(Error::Encoding(format!(
                    "expected {} bytes for bytes{}, found {}",
                    len,
                    len,
                    bytes.len()
                )));
            }
            let mut word = [0u8; WORD];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(word)
        }
        LeafType::String | LeafType::Bytes => {
            unreachable!("dynamic types are encoded via dynamic_bytes")
        }
    }
}

/// Raw content bytes of a dynamic field
fn dynamic_bytes(ty: &LeafType, field: &Value) -> Result<Vec<u8>> {
    match ty {
        LeafType::String => Ok(expect_str(ty, field)?.as_bytes().to_vec()),
        LeafType::Bytes => parse_hex_bytes(expect_str(ty, field)?),
        _ => unreachable!("static types are encoded via static_word"),
    }
}

/// Parse an unsigned integer field into a 32-byte big-endian word
///
/// Accepts JSON numbers, decimal strings and `0x` hex strings. Decimal
/// strings are converted digit by digit so the full 256-bit range is
/// covered without a bigint dependency.
fn parse_uint(field: &Value) -> Result<[u8; WORD]> {
    match field {
        Value::Number(n) => {
            let v = n
                .as_u64()
                .ok_or_else(|| Error::Encoding(format!("invalid uint: {}", n)))?;
            let mut word = [0u8; WORD];
            word[WORD - 8..].copy_from_slice(&v.to_be_bytes());
            Ok(word)
        }
        Value::String(s) if s.starts_with("0x") => {
            let digits = &s[2..];
            if digits.is_empty() || digits.len() > 64 {
                return Err(Error::Encoding(format!("invalid uint: {}", s)));
            }
            // Left-pad odd-length hex to a full byte
            let padded = if digits.len() % 2 == 1 {
                format!("0{}", digits)
            } else {
                digits.to_string()
            };
            let bytes = hex::decode(&padded)
                .map_err(|e| Error::Encoding(format!("invalid uint {}: {}", s, e)))?;
            let mut word = [0u8; WORD];
            word[WORD - bytes.len()..].copy_from_slice(&bytes);
            Ok(word)
        }
        Value::String(s) => {
            if s.is_empty() {
                return Err(Error::Encoding("invalid uint: empty string".into()));
            }
            let mut word = [0u8; WORD];
            for c in s.chars() {
                let d = c
                    .to_digit(10)
                    .ok_or_else(|| Error::Encoding(format!("invalid uint: {}", s)))?;
                let mut carry = d;
                for b in word.iter_mut().rev() {
                    let v = *b as u32 * 10 + carry;
                    *b = v as u8;
                    carry = v >> 8;
                }
                if carry != 0 {
                    return Err(Error::Encoding(format!("uint overflows 256 bits: {}", s)));
                }
            }
            Ok(word)
        }
        other => Err(Error::Encoding(format!("invalid uint: {}", other))),
    }
}

/// Reject values wider than the declared uint width
fn check_width(word: &[u8; WORD], bits: u16, field: &Value) -> Result<()> {
    let lead = WORD - bits as usize / 8;
    if word[..lead].iter().any(|&b| b != 0) {
        return Err(Error::Encoding(format!(
            "value does not fit in uint{}: {}",
            bits, field
        )));
    }
    Ok(())
}

fn usize_word(v: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(v as u64).to_be_bytes());
    word
}

fn expect_str<'a>(ty: &LeafType, field: &'a Value) -> Result<&'a str> {
    field
        .as_str()
        .ok_or_else(|| Error::Encoding(format!("expected a string for {}: {}", ty, field)))
}

/// Decode a `0x`-prefixed hex string, case-insensitive
fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| Error::Encoding(format!("expected 0x-prefixed hex: {}", s)))?;
    hex::decode(digits).map_err(|e| Error::Encoding(format!("invalid hex {}: {}", s, e)))
}
