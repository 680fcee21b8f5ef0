//! Canonical CBOR encoding for version records.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! The same version always produces identical bytes, and therefore an identical
//! digest, on every platform.

use ciborium::value::Value;

use crate::error::CoreError;
use crate::types::DocumentId;
use crate::version::Version;

/// Version field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const DOCUMENT_ID: u64 = 0;
    pub const INDEX: u64 = 1;
    pub const CONTENT_ID: u64 = 2;
    pub const AUTHOR: u64 = 3;
    pub const TIMESTAMP: u64 = 4;
    pub const NOTE: u64 = 5;
    pub const PREV_DIGEST: u64 = 6;
}

/// Encode the sealed fields of a version to canonical CBOR bytes.
///
/// The version's own `digest` is not part of the encoding.
pub fn canonical_version_bytes(
    document_id: DocumentId,
    version: &Version,
) -> Result<Vec<u8>, CoreError> {
    let value = version_to_cbor_value(document_id, version);
    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value)?;
    Ok(buf)
}

/// Convert a version to a CBOR Value (map with integer keys).
fn version_to_cbor_value(document_id: DocumentId, version: &Version) -> Value {
    let entries = vec![
        (
            Value::Integer(keys::DOCUMENT_ID.into()),
            Value::Integer(document_id.get().into()),
        ),
        (
            Value::Integer(keys::INDEX.into()),
            Value::Integer(version.index.into()),
        ),
        (
            Value::Integer(keys::CONTENT_ID.into()),
            Value::Text(version.content_id.as_str().to_owned()),
        ),
        (
            Value::Integer(keys::AUTHOR.into()),
            Value::Text(version.author.as_str().to_owned()),
        ),
        (
            Value::Integer(keys::TIMESTAMP.into()),
            Value::Integer(version.timestamp.into()),
        ),
        (
            Value::Integer(keys::NOTE.into()),
            Value::Text(version.note.clone()),
        ),
        (
            Value::Integer(keys::PREV_DIGEST.into()),
            Value::Bytes(version.prev_digest.0.to_vec()),
        ),
    ];

    Value::Map(entries)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => {
            return Err(CoreError::EncodingError(
                "unsupported CBOR value type".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), CoreError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut pairs: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}
