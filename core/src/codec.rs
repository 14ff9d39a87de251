//! JSON encoding and decoding for storage payloads.
//!
//! # Design
//! Plain module-level functions over `serde_json`; there is no shared codec
//! instance or global configuration. Record invariants live on the types
//! themselves (see [`crate::types`]), so `decode` enforces them for free.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Decode a JSON payload into `T`. Unknown fields are ignored.
pub fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(raw)?)
}

/// Encode `value` as compact JSON. Absent optional fields are omitted.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Decode a JSON object into an untyped map for ad-hoc lookups.
pub fn decode_map(raw: &[u8]) -> Result<Map<String, Value>, DecodeError> {
    decode(raw)
}

/// Extract a single string field such as `"message"` from a JSON object.
pub fn decode_field(raw: &[u8], field: &'static str) -> Result<String, DecodeError> {
    let mut map = decode_map(raw)?;
    match map.remove(field) {
        Some(Value::String(value)) => Ok(value),
        _ => Err(DecodeError::MissingField(field)),
    }
}

/// Interpret a raw body as UTF-8 text.
pub fn decode_text(raw: Vec<u8>) -> Result<String, DecodeError> {
    Ok(String::from_utf8(raw)?)
}
