// src/utils/serialization.rs
//! Serialization utilities for the trust protocol.
//!
//! Provides serialization and deserialization functions for:
//! - JSON wire form of credentials and presentations
//! - Canonical byte form used for signing and content hashing

use serde::{Deserialize, Serialize};
use serde_json;

/// Serializes a value to a JSON string.
///
/// # Arguments
/// * `data` - The value to serialize (must implement `Serialize`)
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Deserializes a value from a JSON string.
///
/// # Arguments
/// * `data` - JSON string to deserialize
///
/// # Returns
/// - `Ok(T)` with deserialized value on success
/// - `Err(serde_json::Error)` if deserialization fails
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Produces the canonical byte form of a value.
///
/// The value is first lifted into a `serde_json::Value`, whose objects keep
/// their keys sorted, and then written as compact JSON. Two structurally equal
/// values always canonicalize to the same bytes regardless of field order in
/// the source text they were parsed from.
pub fn canonicalize<T: Serialize>(data: &T) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(data)?;
    serde_json::to_vec(&value)
}
