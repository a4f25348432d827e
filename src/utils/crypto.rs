// src/utils/crypto.rs
//! Digest utilities shared by identity derivation, anchoring and commitments.
//!
//! Uses SHA-256 (via `ring`) for all operations.

use ring::digest::{digest, SHA256};

/// Prefix marking a claim value that was replaced by its commitment.
pub const COMMITMENT_PREFIX: &str = "hidden:";

/// Computes a SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(digest(&SHA256, data).as_ref());
    out
}

/// Lowercase hex SHA-256 digest (64 characters).
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash_data(data))
}

/// One-way commitment to a claim value: `"hidden:" + sha256_hex(value)`.
///
/// The same value always yields the same commitment, so a verifier who is
/// later told the value can check it against the presentation.
pub fn commitment(value: &str) -> String {
    format!("{COMMITMENT_PREFIX}{}", hash_hex(value.as_bytes()))
}
