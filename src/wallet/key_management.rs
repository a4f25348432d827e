// src/wallet/key_management.rs
//! Cryptographic key management for identities.
//!
//! Provides generation and usage of signing keys for:
//! - Credential signatures (issuers)
//! - Presentation signatures (holders)
//! - Signature verification against published public keys
//!
//! Uses the following cryptographic primitives:
//! - secp256k1 curve (via `k256` crate)
//! - SHA-256 prehashing (via `ring`)
//! - Caller-supplied cryptographically secure random number generation

use crate::error::{Error, Result};
use crate::utils::crypto::hash_data;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};
use std::fmt;

/// Key pair holder for elliptic curve signatures.
///
/// This struct provides:
/// - Key generation from an injected RNG
/// - Public key export in SEC1 compressed form
/// - Message signing (ECDSA over a SHA-256 prehash)
///
/// # Security Notes
/// - The secret key is never exposed, serialized, or printed (`Debug` omits it)
/// - Cloning copies the key inside the owning process only
#[derive(Clone)]
pub struct KeyManager {
    /// Private signing key (never exposed)
    secret_key: SigningKey,
    /// SEC1 compressed public key bytes
    public_key: Vec<u8>,
}

impl KeyManager {
    /// Generates a new KeyManager with a fresh secp256k1 key pair.
    ///
    /// # Arguments
    /// * `rng` - Cryptographically secure random source
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret_key = SigningKey::random(rng);
        let public_key = secret_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        KeyManager {
            secret_key,
            public_key,
        }
    }

    /// SEC1 compressed public key (33 bytes).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Hex encoding of [`public_key`](Self::public_key).
    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }

    /// Signs a message using ECDSA (secp256k1) with SHA-256 prehashing.
    ///
    /// # Arguments
    /// * `message` - Raw message bytes to sign
    ///
    /// # Returns
    /// 64-byte compact ECDSA signature (R || S values)
    ///
    /// # Process Flow
    /// 1. Hashes message with SHA-256
    /// 2. Signs the hash using deterministic ECDSA (RFC 6979)
    /// 3. Serializes signature in compact format
    pub fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>> {
        let hash = hash_data(message);
        let signature: Signature = self
            .secret_key
            .sign_prehash(&hash)
            .map_err(|e| Error::InvalidSignature(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    /// Signs a message and returns the signature hex-encoded.
    pub fn sign_message_hex(&self, message: &[u8]) -> Result<String> {
        self.sign_message(message).map(hex::encode)
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Verifies a hex-encoded signature over `message` against SEC1 public key bytes.
///
/// # Errors
/// - `InvalidKey` if the public key bytes are not a valid secp256k1 point
/// - `InvalidSignature` if the signature is malformed or does not match
pub fn verify_signature(public_key: &[u8], message: &[u8], signature_hex: &str) -> Result<()> {
    let verifying_key =
        VerifyingKey::from_sec1_bytes(public_key).map_err(|e| Error::InvalidKey(e.to_string()))?;
    let bytes = hex::decode(signature_hex)
        .map_err(|e| Error::InvalidSignature(format!("signature is not hex: {e}")))?;
    let signature = Signature::from_slice(&bytes)
        .map_err(|e| Error::InvalidSignature(format!("malformed signature: {e}")))?;
    verifying_key
        .verify_prehash(&hash_data(message), &signature)
        .map_err(|_| Error::InvalidSignature("signature does not match signer or content".into()))
}
