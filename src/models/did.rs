// src/models/did.rs
//! Decentralized Identifier (DID) data model implementation.
//!
//! Defines the identity owned by a party, the DID Document describing it
//! following the [DID Core Specification](https://www.w3.org/TR/did-core/),
//! and the minimal public record published to a ledger.

use crate::error::{Error, Result};
use crate::wallet::key_management::KeyManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DID method tag used in every identifier (`did:example:...`).
pub const DID_METHOD: &str = "example";

/// Number of hex characters of the public key digest kept in the identifier (128 bits).
pub const IDENTIFIER_DIGEST_LEN: usize = 32;

/// Verification method type for secp256k1 keys.
pub const VERIFICATION_KEY_TYPE: &str = "EcdsaSecp256k1VerificationKey2019";

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// A party's identity: identifier, key pair and creation time.
///
/// The private key lives inside [`KeyManager`] and never leaves the owning
/// process. `Identity` is not `Serialize`; share
/// [`PublicRecord`] or [`DidDocument`] instead.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Human-readable label chosen at onboarding, e.g. "Registro Civil"
    pub label: String,
    pub identifier: String,
    pub keys: KeyManager,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// SEC1 compressed public key bytes.
    pub fn public_key(&self) -> &[u8] {
        self.keys.public_key()
    }

    /// Key reference used in proofs (`<did>#key-1`).
    pub fn key_reference(&self) -> String {
        key_reference(&self.identifier)
    }

    /// Ledger-safe record: identifier and public key only.
    pub fn public_record(&self) -> PublicRecord {
        PublicRecord {
            identifier: self.identifier.clone(),
            public_key_hex: self.keys.public_key_hex(),
            timestamp: self.created_at,
        }
    }

    /// W3C DID Document for this identity.
    pub fn did_document(&self) -> DidDocument {
        let key_id = self.key_reference();
        DidDocument {
            context: DID_CONTEXT.to_string(),
            id: self.identifier.clone(),
            controller: self.identifier.clone(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                method_type: VERIFICATION_KEY_TYPE.to_string(),
                controller: self.identifier.clone(),
                public_key_hex: self.keys.public_key_hex(),
            }],
            authentication: vec![key_id],
            created: self.created_at,
        }
    }
}

/// Key reference for a DID's first (and only) key.
pub fn key_reference(identifier: &str) -> String {
    format!("{identifier}#key-1")
}

/// A DID Document representing a decentralized identity.
///
/// # Fields
/// - `id`: The DID string identifier
/// - `verification_method`: Public keys able to sign for the DID
/// - `authentication`: Key references usable for authentication
///
/// # DID Format
/// The `id` field follows DID syntax:
/// ```text
/// did:<method>:<method-specific-id>
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: String,

    /// The complete DID string identifier
    /// Example: "did:example:3f1c9a0b7e2d4c5f8a6b1e0d9c7b2a41"
    pub id: String,

    pub controller: String,

    pub verification_method: Vec<VerificationMethod>,

    pub authentication: Vec<String>,

    pub created: DateTime<Utc>,
}

/// A public key entry inside a DID Document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    pub public_key_hex: String,
}

/// What a ledger learns about an identity: identifier and public key.
///
/// Contains no personal data and no private key material.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicRecord {
    pub identifier: String,
    pub public_key_hex: String,
    pub timestamp: DateTime<Utc>,
}

impl PublicRecord {
    /// Decodes the hex public key into SEC1 bytes.
    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.public_key_hex)
            .map_err(|e| Error::InvalidKey(format!("{}: {e}", self.identifier)))
    }
}
