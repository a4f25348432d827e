// src/models/credential.rs
//! Verifiable Credential data model implementation.
//!
//! Defines the credential structure following the
//! [W3C Verifiable Credentials Data Model](https://www.w3.org/TR/vc-data-model/),
//! together with the privacy-preserving records published to a ledger.

use crate::error::Result;
use crate::models::proof::Proof;
use crate::utils::serialization::canonicalize;
use crate::wallet::key_management::verify_signature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type marker present on every credential.
pub const BASE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Default JSON-LD contexts of a credential.
pub const CREDENTIAL_CONTEXTS: [&str; 2] = [
    "https://www.w3.org/2018/credentials/v1",
    "https://www.w3.org/2018/credentials/examples/v1",
];

/// Claim key reserved for the subject reference.
pub const RESERVED_CLAIM: &str = "id";

/// Unsigned credential record.
///
/// This is exactly the payload covered by the issuer signature.
///
/// # Fields
/// - `id`: `urn:uuid:` token unique per issuance
/// - `types`: `["VerifiableCredential", <type>]`
/// - `issuer`: DID of the issuing authority
/// - `credential_subject`: subject DID and claims
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Example: "urn:uuid:123e4567-e89b-12d3-a456-426614174000"
    pub id: String,

    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Example: "did:example:issuer"
    pub issuer: String,

    pub issuance_date: DateTime<Utc>,

    pub expiration_date: DateTime<Utc>,

    pub credential_subject: CredentialSubject,
}

impl Credential {
    /// The specific credential type (the first non-base marker), if any.
    pub fn credential_type(&self) -> Option<&str> {
        self.types
            .iter()
            .map(String::as_str)
            .find(|t| *t != BASE_CREDENTIAL_TYPE)
    }
}

/// Subject of a credential: subject DID plus claims.
///
/// Claims are kept sorted by key so the canonical form is stable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialSubject {
    /// Subject DID
    pub id: String,

    #[serde(flatten)]
    pub claims: BTreeMap<String, String>,
}

/// A credential together with the issuer's proof.
///
/// Derived credentials inside a presentation reuse this type: their claims
/// are partially replaced by commitments while the issuer's original proof
/// is carried along untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifiableCredential {
    #[serde(flatten)]
    pub credential: Credential,

    pub proof: Proof,
}

impl VerifiableCredential {
    pub fn id(&self) -> &str {
        &self.credential.id
    }

    pub fn claims(&self) -> &BTreeMap<String, String> {
        &self.credential.credential_subject.claims
    }

    /// Re-verifies the issuer proof against the full (unredacted) claim set.
    ///
    /// Only meaningful for the credential as issued. A derived credential
    /// fails this check because its claims were redacted.
    pub fn verify_issuer_signature(&self, issuer_public_key: &[u8]) -> Result<()> {
        let payload = canonicalize(&self.credential)?;
        verify_signature(issuer_public_key, &payload, &self.proof.proof_value)
    }
}

/// Metadata anchored on a ledger as proof of issuance.
///
/// Carries the content hash and identifiers only, never claim values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRecord {
    pub content_hash: String,
    pub issuer_identifier: String,
    pub subject_identifier: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of an issuance: the signed credential and what may be published about it.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub credential: VerifiableCredential,
    /// SHA-256 hex digest of the canonical unsigned record
    pub content_hash: String,
    pub anchor_record: AnchorRecord,
}

/// Permanent record that an issuer invalidated a credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRecord {
    pub credential_id: String,
    pub revoked_by: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
