// src/models/proof.rs
//! Detachable proof block shared by credentials and presentations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proof type tag for secp256k1 ECDSA signatures.
pub const PROOF_TYPE: &str = "EcdsaSecp256k1Signature2019";

/// Why a proof was produced.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// Issuer asserting claims in a credential.
    AssertionMethod,
    /// Holder authorizing a presentation.
    Authentication,
}

/// Signature block attached to a signed document.
///
/// The signed payload is always the canonical form of the document with
/// this block removed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    /// Key reference of the signer, e.g. `did:example:abc#key-1`
    pub verification_method: String,
    pub proof_purpose: ProofPurpose,
    /// Hex-encoded compact signature
    pub proof_value: String,
}

impl Proof {
    pub fn new(
        created: DateTime<Utc>,
        verification_method: String,
        proof_purpose: ProofPurpose,
        proof_value: String,
    ) -> Self {
        Proof {
            proof_type: PROOF_TYPE.to_string(),
            created,
            verification_method,
            proof_purpose,
            proof_value,
        }
    }
}
