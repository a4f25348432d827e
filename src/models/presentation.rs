// src/models/presentation.rs
//! Verifiable Presentation data model.
//!
//! A presentation is a holder-signed, selectively redacted view of one or
//! more credentials, scoped to one recipient and one purpose.

use crate::models::credential::VerifiableCredential;
use crate::models::proof::Proof;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PRESENTATION_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// Unsigned presentation record, the payload covered by the holder signature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Holder DID
    pub holder: String,

    /// Derived credentials with hidden claims replaced by commitments
    pub verifiable_credential: Vec<VerifiableCredential>,

    /// Why the holder is sharing, e.g. "Rental application"
    pub purpose: String,

    /// Verifier DID this presentation is addressed to
    pub recipient: String,

    /// Keys disclosed verbatim. With several credentials this is the union
    /// over all of them, so a key may also appear in `hidden_attributes`.
    pub revealed_attributes: Vec<String>,

    /// Keys replaced by commitments, unioned like `revealed_attributes`.
    /// Within one credential the two sets are always disjoint.
    pub hidden_attributes: Vec<String>,

    pub created: DateTime<Utc>,

    /// Random anti-replay nonce
    pub challenge: String,
}

/// A presentation together with the holder's proof.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifiablePresentation {
    #[serde(flatten)]
    pub presentation: Presentation,

    pub proof: Proof,
}

impl VerifiablePresentation {
    pub fn holder(&self) -> &str {
        &self.presentation.holder
    }

    pub fn credentials(&self) -> &[VerifiableCredential] {
        &self.presentation.verifiable_credential
    }
}
