// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! This module provides issuance and revocation of verifiable credentials.
//!
//! An issuance produces three things:
//! - The signed credential, handed to the subject and stored off-ledger
//! - The content hash of the unsigned record
//! - An anchor record (hash and identifiers only) that may be published
//!
//! Personal data never reaches the ledger.

use crate::blockchain::ledger::Ledger;
use crate::error::{Error, Result};
use crate::models::credential::{
    AnchorRecord, Credential, CredentialSubject, IssuedCredential, RevocationRecord,
    VerifiableCredential, BASE_CREDENTIAL_TYPE, CREDENTIAL_CONTEXTS, RESERVED_CLAIM,
};
use crate::models::did::Identity;
use crate::models::proof::{Proof, ProofPurpose};
use crate::utils::clock::Clock;
use crate::utils::crypto::hash_hex;
use crate::utils::serialization::canonicalize;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Validity applied when a request carries no explicit expiry.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// What the issuer is asked to attest.
///
/// # Fields
/// - `subject_identifier`: DID of the credential subject
/// - `credential_type`: specific type added next to `VerifiableCredential`
/// - `claims`: attribute name to value, must be non-empty and must not use `id`
/// - `expiry`: explicit expiration; defaults to issuance time plus the issuer's validity
#[derive(Debug, Clone)]
pub struct CredentialRequest {
    pub subject_identifier: String,
    pub credential_type: String,
    pub claims: BTreeMap<String, String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialRequest {
    pub fn new(subject_identifier: impl Into<String>, credential_type: impl Into<String>) -> Self {
        CredentialRequest {
            subject_identifier: subject_identifier.into(),
            credential_type: credential_type.into(),
            claims: BTreeMap::new(),
            expiry: None,
        }
    }

    /// Adds one claim.
    pub fn claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(key.into(), value.into());
        self
    }

    /// Adds several claims at once.
    pub fn claims<K, V>(mut self, claims: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.claims
            .extend(claims.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn expires_at(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// Service issuing and revoking credentials on behalf of an issuer identity.
///
/// The service holds no mutable state, so one instance can issue from many
/// threads at once; only the issuer's key material is shared, read-only.
#[derive(Clone)]
pub struct CredentialIssuer {
    clock: Arc<dyn Clock>,
    validity: Duration,
}

impl CredentialIssuer {
    /// Creates a new CredentialIssuer with the default one-year validity.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            validity: Duration::days(DEFAULT_VALIDITY_DAYS),
        }
    }

    /// Overrides the validity used when a request has no explicit expiry.
    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Issues a new signed credential.
    ///
    /// # Arguments
    /// * `issuer` - Identity whose private key signs the credential
    /// * `request` - Subject, type, claims and optional expiry
    /// * `rng` - Secure random source for the credential id
    ///
    /// # Returns
    /// The signed credential, its content hash and the anchor record
    ///
    /// # Errors
    /// - `InvalidClaims` if claims are empty, use the reserved `id` key or an empty key
    /// - `InvalidExpiry` if the expiry is not strictly after the issuance time
    pub fn issue_credential<R: RngCore + CryptoRng>(
        &self,
        issuer: &Identity,
        request: CredentialRequest,
        rng: &mut R,
    ) -> Result<IssuedCredential> {
        validate_claims(&request.claims)?;

        let issued_at = self.clock.now();
        let expires_at = request.expiry.unwrap_or(issued_at + self.validity);
        if expires_at <= issued_at {
            return Err(Error::InvalidExpiry {
                issued_at,
                expires_at,
            });
        }

        let credential = Credential {
            context: CREDENTIAL_CONTEXTS.iter().map(|c| c.to_string()).collect(),
            id: new_credential_id(rng),
            types: vec![
                BASE_CREDENTIAL_TYPE.to_string(),
                request.credential_type.clone(),
            ],
            issuer: issuer.identifier.clone(),
            issuance_date: issued_at,
            expiration_date: expires_at,
            credential_subject: CredentialSubject {
                id: request.subject_identifier.clone(),
                claims: request.claims,
            },
        };

        let payload = canonicalize(&credential)?;
        let signature = issuer.keys.sign_message_hex(&payload)?;
        let content_hash = hash_hex(&payload);

        let anchor_record = AnchorRecord {
            content_hash: content_hash.clone(),
            issuer_identifier: issuer.identifier.clone(),
            subject_identifier: request.subject_identifier,
            credential_type: request.credential_type,
            timestamp: issued_at,
        };

        info!(
            "issued credential {} from {} to {}",
            credential.id, credential.issuer, anchor_record.subject_identifier
        );

        Ok(IssuedCredential {
            credential: VerifiableCredential {
                proof: Proof::new(
                    issued_at,
                    issuer.key_reference(),
                    ProofPurpose::AssertionMethod,
                    signature,
                ),
                credential,
            },
            content_hash,
            anchor_record,
        })
    }

    /// Issues a credential and anchors its hash on the ledger.
    pub fn issue_and_anchor<R: RngCore + CryptoRng>(
        &self,
        issuer: &Identity,
        request: CredentialRequest,
        ledger: &dyn Ledger,
        rng: &mut R,
    ) -> Result<IssuedCredential> {
        let issued = self.issue_credential(issuer, request, rng)?;
        ledger.anchor_credential_hash(issued.anchor_record.clone())?;
        Ok(issued)
    }

    /// Builds the revocation record for a credential.
    ///
    /// Pure construction: the record is not signed. Verifiers only honor a
    /// revocation whose `revoked_by` matches the credential's issuer.
    pub fn revoke_credential(
        &self,
        credential_id: &str,
        issuer: &Identity,
        reason: &str,
    ) -> RevocationRecord {
        debug!("revoking {credential_id} by {}", issuer.identifier);
        RevocationRecord {
            credential_id: credential_id.to_string(),
            revoked_by: issuer.identifier.clone(),
            reason: reason.to_string(),
            timestamp: self.clock.now(),
        }
    }

    /// Builds a revocation record and publishes it to the ledger.
    pub fn revoke_and_publish(
        &self,
        credential_id: &str,
        issuer: &Identity,
        reason: &str,
        ledger: &dyn Ledger,
    ) -> Result<RevocationRecord> {
        let record = self.revoke_credential(credential_id, issuer, reason);
        ledger.publish_revocation(record.clone())?;
        Ok(record)
    }
}

fn validate_claims(claims: &BTreeMap<String, String>) -> Result<()> {
    if claims.is_empty() {
        return Err(Error::InvalidClaims("claims must not be empty".into()));
    }
    if claims.contains_key(RESERVED_CLAIM) {
        return Err(Error::InvalidClaims(format!(
            "claim key `{RESERVED_CLAIM}` is reserved for the subject"
        )));
    }
    if claims.keys().any(|k| k.is_empty()) {
        return Err(Error::InvalidClaims("claim keys must not be empty".into()));
    }
    Ok(())
}

fn new_credential_id<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    format!(
        "urn:uuid:{}",
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    )
}
