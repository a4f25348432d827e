// src/wallet/presentation_builder.rs
//! Selective-disclosure presentation construction.
//!
//! The holder picks which claims of a credential to reveal. Every other
//! claim is replaced by a one-way commitment, so the verifier learns that the
//! claim exists without learning its value. The resulting presentation is
//! signed with the holder's key, proving the holder authorized exactly this
//! disclosure to this recipient.
//!
//! Presentations are exchanged peer-to-peer; nothing here touches a ledger.

use crate::error::{Error, Result};
use crate::models::credential::{Credential, CredentialSubject, VerifiableCredential, RESERVED_CLAIM};
use crate::models::did::Identity;
use crate::models::presentation::{
    Presentation, VerifiablePresentation, PRESENTATION_CONTEXT, PRESENTATION_TYPE,
};
use crate::models::proof::{Proof, ProofPurpose};
use crate::utils::clock::Clock;
use crate::utils::crypto::commitment;
use crate::utils::serialization::canonicalize;
use log::{debug, info, warn};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How reveal-set entries that name no claim of the credential are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPolicy {
    /// Fail with `UnknownAttribute`.
    #[default]
    Strict,
    /// Drop unknown entries silently.
    IgnoreUnknown,
}

/// One credential to include in a presentation and the claims to reveal from it.
#[derive(Debug, Clone)]
pub struct Disclosure<'a> {
    pub credential: &'a VerifiableCredential,
    pub reveal: Vec<String>,
}

impl<'a> Disclosure<'a> {
    pub fn new<S: AsRef<str>>(credential: &'a VerifiableCredential, reveal: &[S]) -> Self {
        Disclosure {
            credential,
            reveal: reveal.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

/// Builds holder-signed presentations.
#[derive(Clone)]
pub struct PresentationBuilder {
    clock: Arc<dyn Clock>,
    policy: RevealPolicy,
}

struct Derived {
    credential: VerifiableCredential,
    revealed: Vec<String>,
    hidden: Vec<String>,
}

impl PresentationBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            policy: RevealPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RevealPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates a presentation disclosing `reveal` from a single credential.
    ///
    /// # Arguments
    /// * `holder` - Identity signing the presentation
    /// * `credential` - The credential as issued
    /// * `reveal` - Claim keys to disclose verbatim
    /// * `recipient` - Verifier DID the presentation is addressed to
    /// * `purpose` - Why the data is being shared
    /// * `rng` - Secure random source for the challenge
    ///
    /// # Errors
    /// `UnknownAttribute` under [`RevealPolicy::Strict`] when `reveal` names a
    /// claim the credential does not carry.
    pub fn create_presentation<S: AsRef<str>, R: RngCore + CryptoRng>(
        &self,
        holder: &Identity,
        credential: &VerifiableCredential,
        reveal: &[S],
        recipient: &str,
        purpose: &str,
        rng: &mut R,
    ) -> Result<VerifiablePresentation> {
        let disclosure = Disclosure::new(credential, reveal);
        self.create_multi_presentation(holder, &[disclosure], recipient, purpose, rng)
    }

    /// Creates one presentation covering several credentials.
    ///
    /// Revealed and hidden attribute lists are the ordered union over all
    /// disclosures. They are not disjoint: a key revealed from one credential
    /// and hidden in another appears in both. Per credential the split is
    /// disjoint and can be read from its claims, where hidden values carry the
    /// `hidden:` commitment prefix.
    pub fn create_multi_presentation<R: RngCore + CryptoRng>(
        &self,
        holder: &Identity,
        disclosures: &[Disclosure<'_>],
        recipient: &str,
        purpose: &str,
        rng: &mut R,
    ) -> Result<VerifiablePresentation> {
        let mut credentials = Vec::with_capacity(disclosures.len());
        let mut revealed_attributes: Vec<String> = Vec::new();
        let mut hidden_attributes: Vec<String> = Vec::new();

        for disclosure in disclosures {
            let subject = &disclosure.credential.credential.credential_subject.id;
            if *subject != holder.identifier {
                warn!(
                    "{} presents credential {} issued to {subject}",
                    holder.identifier,
                    disclosure.credential.id()
                );
            }
            let derived = self.derive(disclosure)?;
            push_unique(&mut revealed_attributes, derived.revealed);
            push_unique(&mut hidden_attributes, derived.hidden);
            credentials.push(derived.credential);
        }

        let created = self.clock.now();
        let presentation = Presentation {
            context: vec![PRESENTATION_CONTEXT.to_string()],
            types: vec![PRESENTATION_TYPE.to_string()],
            holder: holder.identifier.clone(),
            verifiable_credential: credentials,
            purpose: purpose.to_string(),
            recipient: recipient.to_string(),
            revealed_attributes,
            hidden_attributes,
            created,
            challenge: new_challenge(rng),
        };

        let signature = holder.keys.sign_message_hex(&canonicalize(&presentation)?)?;
        info!(
            "{} created presentation for {recipient}: revealed [{}], hidden [{}]",
            holder.identifier,
            presentation.revealed_attributes.join(", "),
            presentation.hidden_attributes.join(", ")
        );

        Ok(VerifiablePresentation {
            presentation,
            proof: Proof::new(
                created,
                holder.key_reference(),
                ProofPurpose::Authentication,
                signature,
            ),
        })
    }

    /// Builds the redacted copy of one credential.
    fn derive(&self, disclosure: &Disclosure<'_>) -> Result<Derived> {
        let source = disclosure.credential;
        let claims = source.claims();

        let mut revealed: Vec<String> = Vec::new();
        let mut unknown: Vec<String> = Vec::new();
        for key in &disclosure.reveal {
            if key == RESERVED_CLAIM {
                // subject reference is always disclosed
                continue;
            }
            let bucket = if claims.contains_key(key) {
                &mut revealed
            } else {
                &mut unknown
            };
            if !bucket.contains(key) {
                bucket.push(key.clone());
            }
        }

        if !unknown.is_empty() {
            match self.policy {
                RevealPolicy::Strict => return Err(Error::UnknownAttribute(unknown)),
                RevealPolicy::IgnoreUnknown => {
                    debug!("ignoring unknown reveal keys: {}", unknown.join(", "))
                }
            }
        }

        let mut hidden = Vec::new();
        let derived_claims: BTreeMap<String, String> = claims
            .iter()
            .map(|(key, value)| {
                if revealed.contains(key) {
                    (key.clone(), value.clone())
                } else {
                    hidden.push(key.clone());
                    (key.clone(), commitment(value))
                }
            })
            .collect();

        let credential = VerifiableCredential {
            credential: Credential {
                credential_subject: CredentialSubject {
                    id: source.credential.credential_subject.id.clone(),
                    claims: derived_claims,
                },
                ..source.credential.clone()
            },
            proof: source.proof.clone(),
        };

        Ok(Derived {
            credential,
            revealed,
            hidden,
        })
    }
}

/// Claim keys a holder may choose to reveal, in canonical order.
pub fn available_attributes(credential: &VerifiableCredential) -> Vec<String> {
    credential
        .claims()
        .keys()
        .filter(|k| k.as_str() != RESERVED_CLAIM)
        .cloned()
        .collect()
}

fn push_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

fn new_challenge<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut nonce = [0u8; 16];
    rng.fill_bytes(&mut nonce);
    hex::encode(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credential_issuer::{CredentialIssuer, CredentialRequest};
    use crate::services::identity_manager::IdentityManager;
    use crate::utils::clock::FixedClock;
    use crate::wallet::key_management::verify_signature;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        builder: PresentationBuilder,
        issuer: Identity,
        holder: Identity,
        verifier: Identity,
        credential: VerifiableCredential,
        rng: StdRng,
    }

    fn fixture() -> Fixture {
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
        let mut rng = StdRng::seed_from_u64(30);
        let identities = IdentityManager::new(clock.clone());
        let issuer = identities.create_identity("Registro Civil", &mut rng);
        let holder = identities.create_identity("Maria", &mut rng);
        let verifier = identities.create_identity("Landlord", &mut rng);
        let request = CredentialRequest::new(&holder.identifier, "IdentityCard").claims([
            ("name", "Maria Elena Garcia"),
            ("birth_date", "1990-03-15"),
            ("nationality", "DO"),
            ("id_number", "001-1234567-8"),
        ]);
        let credential = CredentialIssuer::new(clock.clone())
            .issue_credential(&issuer, request, &mut rng)
            .unwrap()
            .credential;
        Fixture {
            builder: PresentationBuilder::new(clock),
            issuer,
            holder,
            verifier,
            credential,
            rng,
        }
    }

    #[test]
    fn test_lists_available_attributes() {
        let f = fixture();
        assert_eq!(
            available_attributes(&f.credential),
            vec!["birth_date", "id_number", "name", "nationality"]
        );
    }

    #[test]
    fn test_reveals_only_selected() {
        let mut f = fixture();
        let vp = f
            .builder
            .create_presentation(
                &f.holder,
                &f.credential,
                &["name", "nationality"],
                &f.verifier.identifier,
                "Rental application",
                &mut f.rng,
            )
            .unwrap();

        let p = &vp.presentation;
        assert_eq!(p.types, vec!["VerifiablePresentation"]);
        assert_eq!(p.holder, f.holder.identifier);
        assert_eq!(p.recipient, f.verifier.identifier);
        assert_eq!(p.purpose, "Rental application");
        assert_eq!(p.revealed_attributes, vec!["name", "nationality"]);
        assert_eq!(p.hidden_attributes, vec!["birth_date", "id_number"]);

        let claims = vp.credentials()[0].claims();
        assert_eq!(claims["name"], "Maria Elena Garcia");
        assert_eq!(claims["nationality"], "DO");
        for key in ["birth_date", "id_number"] {
            let original = &f.credential.claims()[key];
            assert_ne!(&claims[key], original);
            assert_eq!(claims[key], commitment(original));
            assert!(claims[key].starts_with("hidden:"));
            assert_eq!(claims[key].len(), "hidden:".len() + 64);
        }
    }

    #[test]
    fn test_commitments_are_deterministic() {
        let mut f = fixture();
        let first = f
            .builder
            .create_presentation(&f.holder, &f.credential, &["name"], "did:example:a", "A", &mut f.rng)
            .unwrap();
        let second = f
            .builder
            .create_presentation(&f.holder, &f.credential, &["nationality"], "did:example:b", "B", &mut f.rng)
            .unwrap();

        assert_eq!(
            first.credentials()[0].claims()["id_number"],
            second.credentials()[0].claims()["id_number"]
        );
        assert_ne!(first.presentation.challenge, second.presentation.challenge);
        assert_eq!(first.presentation.challenge.len(), 32);
    }

    #[test]
    fn test_signed_by_holder_and_keeps_issuer_proof() {
        let mut f = fixture();
        let vp = f
            .builder
            .create_presentation(&f.holder, &f.credential, &["name"], "did:example:v", "Job", &mut f.rng)
            .unwrap();

        assert_eq!(vp.proof.proof_purpose, ProofPurpose::Authentication);
        assert_eq!(vp.proof.verification_method, f.holder.key_reference());
        assert_ne!(vp.proof.verification_method, f.issuer.key_reference());
        let payload = canonicalize(&vp.presentation).unwrap();
        verify_signature(f.holder.public_key(), &payload, &vp.proof.proof_value).unwrap();

        let derived = &vp.credentials()[0];
        assert_eq!(derived.proof, f.credential.proof);
        assert_eq!(derived.id(), f.credential.id());
        // Redaction breaks the issuer signature over the claims.
        assert!(derived.verify_issuer_signature(f.issuer.public_key()).is_err());
    }

    #[test]
    fn test_unknown_attributes_rejected_by_default() {
        let mut f = fixture();
        let err = f
            .builder
            .create_presentation(
                &f.holder,
                &f.credential,
                &["name", "salary", "salary", "blood_type"],
                "did:example:v",
                "Job",
                &mut f.rng,
            )
            .unwrap_err();
        match err {
            Error::UnknownAttribute(keys) => assert_eq!(keys, vec!["salary", "blood_type"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_attributes_ignored_when_configured() {
        let mut f = fixture();
        let builder = f.builder.clone().with_policy(RevealPolicy::IgnoreUnknown);
        let vp = builder
            .create_presentation(&f.holder, &f.credential, &["salary", "name", "name"], "did:example:v", "Job", &mut f.rng)
            .unwrap();
        assert_eq!(vp.presentation.revealed_attributes, vec!["name"]);
        assert_eq!(vp.presentation.hidden_attributes.len(), 3);
    }

    #[test]
    fn test_reveal_all_or_nothing() {
        let mut f = fixture();
        let all = available_attributes(&f.credential);
        let vp = f
            .builder
            .create_presentation(&f.holder, &f.credential, &all, "did:example:v", "Audit", &mut f.rng)
            .unwrap();
        assert!(vp.presentation.hidden_attributes.is_empty());
        assert_eq!(vp.credentials()[0].claims(), f.credential.claims());

        let none: [&str; 0] = [];
        let vp = f
            .builder
            .create_presentation(&f.holder, &f.credential, &none, "did:example:v", "Proof of existence", &mut f.rng)
            .unwrap();
        assert!(vp.presentation.revealed_attributes.is_empty());
        assert_eq!(vp.presentation.hidden_attributes, all);
    }

    #[test]
    fn test_subject_reference_is_always_disclosed() {
        let mut f = fixture();
        let vp = f
            .builder
            .create_presentation(&f.holder, &f.credential, &["id", "name"], "did:example:v", "Job", &mut f.rng)
            .unwrap();
        assert_eq!(vp.presentation.revealed_attributes, vec!["name"]);
        assert_eq!(
            vp.credentials()[0].credential.credential_subject.id,
            f.holder.identifier
        );
    }

    #[test]
    fn test_multi_credential_presentation() {
        let mut f = fixture();
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()));
        let degree = CredentialIssuer::new(clock)
            .issue_credential(
                &f.issuer,
                CredentialRequest::new(&f.holder.identifier, "UniversityDegree")
                    .claims([("name", "Maria Elena Garcia"), ("degree", "Systems Engineering"), ("gpa", "3.8")]),
                &mut f.rng,
            )
            .unwrap()
            .credential;

        let disclosures = [
            Disclosure::new(&f.credential, &["name"]),
            Disclosure::new(&degree, &["degree"]),
        ];
        let vp = f
            .builder
            .create_multi_presentation(&f.holder, &disclosures, "did:example:employer", "Job application", &mut f.rng)
            .unwrap();

        assert_eq!(vp.credentials().len(), 2);
        assert_eq!(vp.presentation.revealed_attributes, vec!["name", "degree"]);
        assert_eq!(
            vp.presentation.hidden_attributes,
            vec!["birth_date", "id_number", "nationality", "gpa", "name"]
        );
        // `name` is revealed from the identity card but hidden in the degree
        assert!(vp.credentials()[1].claims()["name"].starts_with("hidden:"));

        // Each credential's own split is disjoint and covers all its claims
        for (derived, reveal) in vp.credentials().iter().zip([["name"], ["degree"]]) {
            for (key, value) in derived.claims() {
                assert_eq!(
                    value.starts_with("hidden:"),
                    !reveal.contains(&key.as_str()),
                    "{key}"
                );
            }
        }
    }

    #[test]
    fn test_presentation_roundtrips_through_json() {
        let mut f = fixture();
        let vp = f
            .builder
            .create_presentation(&f.holder, &f.credential, &["name"], "did:example:v", "Job", &mut f.rng)
            .unwrap();
        let json = serde_json::to_string(&vp).unwrap();
        assert!(json.contains("\"verifiableCredential\""));
        assert!(json.contains("\"credentialSubject\""));
        let back: VerifiablePresentation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vp);
    }
}
