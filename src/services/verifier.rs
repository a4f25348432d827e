// src/services/verifier.rs
//! Presentation verification engine.
//!
//! A verifier checks a presentation without contacting the issuer. It needs
//! only the relevant public keys and a snapshot of the revocation set.
//!
//! Checks, in report order:
//! 1. Holder signature over the presentation
//! 2. Issuer provenance of each derived credential (recorded, not re-verified)
//! 3. Expiry of each credential
//! 4. Revocation status of each credential
//! 5. Freshness of the presentation (anti-replay)
//!
//! Every check runs even if an earlier one fails, so the report is always
//! complete.

use crate::blockchain::ledger::{Ledger, RevocationSet};
use crate::error::Result;
use crate::models::credential::VerifiableCredential;
use crate::models::presentation::VerifiablePresentation;
use crate::models::report::{
    CheckResult, DisclosureSummary, FailureKind, Outcome, Step, VerificationReport,
};
use crate::services::identity_manager::derive_identifier;
use crate::utils::clock::Clock;
use crate::utils::serialization::canonicalize;
use crate::wallet::key_management::verify_signature;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default maximum presentation age.
pub const DEFAULT_REPLAY_WINDOW_MINUTES: i64 = 30;

/// How far in the future a presentation may be dated before it is rejected.
pub const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 60;

/// Whether a stale presentation invalidates the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreshnessPolicy {
    /// Stale presentations are reported as a warning only.
    #[default]
    Advisory,
    /// Stale presentations fail verification.
    Enforced,
}

/// Stateless verification engine.
///
/// Verification is a pure function of the presentation, the keys, the
/// revocation snapshot and the clock, so one instance can serve many
/// concurrent verifications.
#[derive(Clone)]
pub struct Verifier {
    clock: Arc<dyn Clock>,
    replay_window: Duration,
    clock_skew: Duration,
    freshness: FreshnessPolicy,
}

impl Verifier {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            replay_window: Duration::minutes(DEFAULT_REPLAY_WINDOW_MINUTES),
            clock_skew: Duration::seconds(DEFAULT_CLOCK_SKEW_SECONDS),
            freshness: FreshnessPolicy::default(),
        }
    }

    pub fn with_replay_window(mut self, replay_window: Duration) -> Self {
        self.replay_window = replay_window;
        self
    }

    /// Tolerated difference between the holder's clock and ours.
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn with_freshness_policy(mut self, freshness: FreshnessPolicy) -> Self {
        self.freshness = freshness;
        self
    }

    /// Verifies a presentation against explicit keys and a revocation snapshot.
    ///
    /// # Arguments
    /// * `presentation` - The holder-signed presentation
    /// * `issuer_public_key` - SEC1 key of the credential issuer
    /// * `holder_public_key` - SEC1 key of the claimed holder
    /// * `revocation_set` - Snapshot of revoked credential ids
    ///
    /// # Returns
    /// A complete [`VerificationReport`]. Verification failures never raise.
    pub fn verify_presentation(
        &self,
        presentation: &VerifiablePresentation,
        issuer_public_key: &[u8],
        holder_public_key: &[u8],
        revocation_set: &RevocationSet,
    ) -> VerificationReport {
        self.evaluate(
            presentation,
            |_| Some(issuer_public_key),
            holder_public_key,
            revocation_set,
        )
    }

    /// Verifies a presentation resolving keys and revocations from a ledger.
    ///
    /// The revocation set is read once, so the whole call observes one
    /// consistent snapshot.
    ///
    /// # Errors
    /// `NotFound` if the holder or any credential issuer is not registered.
    pub fn verify_with_ledger(
        &self,
        presentation: &VerifiablePresentation,
        ledger: &dyn Ledger,
    ) -> Result<VerificationReport> {
        let holder_key = ledger
            .lookup_identity(presentation.holder())?
            .public_key_bytes()?;

        let mut issuer_keys: BTreeMap<&str, Vec<u8>> = BTreeMap::new();
        for credential in presentation.credentials() {
            let issuer = credential.credential.issuer.as_str();
            if !issuer_keys.contains_key(issuer) {
                let key = ledger.lookup_identity(issuer)?.public_key_bytes()?;
                issuer_keys.insert(issuer, key);
            }
        }

        let revoked = ledger.revocation_set();
        Ok(self.evaluate(
            presentation,
            |issuer| issuer_keys.get(issuer).map(Vec::as_slice),
            &holder_key,
            &revoked,
        ))
    }

    fn evaluate<'k, F>(
        &self,
        presentation: &VerifiablePresentation,
        issuer_key: F,
        holder_public_key: &[u8],
        revocation_set: &RevocationSet,
    ) -> VerificationReport
    where
        F: Fn(&str) -> Option<&'k [u8]>,
    {
        let now = self.clock.now();
        let mut checks = vec![check_holder_signature(presentation, holder_public_key)];

        for credential in presentation.credentials() {
            checks.push(check_provenance(
                credential,
                issuer_key(&credential.credential.issuer),
            ));
            checks.push(check_expiry(credential, now));
            checks.push(check_revocation(credential, revocation_set));
        }

        checks.push(self.check_freshness(presentation.presentation.created, now));

        let valid = checks.iter().all(|c| c.outcome != Outcome::Failed);
        for failed in checks.iter().filter(|c| c.outcome == Outcome::Failed) {
            warn!("{}: {}", failed.step, failed.detail);
        }
        info!(
            "verified presentation from {}: {}",
            presentation.holder(),
            if valid { "valid" } else { "invalid" }
        );

        let p = &presentation.presentation;
        VerificationReport {
            checks,
            valid,
            disclosure: DisclosureSummary {
                holder: p.holder.clone(),
                purpose: p.purpose.clone(),
                recipient: p.recipient.clone(),
                revealed_attributes: p.revealed_attributes.clone(),
                hidden_attributes: p.hidden_attributes.clone(),
            },
            verified_at: now,
        }
    }

    /// Stale and future-dated presentations are both reported with
    /// `StaleChallenge`, as a warning or a failure depending on the policy.
    fn check_freshness(&self, created: DateTime<Utc>, now: DateTime<Utc>) -> CheckResult {
        let age = now - created;
        let problem = if age < -self.clock_skew {
            Some(format!(
                "Presentation is dated {} seconds in the future; created at {}",
                (-age).num_seconds(),
                created.to_rfc3339()
            ))
        } else if age >= self.replay_window {
            Some(format!(
                "Presentation is older than {} minutes and could be a replay; created at {}",
                self.replay_window.num_minutes(),
                created.to_rfc3339()
            ))
        } else {
            None
        };

        let Some(detail) = problem else {
            return CheckResult {
                step: Step::Freshness,
                outcome: Outcome::Passed,
                detail: format!("Created {} minutes ago", age.num_minutes().max(0)),
                credential_id: None,
                failure: None,
            };
        };
        let outcome = match self.freshness {
            FreshnessPolicy::Advisory => Outcome::Warning,
            FreshnessPolicy::Enforced => Outcome::Failed,
        };
        CheckResult {
            step: Step::Freshness,
            outcome,
            detail,
            credential_id: None,
            failure: Some(FailureKind::StaleChallenge),
        }
    }
}

fn check_holder_signature(
    presentation: &VerifiablePresentation,
    holder_public_key: &[u8],
) -> CheckResult {
    let verified = canonicalize(&presentation.presentation)
        .map_err(Into::into)
        .and_then(|payload| {
            verify_signature(holder_public_key, &payload, &presentation.proof.proof_value)
        });
    match verified {
        Ok(()) => CheckResult {
            step: Step::HolderSignature,
            outcome: Outcome::Passed,
            detail: "The holder authorized this presentation".to_string(),
            credential_id: None,
            failure: None,
        },
        Err(e) => CheckResult {
            step: Step::HolderSignature,
            outcome: Outcome::Failed,
            detail: format!("Holder signature is not valid, possible impersonation ({e})"),
            credential_id: None,
            failure: Some(FailureKind::InvalidSignature),
        },
    }
}

/// Records who issued the credential.
///
/// The issuer's proof travels with the derived credential but covers the
/// unredacted claims, so it cannot be re-verified here. Whether the supplied
/// issuer key derives the issuer identifier is noted for the reader only.
fn check_provenance(credential: &VerifiableCredential, issuer_key: Option<&[u8]>) -> CheckResult {
    let issuer = &credential.credential.issuer;
    let key_note = match issuer_key {
        Some(key) if derive_identifier(key) == *issuer => "issuer key matches identifier",
        Some(_) => "supplied issuer key does not match identifier",
        None => "no issuer key supplied",
    };
    CheckResult {
        step: Step::IssuerProvenance,
        outcome: Outcome::ProvenanceOnly,
        detail: format!(
            "Credential issued by {issuer} ({key_note}); issuer signature retained, not re-verified over redacted claims"
        ),
        credential_id: Some(credential.id().to_string()),
        failure: None,
    }
}

fn check_expiry(credential: &VerifiableCredential, now: DateTime<Utc>) -> CheckResult {
    let expires = credential.credential.expiration_date;
    let (outcome, detail, failure) = if now < expires {
        (
            Outcome::Passed,
            format!("Valid until {}", expires.to_rfc3339()),
            None,
        )
    } else {
        (
            Outcome::Failed,
            format!("Expired at {}", expires.to_rfc3339()),
            Some(FailureKind::ExpiredCredential),
        )
    };
    CheckResult {
        step: Step::Expiry,
        outcome,
        detail,
        credential_id: Some(credential.id().to_string()),
        failure,
    }
}

/// Only a revocation published by the credential's own issuer counts.
fn check_revocation(credential: &VerifiableCredential, revocation_set: &RevocationSet) -> CheckResult {
    let id = credential.id();
    let issuer = &credential.credential.issuer;
    let (outcome, detail, failure) = if revocation_set.is_revoked_by(id, issuer) {
        (
            Outcome::Failed,
            "The credential has been revoked by its issuer".to_string(),
            Some(FailureKind::RevokedCredential),
        )
    } else if revocation_set.contains(id) {
        let others: Vec<&str> = revocation_set.revokers(id).collect();
        warn!("ignoring revocation of {id} by non-issuer {}", others.join(", "));
        (
            Outcome::Passed,
            format!(
                "Revocation published by {} ignored, only the issuer may revoke",
                others.join(", ")
            ),
            None,
        )
    } else {
        (
            Outcome::Passed,
            "The credential does not appear in the revocation set".to_string(),
            None,
        )
    };
    CheckResult {
        step: Step::Revocation,
        outcome,
        detail,
        credential_id: Some(credential.id().to_string()),
        failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ledger::InMemoryLedger;
    use crate::error::Error;
    use crate::models::did::Identity;
    use crate::services::credential_issuer::{CredentialIssuer, CredentialRequest};
    use crate::services::identity_manager::IdentityManager;
    use crate::utils::clock::FixedClock;
    use crate::wallet::presentation_builder::PresentationBuilder;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn clock_at(at: DateTime<Utc>) -> Arc<dyn Clock> {
        Arc::new(FixedClock(at))
    }

    struct Fixture {
        issuer: Identity,
        holder: Identity,
        credential: VerifiableCredential,
        presentation: VerifiablePresentation,
        rng: StdRng,
    }

    fn fixture(expiry: Option<DateTime<Utc>>) -> Fixture {
        let clock = clock_at(issued_at());
        let mut rng = StdRng::seed_from_u64(40);
        let identities = IdentityManager::new(clock.clone());
        let issuer = identities.create_identity("Registro Civil", &mut rng);
        let holder = identities.create_identity("Maria", &mut rng);
        let mut request = CredentialRequest::new(&holder.identifier, "IdentityCard")
            .claims([("name", "Maria"), ("nationality", "DO"), ("id_number", "001")]);
        request.expiry = expiry;
        let credential = CredentialIssuer::new(clock.clone())
            .issue_credential(&issuer, request, &mut rng)
            .unwrap()
            .credential;
        let presentation = PresentationBuilder::new(clock)
            .create_presentation(
                &holder,
                &credential,
                &["name", "nationality"],
                "did:example:landlord",
                "Rental application",
                &mut rng,
            )
            .unwrap();
        Fixture {
            issuer,
            holder,
            credential,
            presentation,
            rng,
        }
    }

    fn verifier_at(minutes_after_issue: i64) -> Verifier {
        Verifier::new(clock_at(issued_at() + Duration::minutes(minutes_after_issue)))
    }

    #[test]
    fn test_valid_presentation() {
        let f = fixture(None);
        let report = verifier_at(5).verify_presentation(
            &f.presentation,
            f.issuer.public_key(),
            f.holder.public_key(),
            &RevocationSet::new(),
        );

        assert!(report.valid);
        let steps: Vec<Step> = report.checks.iter().map(|c| c.step).collect();
        assert_eq!(
            steps,
            vec![
                Step::HolderSignature,
                Step::IssuerProvenance,
                Step::Expiry,
                Step::Revocation,
                Step::Freshness
            ]
        );
        assert_eq!(
            report.check(Step::IssuerProvenance).unwrap().outcome,
            Outcome::ProvenanceOnly
        );
        assert!(report
            .check(Step::IssuerProvenance)
            .unwrap()
            .detail
            .contains("issuer key matches identifier"));
        assert_eq!(report.check(Step::Freshness).unwrap().detail, "Created 5 minutes ago");
        assert_eq!(report.disclosure.holder, f.holder.identifier);
        assert_eq!(report.disclosure.purpose, "Rental application");
        assert_eq!(report.disclosure.revealed_attributes, vec!["name", "nationality"]);
        assert_eq!(report.disclosure.hidden_attributes, vec!["id_number"]);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_wrong_holder_key_fails_signature() {
        let mut f = fixture(None);
        let impostor = IdentityManager::new(clock_at(issued_at())).create_identity("Impostor", &mut f.rng);
        let report = verifier_at(1).verify_presentation(
            &f.presentation,
            f.issuer.public_key(),
            impostor.public_key(),
            &RevocationSet::new(),
        );

        assert!(!report.valid);
        let signature = report.check(Step::HolderSignature).unwrap();
        assert_eq!(signature.outcome, Outcome::Failed);
        assert_eq!(signature.failure, Some(FailureKind::InvalidSignature));
        // Remaining checks still ran
        assert_eq!(report.check(Step::Expiry).unwrap().outcome, Outcome::Passed);
        assert_eq!(report.check(Step::Revocation).unwrap().outcome, Outcome::Passed);
        assert!(matches!(report.into_result(), Err(Error::InvalidSignature(_))));
    }

    #[test]
    fn test_malformed_inputs_never_raise() {
        let f = fixture(None);
        let mut broken = f.presentation.clone();
        broken.proof.proof_value = "zz-not-hex".into();

        let report = verifier_at(1).verify_presentation(
            &broken,
            f.issuer.public_key(),
            f.holder.public_key(),
            &RevocationSet::new(),
        );
        assert!(!report.valid);

        let report = verifier_at(1).verify_presentation(
            &f.presentation,
            &[],
            &[0u8; 5],
            &RevocationSet::new(),
        );
        assert!(!report.valid);
        assert!(report
            .check(Step::IssuerProvenance)
            .unwrap()
            .detail
            .contains("does not match"));
    }

    #[test]
    fn test_expiry_boundary() {
        let expiry = issued_at() + Duration::hours(1);
        let f = fixture(Some(expiry));
        let keys = (f.issuer.public_key(), f.holder.public_key());

        let before = Verifier::new(clock_at(expiry - Duration::milliseconds(1)))
            .with_freshness_policy(FreshnessPolicy::Advisory)
            .verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        assert_eq!(before.check(Step::Expiry).unwrap().outcome, Outcome::Passed);

        let after = Verifier::new(clock_at(expiry + Duration::milliseconds(1)))
            .verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        let check = after.check(Step::Expiry).unwrap();
        assert_eq!(check.outcome, Outcome::Failed);
        assert_eq!(check.failure, Some(FailureKind::ExpiredCredential));
        assert!(!after.valid);
        match after.into_result() {
            Err(Error::ExpiredCredential { expired_at, .. }) => assert_eq!(expired_at, expiry),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_revoked_credential() {
        let f = fixture(None);
        let revoked: RevocationSet = [(f.credential.id(), f.issuer.identifier.as_str())]
            .into_iter()
            .collect();
        let report = verifier_at(1).verify_presentation(
            &f.presentation,
            f.issuer.public_key(),
            f.holder.public_key(),
            &revoked,
        );

        assert!(!report.valid);
        assert_eq!(report.check(Step::Revocation).unwrap().outcome, Outcome::Failed);
        assert_eq!(report.check(Step::HolderSignature).unwrap().outcome, Outcome::Passed);
        assert_eq!(report.check(Step::Expiry).unwrap().outcome, Outcome::Passed);
    }

    #[test]
    fn test_revocation_by_non_issuer_is_ignored() {
        let f = fixture(None);
        let revoked: RevocationSet = [(f.credential.id(), f.holder.identifier.as_str())]
            .into_iter()
            .collect();
        let report = verifier_at(1).verify_presentation(
            &f.presentation,
            f.issuer.public_key(),
            f.holder.public_key(),
            &revoked,
        );

        assert!(report.valid);
        let check = report.check(Step::Revocation).unwrap();
        assert_eq!(check.outcome, Outcome::Passed);
        assert!(check.detail.contains(&f.holder.identifier));
    }

    #[test]
    fn test_future_dated_presentation() {
        let f = fixture(None);
        let keys = (f.issuer.public_key(), f.holder.public_key());

        // Within the tolerated skew
        let skewed = Verifier::new(clock_at(issued_at() - Duration::seconds(30)))
            .verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        assert_eq!(skewed.check(Step::Freshness).unwrap().outcome, Outcome::Passed);

        let early = Verifier::new(clock_at(issued_at() - Duration::minutes(10)));
        let report = early.verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        let freshness = report.check(Step::Freshness).unwrap();
        assert_eq!(freshness.outcome, Outcome::Warning);
        assert_eq!(freshness.failure, Some(FailureKind::StaleChallenge));
        assert!(freshness.detail.contains("600 seconds in the future"));

        let enforced = early
            .with_freshness_policy(FreshnessPolicy::Enforced)
            .verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        assert!(!enforced.valid);
        match enforced.into_result() {
            Err(Error::StaleChallenge { created }) => assert_eq!(created, issued_at()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_stale_presentation_is_advisory_by_default() {
        let f = fixture(None);
        let keys = (f.issuer.public_key(), f.holder.public_key());

        let report = verifier_at(30).verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        let freshness = report.check(Step::Freshness).unwrap();
        assert_eq!(freshness.outcome, Outcome::Warning);
        assert_eq!(freshness.failure, Some(FailureKind::StaleChallenge));
        assert!(report.valid);

        let enforced = verifier_at(30)
            .with_freshness_policy(FreshnessPolicy::Enforced)
            .verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        assert!(!enforced.valid);
        assert!(matches!(enforced.into_result(), Err(Error::StaleChallenge { .. })));

        let widened = verifier_at(30)
            .with_replay_window(Duration::hours(2))
            .verify_presentation(&f.presentation, keys.0, keys.1, &RevocationSet::new());
        assert_eq!(widened.check(Step::Freshness).unwrap().outcome, Outcome::Passed);
    }

    #[test]
    fn test_verification_is_idempotent() {
        let f = fixture(None);
        let verifier = verifier_at(3);
        let revoked = RevocationSet::new();
        let first = verifier.verify_presentation(&f.presentation, f.issuer.public_key(), f.holder.public_key(), &revoked);
        let second = verifier.verify_presentation(&f.presentation, f.issuer.public_key(), f.holder.public_key(), &revoked);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tampering_flips_holder_signature() {
        let f = fixture(None);
        let verifier = verifier_at(1);
        let tampers: Vec<Box<dyn Fn(&mut VerifiablePresentation)>> = vec![
            Box::new(|p: &mut VerifiablePresentation| p.presentation.holder = "did:example:impostor".into()),
            Box::new(|p: &mut VerifiablePresentation| p.presentation.challenge = "00".repeat(16)),
            Box::new(|p: &mut VerifiablePresentation| p.presentation.purpose = "Something else".into()),
            Box::new(|p: &mut VerifiablePresentation| {
                p.presentation.verifiable_credential[0]
                    .credential
                    .credential_subject
                    .claims
                    .insert("nationality".into(), "US".into());
            }),
            Box::new(|p: &mut VerifiablePresentation| p.presentation.hidden_attributes.clear()),
        ];
        for tamper in tampers {
            let mut forged = f.presentation.clone();
            tamper(&mut forged);
            let report = verifier.verify_presentation(
                &forged,
                f.issuer.public_key(),
                f.holder.public_key(),
                &RevocationSet::new(),
            );
            assert_eq!(
                report.check(Step::HolderSignature).unwrap().outcome,
                Outcome::Failed
            );
            assert!(!report.valid);
        }
    }

    #[test]
    fn test_verify_with_ledger() {
        let f = fixture(None);
        let ledger = InMemoryLedger::new(clock_at(issued_at())).unwrap();

        let err = verifier_at(1)
            .verify_with_ledger(&f.presentation, &ledger)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        ledger.register_identity(f.holder.public_record()).unwrap();
        ledger.register_identity(f.issuer.public_record()).unwrap();
        let report = verifier_at(1).verify_with_ledger(&f.presentation, &ledger).unwrap();
        assert!(report.valid);

        CredentialIssuer::new(clock_at(issued_at()))
            .revoke_and_publish(f.credential.id(), &f.issuer, "Fraud", &ledger)
            .unwrap();
        let report = verifier_at(2).verify_with_ledger(&f.presentation, &ledger).unwrap();
        assert!(!report.valid);
        assert_eq!(report.check(Step::Revocation).unwrap().outcome, Outcome::Failed);
    }
}
