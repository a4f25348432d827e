// src/models/report.rs
//! Verification report returned by the verification engine.
//!
//! A report is built once per verification call and never mutated afterwards.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The individual checks run against a presentation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    HolderSignature,
    IssuerProvenance,
    Expiry,
    Revocation,
    Freshness,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::HolderSignature => "Holder signature",
            Step::IssuerProvenance => "Issuer provenance",
            Step::Expiry => "Credential validity period",
            Step::Revocation => "Revocation status",
            Step::Freshness => "Presentation freshness",
        };
        f.write_str(name)
    }
}

/// Outcome of a single check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Passed,
    Failed,
    /// Reported but not counted against validity (advisory freshness)
    Warning,
    /// Issuer provenance is recorded, not cryptographically re-verified
    ProvenanceOnly,
}

impl Outcome {
    pub fn is_ok(self) -> bool {
        matches!(self, Outcome::Passed | Outcome::ProvenanceOnly)
    }
}

/// Which error-taxonomy entry a failing check corresponds to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    InvalidSignature,
    ExpiredCredential,
    RevokedCredential,
    StaleChallenge,
}

/// One line of the report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub step: Step,
    pub outcome: Outcome,
    pub detail: String,
    /// Credential the check applies to; `None` for presentation-level checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// What the holder chose to disclose.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureSummary {
    pub holder: String,
    pub purpose: String,
    pub recipient: String,
    pub revealed_attributes: Vec<String>,
    pub hidden_attributes: Vec<String>,
}

/// Complete, ordered result of verifying a presentation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
    /// AND of every check counted towards validity
    pub valid: bool,
    pub disclosure: DisclosureSummary,
    pub verified_at: DateTime<Utc>,
}

impl VerificationReport {
    /// First check for a given step, if any.
    pub fn check(&self, step: Step) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.step == step)
    }

    /// All checks for a given step, in report order.
    pub fn checks_for(&self, step: Step) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(move |c| c.step == step)
    }

    /// Converts the report into a fail-fast result.
    ///
    /// Returns the first failed check as its error-taxonomy variant. Warnings
    /// and provenance notes never produce an error.
    pub fn into_result(self) -> Result<()> {
        let Some(check) = self.checks.into_iter().find(|c| c.outcome == Outcome::Failed) else {
            return Ok(());
        };
        let credential_id = check.credential_id.unwrap_or_default();
        Err(match check.failure {
            Some(FailureKind::ExpiredCredential) => Error::ExpiredCredential {
                credential_id,
                expired_at: parse_detail_time(&check.detail).unwrap_or(self.verified_at),
            },
            Some(FailureKind::RevokedCredential) => Error::RevokedCredential(credential_id),
            Some(FailureKind::StaleChallenge) => Error::StaleChallenge {
                created: parse_detail_time(&check.detail).unwrap_or(self.verified_at),
            },
            Some(FailureKind::InvalidSignature) | None => Error::InvalidSignature(check.detail),
        })
    }
}

/// Extracts the RFC 3339 timestamp the verifier places at the end of expiry
/// and freshness details.
fn parse_detail_time(detail: &str) -> Option<DateTime<Utc>> {
    let (_, stamp) = detail.rsplit_once(' ')?;
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        let thin = "-".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "  CREDENTIAL VERIFICATION REPORT")?;
        writeln!(f, "{rule}")?;
        for check in &self.checks {
            let marker = if check.outcome.is_ok() { "[OK]" } else { "[!!]" };
            writeln!(f)?;
            writeln!(f, "  {marker} {}: {:?}", check.step, check.outcome)?;
            writeln!(f, "      {}", check.detail)?;
        }
        writeln!(f)?;
        writeln!(f, "{thin}")?;
        let verdict = if self.valid {
            "PRESENTATION VALID"
        } else {
            "PRESENTATION INVALID"
        };
        writeln!(f, "  FINAL RESULT: {verdict}")?;
        writeln!(f, "{thin}")?;
        let summary = &self.disclosure;
        writeln!(f)?;
        writeln!(f, "  Shared data:    {}", summary.revealed_attributes.join(", "))?;
        if !summary.hidden_attributes.is_empty() {
            writeln!(f, "  Protected data: {}", summary.hidden_attributes.join(", "))?;
        }
        writeln!(f, "  Purpose: {}", summary.purpose)?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary() -> DisclosureSummary {
        DisclosureSummary {
            holder: "did:example:holder".into(),
            purpose: "Rental application".into(),
            recipient: "did:example:landlord".into(),
            revealed_attributes: vec!["name".into()],
            hidden_attributes: vec!["id_number".into()],
        }
    }

    fn check(step: Step, outcome: Outcome, failure: Option<FailureKind>, detail: &str) -> CheckResult {
        CheckResult {
            step,
            outcome,
            detail: detail.into(),
            credential_id: Some("urn:uuid:1".into()),
            failure,
        }
    }

    #[test]
    fn test_into_result_ok_with_warnings() {
        let report = VerificationReport {
            checks: vec![
                check(Step::HolderSignature, Outcome::Passed, None, "ok"),
                check(Step::IssuerProvenance, Outcome::ProvenanceOnly, None, "noted"),
                check(Step::Freshness, Outcome::Warning, Some(FailureKind::StaleChallenge), "old"),
            ],
            valid: true,
            disclosure: summary(),
            verified_at: Utc::now(),
        };
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_into_result_reports_first_failure() {
        let expired = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let report = VerificationReport {
            checks: vec![
                check(Step::HolderSignature, Outcome::Passed, None, "ok"),
                check(
                    Step::Expiry,
                    Outcome::Failed,
                    Some(FailureKind::ExpiredCredential),
                    &format!("Expired at {}", expired.to_rfc3339()),
                ),
                check(Step::Revocation, Outcome::Failed, Some(FailureKind::RevokedCredential), "revoked"),
            ],
            valid: false,
            disclosure: summary(),
            verified_at: Utc::now(),
        };
        match report.into_result() {
            Err(Error::ExpiredCredential {
                credential_id,
                expired_at,
            }) => {
                assert_eq!(credential_id, "urn:uuid:1");
                assert_eq!(expired_at, expired);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_display_marks_failures() {
        let report = VerificationReport {
            checks: vec![
                check(Step::HolderSignature, Outcome::Failed, Some(FailureKind::InvalidSignature), "bad"),
                check(Step::Revocation, Outcome::Passed, None, "not revoked"),
            ],
            valid: false,
            disclosure: summary(),
            verified_at: Utc::now(),
        };
        let text = report.to_string();
        assert!(text.contains("[!!] Holder signature: Failed"));
        assert!(text.contains("[OK] Revocation status: Passed"));
        assert!(text.contains("PRESENTATION INVALID"));
        assert!(text.contains("Protected data: id_number"));
    }
}
