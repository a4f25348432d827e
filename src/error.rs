// src/error.rs
//! Error taxonomy for the trust protocol.
//!
//! Construction-time preconditions (bad expiry, malformed claims, unknown
//! reveal keys) are raised to the caller. Verification-time conditions are
//! collected into a [`VerificationReport`](crate::models::report::VerificationReport)
//! instead; the `ExpiredCredential`, `RevokedCredential` and `StaleChallenge`
//! variants only surface when a report is converted with
//! [`VerificationReport::into_result`](crate::models::report::VerificationReport::into_result).

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced by identity, issuance, presentation and ledger operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An identifier is absent from the registry.
    #[error("identifier not found: {0}")]
    NotFound(String),

    /// A signature does not match its claimed signer or content.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The requested expiry is not strictly after the issuance time.
    #[error("expiry {expires_at} is not after issuance time {issued_at}")]
    InvalidExpiry {
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },

    #[error("credential {credential_id} expired at {expired_at}")]
    ExpiredCredential {
        credential_id: String,
        expired_at: DateTime<Utc>,
    },

    #[error("credential {0} has been revoked")]
    RevokedCredential(String),

    /// The reveal set names claims the credential does not carry.
    #[error("unknown attributes in reveal set: {}", .0.join(", "))]
    UnknownAttribute(Vec<String>),

    #[error("presentation created at {created} is outside the replay window")]
    StaleChallenge { created: DateTime<Utc> },

    /// The claims mapping is empty or uses a reserved key.
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// Key material could not be decoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// An identifier is already registered with a different public key.
    #[error("identifier {0} is already registered with another key")]
    IdentityConflict(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Convenience result type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
