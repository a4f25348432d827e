// src/services/identity_manager.rs
//! Identity onboarding and resolution.
//!
//! An identity is a key pair plus an identifier derived from the public key,
//! so it exists without any central authority. Publishing it to a ledger is
//! a separate, explicit step taken by the caller.

use crate::blockchain::ledger::Ledger;
use crate::error::Result;
use crate::models::did::{Identity, PublicRecord, DID_METHOD, IDENTIFIER_DIGEST_LEN};
use crate::utils::clock::Clock;
use crate::utils::crypto::hash_hex;
use crate::wallet::key_management::KeyManager;
use log::{debug, info};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// Creates identities and resolves published ones.
#[derive(Clone)]
pub struct IdentityManager {
    clock: Arc<dyn Clock>,
}

impl IdentityManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Generates a fresh key pair and derives its identifier.
    ///
    /// # Arguments
    /// * `label` - Human-readable name of the party
    /// * `rng` - Cryptographically secure random source for the key pair
    ///
    /// # Returns
    /// A new [`Identity`]. Nothing is persisted or transmitted.
    pub fn create_identity<R: RngCore + CryptoRng>(&self, label: &str, rng: &mut R) -> Identity {
        let keys = KeyManager::generate(rng);
        let identifier = derive_identifier(keys.public_key());
        info!("created identity {identifier} ({label})");
        Identity {
            label: label.to_string(),
            identifier,
            keys,
            created_at: self.clock.now(),
        }
    }

    /// Looks up a previously published `(identifier, public key)` pair.
    ///
    /// No signature check happens here; callers verify downstream.
    ///
    /// # Errors
    /// `NotFound` if the registry has no record for `identifier`.
    pub fn resolve_identity(&self, identifier: &str, registry: &dyn Ledger) -> Result<PublicRecord> {
        debug!("resolving {identifier}");
        registry.lookup_identity(identifier)
    }
}

/// `did:example:` followed by the first 128 bits of SHA-256 over the public key, in hex.
pub fn derive_identifier(public_key: &[u8]) -> String {
    let digest = hash_hex(public_key);
    format!("did:{DID_METHOD}:{}", &digest[..IDENTIFIER_DIGEST_LEN])
}
