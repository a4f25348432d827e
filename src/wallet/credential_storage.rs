// src/wallet/credential_storage.rs
//! Holder-side credential storage.
//!
//! Keeps the credentials a holder has received, keyed by credential id, so
//! the holder can pick one later and decide which attributes to reveal.

use crate::models::credential::VerifiableCredential;
use crate::wallet::presentation_builder;
use log::debug;
use std::collections::HashMap;

/// In-memory storage for received credentials.
///
/// Not synchronized; wrap it in a lock if several threads share one wallet.
///
/// # Security Notes
/// - Credentials hold claim values in clear text
/// - Removing a credential does not scrub its memory
#[derive(Debug, Default)]
pub struct CredentialStorage {
    credentials: HashMap<String, VerifiableCredential>,
}

impl CredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a credential under its own id.
    ///
    /// # Returns
    /// The previously stored credential with the same id, if any.
    pub fn store_credential(&mut self, credential: VerifiableCredential) -> Option<VerifiableCredential> {
        let id = credential.id().to_string();
        debug!("storing credential {id}");
        self.credentials.insert(id, credential)
    }

    pub fn get_credential(&self, id: &str) -> Option<&VerifiableCredential> {
        self.credentials.get(id)
    }

    pub fn count_credentials(&self) -> usize {
        self.credentials.len()
    }

    pub fn contains_credential(&self, id: &str) -> bool {
        self.credentials.contains_key(id)
    }

    /// Removes a credential.
    ///
    /// # Returns
    /// `true` if a credential with this id was present.
    pub fn remove_credential(&mut self, id: &str) -> bool {
        self.credentials.remove(id).is_some()
    }

    /// Claim keys the holder may reveal from a stored credential, in
    /// canonical order. `None` if no credential has this id.
    pub fn available_attributes(&self, id: &str) -> Option<Vec<String>> {
        self.get_credential(id)
            .map(presentation_builder::available_attributes)
    }
}
