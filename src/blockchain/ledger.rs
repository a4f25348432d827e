// src/blockchain/ledger.rs
//! Append-only ledger used to anchor hashes and publish revocations.
//!
//! The ledger only ever holds public material:
//! - identifiers and public keys
//! - credential content hashes with issuer/subject identifiers
//! - revocation records
//!
//! Personal data, private keys, credential contents and presentations stay
//! off-ledger.

use crate::error::{Error, Result};
use crate::models::credential::{AnchorRecord, RevocationRecord};
use crate::models::did::PublicRecord;
use crate::utils::clock::Clock;
use crate::utils::crypto::hash_hex;
use crate::utils::serialization::canonicalize;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Store interface consumed by the issuer and the verification engine.
///
/// Mutations take `&self`: implementations serialize their own write path so
/// callers can share one ledger across threads.
pub trait Ledger: Send + Sync {
    /// Publishes an identifier and its public key. Idempotent.
    fn register_identity(&self, record: PublicRecord) -> Result<()>;

    /// Appends proof of issuance. The record carries no claim values.
    fn anchor_credential_hash(&self, anchor: AnchorRecord) -> Result<()>;

    /// Appends a revocation and grows the revocation set.
    fn publish_revocation(&self, revocation: RevocationRecord) -> Result<()>;

    /// Looks up a published identity, failing with `NotFound` if absent.
    fn lookup_identity(&self, identifier: &str) -> Result<PublicRecord>;

    /// Immutable snapshot of published revocations.
    fn revocation_set(&self) -> RevocationSet;
}

/// Read-only snapshot of published revocations.
///
/// Each revoked credential id maps to the identifiers that published a
/// revocation for it. Only a revocation by the credential's own issuer
/// counts; the verifier checks that with [`RevocationSet::is_revoked_by`].
///
/// Cloning is cheap and a snapshot never changes after it is taken, so one
/// verification observes a consistent set for its whole duration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationSet(Arc<BTreeMap<String, BTreeSet<String>>>);

impl RevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if anyone published a revocation for `credential_id`.
    pub fn contains(&self, credential_id: &str) -> bool {
        self.0.contains_key(credential_id)
    }

    /// True if `revoker` published a revocation for `credential_id`.
    pub fn is_revoked_by(&self, credential_id: &str, revoker: &str) -> bool {
        self.0
            .get(credential_id)
            .map_or(false, |revokers| revokers.contains(revoker))
    }

    /// Identifiers that published a revocation for `credential_id`.
    pub fn revokers(&self, credential_id: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(credential_id)
            .into_iter()
            .flat_map(|revokers| revokers.iter().map(String::as_str))
    }

    /// Number of distinct revoked credential ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Revoked credential ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Outstanding snapshots keep the old map; only this one is cloned.
    fn insert(&mut self, credential_id: String, revoker: String) {
        Arc::make_mut(&mut self.0)
            .entry(credential_id)
            .or_default()
            .insert(revoker);
    }
}

/// Builds a set from `(credential_id, revoked_by)` pairs.
impl FromIterator<(String, String)> for RevocationSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut set = RevocationSet::new();
        for (credential_id, revoker) in iter {
            set.insert(credential_id, revoker);
        }
        set
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RevocationSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(id, by)| (id.to_string(), by.to_string()))
            .collect()
    }
}

/// Payload of a ledger block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LedgerEntry {
    #[serde(rename_all = "camelCase")]
    Genesis { message: String },
    #[serde(rename_all = "camelCase")]
    IdentityRegistered {
        identifier: String,
        public_key_hex: String,
    },
    #[serde(rename_all = "camelCase")]
    CredentialAnchored {
        content_hash: String,
        issuer_identifier: String,
        credential_type: String,
    },
    #[serde(rename_all = "camelCase")]
    CredentialRevoked {
        credential_id: String,
        revoked_by: String,
    },
}

impl LedgerEntry {
    fn label(&self) -> &'static str {
        match self {
            LedgerEntry::Genesis { .. } => "GENESIS",
            LedgerEntry::IdentityRegistered { .. } => "IDENTITY_REGISTERED",
            LedgerEntry::CredentialAnchored { .. } => "CREDENTIAL_ANCHORED",
            LedgerEntry::CredentialRevoked { .. } => "CREDENTIAL_REVOKED",
        }
    }
}

/// One hash-linked block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub entry: LedgerEntry,
    pub previous_hash: String,
    pub hash: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockContent<'a> {
    index: u64,
    timestamp: &'a DateTime<Utc>,
    entry: &'a LedgerEntry,
    previous_hash: &'a str,
}

fn block_hash(
    index: u64,
    timestamp: &DateTime<Utc>,
    entry: &LedgerEntry,
    previous_hash: &str,
) -> Result<String> {
    let content = BlockContent {
        index,
        timestamp,
        entry,
        previous_hash,
    };
    Ok(hash_hex(&canonicalize(&content)?))
}

#[derive(Default)]
struct LedgerState {
    blocks: Vec<Block>,
    identities: BTreeMap<String, PublicRecord>,
    anchors: Vec<AnchorRecord>,
    revocations: Vec<RevocationRecord>,
    revoked: RevocationSet,
}

impl LedgerState {
    fn append(&mut self, timestamp: DateTime<Utc>, entry: LedgerEntry) -> Result<()> {
        let index = self.blocks.len() as u64;
        let previous_hash = self
            .blocks
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| "0".to_string());
        let hash = block_hash(index, &timestamp, &entry, &previous_hash)?;
        debug!("ledger block #{index} {} {}", entry.label(), &hash[..16]);
        self.blocks.push(Block {
            index,
            timestamp,
            entry,
            previous_hash,
            hash,
        });
        Ok(())
    }
}

/// In-process ledger with a hash-chained block list.
///
/// Intended for demos and tests; it models the append-only, monotonic
/// consistency expected from a real ledger without any consensus.
pub struct InMemoryLedger {
    clock: Arc<dyn Clock>,
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    /// Initializes a ledger holding only the genesis block.
    pub fn new(clock: Arc<dyn Clock>) -> Result<Self> {
        let mut state = LedgerState::default();
        state.append(
            clock.now(),
            LedgerEntry::Genesis {
                message: "Initial block of the trust ledger".to_string(),
            },
        )?;
        Ok(InMemoryLedger {
            clock,
            state: RwLock::new(state),
        })
    }

    /// Copy of every block, genesis first.
    pub fn blocks(&self) -> Vec<Block> {
        self.read().blocks.clone()
    }

    /// Anchored issuance records, in publication order.
    pub fn anchors(&self) -> Vec<AnchorRecord> {
        self.read().anchors.clone()
    }

    /// Published revocation records, in publication order.
    pub fn revocations(&self) -> Vec<RevocationRecord> {
        self.read().revocations.clone()
    }

    /// Recomputes every block hash and link.
    pub fn verify_chain(&self) -> bool {
        let state = self.read();
        state.blocks.iter().enumerate().all(|(i, block)| {
            let expected_previous = match i {
                0 => "0",
                _ => state.blocks[i - 1].hash.as_str(),
            };
            block.index == i as u64
                && block.previous_hash == expected_previous
                && block_hash(block.index, &block.timestamp, &block.entry, &block.previous_hash)
                    .map(|h| h == block.hash)
                    .unwrap_or(false)
        })
    }

    /// Counts and block list for status reporting.
    pub fn summary(&self) -> LedgerSummary {
        let state = self.read();
        LedgerSummary {
            blocks: state
                .blocks
                .iter()
                .map(|b| (b.index, b.entry.label(), b.hash.clone()))
                .collect(),
            identities: state.identities.len(),
            anchors: state.anchors.len(),
            revocations: state.revoked.len(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Ledger for InMemoryLedger {
    fn register_identity(&self, record: PublicRecord) -> Result<()> {
        let mut state = self.write();
        if let Some(existing) = state.identities.get(&record.identifier) {
            if existing.public_key_hex == record.public_key_hex {
                debug!("identity {} already registered", record.identifier);
                return Ok(());
            }
            return Err(Error::IdentityConflict(record.identifier));
        }
        state.append(
            self.clock.now(),
            LedgerEntry::IdentityRegistered {
                identifier: record.identifier.clone(),
                public_key_hex: record.public_key_hex.clone(),
            },
        )?;
        info!("registered identity {}", record.identifier);
        state.identities.insert(record.identifier.clone(), record);
        Ok(())
    }

    fn anchor_credential_hash(&self, anchor: AnchorRecord) -> Result<()> {
        let mut state = self.write();
        state.append(
            self.clock.now(),
            LedgerEntry::CredentialAnchored {
                content_hash: anchor.content_hash.clone(),
                issuer_identifier: anchor.issuer_identifier.clone(),
                credential_type: anchor.credential_type.clone(),
            },
        )?;
        info!(
            "anchored credential hash {} from {}",
            anchor.content_hash, anchor.issuer_identifier
        );
        state.anchors.push(anchor);
        Ok(())
    }

    fn publish_revocation(&self, revocation: RevocationRecord) -> Result<()> {
        let mut state = self.write();
        if !state.identities.contains_key(&revocation.revoked_by) {
            return Err(Error::NotFound(revocation.revoked_by));
        }
        if state
            .revoked
            .is_revoked_by(&revocation.credential_id, &revocation.revoked_by)
        {
            debug!(
                "credential {} already revoked by {}",
                revocation.credential_id, revocation.revoked_by
            );
            return Ok(());
        }
        state.append(
            self.clock.now(),
            LedgerEntry::CredentialRevoked {
                credential_id: revocation.credential_id.clone(),
                revoked_by: revocation.revoked_by.clone(),
            },
        )?;
        state.revoked.insert(
            revocation.credential_id.clone(),
            revocation.revoked_by.clone(),
        );
        info!(
            "published revocation of {} by {}",
            revocation.credential_id, revocation.revoked_by
        );
        state.revocations.push(revocation);
        Ok(())
    }

    fn lookup_identity(&self, identifier: &str) -> Result<PublicRecord> {
        self.read()
            .identities
            .get(identifier)
            .cloned()
            .ok_or_else(|| Error::NotFound(identifier.to_string()))
    }

    fn revocation_set(&self) -> RevocationSet {
        self.read().revoked.clone()
    }
}

/// Snapshot of ledger contents for the status report.
#[derive(Debug, Clone)]
pub struct LedgerSummary {
    pub blocks: Vec<(u64, &'static str, String)>,
    pub identities: usize,
    pub anchors: usize,
    pub revocations: usize,
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        let thin = "-".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "  LEDGER STATE (ON-CHAIN DATA)")?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;
        writeln!(f, "  Total blocks: {}", self.blocks.len())?;
        writeln!(f, "  Registered identities: {}", self.identities)?;
        writeln!(f, "  Anchored credentials: {}", self.anchors)?;
        writeln!(f, "  Revocations: {}", self.revocations)?;
        writeln!(f)?;
        writeln!(f, "  --- Blocks ---")?;
        for (index, label, hash) in &self.blocks {
            writeln!(f, "  [Block #{index}] {label} | Hash: {}...", &hash[..20])?;
        }
        writeln!(f)?;
        writeln!(f, "{thin}")?;
        writeln!(f, "  DATA KEPT OFF-CHAIN")?;
        writeln!(f, "{thin}")?;
        writeln!(f, "  - Names, birth dates, addresses")?;
        writeln!(f, "  - Full credential contents")?;
        writeln!(f, "  - Private keys")?;
        writeln!(f, "  - Verifiable presentations")?;
        write!(f, "{rule}")
    }
}
