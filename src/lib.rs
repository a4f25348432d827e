// src/lib.rs
//! # Self-Sovereign Identity Trust Protocol
//!
//! Three roles exchange attested claims without the verifier ever contacting
//! the issuer:
//! - **Issuers** sign credentials about a subject and anchor a content hash
//! - **Holders** keep credentials and present chosen claims, hiding the rest
//!   behind hash commitments
//! - **Verifiers** check a presentation with public keys and a revocation snapshot
//!
//! ## Layers
//! 1. **Models**: identities, credentials, presentations, proofs, reports
//! 2. **Services**: identity management, issuance, verification
//! 3. **Wallet**: key management, presentation building, credential storage
//! 4. **Blockchain**: the ledger collaborator (registry, anchors, revocations)
//! 5. **Utils**: hashing, canonical serialization, injected clock

pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod wallet;

pub use error::{Error, Result};
