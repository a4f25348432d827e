// src/main.rs

//! # Self-Sovereign Identity Trust Protocol - Demo Entry Point
//!
//! Walks one end-to-end scenario through every role of the protocol.
//!
//! ## Flow
//! 1. **Identities**: a civil registry, a citizen and a landlord create key pairs
//! 2. **Registry**: each public record is published to the in-memory ledger
//! 3. **Issuance**: the registry issues an identity card and anchors its hash
//! 4. **Presentation**: the citizen reveals name and nationality only
//! 5. **Verification**: the landlord checks the presentation offline
//! 6. **Revocation**: the registry revokes the card and the landlord checks again
//!
//! ## Environment Variables
//! - `RUST_LOG`: (Optional) log filter (default: info)
//! - `SSI_*`: (Optional) settings, see [`ssi_trust::config`]

use anyhow::Context;
use dotenv::dotenv;
use rand::rngs::OsRng;
use ssi_trust::blockchain::ledger::{InMemoryLedger, Ledger};
use ssi_trust::config::Settings;
use ssi_trust::models::presentation::VerifiablePresentation;
use ssi_trust::services::credential_issuer::{CredentialIssuer, CredentialRequest};
use ssi_trust::services::identity_manager::IdentityManager;
use ssi_trust::services::verifier::Verifier;
use ssi_trust::utils::clock::{Clock, SystemClock};
use ssi_trust::utils::serialization::{deserialize, serialize};
use ssi_trust::wallet::credential_storage::CredentialStorage;
use ssi_trust::wallet::presentation_builder::PresentationBuilder;
use std::sync::Arc;

/// Demo entry point
///
/// # Errors
/// - If settings cannot be parsed from the environment
/// - If any issuance or ledger step rejects its input
fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load SSI_* settings")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut rng = OsRng;

    let ledger = InMemoryLedger::new(clock.clone())?;
    let identities = IdentityManager::new(clock.clone());
    let issuer_service =
        CredentialIssuer::new(clock.clone()).with_validity(settings.credential_validity());
    let builder = PresentationBuilder::new(clock.clone()).with_policy(settings.reveal_policy());
    let verifier = Verifier::new(clock)
        .with_replay_window(settings.replay_window())
        .with_freshness_policy(settings.freshness_policy());

    // Step 1-2: identities, published to the registry
    let registry = identities.create_identity("Registro Civil", &mut rng);
    let citizen = identities.create_identity("Maria Garcia", &mut rng);
    let landlord = identities.create_identity("Landlord", &mut rng);
    for identity in [&registry, &citizen, &landlord] {
        ledger.register_identity(identity.public_record())?;
        println!("{:<16} {}", identity.label, identity.identifier);
    }

    // Step 3: issuance with an on-ledger anchor
    let request = CredentialRequest::new(&citizen.identifier, "IdentityCard").claims([
        ("name", "Maria Garcia"),
        ("birth_date", "1990-05-14"),
        ("nationality", "DO"),
        ("id_number", "001-1234567-8"),
    ]);
    let issued = issuer_service.issue_and_anchor(&registry, request, &ledger, &mut rng)?;
    println!("\nIssued {} (hash {})", issued.credential.id(), issued.content_hash);

    let mut wallet = CredentialStorage::new();
    wallet.store_credential(issued.credential.clone());
    let credential_id = issued.credential.id();
    let credential = wallet
        .get_credential(credential_id)
        .context("credential missing from wallet")?;
    println!(
        "Wallet holds {} credential(s); attributes: {}",
        wallet.count_credentials(),
        wallet.available_attributes(credential_id).unwrap_or_default().join(", ")
    );

    // Step 4: selective disclosure for the landlord
    let presentation = builder.create_presentation(
        &citizen,
        credential,
        &["name", "nationality"],
        &landlord.identifier,
        "Rental application",
        &mut rng,
    )?;

    // Step 5: the landlord receives the JSON and verifies it offline
    let wire = serialize(&presentation)?;
    let received: VerifiablePresentation = deserialize(&wire)?;
    let report = verifier.verify_with_ledger(&received, &ledger)?;
    println!("\n{report}");

    // Step 6: revocation, then the same presentation again
    issuer_service.revoke_and_publish(credential_id, &registry, "Document reported stolen", &ledger)?;
    let report = verifier.verify_with_ledger(&received, &ledger)?;
    println!("\n{report}");

    println!("\n{}", ledger.summary());
    println!("Chain intact: {}", ledger.verify_chain());
    Ok(())
}
