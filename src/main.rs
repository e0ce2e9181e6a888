// src/main.rs

//! # Verifiable Claims - Demo Entry Point
//!
//! Wires the in-process collaborators together and runs one publish and
//! one verification end to end.
//!
//! ## Sequence
//! 1. Gov publishes a `person` schema; the authority derives a definition
//! 2. The authority issues the prover a credential
//! 3. The verifier checks `age >= 18` and reveals `name`
//!
//! ## Environment
//! `CLAIMS_*` variables (see `settings`), `RUST_LOG` for log level.

use anyhow::{bail, Context};
use chrono::Utc;
use dotenv::dotenv;
use std::sync::Arc;
use verifiable_claims::ledger::{DuplicatePolicy, InMemoryLedger, InMemoryNetwork, Ledger, Network, SessionHandler};
use verifiable_claims::models::assertion::{AttributeAssertion, PredicateAssertion};
use verifiable_claims::models::proof::NonRevocationInterval;
use verifiable_claims::models::schema::SchemaDetails;
use verifiable_claims::registry::InMemoryRegistry;
use verifiable_claims::wallet::key_management::KeyManager;
use verifiable_claims::zkp::{MasterSecret, ReferenceProofSystem};
use verifiable_claims::{
    ClaimDefinitionPublisher, CredentialProofVerifier, CredentialProverResponder, Settings, VerifyClaimsRequest,
};

const SCHEMA_OWNER: &str = "Gov";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load CLAIMS_* settings")?;
    let flow = settings.flow_settings();
    let policy = if settings.allow_duplicate_identifiers {
        DuplicatePolicy::Allow
    } else {
        DuplicatePolicy::Reject
    };

    // Shared collaborators
    let proofs = Arc::new(ReferenceProofSystem::new());
    let registry = Arc::new(InMemoryRegistry::new());
    let ledger = Arc::new(InMemoryLedger::new(&settings.notary_name, policy));
    let network = Arc::new(InMemoryNetwork::new(flow.session_timeout));

    // Claim definition
    registry.register_authority(SCHEMA_OWNER).await;
    registry.register_authority(&settings.authority_name).await;
    let publisher = ClaimDefinitionPublisher::new(registry.clone(), proofs.clone());
    let details = SchemaDetails::new("person", "1.0", SCHEMA_OWNER);
    let schema_id = publisher
        .create_schema(details.clone(), vec!["name".into(), "age".into()], SCHEMA_OWNER)
        .await?;
    let cred_def_id = publisher
        .create_claim_definition(&details, &settings.authority_name)
        .await
        .context("credential definition was not published")?;

    // Prover credential
    let secret = MasterSecret::new(&settings.master_secret_id);
    proofs
        .issue_credential(&secret, &cred_def_id, [("name", "Alice"), ("age", "25")], Utc::now())
        .await?;

    // Parties
    let prover = CredentialProverResponder::new(
        &settings.prover_name,
        KeyManager::new(),
        secret,
        proofs.clone(),
        ledger.clone(),
    );
    let prover_party = prover.party().clone();
    let handler: Arc<dyn SessionHandler> = Arc::new(prover);
    network.register(prover_party, Some(handler)).await;

    let verifier = CredentialProofVerifier::new(
        &settings.verifier_name,
        KeyManager::new(),
        network.clone(),
        ledger.clone(),
        proofs.clone(),
    );
    network.register(verifier.party().clone(), None).await;
    log::info!("{} resolved as {}", settings.prover_name, network.resolve_party(&settings.prover_name).await?);

    // Verification
    let owner = settings.authority_name.as_str();
    let request = VerifyClaimsRequest {
        identifier: "demo-age-check".into(),
        attributes: vec![AttributeAssertion::reveal(&schema_id, &cred_def_id, owner, "name").expecting("Alice")],
        predicates: vec![PredicateAssertion::at_least(&schema_id, &cred_def_id, owner, "age", 18)],
        prover_name: settings.prover_name.clone(),
        non_revoked: Some(NonRevocationInterval::at(Utc::now())),
    };
    let verified = verifier.verify_claims(request).await;
    for result in network.settle().await {
        if let Err(e) = result {
            log::warn!("prover run ended with {}: {}", e.kind(), e);
        }
    }
    if !verified {
        bail!("verification failed, see log for the cause");
    }

    let records = ledger.verifications("demo-age-check").await;
    println!("verified; {} record(s) committed under 'demo-age-check'", records.len());
    Ok(())
}
