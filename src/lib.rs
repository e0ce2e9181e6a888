// src/lib.rs

//! # Verifiable Claims
//!
//! A Verifier asks a Prover to prove attribute values and `>=` predicates
//! over issued credentials, checks the proof against exactly the request it
//! sent, and commits a verification record jointly with the Prover. An
//! Authority publishes schemas and credential definitions to a registry.
//!
//! ## Layout
//! 1. **Models**: assertions, proof requests, records, registry artifacts
//! 2. **Services**: the verifier, prover and publisher flows
//! 3. **Ledger**: sessions, transactions, signatures, commit
//! 4. **Registry / ZKP**: collaborator seams with in-process implementations
//! 5. **Wallet**: keys and Prover-held credentials

pub mod contracts; // Commit-time verification rules
pub mod error;     // Error taxonomy
pub mod ledger;    // Ledger substrate seam
pub mod models;    // Data structures
pub mod registry;  // Artifact registry seam
pub mod services;  // Protocol flows
pub mod settings;  // Runtime configuration
pub mod utils;     // Helper functions
pub mod wallet;    // Keys and credentials
pub mod zkp;       // Proof-system capability

pub use error::{FlowError, FlowResult};
pub use services::claim_definition::ClaimDefinitionPublisher;
pub use services::prover::{AcceptancePolicy, CredentialProverResponder, ExpectedVerifierPolicy};
pub use services::request_builder::ProofRequestBuilder;
pub use services::verifier::{CredentialProofVerifier, VerificationOutcome, VerifyClaimsRequest};
pub use settings::{FlowSettings, Settings};
