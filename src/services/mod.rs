// src/services/mod.rs
//! Protocol flows run by Verifiers, Provers and Authorities.

pub mod claim_definition; // Schema / credential definition publishing
pub mod prover;           // Responder side of claim verification
pub mod request_builder;  // Canonical proof requests
pub mod verifier;         // Initiator side of claim verification
