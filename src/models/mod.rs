// src/models/mod.rs
//! Data structures exchanged and recorded by the protocols.

pub mod assertion;   // Attribute / predicate assertions
pub mod credential;  // Prover-held credentials
pub mod party;       // Participant identities
pub mod proof;       // Proof requests, responses, support data
pub mod record;      // Ledger records and commands
pub mod schema;      // Registry artifacts
