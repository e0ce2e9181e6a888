// src/wallet/mod.rs
//! Participant key material and Prover-held credentials.

pub mod credential_storage;
pub mod key_management;
