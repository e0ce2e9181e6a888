// src/contracts/mod.rs
//! Ledger contract rules enforced at commit time.

pub mod verification_contract;
