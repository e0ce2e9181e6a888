// src/models/party.rs
//! Network identity of a protocol participant.
//!
//! A [`Party`] pairs the human-readable name callers address a participant
//! by with the secp256k1 verifying key its ledger signatures are checked
//! against.
//!
//! # Key Format
//! The `public_key` field holds a SEC1-compressed (33 byte) point. It is
//! carried as base64 when a party crosses the wire.

use crate::utils::serialization::base64_bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolvable participant (Verifier, Prover, Authority or notary).
///
/// # Fields
/// - `name`: Name the party is resolved by
/// - `public_key`: SEC1-compressed verifying key
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Party {
    /// Name the party is resolved by
    /// Example: "Alice"
    pub name: String,

    /// SEC1-compressed secp256k1 public key
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
}

impl Party {
    pub fn new(name: impl Into<String>, public_key: Vec<u8>) -> Self {
        Self { name: name.into(), public_key }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
