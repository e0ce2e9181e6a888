// src/models/record.rs
//! Ledger facts produced by a successful verification.

use crate::models::assertion::FieldReference;
use crate::models::party::Party;
use crate::models::proof::{ProofRequest, ProofResponse, ProofSupportData};
use serde::{Deserialize, Serialize};

/// Durable record of one successful claim verification.
///
/// Only ever built after the proof checked out against `request`; the record
/// carries the proof of the fact it records.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    /// Caller-chosen key the verification is looked up by later
    pub identifier: String,
    pub request: ProofRequest,
    pub proof: ProofResponse,
    pub support: ProofSupportData,
    /// Verifier first, then Prover
    pub participants: Vec<Party>,
}

impl VerificationRecord {
    pub fn has_participant(&self, party: &Party) -> bool {
        self.participants.contains(party)
    }
}

/// Revealed value a committed record must carry for one field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExpectedAttribute {
    pub reference: FieldReference,
    pub value: String,
}

/// Commands a verification transaction may carry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerificationCommand {
    /// Record a verification whose revealed values must match `expected_attributes`
    Verify { expected_attributes: Vec<ExpectedAttribute> },
}
