// src/contracts/verification_contract.rs
//! Ledger contract governing verification transactions.
//!
//! Every party validates a proposal against these rules before signing it,
//! and the notary validates again before committing. The `Verify` command
//! re-checks the revealed values the Verifier declared it expects,
//! independently of the proof check that produced the record.

use crate::error::{FlowError, FlowResult};
use crate::ledger::transaction::TransactionProposal;
use crate::models::record::{ExpectedAttribute, VerificationCommand, VerificationRecord};
use std::collections::BTreeSet;

/// Checks a proposal against the rules of the command it carries.
///
/// # Errors
/// `TransactionValidationFailed` describing the first violated rule
pub fn verify(proposal: &TransactionProposal) -> FlowResult<()> {
    match &proposal.command {
        VerificationCommand::Verify { expected_attributes } => verify_claims(proposal, expected_attributes),
    }
}

fn verify_claims(proposal: &TransactionProposal, expected: &[ExpectedAttribute]) -> FlowResult<()> {
    let record = match proposal.outputs.as_slice() {
        [record] => record,
        outputs => return Err(reject(format!("expected exactly one verification record, found {}", outputs.len()))),
    };

    if record.identifier.trim().is_empty() {
        return Err(reject("verification record has an empty identifier"));
    }

    check_participants(proposal, record)?;

    for attribute in expected {
        if !record.request.requested_attributes.contains(&attribute.reference) {
            return Err(reject(format!(
                "expected attribute '{}' was not requested",
                attribute.reference.field
            )));
        }
        match record.support.revealed_value(&attribute.reference) {
            Some(value) if value == attribute.value => {}
            Some(value) => {
                return Err(reject(format!(
                    "attribute '{}' revealed as '{}' but '{}' was expected",
                    attribute.reference.field, value, attribute.value
                )))
            }
            None => {
                return Err(reject(format!("attribute '{}' was not revealed", attribute.reference.field)))
            }
        }
    }

    for reference in &record.request.requested_attributes {
        if record.support.revealed_value(reference).is_none() {
            return Err(reject(format!("requested attribute '{}' missing from proof data", reference.field)));
        }
    }

    Ok(())
}

fn check_participants(proposal: &TransactionProposal, record: &VerificationRecord) -> FlowResult<()> {
    let participants: BTreeSet<_> = record.participants.iter().collect();
    if record.participants.len() != 2 || participants.len() != 2 {
        return Err(reject("a verification record needs exactly two distinct participants"));
    }
    let signers: BTreeSet<_> = proposal.required_signers.iter().collect();
    if signers != participants {
        return Err(reject("required signers must be exactly the record participants"));
    }
    if !record.has_participant(&proposal.proposer) {
        return Err(reject(format!("proposer {} is not a participant", proposal.proposer)));
    }
    if record.has_participant(&proposal.notary) {
        return Err(reject("the notary cannot be a participant"));
    }
    Ok(())
}

fn reject(reason: impl Into<String>) -> FlowError {
    FlowError::TransactionValidationFailed(reason.into())
}
