// src/zkp/proof_verification.rs
//! # Reference proof verification
//!
//! Checks a [`ReferenceProof`] against the [`ProofRequest`] it claims to
//! answer and extracts the data used in the proof.
//!
//! ## Checks
//! 1. The proof is bound to this request's digest (nonce included)
//! 2. Every sub-proof is signed by a known credential definition whose
//!    schema and issuer match the statement
//! 3. Every requested attribute is revealed, and nothing unrequested is
//! 4. Every requested predicate is proven from the credential it names,
//!    with its threshold, and holds
//! 5. With a non-revocation interval, every credential was valid within it

use super::proof_generation::{signing_payload, PredicateOutcome, ReferenceProof, SubProofStatement};
use super::ReferenceState;
use crate::error::FlowResult;
use crate::models::assertion::FieldReference;
use crate::models::proof::{ProofRequest, ProofResponse, ProofSupportData, ProofVerification};
use crate::wallet::key_management::KeyManager;

/// Verifies `response` against `request`.
///
/// Rejections are returned as `Ok` with `verified == false`.
pub(crate) fn verify_proof(
    state: &ReferenceState,
    request: &ProofRequest,
    response: &ProofResponse,
) -> FlowResult<ProofVerification> {
    let proof = match ReferenceProof::decode(response) {
        Ok(proof) => proof,
        Err(e) => return Ok(ProofVerification::rejected(format!("undecodable proof: {}", e))),
    };

    let digest = request.digest()?;
    if proof.request_digest != digest {
        return Ok(ProofVerification::rejected("proof was produced for a different request"));
    }

    let mut support = ProofSupportData::default();
    let mut outcomes: Vec<&PredicateOutcome> = Vec::new();
    for sub_proof in &proof.sub_proofs {
        let statement = &sub_proof.statement;
        let Some(definition) = state.definitions.get(&statement.cred_def_id) else {
            return Ok(ProofVerification::rejected(format!(
                "unknown credential definition {}",
                statement.cred_def_id
            )));
        };
        if definition.schema.schema_id != statement.schema_id || definition.authority != statement.issuer {
            return Ok(ProofVerification::rejected(format!(
                "sub-proof does not match credential definition {}",
                statement.cred_def_id
            )));
        }
        let payload = signing_payload(&digest, statement)?;
        if !KeyManager::verify_signature(&definition.keys.public_key(), &payload, &sub_proof.signature) {
            return Ok(ProofVerification::rejected(format!(
                "invalid signature on sub-proof for {}",
                statement.cred_def_id
            )));
        }

        for revealed in &statement.revealed {
            let reference = &revealed.reference;
            if !served_by(reference, statement) {
                return Ok(ProofVerification::rejected(format!(
                    "field '{}' revealed from the wrong credential",
                    reference.field
                )));
            }
            if !request.requested_attributes.contains(reference) {
                return Ok(ProofVerification::rejected(format!("unrequested field '{}' revealed", reference.field)));
            }
        }

        for outcome in &statement.predicates {
            let reference = &outcome.requirement.reference;
            if !served_by(reference, statement) {
                return Ok(ProofVerification::rejected(format!(
                    "predicate on '{}' proven from the wrong credential",
                    reference.field
                )));
            }
            if !request.requested_predicates.contains(&outcome.requirement) {
                return Ok(ProofVerification::rejected(format!("unrequested predicate on '{}'", reference.field)));
            }
            outcomes.push(outcome);
        }

        if request.non_revoked.is_some() && statement.non_revoked != Some(true) {
            return Ok(ProofVerification::rejected(format!(
                "credential under {} is not shown unrevoked within the interval",
                statement.cred_def_id
            )));
        }

        support.revealed.extend(statement.revealed.iter().cloned());
        support.schema_ids.insert(statement.schema_id.clone());
        support.cred_def_ids.insert(statement.cred_def_id.clone());
    }

    for reference in &request.requested_attributes {
        if support.revealed_value(reference).is_none() {
            return Ok(ProofVerification::rejected(format!("requested field '{}' not revealed", reference.field)));
        }
    }

    for requirement in &request.requested_predicates {
        let outcome = outcomes.iter().find(|o| &o.requirement == requirement);
        match outcome {
            Some(o) if o.holds => {}
            Some(_) => {
                return Ok(ProofVerification::rejected(format!(
                    "predicate {} >= {} not satisfied",
                    requirement.reference.field, requirement.threshold
                )))
            }
            None => {
                return Ok(ProofVerification::rejected(format!(
                    "predicate {} >= {} not proven",
                    requirement.reference.field, requirement.threshold
                )))
            }
        }
    }

    Ok(ProofVerification::accepted(support))
}

/// Whether `reference` points at the credential `statement` speaks for.
fn served_by(reference: &FieldReference, statement: &SubProofStatement) -> bool {
    reference.schema_id == statement.schema_id
        && reference.cred_def_id == statement.cred_def_id
        && reference.cred_def_owner == statement.issuer
}
