// src/zkp/proof_generation.rs
//! # Reference proof generation
//!
//! Builds a [`ReferenceProof`] for a [`ProofRequest`] from the credentials in
//! the wallet bound to a master secret.
//!
//! ## Proof layout
//! - one sub-proof per credential the request touches, grouped by
//!   schema / credential definition / issuer
//! - revealed references carry their value; predicate references carry only
//!   a pass/fail outcome
//! - each sub-proof is signed by its credential definition's key over the
//!   request digest followed by the sub-proof statement

use super::{MasterSecret, ReferenceState};
use crate::error::{FlowError, FlowResult};
use crate::models::assertion::FieldReference;
use crate::models::credential::IssuedCredential;
use crate::models::proof::{PredicateRequirement, ProofRequest, ProofResponse, RevealedAttribute};
use crate::utils::serialization::base64_bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct PredicateOutcome {
    pub(crate) requirement: PredicateRequirement,
    pub(crate) holds: bool,
}

/// What one credential attests for one request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubProofStatement {
    pub(crate) schema_id: String,
    pub(crate) cred_def_id: String,
    pub(crate) issuer: String,
    pub(crate) revealed: Vec<RevealedAttribute>,
    pub(crate) predicates: Vec<PredicateOutcome>,
    /// `Some` exactly when the request asked for a non-revocation interval
    pub(crate) non_revoked: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubProof {
    pub(crate) statement: SubProofStatement,
    #[serde(with = "base64_bytes")]
    pub(crate) signature: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferenceProof {
    pub(crate) request_digest: String,
    pub(crate) sub_proofs: Vec<SubProof>,
}

impl ReferenceProof {
    pub(crate) fn decode(response: &ProofResponse) -> FlowResult<Self> {
        Ok(serde_json::from_slice(response.as_bytes())?)
    }

    pub(crate) fn encode(&self) -> FlowResult<ProofResponse> {
        Ok(ProofResponse::from_bytes(serde_json::to_vec(self)?))
    }
}

/// Bytes a sub-proof signature covers.
pub(crate) fn signing_payload(request_digest: &str, statement: &SubProofStatement) -> FlowResult<Vec<u8>> {
    let mut payload = request_digest.as_bytes().to_vec();
    payload.extend(serde_json::to_vec(statement)?);
    Ok(payload)
}

type CredentialKey = (String, String, String);

#[derive(Default)]
struct Group<'a> {
    revealed: Vec<&'a FieldReference>,
    predicates: Vec<&'a PredicateRequirement>,
}

fn group_key(reference: &FieldReference) -> CredentialKey {
    let (schema_id, cred_def_id, owner) = reference.credential_key();
    (schema_id.to_string(), cred_def_id.to_string(), owner.to_string())
}

/// Generates a proof for `request` from the wallet bound to `secret`.
///
/// # Errors
/// `ProofGenerationFailed` if:
/// - the master secret has no wallet
/// - no credential serves one of the referenced definitions
/// - a referenced field is absent, or a predicate field is not an integer
pub(crate) fn generate_proof(
    state: &ReferenceState,
    request: &ProofRequest,
    secret: &MasterSecret,
) -> FlowResult<ProofResponse> {
    let wallet = state
        .wallets
        .get(secret.id())
        .ok_or_else(|| FlowError::ProofGenerationFailed(format!("no credentials bound to secret {}", secret.id())))?;

    let mut groups: BTreeMap<CredentialKey, Group<'_>> = BTreeMap::new();
    for reference in &request.requested_attributes {
        groups.entry(group_key(reference)).or_default().revealed.push(reference);
    }
    for predicate in &request.requested_predicates {
        groups.entry(group_key(&predicate.reference)).or_default().predicates.push(predicate);
    }

    let request_digest = request.digest()?;
    let mut sub_proofs = Vec::with_capacity(groups.len());
    for ((schema_id, cred_def_id, issuer), group) in groups {
        let probe = FieldReference {
            schema_id: schema_id.clone(),
            cred_def_id: cred_def_id.clone(),
            cred_def_owner: issuer.clone(),
            field: String::new(),
        };
        let credential = wallet.find_for(&probe).ok_or_else(|| {
            FlowError::ProofGenerationFailed(format!("no credential issued under {} by {}", cred_def_id, issuer))
        })?;
        let definition = state.definitions.get(&cred_def_id).ok_or_else(|| {
            FlowError::ProofGenerationFailed(format!("unknown credential definition {}", cred_def_id))
        })?;

        let statement = SubProofStatement {
            revealed: reveal(credential, &group.revealed)?,
            predicates: evaluate(credential, &group.predicates)?,
            non_revoked: request
                .non_revoked
                .map(|interval| credential.valid_within(interval.from, interval.to)),
            schema_id,
            cred_def_id,
            issuer,
        };
        let signature = definition.keys.sign_message(&signing_payload(&request_digest, &statement)?)?;
        sub_proofs.push(SubProof { statement, signature });
    }

    ReferenceProof { request_digest, sub_proofs }.encode()
}

fn field_value<'c>(credential: &'c IssuedCredential, field: &str) -> FlowResult<&'c str> {
    credential.value(field).ok_or_else(|| {
        FlowError::ProofGenerationFailed(format!("credential {} has no field '{}'", credential.id, field))
    })
}

fn reveal(credential: &IssuedCredential, references: &[&FieldReference]) -> FlowResult<Vec<RevealedAttribute>> {
    references
        .iter()
        .map(|reference| {
            Ok(RevealedAttribute {
                reference: (*reference).clone(),
                value: field_value(credential, &reference.field)?.to_string(),
            })
        })
        .collect()
}

fn evaluate(credential: &IssuedCredential, predicates: &[&PredicateRequirement]) -> FlowResult<Vec<PredicateOutcome>> {
    predicates
        .iter()
        .map(|predicate| {
            let raw = field_value(credential, &predicate.reference.field)?;
            let value: i64 = raw.trim().parse().map_err(|_| {
                FlowError::ProofGenerationFailed(format!(
                    "field '{}' is not an integer",
                    predicate.reference.field
                ))
            })?;
            Ok(PredicateOutcome { requirement: (*predicate).clone(), holds: value >= predicate.threshold })
        })
        .collect()
}
