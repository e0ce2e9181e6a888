// src/models/proof.rs
//! Proof request / proof response data model.
//!
//! A [`ProofRequest`] is the binding contract a returned proof is checked
//! against. Its requirement sets are `BTreeSet`s, so two requests built from
//! the same assertions in different orders are equal and encode to the same
//! canonical JSON (and therefore the same digest).

use crate::error::{FlowError, FlowResult};
use crate::models::assertion::FieldReference;
use crate::utils::crypto::hash_hex;
use crate::utils::serialization::base64_bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Time window the proof must show the credential was not revoked within.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonRevocationInterval {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl NonRevocationInterval {
    /// # Errors
    /// `MalformedAssertion` if `from` is after `to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> FlowResult<Self> {
        if from > to {
            return Err(FlowError::MalformedAssertion(format!(
                "non-revocation interval starts at {} after it ends at {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Interval covering a single instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { from: instant, to: instant }
    }
}

/// A `field >= threshold` requirement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PredicateRequirement {
    pub reference: FieldReference,
    pub threshold: i64,
}

/// Canonical set of field references and predicates a Verifier wants proven.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProofRequest {
    /// Fresh per request; binds a proof to exactly one exchange
    pub nonce: String,
    pub requested_attributes: BTreeSet<FieldReference>,
    pub requested_predicates: BTreeSet<PredicateRequirement>,
    pub non_revoked: Option<NonRevocationInterval>,
}

impl ProofRequest {
    /// SHA-256 (hex) of the canonical JSON encoding.
    pub fn digest(&self) -> FlowResult<String> {
        let encoded = serde_json::to_vec(self)?;
        Ok(hash_hex(&encoded))
    }

    /// Equality of everything except the nonce.
    pub fn same_requirements(&self, other: &ProofRequest) -> bool {
        self.requested_attributes == other.requested_attributes
            && self.requested_predicates == other.requested_predicates
            && self.non_revoked == other.non_revoked
    }

    /// Every field reference the request touches, revealed or predicated.
    pub fn references(&self) -> impl Iterator<Item = &FieldReference> {
        self.requested_attributes
            .iter()
            .chain(self.requested_predicates.iter().map(|p| &p.reference))
    }
}

/// Opaque proof material produced by the proof-system capability.
///
/// Only the capability that produced it can interpret the bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProofResponse {
    #[serde(with = "base64_bytes")]
    payload: Vec<u8>,
}

impl ProofResponse {
    pub fn from_bytes(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }
}

/// A revealed field together with the value the proof disclosed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RevealedAttribute {
    pub reference: FieldReference,
    pub value: String,
}

/// Auxiliary "data used in proof", returned by a successful verification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ProofSupportData {
    pub revealed: Vec<RevealedAttribute>,
    pub schema_ids: BTreeSet<String>,
    pub cred_def_ids: BTreeSet<String>,
}

impl ProofSupportData {
    pub fn revealed_value(&self, reference: &FieldReference) -> Option<&str> {
        self.revealed
            .iter()
            .find(|r| &r.reference == reference)
            .map(|r| r.value.as_str())
    }
}

/// Outcome of checking a [`ProofResponse`] against its [`ProofRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofVerification {
    pub verified: bool,
    pub support: ProofSupportData,
    /// Why the check failed, when it did
    pub rejection: Option<String>,
}

impl ProofVerification {
    pub fn accepted(support: ProofSupportData) -> Self {
        Self { verified: true, support, rejection: None }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            support: ProofSupportData::default(),
            rejection: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reference(field: &str) -> FieldReference {
        FieldReference {
            schema_id: "S1".into(),
            cred_def_id: "C1".into(),
            cred_def_owner: "Issuer".into(),
            field: field.into(),
        }
    }

    fn request(nonce: &str) -> ProofRequest {
        ProofRequest {
            nonce: nonce.into(),
            requested_attributes: [reference("name")].into_iter().collect(),
            requested_predicates: [PredicateRequirement { reference: reference("age"), threshold: 18 }]
                .into_iter()
                .collect(),
            non_revoked: None,
        }
    }

    #[test]
    fn test_interval_rejects_inverted_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(NonRevocationInterval::new(now, now - Duration::seconds(1)).is_err());
        assert!(NonRevocationInterval::new(now, now).is_ok());
    }

    #[test]
    fn test_digest_depends_on_nonce() {
        let a = request("1");
        let b = request("2");
        assert!(a.same_requirements(&b));
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
        assert_eq!(a.digest().unwrap(), request("1").digest().unwrap());
    }

    #[test]
    fn test_references_cover_predicates() {
        let r = request("1");
        let fields: Vec<&str> = r.references().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "age"]);
    }

    #[test]
    fn test_support_lookup() {
        let support = ProofSupportData {
            revealed: vec![RevealedAttribute { reference: reference("name"), value: "Alice".into() }],
            ..Default::default()
        };
        assert_eq!(support.revealed_value(&reference("name")), Some("Alice"));
        assert_eq!(support.revealed_value(&reference("age")), None);
    }
}
