// src/services/request_builder.rs
//! Canonical proof request construction.
//!
//! Assertions go in as unordered collections and come out as the sorted sets
//! of a [`ProofRequest`], so the same assertions in any order build equal
//! requests. Structurally invalid input is rejected, never dropped.

use crate::error::{FlowError, FlowResult};
use crate::models::assertion::{AttributeAssertion, PredicateAssertion};
use crate::models::proof::{NonRevocationInterval, PredicateRequirement, ProofRequest};
use rand::Rng;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct ProofRequestBuilder {
    attributes: Vec<AttributeAssertion>,
    predicates: Vec<PredicateAssertion>,
    non_revoked: Option<NonRevocationInterval>,
    nonce: Option<String>,
}

impl ProofRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes(mut self, attributes: impl IntoIterator<Item = AttributeAssertion>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn predicates(mut self, predicates: impl IntoIterator<Item = PredicateAssertion>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn non_revoked(mut self, interval: Option<NonRevocationInterval>) -> Self {
        self.non_revoked = interval;
        self
    }

    /// Fixes the nonce instead of drawing a fresh one.
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    /// `MalformedAssertion` if any assertion fails [`FieldReference::validate`],
    /// the interval is inverted, or there is nothing to prove
    ///
    /// [`FieldReference::validate`]: crate::models::assertion::FieldReference::validate
    pub fn build(self) -> FlowResult<ProofRequest> {
        let mut requested_attributes = BTreeSet::new();
        for assertion in &self.attributes {
            let reference = assertion.reference();
            reference.validate()?;
            requested_attributes.insert(reference);
        }

        let mut requested_predicates = BTreeSet::new();
        for assertion in &self.predicates {
            let reference = assertion.reference();
            reference.validate()?;
            requested_predicates.insert(PredicateRequirement { reference, threshold: assertion.threshold });
        }

        if requested_attributes.is_empty() && requested_predicates.is_empty() {
            return Err(FlowError::MalformedAssertion("proof request asks for nothing".into()));
        }
        if let Some(interval) = self.non_revoked {
            NonRevocationInterval::new(interval.from, interval.to)?;
        }

        Ok(ProofRequest {
            nonce: self.nonce.unwrap_or_else(fresh_nonce),
            requested_attributes,
            requested_predicates,
            non_revoked: self.non_revoked,
        })
    }
}

fn fresh_nonce() -> String {
    rand::thread_rng().gen::<u128>().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use tokio_test::assert_err;

    fn attributes() -> Vec<AttributeAssertion> {
        vec![
            AttributeAssertion::reveal("S1", "C1", "Issuer", "age"),
            AttributeAssertion::reveal("S1", "C1", "Issuer", "name").expecting("Alice"),
            AttributeAssertion::reveal("S2", "C2", "Bank", "account"),
            AttributeAssertion::reveal("S2", "C2", "Bank", "branch"),
        ]
    }

    fn predicates() -> Vec<PredicateAssertion> {
        vec![
            PredicateAssertion::at_least("S1", "C1", "Issuer", "age", 18),
            PredicateAssertion::at_least("S2", "C2", "Bank", "balance", 1000),
            PredicateAssertion::at_least("S1", "C1", "Issuer", "height", 150),
        ]
    }

    #[test]
    fn test_order_independent_under_shuffles() {
        let reference = ProofRequestBuilder::new()
            .attributes(attributes())
            .predicates(predicates())
            .nonce("7")
            .build()
            .unwrap();

        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut a = attributes();
            let mut p = predicates();
            a.shuffle(&mut rng);
            p.shuffle(&mut rng);

            let shuffled = ProofRequestBuilder::new().attributes(a.clone()).predicates(p.clone()).nonce("7").build().unwrap();
            assert_eq!(shuffled, reference);
            assert_eq!(shuffled.digest().unwrap(), reference.digest().unwrap());

            let fresh = ProofRequestBuilder::new().attributes(a).predicates(p).build().unwrap();
            assert!(fresh.same_requirements(&reference));
        }
    }

    #[test]
    fn test_multiple_credentials_allowed() {
        let request = ProofRequestBuilder::new().attributes(attributes()).build().unwrap();
        let definitions: BTreeSet<&str> = request.references().map(|r| r.cred_def_id.as_str()).collect();
        assert_eq!(definitions.len(), 2);
    }

    #[test]
    fn test_expected_value_does_not_enter_request() {
        let plain = ProofRequestBuilder::new()
            .attributes([AttributeAssertion::reveal("S1", "C1", "Issuer", "name")])
            .nonce("1")
            .build()
            .unwrap();
        let expecting = ProofRequestBuilder::new()
            .attributes([AttributeAssertion::reveal("S1", "C1", "Issuer", "name").expecting("Alice")])
            .nonce("1")
            .build()
            .unwrap();
        assert_eq!(plain, expecting);
    }

    #[test]
    fn test_duplicates_collapse() {
        let twice = [
            AttributeAssertion::reveal("S1", "C1", "Issuer", "age"),
            AttributeAssertion::reveal("S1", "C1", "Issuer", "age"),
        ];
        let request = ProofRequestBuilder::new().attributes(twice).build().unwrap();
        assert_eq!(request.requested_attributes.len(), 1);
    }

    #[test]
    fn test_fresh_nonces_differ() {
        let a = ProofRequestBuilder::new().attributes(attributes()).build().unwrap();
        let b = ProofRequestBuilder::new().attributes(attributes()).build().unwrap();
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn test_malformed_input_rejected() {
        let err = assert_err!(ProofRequestBuilder::new()
            .attributes([AttributeAssertion::reveal("S1", "C1", "Issuer", "")])
            .build());
        assert_eq!(err.kind(), "malformed_assertion");

        let err = assert_err!(ProofRequestBuilder::new()
            .attributes(attributes())
            .predicates([PredicateAssertion::at_least("S 1", "C1", "Issuer", "age", 18)])
            .build());
        assert_eq!(err.kind(), "malformed_assertion");

        let err = assert_err!(ProofRequestBuilder::new().build());
        assert_eq!(err.kind(), "malformed_assertion");
    }

    #[test]
    fn test_inverted_interval_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let inverted = NonRevocationInterval { from: now, to: now - Duration::days(1) };
        let err = assert_err!(ProofRequestBuilder::new()
            .attributes(attributes())
            .non_revoked(Some(inverted))
            .build());
        assert_eq!(err.kind(), "malformed_assertion");

        let request = ProofRequestBuilder::new()
            .attributes(attributes())
            .non_revoked(Some(NonRevocationInterval::at(now)))
            .build()
            .unwrap();
        assert_eq!(request.non_revoked, Some(NonRevocationInterval::at(now)));
    }
}
