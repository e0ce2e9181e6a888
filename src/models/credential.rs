// src/models/credential.rs
//! Prover-held credential data model.
//!
//! Defines the credential a Prover keeps in its wallet: the attribute
//! values an Authority issued under one credential definition, plus the
//! issuance and revocation instants used for non-revocation proofs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A credential issued to a Prover.
///
/// # Fields
/// - `id`: Wallet-local identifier for the credential
/// - `schema_id` / `cred_def_id`: What it was issued against
/// - `issuer`: Party owning the credential definition
/// - `attributes`: Raw attribute values, keyed by field name
/// - `issued_at` / `revoked_at`: Validity window
///
/// # Security Considerations
/// - Attribute values never leave the wallet except as revealed fields of a proof
/// - Predicate fields are only ever exposed as a pass/fail outcome
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    /// Wallet-local identifier
    /// Example: "cred-0001"
    pub id: String,

    /// Schema the credential conforms to
    /// Example: "Issuer:2:person:1.0"
    pub schema_id: String,

    /// Credential definition it was issued under
    /// Example: "Issuer:3:CL:Issuer:2:person:1.0:TAG1"
    pub cred_def_id: String,

    /// Name of the issuing Authority
    pub issuer: String,

    /// Attribute values, keyed by field name
    /// Example: {"age": "25", "name": "Alice"}
    pub attributes: BTreeMap<String, String>,

    pub issued_at: DateTime<Utc>,

    pub revoked_at: Option<DateTime<Utc>>,
}

impl IssuedCredential {
    /// Whether the credential was valid at some instant in `[from, to]`.
    pub fn valid_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.issued_at <= to && self.revoked_at.map_or(true, |revoked| revoked > from)
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).map(String::as_str)
    }
}
