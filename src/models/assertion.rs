// src/models/assertion.rs
//! Attribute and predicate assertions over credential fields.
//!
//! An assertion names one field of a credential issued under a known
//! schema / credential definition pair. Attribute assertions ask for the
//! field to be revealed (optionally with an expected value); predicate
//! assertions ask for a `>=` proof without revealing the value.

use crate::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

/// Reference to one field of a credential, independent of its value.
///
/// Ordered so that sets of references have a canonical iteration order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldReference {
    pub schema_id: String,
    pub cred_def_id: String,
    /// Party that owns the credential definition (the issuer)
    pub cred_def_owner: String,
    pub field: String,
}

impl FieldReference {
    /// Checks the reference is structurally usable.
    ///
    /// # Errors
    /// `MalformedAssertion` if the field or owner is empty, or an id is
    /// empty or carries whitespace.
    pub fn validate(&self) -> FlowResult<()> {
        check_id("schema_id", &self.schema_id)?;
        check_id("cred_def_id", &self.cred_def_id)?;
        if self.cred_def_owner.trim().is_empty() {
            return Err(FlowError::MalformedAssertion(format!(
                "empty credential definition owner for field '{}'",
                self.field
            )));
        }
        if self.field.trim().is_empty() {
            return Err(FlowError::MalformedAssertion(format!(
                "empty field name for credential definition '{}'",
                self.cred_def_id
            )));
        }
        Ok(())
    }

    /// Key grouping references that must be served by the same credential.
    pub fn credential_key(&self) -> (&str, &str, &str) {
        (&self.schema_id, &self.cred_def_id, &self.cred_def_owner)
    }
}

fn check_id(label: &str, value: &str) -> FlowResult<()> {
    if value.is_empty() {
        return Err(FlowError::MalformedAssertion(format!("empty {}", label)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(FlowError::MalformedAssertion(format!(
            "{} '{}' contains whitespace",
            label, value
        )));
    }
    Ok(())
}

/// Request to reveal a field, optionally requiring it to equal a value.
///
/// An empty `expected_value` means "reveal only".
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeAssertion {
    pub schema_id: String,
    pub cred_def_id: String,
    pub cred_def_owner: String,
    pub field: String,
    #[serde(default)]
    pub expected_value: String,
}

impl AttributeAssertion {
    /// Creates a reveal-only assertion.
    pub fn reveal(
        schema_id: impl Into<String>,
        cred_def_id: impl Into<String>,
        cred_def_owner: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            cred_def_id: cred_def_id.into(),
            cred_def_owner: cred_def_owner.into(),
            field: field.into(),
            expected_value: String::new(),
        }
    }

    /// Same assertion, additionally requiring the revealed value to equal `value`.
    pub fn expecting(mut self, value: impl Into<String>) -> Self {
        self.expected_value = value.into();
        self
    }

    pub fn reference(&self) -> FieldReference {
        FieldReference {
            schema_id: self.schema_id.clone(),
            cred_def_id: self.cred_def_id.clone(),
            cred_def_owner: self.cred_def_owner.clone(),
            field: self.field.clone(),
        }
    }

    /// The value the revealed field must equal, if any.
    pub fn expected(&self) -> Option<&str> {
        if self.expected_value.is_empty() {
            None
        } else {
            Some(&self.expected_value)
        }
    }
}

/// Request to prove `field >= threshold` without revealing the field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateAssertion {
    pub schema_id: String,
    pub cred_def_id: String,
    pub cred_def_owner: String,
    pub field: String,
    pub threshold: i64,
}

impl PredicateAssertion {
    pub fn at_least(
        schema_id: impl Into<String>,
        cred_def_id: impl Into<String>,
        cred_def_owner: impl Into<String>,
        field: impl Into<String>,
        threshold: i64,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            cred_def_id: cred_def_id.into(),
            cred_def_owner: cred_def_owner.into(),
            field: field.into(),
            threshold,
        }
    }

    pub fn reference(&self) -> FieldReference {
        FieldReference {
            schema_id: self.schema_id.clone(),
            cred_def_id: self.cred_def_id.clone(),
            cred_def_owner: self.cred_def_owner.clone(),
            field: self.field.clone(),
        }
    }
}
