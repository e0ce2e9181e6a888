// src/models/schema.rs
//! Registry artifacts: schemas and credential definitions.
//!
//! Both are immutable once published. Identifiers follow the ledger-style
//! layout `{owner}:2:{name}:{version}` for schemas and
//! `{authority}:3:CL:{schema_id}:{tag}` for credential definitions.

use serde::{Deserialize, Serialize};

/// Marker segment of schema identifiers.
const SCHEMA_MARKER: &str = "2";
/// Marker and signature type segments of credential definition identifiers.
const CRED_DEF_MARKER: &str = "3";
const SIGNATURE_TYPE: &str = "CL";

/// Coordinates a schema is looked up by.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaDetails {
    pub name: String,
    pub version: String,
    /// Party that created the schema
    pub owner: String,
}

impl SchemaDetails {
    pub fn new(name: impl Into<String>, version: impl Into<String>, owner: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into(), owner: owner.into() }
    }

    pub fn schema_id(&self) -> String {
        format!("{}:{}:{}:{}", self.owner, SCHEMA_MARKER, self.name, self.version)
    }
}

/// A published schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaRecord {
    pub schema_id: String,
    pub details: SchemaDetails,
    pub attribute_names: Vec<String>,
}

impl SchemaRecord {
    pub fn new(details: SchemaDetails, attribute_names: Vec<String>) -> Self {
        Self { schema_id: details.schema_id(), details, attribute_names }
    }
}

/// A published credential definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialDefinitionRecord {
    pub schema_id: String,
    pub cred_def_id: String,
    /// JSON-encoded public definition
    pub definition_json: String,
}

/// Builds the identifier of the credential definition `authority` derives from `schema_id`.
pub fn credential_definition_id(authority: &str, schema_id: &str, tag: &str) -> String {
    format!("{}:{}:{}:{}:{}", authority, CRED_DEF_MARKER, SIGNATURE_TYPE, schema_id, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_layout() {
        let details = SchemaDetails::new("person", "1.0", "Gov");
        assert_eq!(details.schema_id(), "Gov:2:person:1.0");
        assert_eq!(
            credential_definition_id("Issuer", &details.schema_id(), "TAG1"),
            "Issuer:3:CL:Gov:2:person:1.0:TAG1"
        );
    }
}
