// src/registry/mod.rs
//! Artifact registry seam.
//!
//! Schemas and credential definitions are published once and looked up by
//! id afterwards. Every operation is addressed to a named Authority.

use crate::error::FlowResult;
use crate::models::schema::{CredentialDefinitionRecord, SchemaDetails, SchemaRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;

pub use memory::InMemoryRegistry;

/// Something that can be published to the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "artifact", rename_all = "snake_case")]
pub enum Artifact {
    Schema(SchemaRecord),
    CredentialDefinition(CredentialDefinitionRecord),
}

impl Artifact {
    /// Id the artifact is published under.
    pub fn id(&self) -> &str {
        match self {
            Artifact::Schema(schema) => &schema.schema_id,
            Artifact::CredentialDefinition(definition) => &definition.cred_def_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Schema(_) => "schema",
            Artifact::CredentialDefinition(_) => "credential_definition",
        }
    }
}

/// Registry acknowledgement of a completed publish.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    pub artifact_id: String,
    pub authority: String,
    /// SHA-256 (hex) of the stored payload
    pub content_hash: String,
}

#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Resolves the id of the schema described by `details`.
    ///
    /// # Errors
    /// `RegistryUnavailable`, `UnknownParty` for an unknown authority,
    /// `ArtifactNotFound` if no such schema was published
    async fn lookup_schema(&self, details: &SchemaDetails, authority: &str) -> FlowResult<String>;

    /// # Errors
    /// `RegistryUnavailable` or `ArtifactNotFound`
    async fn schema(&self, schema_id: &str) -> FlowResult<SchemaRecord>;

    /// Publishes `artifact`, all or nothing.
    ///
    /// # Errors
    /// `RegistryUnavailable`, `UnknownParty`, `RegistryRejected` for an id
    /// that is already published or an artifact the authority may not publish
    async fn publish(&self, artifact: Artifact, authority: &str) -> FlowResult<PublishAck>;

    /// # Errors
    /// `RegistryUnavailable`
    async fn credential_definition(&self, cred_def_id: &str) -> FlowResult<Option<CredentialDefinitionRecord>>;
}
