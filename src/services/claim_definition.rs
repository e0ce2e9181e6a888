// src/services/claim_definition.rs
//! Authority-side publishing of schemas and credential definitions.
//!
//! Unlike verification, failures here propagate to the caller with their
//! cause attached.

use crate::error::{FlowError, FlowResult};
use crate::models::schema::{SchemaDetails, SchemaRecord};
use crate::registry::{Artifact, ArtifactRegistry};
use crate::zkp::CredentialIssuance;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct ClaimDefinitionPublisher {
    registry: Arc<dyn ArtifactRegistry>,
    issuance: Arc<dyn CredentialIssuance>,
}

impl ClaimDefinitionPublisher {
    pub fn new(registry: Arc<dyn ArtifactRegistry>, issuance: Arc<dyn CredentialIssuance>) -> Self {
        Self { registry, issuance }
    }

    /// Publishes a schema so other authorities can derive definitions from it.
    ///
    /// # Arguments
    /// * `details` - Name, version and owner of the schema
    /// * `attribute_names` - Fields every credential of this schema carries
    /// * `authority_name` - Publishing authority; must own the schema
    ///
    /// # Returns
    /// The published schema id
    ///
    /// # Errors
    /// `DefinitionCreationFailed` for an empty or repeated attribute list,
    /// otherwise whatever the registry raises
    pub async fn create_schema(
        &self,
        details: SchemaDetails,
        attribute_names: Vec<String>,
        authority_name: &str,
    ) -> FlowResult<String> {
        if attribute_names.is_empty() || attribute_names.iter().any(|a| a.trim().is_empty()) {
            return Err(FlowError::DefinitionCreationFailed(format!(
                "schema {} needs non-empty attribute names",
                details.schema_id()
            )));
        }
        let unique: BTreeSet<&String> = attribute_names.iter().collect();
        if unique.len() != attribute_names.len() {
            return Err(FlowError::DefinitionCreationFailed(format!(
                "schema {} repeats an attribute name",
                details.schema_id()
            )));
        }

        let schema = SchemaRecord::new(details, attribute_names);
        let ack = self.registry.publish(Artifact::Schema(schema), authority_name).await?;
        Ok(ack.artifact_id)
    }

    /// Derives and publishes a credential definition for an existing schema.
    ///
    /// # Arguments
    /// * `details` - Coordinates of the schema to derive from
    /// * `authority_name` - Authority the definition belongs to
    ///
    /// # Returns
    /// The new credential definition id
    ///
    /// # Errors
    /// - `RegistryUnavailable`, `UnknownParty` or `ArtifactNotFound` from the schema lookup
    /// - `DefinitionCreationFailed` from the issuance capability
    /// - `RegistryUnavailable` or `RegistryRejected` from the publish
    pub async fn create_claim_definition(&self, details: &SchemaDetails, authority_name: &str) -> FlowResult<String> {
        let schema_id = self.registry.lookup_schema(details, authority_name).await?;
        let schema = self.registry.schema(&schema_id).await?;
        log::debug!("{} resolved schema {}", authority_name, schema_id);

        let definition = self.issuance.create_credential_definition(&schema, authority_name).await?;
        let ack = self
            .registry
            .publish(Artifact::CredentialDefinition(definition), authority_name)
            .await?;
        log::info!("{} published credential definition {} ({})", authority_name, ack.artifact_id, ack.content_hash);
        Ok(ack.artifact_id)
    }
}
