// src/registry/memory.rs
//! In-process artifact registry.
//!
//! Artifacts are stored as JSON documents keyed by their id, alongside the
//! SHA-256 of the document. Reads decode the stored document, so a lookup
//! returns exactly what was published.

use crate::error::{FlowError, FlowResult};
use crate::models::schema::{CredentialDefinitionRecord, SchemaDetails, SchemaRecord};
use crate::registry::{Artifact, ArtifactRegistry, PublishAck};
use crate::utils::crypto::hash_hex;
use crate::utils::serialization::{deserialize, serialize};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct RegistryState {
    authorities: HashSet<String>,
    documents: HashMap<String, String>,
    available: bool,
}

pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self { state: RwLock::new(RegistryState { available: true, ..Default::default() }) }
    }

    /// Allows `authority` to publish and look up artifacts.
    pub async fn register_authority(&self, authority: impl Into<String>) {
        self.state.write().await.authorities.insert(authority.into());
    }

    /// Takes the registry offline (or back online).
    pub async fn set_available(&self, available: bool) {
        self.state.write().await.available = available;
    }

    /// Number of published artifacts.
    pub async fn artifact_count(&self) -> usize {
        self.state.read().await.documents.len()
    }

    fn read_document<T: serde::de::DeserializeOwned>(state: &RegistryState, id: &str) -> FlowResult<Option<T>> {
        match state.documents.get(id) {
            Some(document) => Ok(Some(deserialize(document)?)),
            None => Ok(None),
        }
    }
}

fn check_access(state: &RegistryState, authority: &str) -> FlowResult<()> {
    if !state.available {
        return Err(FlowError::RegistryUnavailable("registry is offline".into()));
    }
    if !state.authorities.contains(authority) {
        return Err(FlowError::UnknownParty(authority.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ArtifactRegistry for InMemoryRegistry {
    async fn lookup_schema(&self, details: &SchemaDetails, authority: &str) -> FlowResult<String> {
        let state = self.state.read().await;
        check_access(&state, authority)?;
        let schema_id = details.schema_id();
        let schema: Option<SchemaRecord> = Self::read_document(&state, &schema_id)?;
        match schema {
            Some(schema) if schema.details == *details => Ok(schema.schema_id),
            _ => Err(FlowError::ArtifactNotFound(format!(
                "schema {} {} by {}",
                details.name, details.version, details.owner
            ))),
        }
    }

    async fn schema(&self, schema_id: &str) -> FlowResult<SchemaRecord> {
        let state = self.state.read().await;
        if !state.available {
            return Err(FlowError::RegistryUnavailable("registry is offline".into()));
        }
        Self::read_document(&state, schema_id)?
            .ok_or_else(|| FlowError::ArtifactNotFound(format!("schema {}", schema_id)))
    }

    async fn publish(&self, artifact: Artifact, authority: &str) -> FlowResult<PublishAck> {
        let document = match &artifact {
            Artifact::Schema(schema) => serialize(schema)?,
            Artifact::CredentialDefinition(definition) => serialize(definition)?,
        };

        let mut state = self.state.write().await;
        check_access(&state, authority)?;
        let artifact_id = artifact.id().to_string();
        if state.documents.contains_key(&artifact_id) {
            return Err(FlowError::RegistryRejected(format!("{} is already published", artifact_id)));
        }
        match &artifact {
            Artifact::Schema(schema) if schema.details.owner != authority => {
                return Err(FlowError::RegistryRejected(format!(
                    "{} cannot publish a schema owned by {}",
                    authority, schema.details.owner
                )));
            }
            Artifact::CredentialDefinition(definition) if !state.documents.contains_key(&definition.schema_id) => {
                return Err(FlowError::RegistryRejected(format!(
                    "{} references unpublished schema {}",
                    artifact_id, definition.schema_id
                )));
            }
            _ => {}
        }

        let content_hash = hash_hex(document.as_bytes());
        state.documents.insert(artifact_id.clone(), document);
        log::info!("{} published {} {}", authority, artifact.kind(), artifact_id);
        Ok(PublishAck { artifact_id, authority: authority.to_string(), content_hash })
    }

    async fn credential_definition(&self, cred_def_id: &str) -> FlowResult<Option<CredentialDefinitionRecord>> {
        let state = self.state.read().await;
        if !state.available {
            return Err(FlowError::RegistryUnavailable("registry is offline".into()));
        }
        Self::read_document(&state, cred_def_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn person() -> SchemaRecord {
        SchemaRecord::new(SchemaDetails::new("person", "1.0", "Gov"), vec!["name".into(), "age".into()])
    }

    async fn registry() -> InMemoryRegistry {
        let registry = InMemoryRegistry::new();
        registry.register_authority("Gov").await;
        registry.register_authority("Issuer").await;
        registry
    }

    #[tokio::test]
    async fn test_publish_and_lookup_schema() {
        let registry = registry().await;
        let ack = assert_ok!(registry.publish(Artifact::Schema(person()), "Gov").await);
        assert_eq!(ack.artifact_id, "Gov:2:person:1.0");
        assert_eq!(ack.content_hash.len(), 64);

        let id = assert_ok!(registry.lookup_schema(&person().details, "Issuer").await);
        assert_eq!(id, ack.artifact_id);
        assert_eq!(assert_ok!(registry.schema(&id).await), person());
    }

    #[tokio::test]
    async fn test_republish_rejected() {
        let registry = registry().await;
        assert_ok!(registry.publish(Artifact::Schema(person()), "Gov").await);
        let err = assert_err!(registry.publish(Artifact::Schema(person()), "Gov").await);
        assert_eq!(err.kind(), "registry_rejected");
        assert_eq!(registry.artifact_count().await, 1);
    }

    #[tokio::test]
    async fn test_schema_must_be_published_by_owner() {
        let registry = registry().await;
        let err = assert_err!(registry.publish(Artifact::Schema(person()), "Issuer").await);
        assert_eq!(err.kind(), "registry_rejected");
    }

    #[tokio::test]
    async fn test_definition_requires_schema() {
        let registry = registry().await;
        let definition = CredentialDefinitionRecord {
            schema_id: "Gov:2:person:1.0".into(),
            cred_def_id: "Issuer:3:CL:Gov:2:person:1.0:TAG1".into(),
            definition_json: "{}".into(),
        };
        let err = assert_err!(registry.publish(Artifact::CredentialDefinition(definition.clone()), "Issuer").await);
        assert_eq!(err.kind(), "registry_rejected");

        assert_ok!(registry.publish(Artifact::Schema(person()), "Gov").await);
        assert_ok!(registry.publish(Artifact::CredentialDefinition(definition.clone()), "Issuer").await);
        let stored = assert_ok!(registry.credential_definition(&definition.cred_def_id).await);
        assert_eq!(stored, Some(definition));
    }

    #[tokio::test]
    async fn test_unknown_authority_and_offline() {
        let registry = registry().await;
        let err = assert_err!(registry.lookup_schema(&person().details, "Mallory").await);
        assert_eq!(err.kind(), "unknown_party");

        registry.set_available(false).await;
        let err = assert_err!(registry.lookup_schema(&person().details, "Gov").await);
        assert_eq!(err.kind(), "registry_unavailable");
        let err = assert_err!(registry.publish(Artifact::Schema(person()), "Gov").await);
        assert_eq!(err.kind(), "registry_unavailable");
    }

    #[tokio::test]
    async fn test_lookup_missing_schema() {
        let registry = registry().await;
        let err = assert_err!(registry.lookup_schema(&person().details, "Gov").await);
        assert_eq!(err.kind(), "artifact_not_found");
    }
}
