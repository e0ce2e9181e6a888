// tests/claim_definition.rs
//! Publishing flows against the in-memory registry and reference issuance.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use verifiable_claims::models::schema::{CredentialDefinitionRecord, SchemaDetails, SchemaRecord};
use verifiable_claims::registry::{Artifact, ArtifactRegistry, InMemoryRegistry, PublishAck};
use verifiable_claims::zkp::ReferenceProofSystem;
use verifiable_claims::{ClaimDefinitionPublisher, FlowError, FlowResult};

/// Registry whose first credential definition publish drops out.
struct FlakyRegistry {
    inner: Arc<InMemoryRegistry>,
    dropped: AtomicBool,
}

#[async_trait]
impl ArtifactRegistry for FlakyRegistry {
    async fn lookup_schema(&self, details: &SchemaDetails, authority: &str) -> FlowResult<String> {
        self.inner.lookup_schema(details, authority).await
    }

    async fn schema(&self, schema_id: &str) -> FlowResult<SchemaRecord> {
        self.inner.schema(schema_id).await
    }

    async fn publish(&self, artifact: Artifact, authority: &str) -> FlowResult<PublishAck> {
        if matches!(artifact, Artifact::CredentialDefinition(_)) && !self.dropped.swap(true, Ordering::SeqCst) {
            return Err(FlowError::RegistryUnavailable("connection reset".into()));
        }
        self.inner.publish(artifact, authority).await
    }

    async fn credential_definition(&self, cred_def_id: &str) -> FlowResult<Option<CredentialDefinitionRecord>> {
        self.inner.credential_definition(cred_def_id).await
    }
}

struct Setup {
    registry: Arc<InMemoryRegistry>,
    publisher: ClaimDefinitionPublisher,
    details: SchemaDetails,
}

async fn setup(with_schema: bool) -> Setup {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.register_authority("Gov").await;
    registry.register_authority("Issuer").await;
    registry.register_authority("Bank").await;
    let publisher = ClaimDefinitionPublisher::new(registry.clone(), Arc::new(ReferenceProofSystem::new()));
    let details = SchemaDetails::new("person", "1.0", "Gov");
    if with_schema {
        publisher
            .create_schema(details.clone(), vec!["name".into(), "age".into()], "Gov")
            .await
            .unwrap();
    }
    Setup { registry, publisher, details }
}

#[tokio::test]
async fn test_definition_published_and_retrievable() {
    let s = setup(true).await;
    let cred_def_id = assert_ok!(s.publisher.create_claim_definition(&s.details, "Issuer").await);
    assert_eq!(cred_def_id, "Issuer:3:CL:Gov:2:person:1.0:TAG1");

    let record = assert_ok!(s.registry.credential_definition(&cred_def_id).await).unwrap();
    assert_eq!(record.schema_id, "Gov:2:person:1.0");
    let definition: serde_json::Value = serde_json::from_str(&record.definition_json).unwrap();
    assert_eq!(definition["id"], cred_def_id.as_str());
}

#[tokio::test]
async fn test_authorities_derive_distinct_definitions_from_one_schema() {
    let s = setup(true).await;
    let issuer = assert_ok!(s.publisher.create_claim_definition(&s.details, "Issuer").await);
    let bank = assert_ok!(s.publisher.create_claim_definition(&s.details, "Bank").await);
    assert_ne!(issuer, bank);
    assert_eq!(s.registry.artifact_count().await, 3);
}

#[tokio::test]
async fn test_unknown_schema_is_not_found() {
    let s = setup(false).await;
    let err = assert_err!(s.publisher.create_claim_definition(&s.details, "Issuer").await);
    assert_eq!(err.kind(), "artifact_not_found");
}

#[tokio::test]
async fn test_registry_down_propagates() {
    let s = setup(true).await;
    s.registry.set_available(false).await;
    let err = assert_err!(s.publisher.create_claim_definition(&s.details, "Issuer").await);
    assert_eq!(err.kind(), "registry_unavailable");
    assert!(err.to_string().contains("offline"));
}

#[tokio::test]
async fn test_second_definition_by_same_authority_fails() {
    let s = setup(true).await;
    assert_ok!(s.publisher.create_claim_definition(&s.details, "Issuer").await);
    let err = assert_err!(s.publisher.create_claim_definition(&s.details, "Issuer").await);
    assert_eq!(err.kind(), "registry_rejected");
    assert_eq!(s.registry.artifact_count().await, 2);
}

#[tokio::test]
async fn test_definition_publish_retried_after_outage() {
    let s = setup(true).await;
    let flaky = Arc::new(FlakyRegistry { inner: s.registry.clone(), dropped: AtomicBool::new(false) });
    let publisher = ClaimDefinitionPublisher::new(flaky, Arc::new(ReferenceProofSystem::new()));

    let err = assert_err!(publisher.create_claim_definition(&s.details, "Issuer").await);
    assert_eq!(err.kind(), "registry_unavailable");
    assert_eq!(s.registry.artifact_count().await, 1);

    let cred_def_id = assert_ok!(publisher.create_claim_definition(&s.details, "Issuer").await);
    assert_eq!(s.registry.artifact_count().await, 2);
    assert!(assert_ok!(s.registry.credential_definition(&cred_def_id).await).is_some());
}

#[tokio::test]
async fn test_unregistered_authority_is_unknown() {
    let s = setup(true).await;
    let err = assert_err!(s.publisher.create_claim_definition(&s.details, "Mallory").await);
    assert_eq!(err.kind(), "unknown_party");
}
