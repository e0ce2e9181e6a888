// src/zkp/mod.rs
//! # Proof-system capability
//!
//! The protocols consume the credential proof scheme through two traits:
//! - [`ProofSystem`]: proof generation (Prover) and verification (Verifier)
//! - [`CredentialIssuance`]: deriving credential definitions (Authority)
//!
//! [`ReferenceProofSystem`] is an in-process capability implementing both.
//! It stands in for the zero-knowledge math: each sub-proof is a statement
//! (revealed values, predicate outcomes, revocation status) signed with the
//! credential definition's key and bound to the request digest. It keeps
//! the interface contract (proofs bound to exactly one request, predicate
//! values never revealed) without any zero-knowledge property.

use crate::error::{FlowError, FlowResult};
use crate::models::credential::IssuedCredential;
use crate::models::proof::{ProofRequest, ProofResponse, ProofVerification};
use crate::models::schema::{credential_definition_id, CredentialDefinitionRecord, SchemaRecord};
use crate::wallet::credential_storage::CredentialStorage;
use crate::wallet::key_management::KeyManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

pub mod proof_generation;
pub mod proof_verification;

/// Tag of every credential definition the reference capability derives.
const DEFINITION_TAG: &str = "TAG1";

/// Handle to the Prover's master secret.
///
/// Passed explicitly into proof generation; the secret itself stays with
/// the capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MasterSecret {
    id: String,
}

impl MasterSecret {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Proof generation and verification.
#[async_trait]
pub trait ProofSystem: Send + Sync {
    /// Produces a proof for `request` from the credentials bound to `secret`.
    ///
    /// # Errors
    /// `ProofGenerationFailed` when no credential can serve the request
    async fn create_proof(&self, request: &ProofRequest, secret: &MasterSecret) -> FlowResult<ProofResponse>;

    /// Checks `response` against exactly `request`.
    ///
    /// A proof that fails the check is `Ok` with `verified == false`; `Err`
    /// is reserved for the capability itself failing.
    async fn verify_proof(&self, request: &ProofRequest, response: &ProofResponse) -> FlowResult<ProofVerification>;
}

/// Credential definition derivation.
#[async_trait]
pub trait CredentialIssuance: Send + Sync {
    /// Deriving again for the same schema and authority returns the
    /// definition already derived.
    ///
    /// # Errors
    /// `DefinitionCreationFailed`
    async fn create_credential_definition(
        &self,
        schema: &SchemaRecord,
        authority: &str,
    ) -> FlowResult<CredentialDefinitionRecord>;
}

pub(crate) struct DefinitionEntry {
    pub(crate) schema: SchemaRecord,
    pub(crate) authority: String,
    pub(crate) keys: KeyManager,
    definition_json: String,
}

#[derive(Default)]
pub(crate) struct ReferenceState {
    pub(crate) definitions: HashMap<String, DefinitionEntry>,
    /// Wallets keyed by master secret id
    pub(crate) wallets: HashMap<String, CredentialStorage>,
    next_credential: u64,
}

/// In-process proof capability shared by Authorities, Provers and Verifiers.
#[derive(Default)]
pub struct ReferenceProofSystem {
    state: RwLock<ReferenceState>,
}

impl ReferenceProofSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a credential under `cred_def_id` into the wallet bound to `secret`.
    ///
    /// # Arguments
    /// * `secret` - Prover's master secret handle
    /// * `cred_def_id` - Definition previously created by [`CredentialIssuance`]
    /// * `values` - One value per schema attribute
    /// * `issued_at` - Start of the credential's validity
    ///
    /// # Returns
    /// The wallet-local credential id
    ///
    /// # Errors
    /// `IssuanceFailed` if the definition is unknown or the values do not
    /// cover exactly the schema's attributes
    pub async fn issue_credential<K, V>(
        &self,
        secret: &MasterSecret,
        cred_def_id: &str,
        values: impl IntoIterator<Item = (K, V)>,
        issued_at: DateTime<Utc>,
    ) -> FlowResult<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let attributes: BTreeMap<String, String> =
            values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        let mut state = self.state.write().await;
        let definition = state
            .definitions
            .get(cred_def_id)
            .ok_or_else(|| FlowError::IssuanceFailed(format!("unknown credential definition {}", cred_def_id)))?;

        let expected: BTreeSet<&str> = definition.schema.attribute_names.iter().map(String::as_str).collect();
        let provided: BTreeSet<&str> = attributes.keys().map(String::as_str).collect();
        if expected != provided {
            return Err(FlowError::IssuanceFailed(format!(
                "values {:?} do not match schema attributes {:?}",
                provided, expected
            )));
        }

        let credential = IssuedCredential {
            id: String::new(),
            schema_id: definition.schema.schema_id.clone(),
            cred_def_id: cred_def_id.to_string(),
            issuer: definition.authority.clone(),
            attributes,
            issued_at,
            revoked_at: None,
        };

        state.next_credential += 1;
        let id = format!("cred-{:04}", state.next_credential);
        let credential = IssuedCredential { id: id.clone(), ..credential };
        state
            .wallets
            .entry(secret.id().to_string())
            .or_default()
            .store_credential(credential);
        log::debug!("issued credential {} under {}", id, cred_def_id);
        Ok(id)
    }

    /// Marks a credential revoked from `at` onwards.
    ///
    /// # Errors
    /// `IssuanceFailed` if the wallet holds no such credential
    pub async fn revoke_credential(
        &self,
        secret: &MasterSecret,
        credential_id: &str,
        at: DateTime<Utc>,
    ) -> FlowResult<()> {
        let mut state = self.state.write().await;
        let credential = state
            .wallets
            .get_mut(secret.id())
            .and_then(|w| w.get_credential_mut(credential_id))
            .ok_or_else(|| FlowError::IssuanceFailed(format!("no credential {} to revoke", credential_id)))?;
        credential.revoked_at = Some(at);
        Ok(())
    }

    /// Number of credentials held under `secret`.
    pub async fn credential_count(&self, secret: &MasterSecret) -> usize {
        self.state
            .read()
            .await
            .wallets
            .get(secret.id())
            .map_or(0, CredentialStorage::count_credentials)
    }
}

#[async_trait]
impl ProofSystem for ReferenceProofSystem {
    async fn create_proof(&self, request: &ProofRequest, secret: &MasterSecret) -> FlowResult<ProofResponse> {
        let state = self.state.read().await;
        proof_generation::generate_proof(&state, request, secret)
    }

    async fn verify_proof(&self, request: &ProofRequest, response: &ProofResponse) -> FlowResult<ProofVerification> {
        let state = self.state.read().await;
        proof_verification::verify_proof(&state, request, response)
    }
}

#[async_trait]
impl CredentialIssuance for ReferenceProofSystem {
    async fn create_credential_definition(
        &self,
        schema: &SchemaRecord,
        authority: &str,
    ) -> FlowResult<CredentialDefinitionRecord> {
        if schema.attribute_names.is_empty() {
            return Err(FlowError::DefinitionCreationFailed(format!(
                "schema {} declares no attributes",
                schema.schema_id
            )));
        }
        let cred_def_id = credential_definition_id(authority, &schema.schema_id, DEFINITION_TAG);

        let mut state = self.state.write().await;
        if let Some(existing) = state.definitions.get(&cred_def_id) {
            if existing.schema != *schema {
                return Err(FlowError::DefinitionCreationFailed(format!(
                    "{} already derived from a different schema",
                    cred_def_id
                )));
            }
            log::debug!("{} already derived {}", authority, cred_def_id);
            return Ok(CredentialDefinitionRecord {
                schema_id: schema.schema_id.clone(),
                cred_def_id,
                definition_json: existing.definition_json.clone(),
            });
        }

        let keys = KeyManager::new();
        let definition = json!({
            "ver": "1.0",
            "id": cred_def_id,
            "schemaId": schema.schema_id,
            "type": "CL",
            "tag": DEFINITION_TAG,
            "value": {
                "attributes": schema.attribute_names,
                "publicKey": base64::encode(keys.public_key()),
            },
        })
        .to_string();
        state.definitions.insert(
            cred_def_id.clone(),
            DefinitionEntry {
                schema: schema.clone(),
                authority: authority.to_string(),
                keys,
                definition_json: definition.clone(),
            },
        );
        log::info!("{} derived credential definition {}", authority, cred_def_id);

        Ok(CredentialDefinitionRecord {
            schema_id: schema.schema_id.clone(),
            cred_def_id,
            definition_json: definition,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::schema::SchemaDetails;
    use chrono::TimeZone;
    use tokio_test::{assert_err, assert_ok};

    pub(crate) fn person_schema() -> SchemaRecord {
        SchemaRecord::new(
            SchemaDetails::new("person", "1.0", "Gov"),
            vec!["name".into(), "age".into()],
        )
    }

    pub(crate) fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_definition_json_is_parseable() {
        let system = ReferenceProofSystem::new();
        let record = assert_ok!(system.create_credential_definition(&person_schema(), "Issuer").await);
        assert_eq!(record.cred_def_id, "Issuer:3:CL:Gov:2:person:1.0:TAG1");
        let parsed: serde_json::Value = serde_json::from_str(&record.definition_json).unwrap();
        assert_eq!(parsed["schemaId"], "Gov:2:person:1.0");
    }

    #[tokio::test]
    async fn test_definition_derived_once() {
        let system = ReferenceProofSystem::new();
        let first = assert_ok!(system.create_credential_definition(&person_schema(), "Issuer").await);
        let again = assert_ok!(system.create_credential_definition(&person_schema(), "Issuer").await);
        assert_eq!(first, again);

        let mut widened = person_schema();
        widened.attribute_names.push("email".into());
        let err = assert_err!(system.create_credential_definition(&widened, "Issuer").await);
        assert_eq!(err.kind(), "definition_creation_failed");
    }

    #[tokio::test]
    async fn test_issue_requires_schema_attributes() {
        let system = ReferenceProofSystem::new();
        let record = system.create_credential_definition(&person_schema(), "Issuer").await.unwrap();
        let secret = MasterSecret::new("alice-secret");

        let err = assert_err!(
            system.issue_credential(&secret, &record.cred_def_id, [("name", "Alice")], issued_at()).await
        );
        assert_eq!(err.kind(), "issuance_failed");

        assert_ok!(
            system
                .issue_credential(&secret, &record.cred_def_id, [("name", "Alice"), ("age", "25")], issued_at())
                .await
        );
        assert_eq!(system.credential_count(&secret).await, 1);
    }

    #[tokio::test]
    async fn test_revoke_unknown_credential() {
        let system = ReferenceProofSystem::new();
        let err = assert_err!(system.revoke_credential(&MasterSecret::new("s"), "cred-9", issued_at()).await);
        assert_eq!(err.kind(), "issuance_failed");
    }
}
