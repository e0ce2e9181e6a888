// src/wallet/credential_storage.rs
//! Credential storage for a Prover's wallet.
//!
//! Provides an in-memory store of [`IssuedCredential`]s keyed by their
//! wallet-local identifiers, plus the lookup proof generation needs: the
//! credential serving a given schema / credential definition / issuer.

use crate::models::assertion::FieldReference;
use crate::models::credential::IssuedCredential;
use std::collections::HashMap;

/// In-memory storage for issued credentials.
///
/// This storage provides:
/// - O(1) average case insertions and lookups by id
/// - Lookup by credential definition for proof generation
///
/// # Note
/// Not synchronised; owners wrap it in a lock when sharing.
#[derive(Debug, Default)]
pub struct CredentialStorage {
    /// Internal hashmap storing credentials by their ID
    credentials: HashMap<String, IssuedCredential>,
}

impl CredentialStorage {
    /// Creates a new empty CredentialStorage instance.
    pub fn new() -> Self {
        CredentialStorage { credentials: HashMap::new() }
    }

    /// Stores a credential in the wallet.
    ///
    /// # Behavior
    /// - Overwrites existing credential if ID already exists
    /// - Does not validate credential before storage
    pub fn store_credential(&mut self, credential: IssuedCredential) {
        self.credentials.insert(credential.id.clone(), credential);
    }

    pub fn get_credential_mut(&mut self, id: &str) -> Option<&mut IssuedCredential> {
        self.credentials.get_mut(id)
    }

    /// Returns the number of stored credentials.
    pub fn count_credentials(&self) -> usize {
        self.credentials.len()
    }

    /// Finds the credential that can serve `reference`.
    ///
    /// When several credentials match, the most recently issued one wins so
    /// the choice does not depend on hash map order.
    pub fn find_for(&self, reference: &FieldReference) -> Option<&IssuedCredential> {
        self.credentials
            .values()
            .filter(|c| {
                c.schema_id == reference.schema_id
                    && c.cred_def_id == reference.cred_def_id
                    && c.issuer == reference.cred_def_owner
            })
            .max_by(|a, b| a.issued_at.cmp(&b.issued_at).then_with(|| a.id.cmp(&b.id)))
    }
}
