// src/wallet/key_management.rs
//! Cryptographic key management for protocol participants.
//!
//! Every party (Verifier, Prover, notary) signs ledger transactions with its
//! own secp256k1 key; credential definitions use one as well to attest the
//! sub-proofs the reference proof capability produces.
//!
//! Uses the following cryptographic primitives:
//! - secp256k1 ECDSA (via `k256` crate)
//! - SHA-256 prehashing (via `ring`)
//! - Cryptographically secure random number generation

use crate::error::{FlowError, FlowResult};
use crate::models::party::Party;
use crate::utils::crypto::hash_data;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};

/// Key pair owned by one participant.
///
/// # Security Notes
/// - The signing key is never exposed
/// - Signatures are deterministic ECDSA (RFC 6979) over a SHA-256 prehash
#[derive(Clone)]
pub struct KeyManager {
    /// Securely stored private key (never exposed)
    signing_key: SigningKey,
    /// Derived public key for verification
    verifying_key: VerifyingKey,
}

impl KeyManager {
    /// Generates a new KeyManager with a fresh secp256k1 key.
    pub fn new() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        let verifying_key = *signing_key.verifying_key();
        KeyManager { signing_key, verifying_key }
    }

    /// SEC1-compressed public key bytes.
    pub fn public_key(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(true).as_bytes().to_vec()
    }

    /// Identity of a party named `name` holding this key.
    pub fn party(&self, name: impl Into<String>) -> Party {
        Party::new(name, self.public_key())
    }

    /// Signs a message using ECDSA (secp256k1) with SHA-256 prehashing.
    ///
    /// # Arguments
    /// * `message` - Raw message bytes to sign
    ///
    /// # Returns
    /// 64-byte compact ECDSA signature (R || S values)
    ///
    /// # Errors
    /// `Crypto` if the signer rejects the prehash
    pub fn sign_message(&self, message: &[u8]) -> FlowResult<Vec<u8>> {
        let hash = hash_data(message);
        let signature: Signature = self
            .signing_key
            .sign_prehash(&hash)
            .map_err(|e| FlowError::Crypto(format!("signing failed: {}", e)))?;
        Ok(signature.to_bytes().to_vec())
    }

    /// Checks `signature` over `message` against a SEC1-encoded public key.
    ///
    /// Returns `false` for malformed keys or signatures rather than an error:
    /// callers only care whether the signature holds.
    pub fn verify_signature(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        verifying_key
            .verify_prehash(&hash_data(message), &signature)
            .is_ok()
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keys = KeyManager::new();
        let signature = keys.sign_message(b"transaction").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(KeyManager::verify_signature(&keys.public_key(), b"transaction", &signature));
    }

    #[test]
    fn test_verify_rejects_other_message_and_key() {
        let keys = KeyManager::new();
        let other = KeyManager::new();
        let signature = keys.sign_message(b"transaction").unwrap();
        assert!(!KeyManager::verify_signature(&keys.public_key(), b"tampered", &signature));
        assert!(!KeyManager::verify_signature(&other.public_key(), b"transaction", &signature));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let keys = KeyManager::new();
        assert!(!KeyManager::verify_signature(&[1, 2, 3], b"m", &[0; 64]));
        assert!(!KeyManager::verify_signature(&keys.public_key(), b"m", &[0; 10]));
    }

    #[test]
    fn test_party_carries_compressed_key() {
        let keys = KeyManager::new();
        let party = keys.party("Alice");
        assert_eq!(party.name, "Alice");
        assert_eq!(party.public_key.len(), 33);
    }
}
