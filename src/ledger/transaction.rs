// src/ledger/transaction.rs
//! Transaction proposals, signatures and commit confirmations.
//!
//! A transaction's identity is the SHA-256 of its canonical JSON encoding;
//! every signature (participants' and the notary's) is over that id.

use crate::error::{FlowError, FlowResult};
use crate::models::party::Party;
use crate::models::record::{VerificationCommand, VerificationRecord};
use crate::utils::crypto::hash_hex;
use crate::utils::serialization::base64_bytes;
use crate::wallet::key_management::KeyManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unsigned transaction content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionProposal {
    pub proposer: Party,
    pub outputs: Vec<VerificationRecord>,
    pub command: VerificationCommand,
    pub required_signers: Vec<Party>,
    pub notary: Party,
}

impl TransactionProposal {
    pub fn new(
        proposer: Party,
        outputs: Vec<VerificationRecord>,
        command: VerificationCommand,
        required_signers: Vec<Party>,
        notary: Party,
    ) -> Self {
        Self { proposer, outputs, command, required_signers, notary }
    }

    /// Transaction id: SHA-256 (hex) of the canonical JSON encoding.
    pub fn id(&self) -> FlowResult<String> {
        Ok(hash_hex(&serde_json::to_vec(self)?))
    }
}

/// One party's signature over a transaction id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionSignature {
    pub signer: Party,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl TransactionSignature {
    pub fn create(signer: Party, keys: &KeyManager, tx_id: &str) -> FlowResult<Self> {
        let signature = keys.sign_message(tx_id.as_bytes())?;
        Ok(Self { signer, signature })
    }

    pub fn verifies(&self, tx_id: &str) -> bool {
        KeyManager::verify_signature(&self.signer.public_key, tx_id.as_bytes(), &self.signature)
    }
}

/// A proposal together with the signatures collected so far.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub proposal: TransactionProposal,
    pub signatures: Vec<TransactionSignature>,
}

impl SignedTransaction {
    pub fn new(proposal: TransactionProposal) -> Self {
        Self { proposal, signatures: Vec::new() }
    }

    pub fn id(&self) -> FlowResult<String> {
        self.proposal.id()
    }

    /// Adds `signer`'s signature made with `keys`.
    pub fn sign(&mut self, signer: &Party, keys: &KeyManager) -> FlowResult<()> {
        let tx_id = self.id()?;
        let signature = TransactionSignature::create(signer.clone(), keys, &tx_id)?;
        self.add_signature(signature);
        Ok(())
    }

    /// Adds a signature, replacing an earlier one by the same signer.
    pub fn add_signature(&mut self, signature: TransactionSignature) {
        self.signatures.retain(|s| s.signer != signature.signer);
        self.signatures.push(signature);
    }

    pub fn signature_of(&self, party: &Party) -> Option<&TransactionSignature> {
        self.signatures.iter().find(|s| &s.signer == party)
    }

    /// Checks every required signer has a valid signature.
    ///
    /// # Errors
    /// `CommitFailed` naming the first signer whose signature is missing or invalid
    pub fn verify_signatures(&self) -> FlowResult<()> {
        let tx_id = self.id()?;
        for signer in &self.proposal.required_signers {
            match self.signature_of(signer) {
                Some(signature) if signature.verifies(&tx_id) => {}
                Some(_) => {
                    return Err(FlowError::CommitFailed(format!("invalid signature from {}", signer)))
                }
                None => {
                    return Err(FlowError::CommitFailed(format!("missing signature from {}", signer)))
                }
            }
        }
        Ok(())
    }
}

/// Notary's attestation that a transaction was durably committed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommitConfirmation {
    pub tx_id: String,
    pub notary: Party,
    #[serde(with = "base64_bytes")]
    pub notary_signature: Vec<u8>,
    pub committed_at: DateTime<Utc>,
}

impl CommitConfirmation {
    pub fn verifies(&self) -> bool {
        KeyManager::verify_signature(&self.notary.public_key, self.tx_id.as_bytes(), &self.notary_signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proof::{ProofRequest, ProofResponse, ProofSupportData};

    fn proposal(verifier: &Party, prover: &Party, notary: &Party) -> TransactionProposal {
        let record = VerificationRecord {
            identifier: "check-1".into(),
            request: ProofRequest {
                nonce: "1".into(),
                requested_attributes: Default::default(),
                requested_predicates: Default::default(),
                non_revoked: None,
            },
            proof: ProofResponse::from_bytes(vec![1, 2]),
            support: ProofSupportData::default(),
            participants: vec![verifier.clone(), prover.clone()],
        };
        TransactionProposal::new(
            verifier.clone(),
            vec![record],
            VerificationCommand::Verify { expected_attributes: vec![] },
            vec![verifier.clone(), prover.clone()],
            notary.clone(),
        )
    }

    #[test]
    fn test_signatures_cover_all_required_signers() {
        let (vk, pk, nk) = (KeyManager::new(), KeyManager::new(), KeyManager::new());
        let (verifier, prover, notary) = (vk.party("V"), pk.party("P"), nk.party("N"));
        let mut tx = SignedTransaction::new(proposal(&verifier, &prover, &notary));

        tx.sign(&verifier, &vk).unwrap();
        assert!(matches!(tx.verify_signatures(), Err(FlowError::CommitFailed(_))));

        tx.sign(&prover, &pk).unwrap();
        assert!(tx.verify_signatures().is_ok());
    }

    #[test]
    fn test_signature_with_wrong_key_rejected() {
        let (vk, pk, nk) = (KeyManager::new(), KeyManager::new(), KeyManager::new());
        let (verifier, prover, notary) = (vk.party("V"), pk.party("P"), nk.party("N"));
        let mut tx = SignedTransaction::new(proposal(&verifier, &prover, &notary));
        tx.sign(&verifier, &vk).unwrap();
        // Prover's identity, verifier's key
        tx.sign(&prover, &vk).unwrap();
        let err = tx.verify_signatures().unwrap_err();
        assert!(err.to_string().contains("invalid signature from P"));
    }

    #[test]
    fn test_id_changes_with_content() {
        let (vk, pk, nk) = (KeyManager::new(), KeyManager::new(), KeyManager::new());
        let (verifier, prover, notary) = (vk.party("V"), pk.party("P"), nk.party("N"));
        let a = proposal(&verifier, &prover, &notary);
        let mut b = a.clone();
        b.outputs[0].identifier = "check-2".into();
        assert_ne!(a.id().unwrap(), b.id().unwrap());
        assert_eq!(a.id().unwrap(), a.clone().id().unwrap());
    }
}
