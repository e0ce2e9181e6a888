// src/ledger/memory.rs
//! In-process ledger with a single notary.
//!
//! Commit validates, checks signatures and the duplicate policy, then
//! notarises and stores under one write lock, so a transaction lands whole
//! or not at all.

use crate::contracts::verification_contract;
use crate::error::{FlowError, FlowResult};
use crate::ledger::transaction::{CommitConfirmation, SignedTransaction, TransactionProposal};
use crate::ledger::Ledger;
use crate::models::party::Party;
use crate::models::record::VerificationRecord;
use crate::wallet::key_management::KeyManager;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// What the ledger does with a second record under an existing identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep both records
    Allow,
    /// Refuse the commit
    Reject,
}

#[derive(Default)]
struct LedgerState {
    transactions: HashMap<String, SignedTransaction>,
    records: Vec<VerificationRecord>,
    /// When false every commit fails
    accepting: bool,
}

pub struct InMemoryLedger {
    notary: Party,
    notary_keys: KeyManager,
    policy: DuplicatePolicy,
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(notary_name: impl Into<String>, policy: DuplicatePolicy) -> Self {
        let notary_keys = KeyManager::new();
        Self {
            notary: notary_keys.party(notary_name),
            notary_keys,
            policy,
            state: RwLock::new(LedgerState { accepting: true, ..Default::default() }),
        }
    }

    /// Number of committed verification records.
    pub async fn committed_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Makes every subsequent commit fail (or succeed again).
    pub async fn set_accepting(&self, accepting: bool) {
        self.state.write().await.accepting = accepting;
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    fn notary(&self) -> Party {
        self.notary.clone()
    }

    async fn validate(&self, proposal: &TransactionProposal) -> FlowResult<()> {
        if proposal.notary != self.notary {
            return Err(FlowError::TransactionValidationFailed(format!(
                "proposal names notary {} but this ledger is notarised by {}",
                proposal.notary, self.notary
            )));
        }
        verification_contract::verify(proposal)
    }

    async fn commit(&self, transaction: SignedTransaction) -> FlowResult<CommitConfirmation> {
        self.validate(&transaction.proposal).await?;
        transaction.verify_signatures()?;
        let tx_id = transaction.id()?;

        let mut state = self.state.write().await;
        if !state.accepting {
            return Err(FlowError::CommitFailed("ledger is not accepting commits".into()));
        }
        if state.transactions.contains_key(&tx_id) {
            return Err(FlowError::CommitFailed(format!("transaction {} already committed", tx_id)));
        }
        if self.policy == DuplicatePolicy::Reject {
            for output in &transaction.proposal.outputs {
                if state.records.iter().any(|r| r.identifier == output.identifier) {
                    return Err(FlowError::CommitFailed(format!(
                        "a verification with identifier '{}' is already recorded",
                        output.identifier
                    )));
                }
            }
        }

        let confirmation = CommitConfirmation {
            notary_signature: self.notary_keys.sign_message(tx_id.as_bytes())?,
            tx_id: tx_id.clone(),
            notary: self.notary.clone(),
            committed_at: Utc::now(),
        };
        state.records.extend(transaction.proposal.outputs.iter().cloned());
        state.transactions.insert(tx_id.clone(), transaction);
        log::info!("notary {} committed transaction {}", self.notary, tx_id);
        Ok(confirmation)
    }

    async fn is_committed(&self, tx_id: &str) -> bool {
        self.state.read().await.transactions.contains_key(tx_id)
    }

    async fn verifications(&self, identifier: &str) -> Vec<VerificationRecord> {
        self.state
            .read()
            .await
            .records
            .iter()
            .filter(|r| r.identifier == identifier)
            .cloned()
            .collect()
    }
}
