// src/ledger/mod.rs
//! Ledger substrate seam.
//!
//! The protocols consume the substrate through three traits:
//! - [`Network`]: resolves party names and opens sessions
//! - [`SessionHandler`]: the responder side a session is delivered to
//! - [`Ledger`]: validates, notarises and stores transactions
//!
//! In-process implementations live in [`memory`] and [`network`].

use crate::error::FlowResult;
use crate::models::party::Party;
use crate::models::record::VerificationRecord;
use async_trait::async_trait;

pub mod memory;
pub mod network;
pub mod session;
pub mod signing;
pub mod transaction;

pub use memory::{DuplicatePolicy, InMemoryLedger};
pub use network::InMemoryNetwork;
pub use session::{FlowMessage, Session};
pub use transaction::{CommitConfirmation, SignedTransaction, TransactionProposal, TransactionSignature};

/// Party resolution and session establishment.
#[async_trait]
pub trait Network: Send + Sync {
    /// # Errors
    /// `UnknownParty` if no participant goes by `name`
    async fn resolve_party(&self, name: &str) -> FlowResult<Party>;

    /// Opens a session from `initiator` to `peer`, starting the peer's responder.
    ///
    /// # Errors
    /// `UnknownParty` or `SessionFailure`
    async fn open_session(&self, initiator: &Party, peer: &Party) -> FlowResult<Session>;
}

/// Responder logic a party runs for each inbound session.
#[async_trait]
pub trait SessionHandler: Send + Sync {
    async fn on_session(&self, session: Session) -> FlowResult<()>;
}

/// Transaction validation and notarised commitment.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Notary that must attest every commit.
    fn notary(&self) -> Party;

    /// Checks a proposal against the ledger contract.
    ///
    /// # Errors
    /// `TransactionValidationFailed`
    async fn validate(&self, proposal: &TransactionProposal) -> FlowResult<()>;

    /// Durably commits a fully signed transaction, all or nothing.
    ///
    /// # Errors
    /// `CommitFailed` (or `TransactionValidationFailed` from re-validation)
    async fn commit(&self, transaction: SignedTransaction) -> FlowResult<CommitConfirmation>;

    async fn is_committed(&self, tx_id: &str) -> bool;

    /// Committed verification records carrying `identifier`, in commit order.
    async fn verifications(&self, identifier: &str) -> Vec<VerificationRecord>;
}
