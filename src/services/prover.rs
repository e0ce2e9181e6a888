// src/services/prover.rs
//! Prover side of the claim verification protocol.
//!
//! One [`CredentialProverResponder::on_session`] call serves one inbound
//! session: prove, co-sign, await finality. The responder never signs a
//! proposal that failed its [`AcceptancePolicy`] or local ledger
//! validation, and every proof it sends or refuses is logged.

use crate::error::{FlowError, FlowResult};
use crate::ledger::{FlowMessage, Ledger, Session, SessionHandler, SignedTransaction, TransactionProposal, TransactionSignature};
use crate::models::party::Party;
use crate::models::proof::{ProofRequest, ProofResponse};
use crate::models::record::VerificationCommand;
use crate::wallet::key_management::KeyManager;
use crate::zkp::{MasterSecret, ProofSystem};
use async_trait::async_trait;
use std::sync::Arc;

/// What the prover knows when a proposal arrives.
pub struct ProposalContext<'a> {
    /// The prover itself
    pub prover: &'a Party,
    /// Counterparty of the session the proposal arrived on
    pub verifier: &'a Party,
    pub request: &'a ProofRequest,
    /// Proof this prover sent on the session
    pub proof: &'a ProofResponse,
    pub proposal: &'a TransactionProposal,
}

/// Local check a proposal must pass before the prover signs it.
pub trait AcceptancePolicy: Send + Sync {
    /// # Errors
    /// `TransactionValidationFailed` naming the reason for refusal
    fn accept(&self, context: &ProposalContext<'_>) -> FlowResult<()>;
}

/// Accepts only the verification this session was about.
///
/// The proposer must be the session's verifier, the transaction must carry
/// one `Verify` command and one record, and that record must answer the
/// request received here with the proof sent here, listing the prover as a
/// participant and a required signer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedVerifierPolicy;

impl AcceptancePolicy for ExpectedVerifierPolicy {
    fn accept(&self, context: &ProposalContext<'_>) -> FlowResult<()> {
        let proposal = context.proposal;
        if &proposal.proposer != context.verifier {
            return Err(refuse(format!(
                "proposal from {} arrived on the session with {}",
                proposal.proposer, context.verifier
            )));
        }
        match &proposal.command {
            VerificationCommand::Verify { .. } => {}
        }
        let record = match proposal.outputs.as_slice() {
            [record] => record,
            outputs => return Err(refuse(format!("expected one verification record, found {}", outputs.len()))),
        };
        if &record.request != context.request {
            return Err(refuse("record answers a different proof request"));
        }
        if &record.proof != context.proof {
            return Err(refuse("record carries a different proof"));
        }
        if !record.has_participant(context.prover) || !proposal.required_signers.contains(context.prover) {
            return Err(refuse(format!("{} is not a participant of the record", context.prover)));
        }
        Ok(())
    }
}

fn refuse(reason: impl Into<String>) -> FlowError {
    FlowError::TransactionValidationFailed(reason.into())
}

/// Protocol responder run for every session opened to the prover.
pub struct CredentialProverResponder {
    me: Party,
    keys: KeyManager,
    secret: MasterSecret,
    proofs: Arc<dyn ProofSystem>,
    ledger: Arc<dyn Ledger>,
    policy: Arc<dyn AcceptancePolicy>,
}

impl CredentialProverResponder {
    /// Creates a responder using the [`ExpectedVerifierPolicy`].
    ///
    /// # Arguments
    /// * `name` - Name the prover is registered under
    /// * `keys` - Signing keys behind that identity
    /// * `secret` - Master secret handle proofs are generated with
    /// * `proofs` - Proof generation capability
    /// * `ledger` - Ledger used for local validation and finality checks
    pub fn new(
        name: impl Into<String>,
        keys: KeyManager,
        secret: MasterSecret,
        proofs: Arc<dyn ProofSystem>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            me: keys.party(name),
            keys,
            secret,
            proofs,
            ledger,
            policy: Arc::new(ExpectedVerifierPolicy),
        }
    }

    /// Replaces the acceptance policy.
    pub fn with_policy(mut self, policy: Arc<dyn AcceptancePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn party(&self) -> &Party {
        &self.me
    }

    async fn prove(&self, session: &mut Session) -> FlowResult<(ProofRequest, ProofResponse)> {
        let request = match session.receive().await? {
            FlowMessage::ProofRequest(request) => request,
            FlowMessage::Declined { reason } => {
                return Err(FlowError::SessionFailure(format!(
                    "{} declined before requesting: {}",
                    session.peer(),
                    reason
                )))
            }
            other => {
                return Err(FlowError::SessionFailure(format!(
                    "expected a proof request from {}, received {}",
                    session.peer(),
                    other.label()
                )))
            }
        };

        let digest = request.digest()?;
        let proof = match self.proofs.create_proof(&request, &self.secret).await {
            Ok(proof) => proof,
            Err(e) => {
                log::warn!("{} declining proof request {} from {}: {}", self.me, digest, session.peer(), e);
                decline(session, &e.to_string()).await;
                return Err(e);
            }
        };

        log::info!("{} sending proof for request {} to {}", self.me, digest, session.peer());
        session.send(&FlowMessage::ProofResponse(proof.clone())).await?;
        Ok((request, proof))
    }

    async fn co_sign(
        &self,
        session: &mut Session,
        request: &ProofRequest,
        proof: &ProofResponse,
    ) -> FlowResult<String> {
        let transaction: SignedTransaction = match session.receive().await? {
            FlowMessage::Proposal(transaction) => transaction,
            FlowMessage::Declined { reason } => {
                return Err(FlowError::SessionFailure(format!("{} abandoned the run: {}", session.peer(), reason)))
            }
            other => {
                return Err(FlowError::SessionFailure(format!(
                    "expected a proposal from {}, received {}",
                    session.peer(),
                    other.label()
                )))
            }
        };

        let tx_id = transaction.id()?;
        if let Err(e) = self.check_proposal(session.peer(), request, proof, &transaction, &tx_id).await {
            log::warn!("{} refusing to sign {}: {}", self.me, tx_id, e);
            decline(session, &e.to_string()).await;
            return Err(e);
        }

        let signature = TransactionSignature::create(self.me.clone(), &self.keys, &tx_id)?;
        session.send(&FlowMessage::Signature(signature)).await?;
        log::info!("{} signed transaction {}", self.me, tx_id);
        Ok(tx_id)
    }

    async fn check_proposal(
        &self,
        verifier: &Party,
        request: &ProofRequest,
        proof: &ProofResponse,
        transaction: &SignedTransaction,
        tx_id: &str,
    ) -> FlowResult<()> {
        let context = ProposalContext {
            prover: &self.me,
            verifier,
            request,
            proof,
            proposal: &transaction.proposal,
        };
        self.policy.accept(&context)?;
        self.ledger.validate(&transaction.proposal).await?;
        match transaction.signature_of(verifier) {
            Some(signature) if signature.verifies(tx_id) => Ok(()),
            _ => Err(refuse(format!("proposal lacks a valid signature from {}", verifier))),
        }
    }

    async fn await_finality(&self, session: &mut Session, tx_id: &str) -> FlowResult<()> {
        let confirmation = match session.receive().await {
            Ok(FlowMessage::Finalized(confirmation)) => confirmation,
            Ok(other) => {
                return Err(FlowError::CommitFailed(format!(
                    "expected finality for {}, received {}",
                    tx_id,
                    other.label()
                )))
            }
            Err(e) => return Err(FlowError::CommitFailed(format!("no finality for {}: {}", tx_id, e))),
        };
        if confirmation.tx_id != tx_id || !confirmation.verifies() {
            return Err(FlowError::CommitFailed(format!("invalid commit confirmation for {}", tx_id)));
        }
        if !self.ledger.is_committed(tx_id).await {
            return Err(FlowError::CommitFailed(format!("{} is not on the ledger", tx_id)));
        }
        log::info!("{} saw transaction {} committed by {}", self.me, tx_id, confirmation.notary);
        Ok(())
    }
}

#[async_trait]
impl SessionHandler for CredentialProverResponder {
    async fn on_session(&self, mut session: Session) -> FlowResult<()> {
        let (request, proof) = self.prove(&mut session).await?;
        let tx_id = self.co_sign(&mut session, &request, &proof).await?;
        self.await_finality(&mut session, &tx_id).await
    }
}

async fn decline(session: &Session, reason: &str) {
    let message = FlowMessage::Declined { reason: reason.to_string() };
    if let Err(e) = session.send(&message).await {
        log::debug!("could not deliver decline to {}: {}", session.peer(), e);
    }
}
