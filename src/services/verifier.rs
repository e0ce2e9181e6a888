// src/services/verifier.rs
//! Verifier side of the claim verification protocol.
//!
//! A run walks the stages of [`VerifierStage`] in order and stops at the
//! first failure. Nothing reaches the ledger unless the proof checked out
//! against the exact request that was sent and both parties signed.
//!
//! [`CredentialProofVerifier::run`] returns the typed failure;
//! [`CredentialProofVerifier::verify_claims`] is the boolean contract and
//! logs the stage and error kind it collapses.

use crate::error::{FlowError, FlowResult};
use crate::ledger::signing::collect_counter_signatures;
use crate::ledger::{CommitConfirmation, FlowMessage, Ledger, Network, Session, SignedTransaction, TransactionProposal};
use crate::models::assertion::{AttributeAssertion, PredicateAssertion};
use crate::models::party::Party;
use crate::models::proof::{NonRevocationInterval, ProofRequest, ProofResponse};
use crate::models::record::{ExpectedAttribute, VerificationCommand, VerificationRecord};
use crate::services::request_builder::ProofRequestBuilder;
use crate::wallet::key_management::KeyManager;
use crate::zkp::ProofSystem;
use std::fmt;
use std::sync::Arc;

/// Caller input for one verification.
#[derive(Debug, Clone)]
pub struct VerifyClaimsRequest {
    /// Key the committed record is looked up by later
    pub identifier: String,
    pub attributes: Vec<AttributeAssertion>,
    pub predicates: Vec<PredicateAssertion>,
    pub prover_name: String,
    pub non_revoked: Option<NonRevocationInterval>,
}

/// Stages of a verifier run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerifierStage {
    Resolve,
    Open,
    Build,
    Exchange,
    Verify,
    Derive,
    Commit,
}

impl fmt::Display for VerifierStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VerifierStage::Resolve => "resolve",
            VerifierStage::Open => "open",
            VerifierStage::Build => "build",
            VerifierStage::Exchange => "exchange",
            VerifierStage::Verify => "verify",
            VerifierStage::Derive => "derive",
            VerifierStage::Commit => "commit",
        };
        f.write_str(label)
    }
}

/// A verification that landed on the ledger.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub record: VerificationRecord,
    pub confirmation: CommitConfirmation,
}

/// Protocol initiator: requests, checks and jointly records a proof.
pub struct CredentialProofVerifier {
    me: Party,
    keys: KeyManager,
    network: Arc<dyn Network>,
    ledger: Arc<dyn Ledger>,
    proofs: Arc<dyn ProofSystem>,
}

impl CredentialProofVerifier {
    /// # Arguments
    /// * `name` - Name this verifier is registered under on the network
    /// * `keys` - Signing keys behind that identity
    /// * `network` - Party directory and session transport
    /// * `ledger` - Substrate the record is committed to
    /// * `proofs` - Proof verification capability
    pub fn new(
        name: impl Into<String>,
        keys: KeyManager,
        network: Arc<dyn Network>,
        ledger: Arc<dyn Ledger>,
        proofs: Arc<dyn ProofSystem>,
    ) -> Self {
        Self { me: keys.party(name), keys, network, ledger, proofs }
    }

    pub fn party(&self) -> &Party {
        &self.me
    }

    /// Runs the protocol, reducing the outcome to success or failure.
    ///
    /// Returns `true` iff the record was durably committed. The failure
    /// kind and stage are logged, never raised.
    pub async fn verify_claims(&self, request: VerifyClaimsRequest) -> bool {
        let identifier = request.identifier.clone();
        let mut stage = VerifierStage::Resolve;
        match self.run_staged(request, &mut stage).await {
            Ok(outcome) => {
                log::info!(
                    "verification '{}' committed in transaction {}",
                    identifier,
                    outcome.confirmation.tx_id
                );
                true
            }
            Err(e) => {
                log::warn!("verification '{}' failed at {} ({}): {}", identifier, stage, e.kind(), e);
                false
            }
        }
    }

    /// Runs the protocol and returns the committed record.
    ///
    /// # Errors
    /// The first failure, typed by the stage that raised it:
    /// `UnknownParty`, `SessionFailure`, `MalformedAssertion`,
    /// `ProofVerificationFailed`, `TransactionValidationFailed`,
    /// `SignatureCollectionFailed` or `CommitFailed`
    pub async fn run(&self, request: VerifyClaimsRequest) -> FlowResult<VerificationOutcome> {
        let mut stage = VerifierStage::Resolve;
        self.run_staged(request, &mut stage).await
    }

    async fn run_staged(
        &self,
        request: VerifyClaimsRequest,
        stage: &mut VerifierStage,
    ) -> FlowResult<VerificationOutcome> {
        let identifier = request.identifier.clone();

        *stage = VerifierStage::Resolve;
        log::debug!("verification '{}': {}", identifier, stage);
        let prover = self.network.resolve_party(&request.prover_name).await?;

        *stage = VerifierStage::Open;
        log::debug!("verification '{}': {} session with {}", identifier, stage, prover);
        let mut session = self.network.open_session(&self.me, &prover).await?;

        *stage = VerifierStage::Build;
        log::debug!("verification '{}': {}", identifier, stage);
        let proof_request = match ProofRequestBuilder::new()
            .attributes(request.attributes.iter().cloned())
            .predicates(request.predicates)
            .non_revoked(request.non_revoked)
            .build()
        {
            Ok(proof_request) => proof_request,
            Err(e) => {
                decline(&session, &e.to_string()).await;
                return Err(e);
            }
        };

        *stage = VerifierStage::Exchange;
        log::debug!("verification '{}': {}", identifier, stage);
        let proof = exchange(&mut session, &proof_request).await?;

        *stage = VerifierStage::Verify;
        log::debug!("verification '{}': {}", identifier, stage);
        let check = self.proofs.verify_proof(&proof_request, &proof).await?;
        if !check.verified {
            let reason = check.rejection.unwrap_or_else(|| "proof rejected".into());
            decline(&session, &reason).await;
            return Err(FlowError::ProofVerificationFailed(reason));
        }

        *stage = VerifierStage::Derive;
        log::debug!("verification '{}': {}", identifier, stage);
        let record = VerificationRecord {
            identifier,
            request: proof_request,
            proof,
            support: check.support,
            participants: vec![self.me.clone(), prover.clone()],
        };
        let expected_attributes = expected_attributes(&request.attributes);

        *stage = VerifierStage::Commit;
        log::debug!("verification '{}': {}", record.identifier, stage);
        let proposal = TransactionProposal::new(
            self.me.clone(),
            vec![record.clone()],
            VerificationCommand::Verify { expected_attributes },
            vec![self.me.clone(), prover],
            self.ledger.notary(),
        );
        if let Err(e) = self.ledger.validate(&proposal).await {
            decline(&session, &e.to_string()).await;
            return Err(e);
        }

        let mut transaction = SignedTransaction::new(proposal);
        transaction.sign(&self.me, &self.keys)?;
        let transaction = collect_counter_signatures(transaction, &mut session).await?;
        let confirmation = self.ledger.commit(transaction).await?;

        if let Err(e) = session.send(&FlowMessage::Finalized(confirmation.clone())).await {
            log::warn!("committed {} but could not notify {}: {}", confirmation.tx_id, session.peer(), e);
        }
        Ok(VerificationOutcome { record, confirmation })
    }
}

/// Sends the request and waits for exactly one response.
async fn exchange(session: &mut Session, request: &ProofRequest) -> FlowResult<ProofResponse> {
    session.send(&FlowMessage::ProofRequest(request.clone())).await?;
    match session.receive().await? {
        FlowMessage::ProofResponse(proof) => Ok(proof),
        FlowMessage::Declined { reason } => Err(FlowError::SessionFailure(format!(
            "{} declined to prove: {}",
            session.peer(),
            reason
        ))),
        other => Err(FlowError::SessionFailure(format!(
            "expected a proof response from {}, received {}",
            session.peer(),
            other.label()
        ))),
    }
}

async fn decline(session: &Session, reason: &str) {
    let message = FlowMessage::Declined { reason: reason.to_string() };
    if let Err(e) = session.send(&message).await {
        log::debug!("could not tell {} the run was abandoned: {}", session.peer(), e);
    }
}

/// Revealed values the commit must re-check.
fn expected_attributes(attributes: &[AttributeAssertion]) -> Vec<ExpectedAttribute> {
    attributes
        .iter()
        .filter_map(|a| {
            a.expected().map(|value| ExpectedAttribute { reference: a.reference(), value: value.to_string() })
        })
        .collect()
}
