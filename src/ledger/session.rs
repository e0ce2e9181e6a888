// src/ledger/session.rs
//! Bidirectional Verifier/Prover session and its wire messages.
//!
//! A session is a pair of bounded channels carrying JSON-encoded frames.
//! Request-then-response ordering within a session follows from the
//! channel's FIFO delivery. Every receive is bounded by the session timeout.

use crate::error::{FlowError, FlowResult};
use crate::ledger::transaction::{CommitConfirmation, SignedTransaction, TransactionSignature};
use crate::models::party::Party;
use crate::models::proof::{ProofRequest, ProofResponse};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

/// Frames buffered per direction.
const SESSION_BUFFER: usize = 8;

/// Messages exchanged on a session, in protocol order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum FlowMessage {
    /// Message 1, Verifier to Prover
    ProofRequest(ProofRequest),
    /// Message 2, Prover to Verifier
    ProofResponse(ProofResponse),
    /// Verifier-signed transaction awaiting the Prover's counter-signature
    Proposal(SignedTransaction),
    Signature(TransactionSignature),
    Declined { reason: String },
    /// Notarised commit, announced to the counterparty
    Finalized(CommitConfirmation),
}

impl FlowMessage {
    pub fn label(&self) -> &'static str {
        match self {
            FlowMessage::ProofRequest(_) => "proof_request",
            FlowMessage::ProofResponse(_) => "proof_response",
            FlowMessage::Proposal(_) => "proposal",
            FlowMessage::Signature(_) => "signature",
            FlowMessage::Declined { .. } => "declined",
            FlowMessage::Finalized(_) => "finalized",
        }
    }

    pub fn encode(&self) -> FlowResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn decode(frame: &[u8]) -> FlowResult<Self> {
        Ok(serde_json::from_slice(frame)?)
    }
}

/// One end of a two-party session.
#[derive(Debug)]
pub struct Session {
    local: Party,
    peer: Party,
    outbound: mpsc::Sender<Bytes>,
    inbound: mpsc::Receiver<Bytes>,
    timeout: Duration,
}

impl Session {
    /// Creates both ends of a session between `initiator` and `responder`.
    ///
    /// # Returns
    /// `(initiator_end, responder_end)`
    pub fn pair(initiator: Party, responder: Party, timeout: Duration) -> (Session, Session) {
        let (to_responder, from_initiator) = mpsc::channel(SESSION_BUFFER);
        let (to_initiator, from_responder) = mpsc::channel(SESSION_BUFFER);
        let initiator_end = Session {
            local: initiator.clone(),
            peer: responder.clone(),
            outbound: to_responder,
            inbound: from_responder,
            timeout,
        };
        let responder_end = Session {
            local: responder,
            peer: initiator,
            outbound: to_initiator,
            inbound: from_initiator,
            timeout,
        };
        (initiator_end, responder_end)
    }

    pub fn peer(&self) -> &Party {
        &self.peer
    }

    /// Sends one message to the peer.
    ///
    /// # Errors
    /// `SessionFailure` if the peer has gone away
    pub async fn send(&self, message: &FlowMessage) -> FlowResult<()> {
        let frame = message.encode()?;
        log::debug!("{} -> {}: {}", self.local, self.peer, message.label());
        self.outbound.send(frame).await.map_err(|_| {
            FlowError::SessionFailure(format!("session with {} closed before {} was sent", self.peer, message.label()))
        })
    }

    /// Suspends until the peer's next message arrives.
    ///
    /// # Errors
    /// `SessionFailure` on timeout, on a closed session, or on an undecodable frame
    pub async fn receive(&mut self) -> FlowResult<FlowMessage> {
        let frame = match tokio::time::timeout(self.timeout, self.inbound.recv()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Err(FlowError::SessionFailure(format!("session with {} closed", self.peer)))
            }
            Err(_) => {
                return Err(FlowError::SessionFailure(format!(
                    "timed out after {:?} waiting for {}",
                    self.timeout, self.peer
                )))
            }
        };
        let message = FlowMessage::decode(&frame).map_err(|e| {
            FlowError::SessionFailure(format!("undecodable frame from {}: {}", self.peer, e))
        })?;
        log::debug!("{} <- {}: {}", self.local, self.peer, message.label());
        Ok(message)
    }
}
