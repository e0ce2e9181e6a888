// src/ledger/signing.rs
//! Counter-signature exchange, piggybacked on the protocol session.

use crate::error::{FlowError, FlowResult};
use crate::ledger::session::{FlowMessage, Session};
use crate::ledger::transaction::SignedTransaction;

/// Sends `transaction` to the session peer and waits for its signature.
///
/// The peer must be a required signer. Any transport failure, decline,
/// unexpected message or invalid signature is a `SignatureCollectionFailed`.
pub async fn collect_counter_signatures(
    mut transaction: SignedTransaction,
    session: &mut Session,
) -> FlowResult<SignedTransaction> {
    let peer = session.peer().clone();
    if !transaction.proposal.required_signers.contains(&peer) {
        return Err(FlowError::SignatureCollectionFailed(format!("{} is not a required signer", peer)));
    }
    let tx_id = transaction.id()?;

    session
        .send(&FlowMessage::Proposal(transaction.clone()))
        .await
        .map_err(signature_failure)?;

    match session.receive().await.map_err(signature_failure)? {
        FlowMessage::Signature(signature) => {
            if signature.signer != peer {
                return Err(FlowError::SignatureCollectionFailed(format!(
                    "signature from {} arrived on the session with {}",
                    signature.signer, peer
                )));
            }
            if !signature.verifies(&tx_id) {
                return Err(FlowError::SignatureCollectionFailed(format!("invalid signature from {}", peer)));
            }
            transaction.add_signature(signature);
            Ok(transaction)
        }
        FlowMessage::Declined { reason } => Err(FlowError::SignatureCollectionFailed(format!(
            "{} declined to sign: {}",
            peer, reason
        ))),
        other => Err(FlowError::SignatureCollectionFailed(format!(
            "expected a signature from {}, received {}",
            peer,
            other.label()
        ))),
    }
}

fn signature_failure(err: FlowError) -> FlowError {
    match err {
        FlowError::SessionFailure(reason) => FlowError::SignatureCollectionFailed(reason),
        other => other,
    }
}
