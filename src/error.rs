// src/error.rs
//! Error taxonomy shared by every protocol run.
//!
//! The caller-facing verification contract collapses all of these into a
//! boolean; the variants survive internally so logs keep the specific cause.

use thiserror::Error;

/// Failure of a verification, prover, or publishing run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("unknown party: {0}")]
    UnknownParty(String),

    #[error("malformed assertion: {0}")]
    MalformedAssertion(String),

    #[error("session failure: {0}")]
    SessionFailure(String),

    #[error("proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("proof verification failed: {0}")]
    ProofVerificationFailed(String),

    #[error("transaction validation failed: {0}")]
    TransactionValidationFailed(String),

    #[error("signature collection failed: {0}")]
    SignatureCollectionFailed(String),

    #[error("commit failed: {0}")]
    CommitFailed(String),

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("registry rejected artifact: {0}")]
    RegistryRejected(String),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("credential definition creation failed: {0}")]
    DefinitionCreationFailed(String),

    #[error("credential issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl FlowError {
    /// Stable label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::UnknownParty(_) => "unknown_party",
            FlowError::MalformedAssertion(_) => "malformed_assertion",
            FlowError::SessionFailure(_) => "session_failure",
            FlowError::ProofGenerationFailed(_) => "proof_generation_failed",
            FlowError::ProofVerificationFailed(_) => "proof_verification_failed",
            FlowError::TransactionValidationFailed(_) => "transaction_validation_failed",
            FlowError::SignatureCollectionFailed(_) => "signature_collection_failed",
            FlowError::CommitFailed(_) => "commit_failed",
            FlowError::RegistryUnavailable(_) => "registry_unavailable",
            FlowError::RegistryRejected(_) => "registry_rejected",
            FlowError::ArtifactNotFound(_) => "artifact_not_found",
            FlowError::DefinitionCreationFailed(_) => "definition_creation_failed",
            FlowError::IssuanceFailed(_) => "issuance_failed",
            FlowError::Crypto(_) => "crypto",
            FlowError::Serialization(_) => "serialization",
            FlowError::Configuration(_) => "configuration",
        }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = FlowError::UnknownParty("Bob".into());
        assert_eq!(e.to_string(), "unknown party: Bob");

        let e = FlowError::CommitFailed("duplicate identifier".into());
        assert_eq!(e.to_string(), "commit failed: duplicate identifier");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(
            FlowError::ProofVerificationFailed("x".into()).kind(),
            "proof_verification_failed"
        );
        assert_eq!(
            FlowError::SignatureCollectionFailed("x".into()).kind(),
            "signature_collection_failed"
        );
    }

    #[test]
    fn test_serde_error_converts() {
        let err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let e: FlowError = err.into();
        assert_eq!(e.kind(), "serialization");
    }
}
