//! Metadata cache errors.

use chainabi_core::{ClientError, DecodeError, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// `decoder_for` was asked about a contract that was never resolved.
    #[error("No metadata cached for {address}")]
    NotFound { address: String },

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Transaction {hash} not found")]
    TransactionNotFound { hash: String },

    /// The chain client is unset, unreachable or timed out.
    #[error("Chain client unavailable: {0}")]
    CollaboratorUnavailable(#[from] ClientError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl MetadataError {
    /// Returns `true` if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::CollaboratorUnavailable(e) => {
                matches!(e, ClientError::Timeout { .. } | ClientError::Transport(_))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_transient() {
        let err: MetadataError = ClientError::Timeout { ms: 10 }.into();
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Chain client unavailable: Chain client call timed out after 10ms");
        let unset: MetadataError = ClientError::NotConfigured.into();
        assert!(!unset.is_transient());
        assert!(!MetadataError::InvalidAddress("x".into()).is_transient());
    }
}
