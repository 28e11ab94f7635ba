//! Error types for paygate-crypto

use thiserror::Error;

/// Result type for signing operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in signing operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Shared key is empty, or the asymmetric scheme has no signer configured
    #[error("signing key is missing")]
    MissingSigningKey,

    /// Key material was rejected by the primitive
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// External signer failed
    #[error("external signer failed: {0}")]
    External(String),
}
