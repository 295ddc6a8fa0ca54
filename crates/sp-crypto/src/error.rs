//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by signing, verification and key parsing.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Verification failed.
    #[error("signature verification failed")]
    Verification,

    /// Invalid key material.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Certificate could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Algorithm not supported for this key or operation.
    #[error("algorithm not supported: {0}")]
    UnsupportedAlgorithm(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_error_is_generic() {
        let error = CryptoError::Verification;
        // Don't leak information about why verification failed
        assert_eq!(error.to_string(), "signature verification failed");
    }

    #[test]
    fn invalid_key_carries_detail() {
        let error = CryptoError::InvalidKey("truncated".to_string());
        assert!(error.to_string().contains("truncated"));
    }
}
