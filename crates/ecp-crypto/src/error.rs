//! Error types for key and signing request operations.

use thiserror::Error;

/// Result type for CSR operations.
pub type CsrResult<T> = Result<T, CsrError>;

/// Errors raised while generating or inspecting signing requests.
#[derive(Debug, Error)]
pub enum CsrError {
    /// Key pair generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Key or request could not be encoded.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// The request could not be signed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Input is not a usable PEM document.
    #[error("invalid PEM: {0}")]
    InvalidPem(String),

    /// The request's self-signature does not verify.
    #[error("signature verification failed: {0}")]
    Verification(String),
}

impl From<rsa::Error> for CsrError {
    fn from(err: rsa::Error) -> Self {
        Self::KeyGeneration(err.to_string())
    }
}

impl From<rcgen::Error> for CsrError {
    fn from(err: rcgen::Error) -> Self {
        Self::Signing(err.to_string())
    }
}
