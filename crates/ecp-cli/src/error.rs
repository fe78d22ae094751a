//! CLI error types.

use ecp_client::EcpError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Client error, reported with its kind.
    #[error("{kind}: {0}", kind = .0.kind())]
    Ecp(#[from] EcpError),

    /// Configuration file error.
    #[error("ConfigError: {0}")]
    Config(String),

    /// Invalid or missing argument.
    #[error("ConfigError: {0}")]
    InvalidArgument(String),

    /// Signing request error.
    #[error("CryptoError: {0}")]
    Crypto(#[from] ecp_crypto::CsrError),

    /// IO error.
    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
