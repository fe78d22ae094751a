//! Client error types.
//!
//! Every failure of the handshake or the certificate exchange is one of
//! seven kinds; [`EcpError::kind`] gives the classification.

use std::fmt;

use ecp_crypto::CsrError;
use ecp_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client operations.
pub type EcpResult<T> = Result<T, EcpError>;

/// Classification of an [`EcpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing URL, unknown IdP.
    Config,
    /// Connection failure, timeout, unreadable HTTP response.
    Transport,
    /// Malformed XML or structural validation failure.
    Parse,
    /// Valid XML that breaks ECP/PAOS expectations.
    Protocol,
    /// Credentials rejected, or no usable SP session.
    Authentication,
    /// Key generation or signing failure.
    Crypto,
    /// The SP did not return a certificate.
    Certificate,
}

impl ErrorKind {
    /// Name of the kind as reported to users.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Config => "ConfigError",
            Self::Transport => "TransportError",
            Self::Parse => "ParseError",
            Self::Protocol => "ProtocolError",
            Self::Authentication => "AuthenticationError",
            Self::Crypto => "CryptoError",
            Self::Certificate => "CertificateError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by the ECP client.
#[derive(Debug, Error)]
pub enum EcpError {
    /// Configuration error.
    #[error("{0}")]
    Config(String),

    /// Transport error.
    #[error("{0}")]
    Transport(String),

    /// Parse error.
    #[error(transparent)]
    Parse(#[from] ProtocolError),

    /// Protocol error.
    #[error("{0}")]
    Protocol(String),

    /// Authentication error.
    #[error("{0}")]
    Authentication(String),

    /// Crypto error.
    #[error(transparent)]
    Crypto(#[from] CsrError),

    /// Certificate error.
    #[error("{0}")]
    Certificate(String),
}

impl EcpError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Certificate(_) => ErrorKind::Certificate,
        }
    }
}

impl From<reqwest::Error> for EcpError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest's own message rarely names the cause; walk the chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Transport(message)
    }
}

impl From<url::ParseError> for EcpError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {err}"))
    }
}
