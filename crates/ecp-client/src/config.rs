//! Client configuration.

use std::time::Duration;

use ecp_crypto::CsrConfig;
use serde::{Deserialize, Serialize};

/// Default idle timeout for connections.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default timeout for one HTTP exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(100);

/// HTTP settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// How long a connection may sit without traffic. Bounds each read
    /// during a request and the life of an unused pooled connection.
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// Upper bound for one request/response exchange.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: concat!("ecp-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Certificate request settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Requested certificate lifetime in hours.
    pub lifetime_hours: u32,
    /// Anti-forgery token, sent both as form field and cookie.
    pub csrf_token: String,
    /// Common name put in the signing request. The SP replaces it.
    pub common_name: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            lifetime_hours: 12,
            csrf_token: "fetchMyCertificate".to_string(),
            common_name: "ignoreMe".to_string(),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcpConfig {
    /// HTTP settings.
    pub http: HttpConfig,
    /// Certificate request settings.
    pub certificate: CertificateConfig,
    /// Signing request settings.
    pub csr: CsrConfig,
}
