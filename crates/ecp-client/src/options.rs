//! Per-attempt client options.

use url::Url;

use crate::error::{EcpError, EcpResult};
use crate::providers::Credentials;

/// Endpoints and credentials for one handshake attempt.
///
/// Built before the handshake starts and only read afterwards.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    credentials: Credentials,
    sp_url: String,
    sp_endpoint: String,
    idp_url: String,
}

impl ClientOptions {
    /// Creates options whose SP endpoint is the SP URL itself.
    #[must_use]
    pub fn new(
        sp_url: impl Into<String>,
        idp_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let sp_url = sp_url.into();
        Self {
            credentials,
            sp_endpoint: sp_url.clone(),
            sp_url,
            idp_url: idp_url.into(),
        }
    }

    /// Sets the protected resource the handshake starts from, when it differs
    /// from the SP URL.
    #[must_use]
    pub fn with_sp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sp_endpoint = endpoint.into();
        self
    }

    /// The user name.
    #[must_use]
    pub fn principal(&self) -> &str {
        self.credentials.principal()
    }

    /// The credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// SP URL (also the certificate endpoint).
    #[must_use]
    pub fn sp_url(&self) -> &str {
        &self.sp_url
    }

    /// Resource fetched to start the handshake.
    #[must_use]
    pub fn sp_endpoint(&self) -> &str {
        &self.sp_endpoint
    }

    /// IdP ECP login endpoint.
    #[must_use]
    pub fn idp_url(&self) -> &str {
        &self.idp_url
    }

    /// Checks every URL before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`EcpError::Config`] naming the first bad URL.
    pub fn validate(&self) -> EcpResult<()> {
        parse_http_url("SP URL", &self.sp_url)?;
        parse_http_url("SP endpoint", &self.sp_endpoint)?;
        parse_http_url("IdP URL", &self.idp_url)?;
        Ok(())
    }
}

/// Parses an absolute `http`/`https` URL with a host.
///
/// # Errors
///
/// Returns [`EcpError::Config`] otherwise.
pub fn parse_http_url(label: &str, value: &str) -> EcpResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| EcpError::Config(format!("invalid {label} '{value}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(EcpError::Config(format!(
            "invalid {label} '{value}': scheme must be http or https"
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(EcpError::Config(format!("invalid {label} '{value}': no host")));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn options(sp: &str, idp: &str) -> ClientOptions {
        ClientOptions::new(sp, idp, Credentials::new("alice", "secret"))
    }

    #[test]
    fn endpoint_defaults_to_sp_url() {
        let options = options("https://sp.example/getcert", "https://idp.example/ecp");
        assert_eq!(options.sp_endpoint(), "https://sp.example/getcert");
        assert!(options.validate().is_ok());

        let options = options.with_sp_endpoint("https://sp.example/secure");
        assert_eq!(options.sp_endpoint(), "https://sp.example/secure");
        assert_eq!(options.sp_url(), "https://sp.example/getcert");
    }

    #[test]
    fn rejects_bad_urls() {
        for (sp, idp) in [
            ("not a url", "https://idp.example/ecp"),
            ("ftp://sp.example/", "https://idp.example/ecp"),
            ("https://sp.example/", "/relative"),
            ("file:///etc/passwd", "https://idp.example/ecp"),
        ] {
            let err = options(sp, idp).validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{sp} {idp}");
        }
    }

    #[test]
    fn debug_hides_secret() {
        let debug = format!("{:?}", options("https://sp/", "https://idp/"));
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("[REDACTED]"));
    }
}
