//! Certificate retrieval over an established ECP session.

use std::fmt;
use std::sync::Arc;

use ecp_crypto::{find_certificates, CsrGenerator, PrivateKeyHandle, SigningRequest};
use ecp_protocol::MessageCodec;
use url::form_urlencoded;

use crate::config::{CertificateConfig, EcpConfig};
use crate::error::{EcpError, EcpResult};
use crate::orchestrator::{EcpOrchestrator, EcpSession};
use crate::providers::{Credentials, IdpDirectory, StaticIdpDirectory};
use crate::transport::{HttpExchange, HttpRequest, HttpTransport, ReqwestTransport};

/// Content type of the certificate request form.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// Posts a signing request to the SP and assembles the returned bundle.
#[derive(Debug, Clone)]
pub struct CertificateExchange {
    exchange: HttpExchange,
    config: CertificateConfig,
}

impl CertificateExchange {
    /// Creates an exchange on top of the given HTTP adapter.
    #[must_use]
    pub const fn new(exchange: HttpExchange, config: CertificateConfig) -> Self {
        Self { exchange, config }
    }

    /// Certificate settings.
    #[must_use]
    pub const fn config(&self) -> &CertificateConfig {
        &self.config
    }

    /// The URL-encoded form body for `csr`.
    #[must_use]
    pub fn form_body(&self, csr: &SigningRequest) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("submit", "certreq")
            .append_pair("certlifetime", &self.config.lifetime_hours.to_string())
            .append_pair("CSRF", &self.config.csrf_token)
            .append_pair("certreq", csr.pem())
            .finish()
    }

    /// Submits `csr` to the session's SP URL.
    ///
    /// Returns the private key as PKCS#1 PEM followed by the SP's response
    /// body.
    ///
    /// # Errors
    ///
    /// - [`EcpError::Transport`] when the request fails
    /// - [`EcpError::Certificate`] when the SP answers with an error status,
    ///   an empty body or a body without any certificate
    /// - [`EcpError::Crypto`] if the key cannot be encoded
    pub async fn fetch_certificate(
        &self,
        session: &EcpSession,
        csr: &SigningRequest,
        key: &PrivateKeyHandle,
    ) -> EcpResult<String> {
        if session.cookies().is_empty() {
            tracing::warn!(
                sp_url = session.sp_url(),
                "Session has no cookie; the SP will probably refuse the request"
            );
        }

        let request = HttpRequest::post(session.sp_url())
            .body(FORM_CONTENT_TYPE, self.form_body(csr))
            .header("Cookie", format!("CSRF={}", self.config.csrf_token));
        let response = self.exchange.send(&request, session.cookies()).await?;

        if !response.is_success() {
            return Err(EcpError::Certificate(format!(
                "SP refused the signing request (HTTP {})",
                response.status
            )));
        }
        let body = response.text();
        if body.trim().is_empty() {
            return Err(EcpError::Certificate(
                "SP returned an empty response".to_string(),
            ));
        }
        let certificates = find_certificates(&body);
        if certificates.is_empty() {
            return Err(EcpError::Certificate(
                "SP response contains no certificate".to_string(),
            ));
        }
        for certificate in &certificates {
            tracing::info!(
                subject = %certificate.subject,
                issuer = %certificate.issuer,
                not_after = %certificate.not_after,
                "Received certificate"
            );
        }

        let mut bundle = key.to_pkcs1_pem()?;
        if !bundle.ends_with('\n') {
            bundle.push('\n');
        }
        bundle.push_str(&body);
        Ok(bundle)
    }
}

/// One-call certificate retrieval.
///
/// Each call runs a fresh handshake, generates a new key pair and exchanges
/// the signing request.
#[derive(Clone)]
pub struct CertificateFetcher {
    transport: Arc<dyn HttpTransport>,
    directory: Arc<dyn IdpDirectory>,
    codec: MessageCodec,
    config: EcpConfig,
}

impl CertificateFetcher {
    /// Creates a fetcher with a `reqwest` transport and no registered IdPs.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: EcpConfig) -> EcpResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.http)?);
        Ok(Self::with_transport(transport, config))
    }

    /// Creates a fetcher on top of the given transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: EcpConfig) -> Self {
        Self {
            transport,
            directory: Arc::new(StaticIdpDirectory::new()),
            codec: MessageCodec::default(),
            config,
        }
    }

    /// Resolves IdP IDs through `directory`.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn IdpDirectory>) -> Self {
        self.directory = directory;
        self
    }

    /// Uses a custom codec.
    #[must_use]
    pub fn with_codec(mut self, codec: MessageCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &EcpConfig {
        &self.config
    }

    /// Authenticates `username` at `idp` for `sp_url` and returns the private
    /// key followed by the issued certificate, both PEM encoded.
    ///
    /// `idp` is a registered IdP ID or the IdP's ECP endpoint URL.
    ///
    /// # Errors
    ///
    /// Any handshake, key generation or certificate error.
    pub async fn authenticate(
        &self,
        sp_url: &str,
        idp: &str,
        username: &str,
        password: &str,
    ) -> EcpResult<String> {
        let mut orchestrator = EcpOrchestrator::builder()
            .transport(self.transport.clone())
            .http_config(self.config.http.clone())
            .codec(self.codec.clone())
            .credential_source(Arc::new(Credentials::new(username, password)))
            .idp_directory(self.directory.clone())
            .build()?;
        let session = orchestrator.authenticate(sp_url, idp, Some(username)).await?;
        tracing::info!(
            sp_url,
            message_id = session.message_id(),
            cookies = ?session.cookies(),
            "ECP session established"
        );

        let (csr, key) =
            CsrGenerator::new(self.config.csr.clone()).generate(&self.config.certificate.common_name)?;
        tracing::debug!(
            common_name = csr.common_name(),
            digest = %csr.digest(),
            key_bits = key.bits(),
            "Generated signing request"
        );

        CertificateExchange::new(orchestrator.exchange().clone(), self.config.certificate.clone())
            .fetch_certificate(&session, &csr, &key)
            .await
    }
}

impl fmt::Debug for CertificateFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
