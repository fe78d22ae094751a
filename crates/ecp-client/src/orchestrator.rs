//! ECP session orchestrator.
//!
//! Drives one SP -> IdP -> SP handshake:
//!
//! 1. GET the SP resource advertising PAOS support.
//! 2. Pick the `paos:Request` header and the `AuthnRequest` out of the reply.
//! 3. POST the `AuthnRequest` to the IdP with HTTP Basic credentials.
//! 4. Check that the IdP's `ecp:Response` names the same consumer URL.
//! 5. POST the IdP's `Response` to that consumer URL.
//! 6. Keep the session cookie the SP sets.
//!
//! Every failure is terminal for the attempt. An orchestrator runs exactly one
//! attempt; retrying means building a new one.

use std::fmt;
use std::sync::Arc;

use ecp_protocol::{
    is_xml_media_type, MessageCodec, PaosRequestHeader, RelayStateHeader, SoapEnvelope, XmlElement,
    XmlObject, PAOS_ACCEPT, PAOS_HEADER_VALUE, PAOS_MEDIA_TYPE, SAMLP_NS, SAML_STATUS_SUCCESS,
    SOAP_CONTENT_TYPE,
};

use crate::config::HttpConfig;
use crate::cookie::SessionCookies;
use crate::error::{EcpError, EcpResult};
use crate::flow::HandshakeState;
use crate::options::ClientOptions;
use crate::providers::{resolve_idp, CredentialSource, IdpDirectory, NoCredentials, StaticIdpDirectory};
use crate::transport::{HttpExchange, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

const NO_ECP: &str = "SP does not support ECP";

/// An authenticated SP session.
///
/// Only produced by a handshake that reached
/// [`HandshakeState::SessionEstablished`].
#[derive(Debug, Clone)]
pub struct EcpSession {
    sp_url: String,
    idp_url: String,
    response_consumer_url: String,
    message_id: String,
    cookies: SessionCookies,
}

impl EcpSession {
    /// SP URL the session was established for.
    #[must_use]
    pub fn sp_url(&self) -> &str {
        &self.sp_url
    }

    /// IdP endpoint that authenticated the user.
    #[must_use]
    pub fn idp_url(&self) -> &str {
        &self.idp_url
    }

    /// Where the assertion was delivered.
    #[must_use]
    pub fn response_consumer_url(&self) -> &str {
        &self.response_consumer_url
    }

    /// Message ID of the attempt.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Cookies captured from the SP.
    #[must_use]
    pub const fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }
}

/// What the SP asked for in step 2.
struct SpRequest {
    paos: PaosRequestHeader,
    relay_state: Option<RelayStateHeader>,
    authn_request: XmlElement,
}

/// Builder for [`EcpOrchestrator`].
#[derive(Default)]
pub struct EcpOrchestratorBuilder {
    transport: Option<Arc<dyn HttpTransport>>,
    http: HttpConfig,
    codec: Option<MessageCodec>,
    credentials: Option<Arc<dyn CredentialSource>>,
    directory: Option<Arc<dyn IdpDirectory>>,
    sp_endpoint: Option<String>,
}

impl EcpOrchestratorBuilder {
    /// Uses the given transport instead of a fresh `reqwest` client.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// HTTP settings.
    #[must_use]
    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http = config;
        self
    }

    /// Message codec (and with it the provider registry).
    #[must_use]
    pub fn codec(mut self, codec: MessageCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Where credentials come from.
    #[must_use]
    pub fn credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(source);
        self
    }

    /// Where IdP IDs are looked up.
    #[must_use]
    pub fn idp_directory(mut self, directory: Arc<dyn IdpDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Protected resource [`EcpOrchestrator::authenticate`] starts from, when
    /// it differs from the SP URL.
    #[must_use]
    pub fn sp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sp_endpoint = Some(endpoint.into());
        self
    }

    /// Builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Fails if no transport was given and the default one cannot be created.
    pub fn build(self) -> EcpResult<EcpOrchestrator> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.http)?),
        };
        Ok(EcpOrchestrator {
            exchange: HttpExchange::new(transport, self.http),
            codec: self.codec.unwrap_or_default(),
            credentials: self.credentials.unwrap_or_else(|| Arc::new(NoCredentials)),
            directory: self
                .directory
                .unwrap_or_else(|| Arc::new(StaticIdpDirectory::new())),
            sp_endpoint: self.sp_endpoint,
            state: HandshakeState::Init,
            cookies: SessionCookies::new(),
            message_id: None,
        })
    }
}

/// The ECP handshake state machine.
pub struct EcpOrchestrator {
    exchange: HttpExchange,
    codec: MessageCodec,
    credentials: Arc<dyn CredentialSource>,
    directory: Arc<dyn IdpDirectory>,
    sp_endpoint: Option<String>,
    state: HandshakeState,
    cookies: SessionCookies,
    message_id: Option<String>,
}

impl EcpOrchestrator {
    /// Starts building an orchestrator.
    #[must_use]
    pub fn builder() -> EcpOrchestratorBuilder {
        EcpOrchestratorBuilder::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Cookies captured so far, also after a failure.
    #[must_use]
    pub const fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    /// Message ID of the attempt, once the SP's PAOS request was read.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// The HTTP adapter, shared with follow-up exchanges on the session.
    #[must_use]
    pub const fn exchange(&self) -> &HttpExchange {
        &self.exchange
    }

    /// Resolves `idp` through the directory, obtains credentials and runs the
    /// handshake.
    ///
    /// `idp` is a registered IdP ID or the IdP's ECP endpoint URL.
    ///
    /// # Errors
    ///
    /// See [`establish`](Self::establish). Unknown IdPs and missing
    /// credentials are [`EcpError::Config`].
    pub async fn authenticate(
        &mut self,
        sp_url: &str,
        idp: &str,
        principal_hint: Option<&str>,
    ) -> EcpResult<EcpSession> {
        self.ensure_fresh()?;
        let options = match self.prepare(sp_url, idp, principal_hint) {
            Ok(options) => options,
            Err(err) => return Err(self.fail(err)),
        };
        self.establish(&options).await
    }

    /// Runs the handshake.
    ///
    /// # Errors
    ///
    /// - [`EcpError::Config`] for invalid URLs, before any request is sent
    /// - [`EcpError::Transport`] when a request fails
    /// - [`EcpError::Parse`] for malformed or invalid XML
    /// - [`EcpError::Protocol`] when the SP does not speak ECP, the IdP's
    ///   consumer URL differs from the SP's, or a mandatory part is missing
    /// - [`EcpError::Authentication`] when the IdP rejects the credentials or
    ///   the SP issues no usable session
    pub async fn establish(&mut self, options: &ClientOptions) -> EcpResult<EcpSession> {
        self.ensure_fresh()?;
        match self.drive(options).await {
            Ok(session) => Ok(session),
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn drive(&mut self, options: &ClientOptions) -> EcpResult<EcpSession> {
        options.validate()?;

        let request = HttpRequest::get(options.sp_endpoint())
            .header("Accept", PAOS_ACCEPT)
            .header("PAOS", PAOS_HEADER_VALUE);
        self.advance(HandshakeState::SpRequestSent)?;
        let response = self.exchange.send(&request, &self.cookies).await?;
        self.cookies
            .absorb_set_cookie(response.headers_named("Set-Cookie"));

        let sp_request = self.read_sp_request(&response)?;
        self.message_id = Some(sp_request.paos.message_id().to_string());
        self.advance(HandshakeState::PaosDetected)?;
        let consumer_url = sp_request.paos.response_consumer_url().to_string();
        tracing::debug!(
            message_id = self.message_id(),
            response_consumer_url = %consumer_url,
            relay_state = sp_request.relay_state.is_some(),
            "SP requested ECP authentication"
        );

        let envelope = SoapEnvelope::new().with_body(sp_request.authn_request);
        let body = self.codec.encode(&XmlObject::Envelope(envelope))?;
        let request = HttpRequest::post(options.idp_url())
            .body(SOAP_CONTENT_TYPE, body)
            .basic_auth(options.principal(), options.credentials().secret());
        self.advance(HandshakeState::IdpAuthSent)?;
        // Cookies belong to the SP and never go to the IdP.
        let response = self
            .exchange
            .send(&request, &SessionCookies::new())
            .await?;

        let saml_response = self.read_idp_response(&response, &consumer_url)?;
        self.advance(HandshakeState::IdpResponseReceived)?;

        let mut envelope = SoapEnvelope::new();
        if let Some(relay_state) = &sp_request.relay_state {
            envelope = envelope.with_header(relay_state.element().clone());
        }
        let envelope = envelope.with_body(saml_response);
        let body = self.codec.encode(&XmlObject::Envelope(envelope))?;
        let request = HttpRequest::post(&consumer_url).body(PAOS_MEDIA_TYPE, body);
        self.advance(HandshakeState::SpResponsePosted)?;
        let response = self.exchange.send(&request, &self.cookies).await?;

        if response.status >= 400 {
            return Err(EcpError::Authentication(format!(
                "SP rejected the assertion (HTTP {})",
                response.status
            )));
        }
        let added = self
            .cookies
            .absorb_set_cookie(response.headers_named("Set-Cookie"));
        if added == 0 {
            if let Some(reason) = self.error_indicator(&response) {
                return Err(EcpError::Authentication(format!(
                    "SP issued no session: {reason}"
                )));
            }
            tracing::debug!(
                message_id = self.message_id(),
                "SP set no cookie on the assertion response"
            );
        }

        self.advance(HandshakeState::SessionEstablished)?;
        Ok(EcpSession {
            sp_url: options.sp_url().to_string(),
            idp_url: options.idp_url().to_string(),
            response_consumer_url: consumer_url,
            message_id: self.message_id.clone().unwrap_or_default(),
            cookies: self.cookies.clone(),
        })
    }

    fn read_sp_request(&self, response: &HttpResponse) -> EcpResult<SpRequest> {
        if !response.is_success() {
            return Err(EcpError::Protocol(format!(
                "{NO_ECP} (HTTP {})",
                response.status
            )));
        }
        if let Some(content_type) = response.content_type() {
            if !is_xml_media_type(content_type) {
                return Err(EcpError::Protocol(format!(
                    "{NO_ECP} (got {content_type})"
                )));
            }
        }

        let envelope = self.codec.decode_envelope(&response.body)?;
        let paos = self
            .codec
            .paos_request(&envelope)?
            .ok_or_else(|| EcpError::Protocol(NO_ECP.to_string()))?;

        if let Some(ecp) = self.codec.ecp_request(&envelope)? {
            tracing::debug!(
                issuer = ecp.issuer.as_deref().unwrap_or("-"),
                provider_name = ecp.provider_name.as_deref().unwrap_or("-"),
                is_passive = ecp.is_passive,
                acceptable_idps = ecp.idp_list.len(),
                "SP sent ecp:Request"
            );
        }
        let relay_state = self.codec.relay_state(&envelope)?;

        let authn_request = envelope
            .body_element()
            .filter(|e| e.name.is(SAMLP_NS, "AuthnRequest"))
            .cloned()
            .ok_or_else(|| {
                EcpError::Protocol("SP's PAOS request carries no AuthnRequest".to_string())
            })?;

        Ok(SpRequest {
            paos,
            relay_state,
            authn_request,
        })
    }

    fn read_idp_response(
        &self,
        response: &HttpResponse,
        expected_consumer_url: &str,
    ) -> EcpResult<XmlElement> {
        if matches!(response.status, 401 | 403) {
            return Err(EcpError::Authentication(format!(
                "IdP rejected the credentials (HTTP {})",
                response.status
            )));
        }

        // SOAP faults arrive with HTTP 500, so only give up on the body when
        // it is not an envelope.
        let envelope = match self.codec.decode_envelope(&response.body) {
            Ok(envelope) => envelope,
            Err(err) if response.is_success() => return Err(err.into()),
            Err(_) => {
                return Err(EcpError::Protocol(format!(
                    "IdP returned HTTP {}",
                    response.status
                )))
            }
        };
        if let Some(fault) = envelope.fault() {
            return Err(EcpError::Authentication(format!(
                "IdP returned a SOAP fault: {}",
                fault_string(fault)
            )));
        }
        if !response.is_success() {
            return Err(EcpError::Protocol(format!(
                "IdP returned HTTP {}",
                response.status
            )));
        }

        let header = self.codec.paos_response(&envelope)?.ok_or_else(|| {
            EcpError::Protocol("IdP response has no ecp:Response header".to_string())
        })?;
        if header.response_consumer_url() != expected_consumer_url {
            return Err(EcpError::Protocol(format!(
                "responseConsumerURL mismatch: SP requested '{expected_consumer_url}', IdP answered '{}'",
                header.response_consumer_url()
            )));
        }

        let saml_response = envelope
            .body_element()
            .filter(|e| e.name.is(SAMLP_NS, "Response"))
            .cloned()
            .ok_or_else(|| {
                EcpError::Protocol("IdP response carries no samlp:Response".to_string())
            })?;
        match status_code(&saml_response) {
            Some(SAML_STATUS_SUCCESS) => Ok(saml_response),
            Some(status) => Err(EcpError::Authentication(format!(
                "IdP refused authentication: {status}"
            ))),
            None => Err(EcpError::Protocol(
                "samlp:Response has no StatusCode".to_string(),
            )),
        }
    }

    /// Why an SP reply without cookies is a failure, if it is one.
    fn error_indicator(&self, response: &HttpResponse) -> Option<String> {
        let envelope = self.codec.decode_envelope(&response.body).ok()?;
        if let Some(fault) = envelope.fault() {
            return Some(format!("SOAP fault: {}", fault_string(fault)));
        }
        envelope
            .body()
            .iter()
            .filter_map(status_code)
            .find(|status| *status != SAML_STATUS_SUCCESS)
            .map(|status| format!("SAML status {status}"))
    }

    fn prepare(
        &self,
        sp_url: &str,
        idp: &str,
        principal_hint: Option<&str>,
    ) -> EcpResult<ClientOptions> {
        let entry = resolve_idp(self.directory.as_ref(), idp)?;
        let login_url = entry.login_url.ok_or_else(|| {
            EcpError::Config(format!("IdP '{}' has no login location", entry.provider_id))
        })?;
        let credentials = self.credentials.credentials(principal_hint)?;
        tracing::debug!(idp = %entry.provider_id, %login_url, "Resolved IdP");
        let options = ClientOptions::new(sp_url, login_url, credentials);
        Ok(match &self.sp_endpoint {
            Some(endpoint) => options.with_sp_endpoint(endpoint.as_str()),
            None => options,
        })
    }

    fn ensure_fresh(&self) -> EcpResult<()> {
        if self.state == HandshakeState::Init {
            Ok(())
        } else {
            Err(EcpError::Protocol(format!(
                "handshake already attempted (state {}); start a new orchestrator",
                self.state
            )))
        }
    }

    fn advance(&mut self, next: HandshakeState) -> EcpResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(EcpError::Protocol(format!(
                "illegal handshake transition {} -> {next}",
                self.state
            )));
        }
        tracing::debug!(
            from = %self.state,
            to = %next,
            message_id = self.message_id(),
            "Handshake transition"
        );
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, err: EcpError) -> EcpError {
        tracing::warn!(
            state = %self.state,
            message_id = self.message_id(),
            kind = %err.kind(),
            error = %err,
            "ECP handshake failed"
        );
        if !self.state.is_terminal() {
            self.state = HandshakeState::Failed;
        }
        err
    }
}

impl fmt::Debug for EcpOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcpOrchestrator")
            .field("state", &self.state)
            .field("message_id", &self.message_id)
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

/// Top-level `StatusCode` value of a SAML protocol response.
fn status_code(response: &XmlElement) -> Option<&str> {
    response
        .child(SAMLP_NS, "Status")?
        .child(SAMLP_NS, "StatusCode")?
        .attribute("Value")
}

fn fault_string(fault: &XmlElement) -> &str {
    fault
        .children
        .iter()
        .find(|c| c.name.local == "faultstring")
        .map_or("unspecified", |c| c.text.trim())
}
