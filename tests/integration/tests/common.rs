//! Common test utilities and fixtures.

use ecp_protocol::{ECP_NS, PAOS_MEDIA_TYPE, PAOS_NS, SAMLP_NS, SAML_NS, SAML_STATUS_SUCCESS, SOAP11_NS, SOAP_ACTOR_NEXT};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Path of the certificate service at the SP.
pub const CERT_PATH: &str = "/secure/getcert";

/// Path of the SP's assertion consumer.
pub const ACS_PATH: &str = "/Shibboleth.sso/SAML2/ECP";

/// Path of the IdP's ECP endpoint.
pub const IDP_PATH: &str = "/idp/profile/SAML2/SOAP/ECP";

/// Session cookie the mock SP issues.
pub const SESSION_COOKIE: &str = "_shibsession_64656661756c74=_0a1b2c3d";

/// Initialises test logging once; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ecp_client=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A mock SP and a mock IdP.
pub struct Federation {
    /// The service provider.
    pub sp: MockServer,
    /// The identity provider.
    pub idp: MockServer,
}

impl Federation {
    /// Starts both servers with nothing mounted.
    pub async fn start() -> Self {
        init_tracing();
        Self {
            sp: MockServer::start().await,
            idp: MockServer::start().await,
        }
    }

    /// Certificate service URL.
    pub fn sp_url(&self) -> String {
        format!("{}{CERT_PATH}", self.sp.uri())
    }

    /// Assertion consumer URL.
    pub fn acs_url(&self) -> String {
        format!("{}{ACS_PATH}", self.sp.uri())
    }

    /// IdP ECP endpoint URL.
    pub fn idp_url(&self) -> String {
        format!("{}{IDP_PATH}", self.idp.uri())
    }

    /// SP answers the PAOS GET with an ECP request for its own consumer URL.
    pub async fn mount_paos_request(&self, expected_calls: u64) {
        self.mount_paos_request_with(paos_request(&self.acs_url(), Some("ss:mem:relay")), None, expected_calls)
            .await;
    }

    /// SP answers the PAOS GET with `body`, optionally setting a cookie.
    pub async fn mount_paos_request_with(&self, body: String, cookie: Option<&str>, expected_calls: u64) {
        let mut response = ResponseTemplate::new(200).set_body_raw(body, PAOS_MEDIA_TYPE);
        if let Some(cookie) = cookie {
            response = response.insert_header("Set-Cookie", cookie);
        }
        Mock::given(method("GET"))
            .and(path(CERT_PATH))
            .and(header_exists("PAOS"))
            .respond_with(response)
            .expect(expected_calls)
            .mount(&self.sp)
            .await;
    }

    /// IdP authenticates anyone with Basic credentials and answers for
    /// `consumer_url`.
    pub async fn mount_idp_response(&self, consumer_url: &str, status: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(IDP_PATH))
            .and(header_exists("Authorization"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(idp_response(consumer_url, status), "text/xml"),
            )
            .expect(expected_calls)
            .mount(&self.idp)
            .await;
    }

    /// IdP replies with `status` and an empty body.
    pub async fn mount_idp_status(&self, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(IDP_PATH))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_calls)
            .mount(&self.idp)
            .await;
    }

    /// IdP must not be called.
    pub async fn forbid_idp(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.idp)
            .await;
    }

    /// Consumer accepts the assertion with a redirect that sets the session.
    pub async fn mount_acs(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(ACS_PATH))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", self.sp_url().as_str())
                    .insert_header("Set-Cookie", format!("{SESSION_COOKIE}; path=/; secure; HttpOnly").as_str()),
            )
            .expect(expected_calls)
            .mount(&self.sp)
            .await;
    }

    /// Certificate service answers the form POST with `status` and `body`.
    pub async fn mount_certificate(&self, status: u16, body: String, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(CERT_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/plain"))
            .expect(expected_calls)
            .mount(&self.sp)
            .await;
    }

    /// Requests the SP received on `path`, in order.
    pub async fn sp_requests(&self, request_path: &str) -> Vec<Request> {
        received(&self.sp, request_path).await
    }

    /// Requests the IdP received, in order.
    pub async fn idp_requests(&self) -> Vec<Request> {
        received(&self.idp, IDP_PATH).await
    }
}

async fn received(server: &MockServer, request_path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .collect()
}

/// Header value of a recorded request.
pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

/// A PAOS request envelope as a Shibboleth SP sends it.
pub fn paos_request(consumer_url: &str, relay_state: Option<&str>) -> String {
    let relay_state = relay_state.map_or_else(String::new, |value| {
        format!(
            r#"<ecp:RelayState xmlns:ecp="{ECP_NS}" S:mustUnderstand="1" S:actor="{SOAP_ACTOR_NEXT}">{value}</ecp:RelayState>"#
        )
    });
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<S:Envelope xmlns:S="{SOAP11_NS}">
  <S:Header>
    <paos:Request xmlns:paos="{PAOS_NS}" S:mustUnderstand="1" S:actor="{SOAP_ACTOR_NEXT}" responseConsumerURL="{consumer_url}" service="{ECP_NS}"/>
    <ecp:Request xmlns:ecp="{ECP_NS}" S:mustUnderstand="1" S:actor="{SOAP_ACTOR_NEXT}" IsPassive="0">
      <saml:Issuer xmlns:saml="{SAML_NS}">https://sp.example/shibboleth</saml:Issuer>
    </ecp:Request>
    {relay_state}
  </S:Header>
  <S:Body>
    <samlp:AuthnRequest xmlns:samlp="{SAMLP_NS}" AssertionConsumerServiceURL="{consumer_url}" ID="_ec1f1fc7" IssueInstant="2026-10-19T10:00:00Z" ProtocolBinding="urn:oasis:names:tc:SAML:2.0:bindings:PAOS" Version="2.0"><saml:Issuer xmlns:saml="{SAML_NS}">https://sp.example/shibboleth</saml:Issuer><samlp:NameIDPolicy AllowCreate="1"/></samlp:AuthnRequest>
  </S:Body>
</S:Envelope>"#
    )
}

/// An IdP response envelope naming `consumer_url`.
pub fn idp_response(consumer_url: &str, status: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap11:Envelope xmlns:soap11="{SOAP11_NS}">
  <soap11:Header>
    <ecp:Response xmlns:ecp="{ECP_NS}" soap11:actor="{SOAP_ACTOR_NEXT}" soap11:mustUnderstand="1" AssertionConsumerServiceURL="{consumer_url}"/>
  </soap11:Header>
  <soap11:Body>
    <saml2p:Response xmlns:saml2p="{SAMLP_NS}" Destination="{consumer_url}" ID="_9d8e7f" InResponseTo="_ec1f1fc7" IssueInstant="2026-10-19T10:00:01Z" Version="2.0"><saml2p:Status><saml2p:StatusCode Value="{status}"/></saml2p:Status><saml2:Assertion xmlns:saml2="{SAML_NS}" ID="_a55e" IssueInstant="2026-10-19T10:00:01Z" Version="2.0"><saml2:Issuer>https://idp.example/idp/shibboleth</saml2:Issuer></saml2:Assertion></saml2p:Response>
  </soap11:Body>
</soap11:Envelope>"#
    )
}

/// A successful IdP response for `consumer_url`.
pub fn idp_success(consumer_url: &str) -> String {
    idp_response(consumer_url, SAML_STATUS_SUCCESS)
}

/// A self-signed certificate in PEM form, standing in for the issued one.
pub fn issued_certificate() -> String {
    match rcgen::generate_simple_self_signed(vec!["alice.example".to_string()]) {
        Ok(certified) => certified.cert.pem(),
        Err(err) => panic!("test certificate: {err}"),
    }
}
