//! In-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{EcpError, EcpResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Replays canned responses in order and records every request.
///
/// Once the script runs out every further request fails with a transport
/// error.
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> EcpResult<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EcpError::Transport(format!("connection refused: {url}")))
    }
}

/// Namespaces used by the fixtures below.
pub(crate) mod xml {
    use ecp_protocol::{ECP_NS, PAOS_NS, SAMLP_NS, SAML_NS, SAML_STATUS_SUCCESS, SOAP11_NS};

    pub(crate) fn sp_paos_request(consumer_url: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<S:Envelope xmlns:S="{SOAP11_NS}">
  <S:Header>
    <paos:Request xmlns:paos="{PAOS_NS}" S:mustUnderstand="1" S:actor="http://schemas.xmlsoap.org/soap/actor/next" responseConsumerURL="{consumer_url}" service="{ECP_NS}"/>
    <ecp:Request xmlns:ecp="{ECP_NS}" S:mustUnderstand="1" S:actor="http://schemas.xmlsoap.org/soap/actor/next" IsPassive="0">
      <saml:Issuer xmlns:saml="{SAML_NS}">https://sp.example/shibboleth</saml:Issuer>
    </ecp:Request>
    <ecp:RelayState xmlns:ecp="{ECP_NS}" S:mustUnderstand="1" S:actor="http://schemas.xmlsoap.org/soap/actor/next">ss:mem:relay</ecp:RelayState>
  </S:Header>
  <S:Body>
    <samlp:AuthnRequest xmlns:samlp="{SAMLP_NS}" ID="_authn1" Version="2.0" AssertionConsumerServiceURL="{consumer_url}" ProtocolBinding="urn:oasis:names:tc:SAML:2.0:bindings:PAOS"><saml:Issuer xmlns:saml="{SAML_NS}">https://sp.example/shibboleth</saml:Issuer></samlp:AuthnRequest>
  </S:Body>
</S:Envelope>"#
        )
    }

    pub(crate) fn sp_without_paos() -> String {
        format!(
            r#"<S:Envelope xmlns:S="{SOAP11_NS}"><S:Header/><S:Body><p>nothing</p></S:Body></S:Envelope>"#
        )
    }

    pub(crate) fn idp_response(consumer_url: &str, status: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soap11:Envelope xmlns:soap11="{SOAP11_NS}">
  <soap11:Header>
    <ecp:Response xmlns:ecp="{ECP_NS}" soap11:mustUnderstand="1" soap11:actor="http://schemas.xmlsoap.org/soap/actor/next" AssertionConsumerServiceURL="{consumer_url}"/>
  </soap11:Header>
  <soap11:Body>
    <saml2p:Response xmlns:saml2p="{SAMLP_NS}" ID="_resp1" InResponseTo="_authn1" Version="2.0"><saml2p:Status><saml2p:StatusCode Value="{status}"/></saml2p:Status><saml2:Assertion xmlns:saml2="{SAML_NS}" ID="_a1"/></saml2p:Response>
  </soap11:Body>
</soap11:Envelope>"#
        )
    }

    pub(crate) fn idp_success(consumer_url: &str) -> String {
        idp_response(consumer_url, SAML_STATUS_SUCCESS)
    }
}
