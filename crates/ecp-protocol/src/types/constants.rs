//! Namespaces, media types and other protocol constants.

/// SOAP 1.1 envelope namespace URI.
pub const SOAP11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.1 actor addressing the next intermediary (the ECP client).
pub const SOAP_ACTOR_NEXT: &str = "http://schemas.xmlsoap.org/soap/actor/next";

/// Liberty PAOS binding namespace URI.
pub const PAOS_NS: &str = "urn:liberty:paos:2003-08";

/// SAML 2.0 ECP profile namespace URI.
///
/// Also the `service` value an SP puts in its PAOS request.
pub const ECP_NS: &str = "urn:oasis:names:tc:SAML:2.0:profiles:SSO:ecp";

/// SAML 2.0 assertion namespace URI.
pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 protocol namespace URI.
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// Successful top-level SAML status.
pub const SAML_STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

/// Media type of PAOS messages exchanged with the SP.
pub const PAOS_MEDIA_TYPE: &str = "application/vnd.paos+xml";

/// `Accept` value advertising PAOS support alongside ordinary HTML.
pub const PAOS_ACCEPT: &str = "text/html; application/vnd.paos+xml";

/// `PAOS` HTTP header value announcing the ECP service.
pub const PAOS_HEADER_VALUE: &str =
    r#"ver="urn:liberty:paos:2003-08";"urn:oasis:names:tc:SAML:2.0:profiles:SSO:ecp""#;

/// Content type for SOAP messages sent to the IdP.
pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Structural schemas the codec validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaRef {
    /// SOAP 1.1 envelope.
    SoapEnvelope,
    /// SAML IdP list (static IdP metadata).
    IdpList,
}

impl SchemaRef {
    /// Human-readable schema name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SoapEnvelope => "SOAP envelope schema",
            Self::IdpList => "IdP list schema",
        }
    }
}

/// Returns true if a `Content-Type` value denotes an XML payload.
#[must_use]
pub fn is_xml_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == PAOS_MEDIA_TYPE
        || essence == "text/xml"
        || essence == "application/xml"
        || essence == "application/soap+xml"
        || essence.ends_with("+xml")
}
