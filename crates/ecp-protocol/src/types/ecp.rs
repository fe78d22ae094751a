//! SAML2 ECP profile header blocks.
//!
//! - `ecp:Response` is returned by the IdP and echoes where the assertion
//!   must go. This crate calls it the PAOS response header because it is
//!   what closes the PAOS round trip.
//! - `ecp:Request` accompanies the SP's PAOS request with SP identity and an
//!   optional list of acceptable IdPs.
//! - `ecp:RelayState` is opaque SP state the client must hand back.

use quick_xml::escape::escape;

use super::paos::soap_flag;
use super::{idp_list_to_xml, IdpEntry, ECP_NS, SAMLP_NS, SAML_NS, SOAP11_NS, SOAP_ACTOR_NEXT};
use crate::error::ProtocolResult;
use crate::xml::{QName, XmlElement};

/// `ecp:Response` header block sent by the IdP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaosResponseHeader {
    response_consumer_url: String,
    must_understand: bool,
    actor: Option<String>,
}

impl PaosResponseHeader {
    /// Element name of the header block.
    #[must_use]
    pub fn element_name() -> QName {
        QName::new(ECP_NS, "Response")
    }

    /// Creates a header echoing the given consumer URL.
    #[must_use]
    pub fn new(response_consumer_url: impl Into<String>) -> Self {
        Self {
            response_consumer_url: response_consumer_url.into(),
            must_understand: true,
            actor: Some(SOAP_ACTOR_NEXT.to_string()),
        }
    }

    /// Builds the header from a parsed `ecp:Response` element.
    ///
    /// # Errors
    ///
    /// Fails if `AssertionConsumerServiceURL` is missing.
    pub fn from_element(element: &XmlElement) -> ProtocolResult<Self> {
        Ok(Self {
            response_consumer_url: element
                .required_attribute("AssertionConsumerServiceURL")?
                .to_string(),
            must_understand: soap_flag(element.attribute_ns(SOAP11_NS, "mustUnderstand")),
            actor: element.attribute_ns(SOAP11_NS, "actor").map(str::to_string),
        })
    }

    /// Serializes the header as a standalone element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = format!(r#"<ecp:Response xmlns:ecp="{ECP_NS}" xmlns:S="{SOAP11_NS}""#);
        if self.must_understand {
            xml.push_str(r#" S:mustUnderstand="1""#);
        }
        if let Some(actor) = &self.actor {
            xml.push_str(&format!(r#" S:actor="{}""#, escape(actor.as_str())));
        }
        xml.push_str(&format!(
            r#" AssertionConsumerServiceURL="{}"/>"#,
            escape(self.response_consumer_url.as_str())
        ));
        xml
    }

    /// The consumer URL echoed by the IdP.
    #[must_use]
    pub fn response_consumer_url(&self) -> &str {
        &self.response_consumer_url
    }

    /// Whether the block carries `mustUnderstand="1"`.
    #[must_use]
    pub const fn must_understand(&self) -> bool {
        self.must_understand
    }

    /// SOAP actor the block is addressed to.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

/// `ecp:Request` header block sent by the SP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EcpRequestHeader {
    /// SP entity ID from the nested `saml:Issuer`.
    pub issuer: Option<String>,
    /// Human-readable SP name.
    pub provider_name: Option<String>,
    /// Whether the SP asked for passive authentication.
    pub is_passive: bool,
    /// IdPs the SP is willing to accept.
    pub idp_list: Vec<IdpEntry>,
}

impl EcpRequestHeader {
    /// Element name of the header block.
    #[must_use]
    pub fn element_name() -> QName {
        QName::new(ECP_NS, "Request")
    }

    /// Builds the header from a parsed `ecp:Request` element.
    ///
    /// # Errors
    ///
    /// Fails if a nested `IDPEntry` lacks its `ProviderID`.
    pub fn from_element(element: &XmlElement) -> ProtocolResult<Self> {
        let issuer = element
            .child(SAML_NS, "Issuer")
            .map(|i| i.text.trim().to_string());

        let idp_list = match element.child(SAMLP_NS, "IDPList") {
            Some(list) => list
                .children_named(SAMLP_NS, "IDPEntry")
                .map(IdpEntry::from_element)
                .collect::<ProtocolResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            issuer,
            provider_name: element.attribute("ProviderName").map(str::to_string),
            is_passive: soap_flag(element.attribute("IsPassive")),
            idp_list,
        })
    }

    /// Serializes the header as a standalone element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<ecp:Request xmlns:ecp="{ECP_NS}" xmlns:S="{SOAP11_NS}" S:mustUnderstand="1" S:actor="{SOAP_ACTOR_NEXT}" IsPassive="{}""#,
            if self.is_passive { "1" } else { "0" }
        );
        if let Some(name) = &self.provider_name {
            xml.push_str(&format!(r#" ProviderName="{}""#, escape(name.as_str())));
        }
        xml.push('>');
        if let Some(issuer) = &self.issuer {
            xml.push_str(&format!(
                r#"<saml:Issuer xmlns:saml="{SAML_NS}">{}</saml:Issuer>"#,
                escape(issuer.as_str())
            ));
        }
        if !self.idp_list.is_empty() {
            xml.push_str(&idp_list_to_xml(&self.idp_list));
        }
        xml.push_str("</ecp:Request>");
        xml
    }
}

/// `ecp:RelayState` header block.
///
/// Kept verbatim; the client must return it unchanged to the SP.
#[derive(Debug, Clone)]
pub struct RelayStateHeader {
    element: XmlElement,
}

impl RelayStateHeader {
    /// Element name of the header block.
    #[must_use]
    pub fn element_name() -> QName {
        QName::new(ECP_NS, "RelayState")
    }

    /// Wraps a parsed `ecp:RelayState` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            element: element.clone(),
        }
    }

    /// The relay state value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.element.text.trim()
    }

    /// The original element.
    #[must_use]
    pub const fn element(&self) -> &XmlElement {
        &self.element
    }

    /// Serializes the header as a standalone element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = format!(r#"<ecp:RelayState xmlns:ecp="{ECP_NS}" xmlns:S="{SOAP11_NS}""#);
        if soap_flag(self.element.attribute_ns(SOAP11_NS, "mustUnderstand")) {
            xml.push_str(r#" S:mustUnderstand="1""#);
        }
        if let Some(actor) = self.element.attribute_ns(SOAP11_NS, "actor") {
            xml.push_str(&format!(r#" S:actor="{}""#, escape(actor)));
        }
        xml.push_str(&format!(">{}</ecp:RelayState>", escape(self.value())));
        xml
    }
}
