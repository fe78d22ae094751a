//! PAOS request header.
//!
//! The header block an SP puts in front of its `AuthnRequest` to tell the
//! client where the IdP's answer has to be delivered.

use quick_xml::escape::escape;
use uuid::Uuid;

use super::{PAOS_NS, SOAP11_NS, SOAP_ACTOR_NEXT};
use crate::error::ProtocolResult;
use crate::xml::{QName, XmlElement};

/// `paos:Request` SOAP header block.
///
/// Immutable once created. Each header carries a message ID; when the SP did
/// not supply one a fresh ID is issued, so every handshake attempt has its
/// own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaosRequestHeader {
    message_id: String,
    response_consumer_url: String,
    service: String,
    must_understand: bool,
    actor: Option<String>,
}

impl PaosRequestHeader {
    /// Element name of the header block.
    #[must_use]
    pub fn element_name() -> QName {
        QName::new(PAOS_NS, "Request")
    }

    /// Creates a header addressed to the next SOAP intermediary.
    #[must_use]
    pub fn new(response_consumer_url: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            message_id: issue_message_id(),
            response_consumer_url: response_consumer_url.into(),
            service: service.into(),
            must_understand: true,
            actor: Some(SOAP_ACTOR_NEXT.to_string()),
        }
    }

    /// Replaces the message ID.
    #[must_use]
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    /// Builds the header from a parsed `paos:Request` element.
    ///
    /// # Errors
    ///
    /// Fails if `responseConsumerURL` or `service` is missing.
    pub fn from_element(element: &XmlElement) -> ProtocolResult<Self> {
        let response_consumer_url = element.required_attribute("responseConsumerURL")?;
        let service = element.required_attribute("service")?;
        let message_id = element
            .attribute("messageID")
            .map_or_else(issue_message_id, str::to_string);

        Ok(Self {
            message_id,
            response_consumer_url: response_consumer_url.to_string(),
            service: service.to_string(),
            must_understand: soap_flag(element.attribute_ns(SOAP11_NS, "mustUnderstand")),
            actor: element.attribute_ns(SOAP11_NS, "actor").map(str::to_string),
        })
    }

    /// Serializes the header as a standalone element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = format!(r#"<paos:Request xmlns:paos="{PAOS_NS}" xmlns:S="{SOAP11_NS}""#);
        if self.must_understand {
            xml.push_str(r#" S:mustUnderstand="1""#);
        }
        if let Some(actor) = &self.actor {
            xml.push_str(&format!(r#" S:actor="{}""#, escape(actor.as_str())));
        }
        xml.push_str(&format!(
            r#" responseConsumerURL="{}" service="{}" messageID="{}"/>"#,
            escape(self.response_consumer_url.as_str()),
            escape(self.service.as_str()),
            escape(self.message_id.as_str()),
        ));
        xml
    }

    /// Message ID of this exchange.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Where the SP expects the IdP's response.
    #[must_use]
    pub fn response_consumer_url(&self) -> &str {
        &self.response_consumer_url
    }

    /// Service URI (the ECP profile).
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
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

/// Issues a new, globally unique message ID.
#[must_use]
pub fn issue_message_id() -> String {
    format!("_{}", Uuid::new_v4().simple())
}

/// Interprets a SOAP boolean attribute (`"1"` or `"true"`).
pub(crate) fn soap_flag(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1" | "true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ECP_NS;
    use crate::xml::parse_document;

    #[test]
    fn parses_sp_header() {
        let xml = format!(
            r#"<paos:Request xmlns:paos="{PAOS_NS}" xmlns:S="{SOAP11_NS}" S:mustUnderstand="1" S:actor="{SOAP_ACTOR_NEXT}" responseConsumerURL="https://sp.example/acs" service="{ECP_NS}" messageID="m-1"/>"#
        );
        let element = parse_document(&xml).unwrap();
        let header = PaosRequestHeader::from_element(&element).unwrap();

        assert_eq!(header.response_consumer_url(), "https://sp.example/acs");
        assert_eq!(header.service(), ECP_NS);
        assert_eq!(header.message_id(), "m-1");
        assert!(header.must_understand());
        assert_eq!(header.actor(), Some(SOAP_ACTOR_NEXT));
    }

    #[test]
    fn issues_message_id_when_absent() {
        let xml = format!(
            r#"<Request xmlns="{PAOS_NS}" responseConsumerURL="https://sp.example/acs" service="{ECP_NS}"/>"#
        );
        let element = parse_document(&xml).unwrap();
        let a = PaosRequestHeader::from_element(&element).unwrap();
        let b = PaosRequestHeader::from_element(&element).unwrap();

        assert!(a.message_id().starts_with('_'));
        assert_ne!(a.message_id(), b.message_id());
        assert!(!a.must_understand());
    }

    #[test]
    fn missing_consumer_url_is_an_error() {
        let xml = format!(r#"<paos:Request xmlns:paos="{PAOS_NS}" service="{ECP_NS}"/>"#);
        let element = parse_document(&xml).unwrap();
        assert!(PaosRequestHeader::from_element(&element).is_err());
    }

    #[test]
    fn serialized_header_parses_back() {
        let header = PaosRequestHeader::new("https://sp.example/acs?a=1&b=2", ECP_NS)
            .with_message_id("fixed");
        let element = parse_document(&header.to_xml()).unwrap();
        assert_eq!(PaosRequestHeader::from_element(&element).unwrap(), header);
    }
}
