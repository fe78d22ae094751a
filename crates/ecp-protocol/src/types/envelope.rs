//! SOAP 1.1 envelope.

use super::SOAP11_NS;
use crate::error::{ProtocolError, ProtocolResult};
use crate::xml::{NamespaceDecl, QName, XmlElement};

/// Prefixes tried, in order, for the envelope's own namespace.
const ENVELOPE_PREFIXES: [&str; 4] = ["S", "soap11", "soapenv", "SOAP-ENV"];

/// A SOAP envelope: header blocks and body entries.
///
/// Entries are kept as parsed elements so that they can be re-enveloped
/// without being re-serialized.
#[derive(Debug, Clone, Default)]
pub struct SoapEnvelope {
    headers: Vec<XmlElement>,
    body: Vec<XmlElement>,
}

impl SoapEnvelope {
    /// Element name of the envelope.
    #[must_use]
    pub fn element_name() -> QName {
        QName::new(SOAP11_NS, "Envelope")
    }

    /// Creates an empty envelope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header block.
    #[must_use]
    pub fn with_header(mut self, block: XmlElement) -> Self {
        self.headers.push(block);
        self
    }

    /// Adds a body entry.
    #[must_use]
    pub fn with_body(mut self, entry: XmlElement) -> Self {
        self.body.push(entry);
        self
    }

    /// Builds an envelope from a structurally valid `Envelope` element.
    ///
    /// # Errors
    ///
    /// Fails if the element has no `Body`.
    pub fn from_element(root: &XmlElement) -> ProtocolResult<Self> {
        let body = root
            .child(SOAP11_NS, "Body")
            .ok_or_else(|| ProtocolError::MissingElement("S:Body".to_string()))?;
        let headers = root
            .child(SOAP11_NS, "Header")
            .map(|h| h.children.clone())
            .unwrap_or_default();

        Ok(Self {
            headers,
            body: body.children.clone(),
        })
    }

    /// All header blocks.
    #[must_use]
    pub fn headers(&self) -> &[XmlElement] {
        &self.headers
    }

    /// The first header block with the given name.
    #[must_use]
    pub fn header(&self, name: &QName) -> Option<&XmlElement> {
        self.headers.iter().find(|h| &h.name == name)
    }

    /// All body entries.
    #[must_use]
    pub fn body(&self) -> &[XmlElement] {
        &self.body
    }

    /// The first body entry.
    #[must_use]
    pub fn body_element(&self) -> Option<&XmlElement> {
        self.body.first()
    }

    /// The SOAP fault carried in the body, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&XmlElement> {
        self.body.iter().find(|e| e.name.is(SOAP11_NS, "Fault"))
    }

    /// Serializes the envelope.
    ///
    /// Namespace bindings that embedded entries inherited from their original
    /// documents are declared on the new `Envelope` element.
    ///
    /// # Errors
    ///
    /// Fails if two entries inherit conflicting bindings for one prefix.
    pub fn to_xml(&self) -> ProtocolResult<String> {
        let mut inherited: Vec<NamespaceDecl> = Vec::new();
        for entry in self.headers.iter().chain(&self.body) {
            for decl in entry.inherited_namespaces() {
                match inherited.iter().find(|d| d.prefix == decl.prefix) {
                    Some(existing) if existing.uri == decl.uri => {}
                    Some(_) => {
                        return Err(ProtocolError::InvalidMessage(format!(
                            "conflicting bindings for namespace prefix '{}'",
                            decl.prefix.as_deref().unwrap_or_default()
                        )))
                    }
                    None => inherited.push(decl),
                }
            }
        }

        let prefix = ENVELOPE_PREFIXES
            .iter()
            .copied()
            .find(|p| {
                inherited
                    .iter()
                    .all(|d| d.prefix.as_deref() != Some(*p) || d.uri == SOAP11_NS)
            })
            .ok_or_else(|| {
                ProtocolError::InvalidMessage("no free prefix for the SOAP namespace".to_string())
            })?;
        inherited.retain(|d| d.prefix.as_deref() != Some(prefix));

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push_str(&format!(r#"<{prefix}:Envelope xmlns:{prefix}="{SOAP11_NS}""#));
        for decl in &inherited {
            xml.push(' ');
            xml.push_str(&decl.to_attribute());
        }
        xml.push('>');

        if !self.headers.is_empty() {
            xml.push_str(&format!("<{prefix}:Header>"));
            for block in &self.headers {
                xml.push_str(block.raw());
            }
            xml.push_str(&format!("</{prefix}:Header>"));
        }

        xml.push_str(&format!("<{prefix}:Body>"));
        for entry in &self.body {
            xml.push_str(entry.raw());
        }
        xml.push_str(&format!("</{prefix}:Body></{prefix}:Envelope>"));
        Ok(xml)
    }
}
