//! Protocol codec error types.
//!
//! Covers malformed XML, structural (schema) violations and messages whose
//! elements are not known to the provider registry.

use thiserror::Error;

/// Result type for codec operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Input is not well-formed XML.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Input is well-formed but does not match the expected schema.
    #[error("{schema} validation failed: {reason}")]
    SchemaViolation {
        /// Name of the schema that was checked.
        schema: &'static str,
        /// Why validation failed.
        reason: String,
    },

    /// A mandatory child element is absent.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// A mandatory attribute is absent.
    #[error("element {element} is missing attribute {attribute}")]
    MissingAttribute {
        /// Element that lacks the attribute.
        element: String,
        /// The attribute name.
        attribute: &'static str,
    },

    /// No provider is registered for the element name.
    #[error("no object provider registered for {0}")]
    UnknownElement(String),

    /// A message could not be produced from the given parts.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl From<quick_xml::Error> for ProtocolError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<std::str::Utf8Error> for ProtocolError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::XmlParse(format!("invalid UTF-8: {err}"))
    }
}
