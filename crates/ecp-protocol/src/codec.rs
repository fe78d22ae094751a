//! Message codec.
//!
//! Turns protocol objects into bytes and back. Decoding checks
//! well-formedness and structure first, then hands the element to the
//! [`ProviderRegistry`]. A header block that is simply not present decodes to
//! `None`; only broken input is an error.

use std::sync::Arc;

use crate::error::{ProtocolError, ProtocolResult};
use crate::registry::{ProviderRegistry, XmlObject};
use crate::schema::validate;
use crate::types::{
    EcpRequestHeader, IdpEntry, PaosRequestHeader, PaosResponseHeader, RelayStateHeader, SchemaRef,
    SoapEnvelope,
};
use crate::xml::{parse_document, QName};

/// The message shapes a caller can ask the codec for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageShape {
    /// The whole SOAP envelope.
    Envelope,
    /// `paos:Request` from the envelope header.
    PaosRequest,
    /// `ecp:Response` from the envelope header.
    PaosResponse,
    /// `ecp:Request` from the envelope header.
    EcpRequest,
    /// `ecp:RelayState` from the envelope header.
    RelayState,
    /// A standalone `samlp:IDPList` document.
    IdpList,
}

impl MessageShape {
    /// Element name of the shape.
    #[must_use]
    pub fn element_name(self) -> QName {
        match self {
            Self::Envelope => SoapEnvelope::element_name(),
            Self::PaosRequest => PaosRequestHeader::element_name(),
            Self::PaosResponse => PaosResponseHeader::element_name(),
            Self::EcpRequest => EcpRequestHeader::element_name(),
            Self::RelayState => RelayStateHeader::element_name(),
            Self::IdpList => IdpEntry::list_element_name(),
        }
    }

    /// Schema the enclosing document is validated against.
    #[must_use]
    pub const fn schema(self) -> SchemaRef {
        match self {
            Self::IdpList => SchemaRef::IdpList,
            _ => SchemaRef::SoapEnvelope,
        }
    }

    const fn is_header(self) -> bool {
        !matches!(self, Self::Envelope | Self::IdpList)
    }
}

/// Encoder and decoder for ECP messages.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    registry: Arc<ProviderRegistry>,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(Arc::new(ProviderRegistry::with_defaults()))
    }
}

impl MessageCodec {
    /// Creates a codec backed by the given registry.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// The registry in use.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Serializes a message.
    ///
    /// # Errors
    ///
    /// Fails if no provider handles the message or it cannot be rendered.
    pub fn encode(&self, message: &XmlObject) -> ProtocolResult<Vec<u8>> {
        self.registry.marshal(message).map(String::into_bytes)
    }

    /// Decodes the requested shape from a serialized document.
    ///
    /// Returns `Ok(None)` when the document is valid but the requested header
    /// block is absent.
    ///
    /// # Errors
    ///
    /// Fails if the input is not well-formed, does not satisfy the shape's
    /// schema, or contains an element the registry cannot handle.
    pub fn decode(&self, bytes: &[u8], shape: MessageShape) -> ProtocolResult<Option<XmlObject>> {
        let text = std::str::from_utf8(bytes)?;
        let root = parse_document(text)?;
        validate(&root, shape.schema())?;

        if !shape.is_header() {
            return self.registry.unmarshal(&root).map(Some);
        }

        let envelope = SoapEnvelope::from_element(&root)?;
        self.header(&envelope, shape)
    }

    /// Decodes a SOAP envelope.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Self::decode).
    pub fn decode_envelope(&self, bytes: &[u8]) -> ProtocolResult<SoapEnvelope> {
        match self.decode(bytes, MessageShape::Envelope)? {
            Some(XmlObject::Envelope(envelope)) => Ok(envelope),
            other => Err(unexpected(other, MessageShape::Envelope)),
        }
    }

    /// Decodes a header block from an already decoded envelope.
    ///
    /// # Errors
    ///
    /// Fails if the block is present but malformed.
    pub fn header(
        &self,
        envelope: &SoapEnvelope,
        shape: MessageShape,
    ) -> ProtocolResult<Option<XmlObject>> {
        match envelope.header(&shape.element_name()) {
            Some(block) => self.registry.unmarshal(block).map(Some),
            None => Ok(None),
        }
    }

    /// The `paos:Request` header of an envelope, if present.
    ///
    /// # Errors
    ///
    /// Fails if the block is present but malformed.
    pub fn paos_request(&self, envelope: &SoapEnvelope) -> ProtocolResult<Option<PaosRequestHeader>> {
        match self.header(envelope, MessageShape::PaosRequest)? {
            Some(XmlObject::PaosRequest(header)) => Ok(Some(header)),
            None => Ok(None),
            other => Err(unexpected(other, MessageShape::PaosRequest)),
        }
    }

    /// The `ecp:Response` header of an envelope, if present.
    ///
    /// # Errors
    ///
    /// Fails if the block is present but malformed.
    pub fn paos_response(
        &self,
        envelope: &SoapEnvelope,
    ) -> ProtocolResult<Option<PaosResponseHeader>> {
        match self.header(envelope, MessageShape::PaosResponse)? {
            Some(XmlObject::PaosResponse(header)) => Ok(Some(header)),
            None => Ok(None),
            other => Err(unexpected(other, MessageShape::PaosResponse)),
        }
    }

    /// The `ecp:Request` header of an envelope, if present.
    ///
    /// # Errors
    ///
    /// Fails if the block is present but malformed.
    pub fn ecp_request(&self, envelope: &SoapEnvelope) -> ProtocolResult<Option<EcpRequestHeader>> {
        match self.header(envelope, MessageShape::EcpRequest)? {
            Some(XmlObject::EcpRequest(header)) => Ok(Some(header)),
            None => Ok(None),
            other => Err(unexpected(other, MessageShape::EcpRequest)),
        }
    }

    /// The `ecp:RelayState` header of an envelope, if present.
    ///
    /// # Errors
    ///
    /// Fails if the registry maps the block to something else.
    pub fn relay_state(&self, envelope: &SoapEnvelope) -> ProtocolResult<Option<RelayStateHeader>> {
        match self.header(envelope, MessageShape::RelayState)? {
            Some(XmlObject::RelayState(header)) => Ok(Some(header)),
            None => Ok(None),
            other => Err(unexpected(other, MessageShape::RelayState)),
        }
    }

    /// Decodes a standalone `IDPList` document.
    ///
    /// # Errors
    ///
    /// Fails if the document is malformed or not a valid list.
    pub fn decode_idp_list(&self, bytes: &[u8]) -> ProtocolResult<Vec<IdpEntry>> {
        match self.decode(bytes, MessageShape::IdpList)? {
            Some(XmlObject::IdpList(entries)) => Ok(entries),
            other => Err(unexpected(other, MessageShape::IdpList)),
        }
    }
}

fn unexpected(object: Option<XmlObject>, shape: MessageShape) -> ProtocolError {
    let found = object.map_or_else(|| "nothing".to_string(), |o| o.element_name().to_string());
    ProtocolError::InvalidMessage(format!(
        "expected {}, decoded {found}",
        shape.element_name()
    ))
}
