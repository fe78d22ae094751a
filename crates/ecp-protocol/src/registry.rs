//! Element-name keyed object providers.
//!
//! The registry maps a namespace-qualified element name to the functions that
//! turn a parsed element into a typed message and back. It is built once,
//! usually with [`ProviderRegistry::with_defaults`], and handed to the codec;
//! there is no global instance.

use std::collections::HashMap;

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{
    idp_list_to_xml, EcpRequestHeader, IdpEntry, PaosRequestHeader, PaosResponseHeader,
    RelayStateHeader, SoapEnvelope,
};
use crate::xml::{QName, XmlElement};

/// A decoded protocol object.
#[derive(Debug, Clone)]
pub enum XmlObject {
    /// `paos:Request` header block.
    PaosRequest(PaosRequestHeader),
    /// `ecp:Response` header block.
    PaosResponse(PaosResponseHeader),
    /// `ecp:Request` header block.
    EcpRequest(EcpRequestHeader),
    /// `ecp:RelayState` header block.
    RelayState(RelayStateHeader),
    /// SOAP envelope.
    Envelope(SoapEnvelope),
    /// A single `samlp:IDPEntry`.
    IdpEntry(IdpEntry),
    /// A `samlp:IDPList`.
    IdpList(Vec<IdpEntry>),
}

impl XmlObject {
    /// Element name this object is serialized as.
    #[must_use]
    pub fn element_name(&self) -> QName {
        match self {
            Self::PaosRequest(_) => PaosRequestHeader::element_name(),
            Self::PaosResponse(_) => PaosResponseHeader::element_name(),
            Self::EcpRequest(_) => EcpRequestHeader::element_name(),
            Self::RelayState(_) => RelayStateHeader::element_name(),
            Self::Envelope(_) => SoapEnvelope::element_name(),
            Self::IdpEntry(_) => IdpEntry::element_name(),
            Self::IdpList(_) => IdpEntry::list_element_name(),
        }
    }
}

/// Builds a typed object from a parsed element.
pub type Unmarshaller = fn(&XmlElement) -> ProtocolResult<XmlObject>;

/// Serializes a typed object.
pub type Marshaller = fn(&XmlObject) -> ProtocolResult<String>;

/// Unmarshal and marshal behaviour for one element name.
#[derive(Clone, Copy)]
pub struct ObjectProvider {
    /// Element to object.
    pub unmarshal: Unmarshaller,
    /// Object to XML text.
    pub marshal: Marshaller,
}

impl std::fmt::Debug for ObjectProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectProvider").finish_non_exhaustive()
    }
}

/// Lookup table from element name to [`ObjectProvider`].
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<QName, ObjectProvider>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with providers for every message the ECP client
    /// handles.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            PaosRequestHeader::element_name(),
            ObjectProvider {
                unmarshal: |e| PaosRequestHeader::from_element(e).map(XmlObject::PaosRequest),
                marshal: |o| match o {
                    XmlObject::PaosRequest(h) => Ok(h.to_xml()),
                    other => Err(mismatch(other, "paos:Request")),
                },
            },
        );
        registry.register(
            PaosResponseHeader::element_name(),
            ObjectProvider {
                unmarshal: |e| PaosResponseHeader::from_element(e).map(XmlObject::PaosResponse),
                marshal: |o| match o {
                    XmlObject::PaosResponse(h) => Ok(h.to_xml()),
                    other => Err(mismatch(other, "ecp:Response")),
                },
            },
        );
        registry.register(
            EcpRequestHeader::element_name(),
            ObjectProvider {
                unmarshal: |e| EcpRequestHeader::from_element(e).map(XmlObject::EcpRequest),
                marshal: |o| match o {
                    XmlObject::EcpRequest(h) => Ok(h.to_xml()),
                    other => Err(mismatch(other, "ecp:Request")),
                },
            },
        );
        registry.register(
            RelayStateHeader::element_name(),
            ObjectProvider {
                unmarshal: |e| Ok(XmlObject::RelayState(RelayStateHeader::from_element(e))),
                marshal: |o| match o {
                    XmlObject::RelayState(h) => Ok(h.to_xml()),
                    other => Err(mismatch(other, "ecp:RelayState")),
                },
            },
        );
        registry.register(
            SoapEnvelope::element_name(),
            ObjectProvider {
                unmarshal: |e| SoapEnvelope::from_element(e).map(XmlObject::Envelope),
                marshal: |o| match o {
                    XmlObject::Envelope(env) => env.to_xml(),
                    other => Err(mismatch(other, "S:Envelope")),
                },
            },
        );
        registry.register(
            IdpEntry::element_name(),
            ObjectProvider {
                unmarshal: |e| IdpEntry::from_element(e).map(XmlObject::IdpEntry),
                marshal: |o| match o {
                    XmlObject::IdpEntry(entry) => Ok(entry.to_xml()),
                    other => Err(mismatch(other, "samlp:IDPEntry")),
                },
            },
        );
        registry.register(
            IdpEntry::list_element_name(),
            ObjectProvider {
                unmarshal: |e| {
                    e.children_named(crate::types::SAMLP_NS, "IDPEntry")
                        .map(IdpEntry::from_element)
                        .collect::<ProtocolResult<Vec<_>>>()
                        .map(XmlObject::IdpList)
                },
                marshal: |o| match o {
                    XmlObject::IdpList(entries) => Ok(idp_list_to_xml(entries)),
                    other => Err(mismatch(other, "samlp:IDPList")),
                },
            },
        );
        registry
    }

    /// Registers a provider, returning the one it replaces.
    pub fn register(&mut self, name: QName, provider: ObjectProvider) -> Option<ObjectProvider> {
        tracing::trace!(element = %name, "Registering object provider");
        self.providers.insert(name, provider)
    }

    /// Returns the provider for an element name.
    #[must_use]
    pub fn provider(&self, name: &QName) -> Option<&ObjectProvider> {
        self.providers.get(name)
    }

    /// Returns true if a provider is registered for the name.
    #[must_use]
    pub fn contains(&self, name: &QName) -> bool {
        self.providers.contains_key(name)
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Converts an element into its typed object.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownElement`] if no provider is registered
    /// for the element's name, or the provider's own error.
    pub fn unmarshal(&self, element: &XmlElement) -> ProtocolResult<XmlObject> {
        let provider = self
            .providers
            .get(&element.name)
            .ok_or_else(|| ProtocolError::UnknownElement(element.name.to_string()))?;
        (provider.unmarshal)(element)
    }

    /// Serializes an object with the provider registered for its name.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownElement`] if the object's element name
    /// has no provider.
    pub fn marshal(&self, object: &XmlObject) -> ProtocolResult<String> {
        let name = object.element_name();
        let provider = self
            .providers
            .get(&name)
            .ok_or_else(|| ProtocolError::UnknownElement(name.to_string()))?;
        (provider.marshal)(object)
    }
}

fn mismatch(object: &XmlObject, expected: &str) -> ProtocolError {
    ProtocolError::InvalidMessage(format!(
        "{} cannot be marshalled as {expected}",
        object.element_name()
    ))
}
