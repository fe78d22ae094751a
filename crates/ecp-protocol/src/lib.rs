//! SOAP, PAOS and SAML2 ECP message codec.
//!
//! This crate provides the message layer of an ECP client:
//!
//! - **Element tree** - namespace-aware parsing that keeps each element's
//!   source text, so SAML payloads can be forwarded untouched
//! - **Message types** - PAOS request header, ECP response, request and
//!   relay-state headers, IdP entries and the SOAP envelope
//! - **Provider registry** - element name to unmarshal/marshal lookup table
//! - **Codec** - structural validation plus decoding into typed messages
//!
//! # Architecture
//!
//! - [`xml`] - element tree on top of `quick-xml`
//! - [`types`] - protocol message shapes and constants
//! - [`schema`] - structural validation
//! - [`registry`] - object providers keyed by element name
//! - [`codec`] - encode/decode entry points
//! - [`error`] - error types
//!
//! # Example
//!
//! ```rust,ignore
//! use ecp_protocol::{MessageCodec, MessageShape};
//!
//! let codec = MessageCodec::default();
//! let envelope = codec.decode_envelope(&body)?;
//! match codec.paos_request(&envelope)? {
//!     Some(header) => println!("reply to {}", header.response_consumer_url()),
//!     None => println!("SP does not speak ECP"),
//! }
//! ```
//!
//! # Specifications
//!
//! - [SAML 2.0 Profiles, section 4.2 (ECP)](https://docs.oasis-open.org/security/saml/v2.0/saml-profiles-2.0-os.pdf)
//! - [SAML 2.0 Bindings, section 3.3 (Reverse SOAP)](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [SOAP 1.1](https://www.w3.org/TR/2000/NOTE-SOAP-20000508/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod registry;
pub mod schema;
pub mod types;
pub mod xml;

pub use codec::{MessageCodec, MessageShape};
pub use error::{ProtocolError, ProtocolResult};
pub use registry::{ObjectProvider, ProviderRegistry, XmlObject};
pub use types::*;
pub use xml::{parse_document, QName, XmlElement};
