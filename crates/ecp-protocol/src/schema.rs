//! Structural validation of decoded documents.

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{SchemaRef, SAMLP_NS, SOAP11_NS};
use crate::xml::{parse_document, XmlElement};

/// Checks a parsed document against a schema.
///
/// # Errors
///
/// Returns [`ProtocolError::SchemaViolation`] describing the first problem.
pub fn validate(root: &XmlElement, schema: SchemaRef) -> ProtocolResult<()> {
    let outcome = match schema {
        SchemaRef::SoapEnvelope => validate_envelope(root),
        SchemaRef::IdpList => validate_idp_list(root),
    };
    outcome.map_err(|reason| ProtocolError::SchemaViolation {
        schema: schema.name(),
        reason,
    })
}

/// Returns true if `input` is well-formed and valid against `schema`.
#[must_use]
pub fn is_valid(input: &[u8], schema: SchemaRef) -> bool {
    std::str::from_utf8(input)
        .ok()
        .and_then(|text| parse_document(text).ok())
        .is_some_and(|root| validate(&root, schema).is_ok())
}

fn validate_envelope(root: &XmlElement) -> Result<(), String> {
    if !root.name.is(SOAP11_NS, "Envelope") {
        return Err(format!("root element is {}, expected Envelope", root.name));
    }

    let mut seen_header = false;
    let mut seen_body = false;
    for (index, child) in root.children.iter().enumerate() {
        if child.name.is(SOAP11_NS, "Header") {
            if seen_header || index != 0 {
                return Err("Header must appear once, before Body".to_string());
            }
            seen_header = true;
        } else if child.name.is(SOAP11_NS, "Body") {
            if seen_body {
                return Err("more than one Body".to_string());
            }
            seen_body = true;
        } else if !seen_body {
            return Err(format!("unexpected element {} before Body", child.name));
        } else if child.name.namespace.is_none() {
            return Err(format!("trailing element {} must be qualified", child.name));
        }
    }

    if !seen_body {
        return Err("no Body".to_string());
    }
    Ok(())
}

fn validate_idp_list(root: &XmlElement) -> Result<(), String> {
    if !root.name.is(SAMLP_NS, "IDPList") {
        return Err(format!("root element is {}, expected IDPList", root.name));
    }

    let mut entries = 0;
    for child in &root.children {
        if child.name.is(SAMLP_NS, "IDPEntry") {
            if child.attribute("ProviderID").is_none() {
                return Err("IDPEntry without ProviderID".to_string());
            }
            entries += 1;
        } else if !child.name.is(SAMLP_NS, "GetComplete") {
            return Err(format!("unexpected element {}", child.name));
        }
    }

    if entries == 0 {
        return Err("IDPList has no IDPEntry".to_string());
    }
    Ok(())
}
