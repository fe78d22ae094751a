//! Namespace-aware element tree.
//!
//! A small document model on top of `quick-xml`. Every element keeps the
//! exact source text it was parsed from so message bodies can be forwarded
//! byte for byte, together with the namespace bindings it inherited from its
//! ancestors.

use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ProtocolError, ProtocolResult};

/// Namespace bound to the `xml` prefix by definition.
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace-qualified element or attribute name.
///
/// The prefix is never part of a name's identity: `<S:Body>` and
/// `<Body xmlns="...">` resolve to the same `QName`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI, if any.
    pub namespace: Option<String>,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Creates a namespace-qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Creates a name in no namespace.
    #[must_use]
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Returns true if this name has the given namespace and local part.
    #[must_use]
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local == local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// A namespace binding (`xmlns` or `xmlns:prefix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Bound prefix; `None` for the default namespace.
    pub prefix: Option<String>,
    /// Namespace URI.
    pub uri: String,
}

impl NamespaceDecl {
    /// Renders the binding as an attribute.
    #[must_use]
    pub fn to_attribute(&self) -> String {
        let uri = quick_xml::escape::escape(self.uri.as_str());
        match &self.prefix {
            Some(prefix) => format!(r#"xmlns:{prefix}="{uri}""#),
            None => format!(r#"xmlns="{uri}""#),
        }
    }
}

/// Attribute with its resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Resolved name. Unprefixed attributes are in no namespace.
    pub name: QName,
    /// Unescaped value.
    pub value: String,
}

/// Parsed element.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// Resolved element name.
    pub name: QName,
    /// Prefix used in the source document.
    pub prefix: Option<String>,
    /// Non-namespace attributes.
    pub attributes: Vec<XmlAttribute>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element.
    pub text: String,
    raw: String,
    declared: Vec<NamespaceDecl>,
    in_scope: Vec<NamespaceDecl>,
}

impl XmlElement {
    /// Returns the value of an unqualified attribute.
    #[must_use]
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Returns the value of an unqualified attribute that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingAttribute`] if it is absent.
    pub fn required_attribute(&self, local: &'static str) -> ProtocolResult<&str> {
        self.attribute(local)
            .ok_or_else(|| ProtocolError::MissingAttribute {
                element: self.qualified_name(),
                attribute: local,
            })
    }

    /// Returns the value of a namespace-qualified attribute.
    #[must_use]
    pub fn attribute_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }

    /// Returns the first child with the given name.
    #[must_use]
    pub fn child(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name.is(namespace, local))
    }

    /// Returns every child with the given name.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name.is(namespace, local))
    }

    /// Depth-first search for a descendant (or self) with the given name.
    #[must_use]
    pub fn find(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        if self.name.is(namespace, local) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(namespace, local))
    }

    /// The element exactly as it appeared in the source document.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Qualified name as written in the source (`prefix:local`).
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name.local),
            None => self.name.local.clone(),
        }
    }

    /// Bindings this element relies on but does not declare itself.
    ///
    /// Emitting these on a new parent makes [`raw`](Self::raw) valid XML
    /// with the same meaning outside its original document.
    #[must_use]
    pub fn inherited_namespaces(&self) -> Vec<NamespaceDecl> {
        self.in_scope
            .iter()
            .filter(|b| b.prefix.as_deref() != Some("xml"))
            .filter(|b| !self.declared.iter().any(|d| d.prefix == b.prefix))
            .cloned()
            .collect()
    }
}

/// Parses a complete document and returns its root element.
///
/// # Errors
///
/// Returns [`ProtocolError::XmlParse`] for malformed input, unbound
/// prefixes, text outside the root, or a missing or duplicated root.
pub fn parse_document(input: &str) -> ProtocolResult<XmlElement> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<(XmlElement, usize)> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let base_scope = vec![NamespaceDecl {
        prefix: Some("xml".to_string()),
        uri: XML_NS.to_string(),
    }];

    loop {
        let start = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                let scope = stack.last().map_or(&base_scope, |(p, _)| &p.in_scope);
                let element = open_element(&e, scope)?;
                stack.push((element, start));
            }
            Event::Empty(e) => {
                let scope = stack.last().map_or(&base_scope, |(p, _)| &p.in_scope);
                let mut element = open_element(&e, scope)?;
                element.raw = input[start..reader.buffer_position() as usize].to_string();
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let (mut element, begin) = stack
                    .pop()
                    .ok_or_else(|| ProtocolError::XmlParse("unexpected end tag".to_string()))?;
                element.raw = input[begin..reader.buffer_position() as usize].to_string();
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                match stack.last_mut() {
                    Some((parent, _)) => parent.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(ProtocolError::XmlParse(
                            "character data outside the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(c) => {
                if let Some((parent, _)) = stack.last_mut() {
                    parent.text.push_str(std::str::from_utf8(&c)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some((open, _)) = stack.last() {
        return Err(ProtocolError::XmlParse(format!(
            "unclosed element {}",
            open.qualified_name()
        )));
    }
    root.ok_or_else(|| ProtocolError::XmlParse("document has no root element".to_string()))
}

fn attach(
    element: XmlElement,
    stack: &mut [(XmlElement, usize)],
    root: &mut Option<XmlElement>,
) -> ProtocolResult<()> {
    if let Some((parent, _)) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ProtocolError::XmlParse(
            "document has more than one root element".to_string(),
        ));
    }
    *root = Some(element);
    Ok(())
}

fn open_element(e: &BytesStart<'_>, parent_scope: &[NamespaceDecl]) -> ProtocolResult<XmlElement> {
    let qualified = std::str::from_utf8(e.name().as_ref())?.to_string();
    let (prefix, local) = split_qualified(&qualified);

    let mut declared = Vec::new();
    let mut plain = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ProtocolError::XmlParse(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            declared.push(NamespaceDecl { prefix: None, uri: value });
        } else if let Some(p) = key.strip_prefix("xmlns:") {
            declared.push(NamespaceDecl {
                prefix: Some(p.to_string()),
                uri: value,
            });
        } else {
            plain.push((key, value));
        }
    }

    let mut in_scope = parent_scope.to_vec();
    for decl in &declared {
        in_scope.retain(|b| b.prefix != decl.prefix);
        if !(decl.prefix.is_none() && decl.uri.is_empty()) {
            in_scope.push(decl.clone());
        }
    }

    let namespace = match prefix {
        Some(p) => Some(resolve(&in_scope, Some(p)).ok_or_else(|| unbound(p))?),
        None => resolve(&in_scope, None),
    };

    let mut attributes = Vec::with_capacity(plain.len());
    for (key, value) in plain {
        let (attr_prefix, attr_local) = split_qualified(&key);
        let name = match attr_prefix {
            Some(p) => QName::new(resolve(&in_scope, Some(p)).ok_or_else(|| unbound(p))?, attr_local),
            None => QName::unqualified(attr_local),
        };
        attributes.push(XmlAttribute { name, value });
    }

    Ok(XmlElement {
        name: QName {
            namespace,
            local: local.to_string(),
        },
        prefix: prefix.map(str::to_string),
        attributes,
        children: Vec::new(),
        text: String::new(),
        raw: String::new(),
        declared,
        in_scope,
    })
}

fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn resolve(scope: &[NamespaceDecl], prefix: Option<&str>) -> Option<String> {
    scope
        .iter()
        .rev()
        .find(|b| b.prefix.as_deref() == prefix)
        .map(|b| b.uri.clone())
}

fn unbound(prefix: &str) -> ProtocolError {
    ProtocolError::XmlParse(format!("unbound namespace prefix '{prefix}'"))
}
