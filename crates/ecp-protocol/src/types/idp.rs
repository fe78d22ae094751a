//! Identity provider entries.

use quick_xml::escape::escape;

use super::SAMLP_NS;
use crate::error::ProtocolResult;
use crate::xml::{QName, XmlElement};

/// A known identity provider (`samlp:IDPEntry`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpEntry {
    /// Provider identifier used to select this IdP.
    pub provider_id: String,
    /// Display name.
    pub name: Option<String>,
    /// ECP/SOAP login endpoint.
    pub login_url: Option<String>,
}

impl IdpEntry {
    /// Element name of an entry.
    #[must_use]
    pub fn element_name() -> QName {
        QName::new(SAMLP_NS, "IDPEntry")
    }

    /// Element name of an entry list.
    #[must_use]
    pub fn list_element_name() -> QName {
        QName::new(SAMLP_NS, "IDPList")
    }

    /// Creates an entry with a login endpoint.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, login_url: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            name: None,
            login_url: Some(login_url.into()),
        }
    }

    /// Creates an entry whose identifier is its own login URL.
    #[must_use]
    pub fn from_url(login_url: impl Into<String>) -> Self {
        let url = login_url.into();
        Self::new(url.clone(), url)
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds an entry from a parsed `IDPEntry` element.
    ///
    /// # Errors
    ///
    /// Fails if `ProviderID` is missing.
    pub fn from_element(element: &XmlElement) -> ProtocolResult<Self> {
        Ok(Self {
            provider_id: element.required_attribute("ProviderID")?.to_string(),
            name: element.attribute("Name").map(str::to_string),
            login_url: element.attribute("Loc").map(str::to_string),
        })
    }

    /// Serializes the entry with the `samlp` prefix, without declaring it.
    #[must_use]
    pub fn to_xml_fragment(&self) -> String {
        let mut xml = format!(
            r#"<samlp:IDPEntry ProviderID="{}""#,
            escape(self.provider_id.as_str())
        );
        if let Some(name) = &self.name {
            xml.push_str(&format!(r#" Name="{}""#, escape(name.as_str())));
        }
        if let Some(loc) = &self.login_url {
            xml.push_str(&format!(r#" Loc="{}""#, escape(loc.as_str())));
        }
        xml.push_str("/>");
        xml
    }

    /// Serializes the entry as a standalone element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        self.to_xml_fragment()
            .replacen("<samlp:IDPEntry", &format!(r#"<samlp:IDPEntry xmlns:samlp="{SAMLP_NS}""#), 1)
    }
}

/// Serializes a list of entries as a `samlp:IDPList` document element.
#[must_use]
pub fn idp_list_to_xml(entries: &[IdpEntry]) -> String {
    let mut xml = format!(r#"<samlp:IDPList xmlns:samlp="{SAMLP_NS}">"#);
    for entry in entries {
        xml.push_str(&entry.to_xml_fragment());
    }
    xml.push_str("</samlp:IDPList>");
    xml
}
