//! Credential and IdP directory providers.
//!
//! The orchestrator never talks to a console or the file system. Whoever
//! builds it supplies a [`CredentialSource`] and an [`IdpDirectory`].

use std::collections::BTreeMap;
use std::fmt;

use ecp_protocol::{IdpEntry, MessageCodec};
use url::Url;

use crate::error::{EcpError, EcpResult};

/// A principal and its secret.
///
/// The secret is never shown by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    principal: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(principal: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            secret: secret.into(),
        }
    }

    /// The user name.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// The password.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("principal", &self.principal)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Supplies credentials for the IdP.
pub trait CredentialSource: Send + Sync {
    /// Returns credentials, optionally for a known principal.
    ///
    /// # Errors
    ///
    /// Returns [`EcpError::Config`] when no credentials can be obtained.
    fn credentials(&self, principal_hint: Option<&str>) -> EcpResult<Credentials>;
}

impl CredentialSource for Credentials {
    fn credentials(&self, _principal_hint: Option<&str>) -> EcpResult<Credentials> {
        Ok(self.clone())
    }
}

/// A source that has nothing to offer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn credentials(&self, _principal_hint: Option<&str>) -> EcpResult<Credentials> {
        Err(EcpError::Config("no credentials available".to_string()))
    }
}

/// Looks up identity providers by ID.
pub trait IdpDirectory: Send + Sync {
    /// Returns the entry registered under `id`.
    fn lookup(&self, id: &str) -> Option<IdpEntry>;

    /// Every registered entry.
    fn entries(&self) -> Vec<IdpEntry>;
}

/// Directory backed by an in-memory table.
///
/// Built from configuration or from an `IDPList` metadata document.
#[derive(Debug, Clone, Default)]
pub struct StaticIdpDirectory {
    entries: BTreeMap<String, IdpEntry>,
}

impl StaticIdpDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from `(id, login URL)` pairs.
    pub fn from_urls<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut directory = Self::new();
        for (id, url) in pairs {
            directory.insert(IdpEntry::new(id, url));
        }
        directory
    }

    /// Builds a directory from a `samlp:IDPList` document.
    ///
    /// # Errors
    ///
    /// Returns [`EcpError::Parse`] if the document is malformed or invalid.
    pub fn from_idp_list(document: &[u8], codec: &MessageCodec) -> EcpResult<Self> {
        let mut directory = Self::new();
        for entry in codec.decode_idp_list(document)? {
            directory.insert(entry);
        }
        tracing::debug!(entries = directory.entries.len(), "Loaded IdP list");
        Ok(directory)
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, entry: IdpEntry) {
        self.entries.insert(entry.provider_id.clone(), entry);
    }

    /// Adds every entry of another directory, replacing duplicates.
    pub fn extend(&mut self, other: &dyn IdpDirectory) {
        for entry in other.entries() {
            self.insert(entry);
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IdpDirectory for StaticIdpDirectory {
    fn lookup(&self, id: &str) -> Option<IdpEntry> {
        self.entries.get(id).cloned()
    }

    fn entries(&self) -> Vec<IdpEntry> {
        self.entries.values().cloned().collect()
    }
}

/// Resolves an IdP argument that is either a registered ID or a login URL.
///
/// # Errors
///
/// Returns [`EcpError::Config`] if the ID is unknown (the message lists the
/// known IDs) or the entry has no login location.
pub fn resolve_idp(directory: &dyn IdpDirectory, id_or_url: &str) -> EcpResult<IdpEntry> {
    if let Some(entry) = directory.lookup(id_or_url) {
        return match entry.login_url {
            Some(_) => Ok(entry),
            None => Err(EcpError::Config(format!(
                "IdP '{id_or_url}' has no login location"
            ))),
        };
    }

    if let Ok(url) = Url::parse(id_or_url) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(IdpEntry::from_url(id_or_url));
        }
    }

    let known: Vec<String> = directory
        .entries()
        .into_iter()
        .map(|e| e.provider_id)
        .collect();
    let known = if known.is_empty() {
        "none".to_string()
    } else {
        known.join(", ")
    };
    Err(EcpError::Config(format!(
        "unknown IdP '{id_or_url}' (known IdPs: {known})"
    )))
}
