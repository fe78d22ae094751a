//! CLI configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ecp_client::{EcpConfig, StaticIdpDirectory};
use ecp_protocol::MessageCodec;
use serde::{Deserialize, Serialize};

use crate::{CliError, CliResult};

/// CLI configuration.
///
/// ```toml
/// default_idp = "protectnetwork"
/// sp_url = "https://cilogon.example/secure/getcert"
///
/// [idps]
/// protectnetwork = "https://idp.protectnetwork.org/protectnetwork-idp/profile/SAML2/SOAP/ECP"
///
/// [http]
/// request_timeout = "30s"
///
/// [certificate]
/// lifetime_hours = 24
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default SP URL.
    pub sp_url: Option<String>,

    /// Default IdP ID or URL.
    pub default_idp: Option<String>,

    /// Default user name.
    pub username: Option<String>,

    /// IDPList document with additional IdPs.
    pub metadata_file: Option<PathBuf>,

    /// Registered IdPs, ID to ECP endpoint URL.
    pub idps: BTreeMap<String, String>,

    /// Client settings.
    #[serde(flatten)]
    pub client: EcpConfig,
}

impl CliConfig {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::config_path()?, false),
        };

        if !path.exists() {
            if explicit {
                return Err(CliError::Config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CliError::Config(format!("failed to parse {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), idps = config.idps.len(), "Loaded configuration");
        Ok(config)
    }

    /// Gets the default configuration file path.
    pub fn config_path() -> CliResult<PathBuf> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| CliError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".ecp").join("ecp.toml"))
    }

    /// Builds the IdP directory: entries from `metadata_file` first, then the
    /// `[idps]` table, which wins on duplicate IDs.
    pub fn idp_directory(&self, codec: &MessageCodec) -> CliResult<StaticIdpDirectory> {
        let mut directory = match &self.metadata_file {
            Some(path) => {
                let document = std::fs::read(path).map_err(|e| {
                    CliError::Config(format!("cannot read IdP list {}: {e}", path.display()))
                })?;
                StaticIdpDirectory::from_idp_list(&document, codec)?
            }
            None => StaticIdpDirectory::new(),
        };
        directory.extend(&StaticIdpDirectory::from_urls(
            self.idps.iter().map(|(id, url)| (id.as_str(), url.as_str())),
        ));
        Ok(directory)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecp_client::IdpDirectory;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn parses_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
default_idp = "test"

[idps]
test = "https://idp.example/ecp"

[http]
request_timeout = "30s"

[certificate]
lifetime_hours = 24

[csr]
digest = "sha512"
"#
        )
        .unwrap();

        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.default_idp.as_deref(), Some("test"));
        assert_eq!(config.client.http.request_timeout, Duration::from_secs(30));
        assert_eq!(config.client.http.idle_timeout, Duration::from_secs(1));
        assert_eq!(config.client.certificate.lifetime_hours, 24);
        assert_eq!(config.client.certificate.csrf_token, "fetchMyCertificate");
        assert_eq!(config.client.csr.digest, ecp_crypto::CsrDigest::Sha512);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn directory_merges_metadata_and_table() {
        let mut metadata = tempfile::NamedTempFile::new().unwrap();
        write!(
            metadata,
            r#"<samlp:IDPList xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol">
                 <samlp:IDPEntry ProviderID="shared" Loc="https://old.example/ecp"/>
                 <samlp:IDPEntry ProviderID="listed" Loc="https://listed.example/ecp"/>
               </samlp:IDPList>"#
        )
        .unwrap();

        let config = CliConfig {
            metadata_file: Some(metadata.path().to_path_buf()),
            idps: BTreeMap::from([("shared".to_string(), "https://new.example/ecp".to_string())]),
            ..CliConfig::default()
        };
        let directory = config.idp_directory(&MessageCodec::default()).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(
            directory.lookup("shared").unwrap().login_url.as_deref(),
            Some("https://new.example/ecp")
        );
        assert!(directory.lookup("listed").is_some());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = CliConfig::default();
        config.idps.insert("a".to_string(), "https://a/ecp".to_string());
        let text = config.to_toml().unwrap();
        assert!(text.contains("[idps]"));
        assert!(text.contains("request_timeout = \"1m 40s\""));
    }
}
