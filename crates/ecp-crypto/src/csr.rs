//! PKCS#10 signing request generation.
//!
//! Every call produces a fresh RSA key pair from the operating system's
//! secure random source. The request is self-signed with that key and
//! returned as PEM together with a handle to the private key, which the
//! caller needs again when the issued certificate arrives.

use std::fmt;

use rand_core::OsRng;
use rcgen::{CertificateParams, DnType, KeyPair};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};

use crate::error::{CsrError, CsrResult};

/// Default RSA modulus size.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Digest used for the request signature.
///
/// MD5 is deliberately absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsrDigest {
    /// RSA PKCS#1 v1.5 with SHA-256.
    #[default]
    Sha256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    Sha384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    Sha512,
}

impl CsrDigest {
    /// Returns the digest name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    fn signature_algorithm(self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            Self::Sha256 => &rcgen::PKCS_RSA_SHA256,
            Self::Sha384 => &rcgen::PKCS_RSA_SHA384,
            Self::Sha512 => &rcgen::PKCS_RSA_SHA512,
        }
    }
}

impl fmt::Display for CsrDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed subject fields placed next to the caller's common name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistinguishedNameTemplate {
    /// `OU`
    pub organizational_unit: String,
    /// `O`
    pub organization: String,
    /// `L`
    pub locality: String,
    /// `ST`
    pub state: String,
    /// `C`, two letters.
    pub country: String,
}

impl Default for DistinguishedNameTemplate {
    fn default() -> Self {
        Self {
            organizational_unit: "NCEAS".to_string(),
            organization: "UCSB".to_string(),
            locality: "Santa Barbara".to_string(),
            state: "California".to_string(),
            country: "US".to_string(),
        }
    }
}

/// Signing request generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrConfig {
    /// Signature digest.
    pub digest: CsrDigest,
    /// RSA modulus size in bits.
    pub key_bits: usize,
    /// Subject template.
    pub subject: DistinguishedNameTemplate,
}

impl Default for CsrConfig {
    fn default() -> Self {
        Self {
            digest: CsrDigest::default(),
            key_bits: DEFAULT_KEY_BITS,
            subject: DistinguishedNameTemplate::default(),
        }
    }
}

/// A signed PKCS#10 request.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pem: String,
    common_name: String,
    digest: CsrDigest,
}

impl SigningRequest {
    /// PEM encoding (`CERTIFICATE REQUEST`).
    #[must_use]
    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// Subject common name.
    #[must_use]
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// Digest the request was signed with.
    #[must_use]
    pub const fn digest(&self) -> CsrDigest {
        self.digest
    }
}

/// The private half of a generated key pair.
///
/// Debug output never includes key material.
pub struct PrivateKeyHandle {
    key: RsaPrivateKey,
}

impl PrivateKeyHandle {
    /// Key size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        use rsa::traits::PublicKeyParts;
        self.key.size() * 8
    }

    /// PKCS#1 PEM (`RSA PRIVATE KEY`), the form placed in client bundles.
    ///
    /// # Errors
    ///
    /// Fails if the key cannot be encoded.
    pub fn to_pkcs1_pem(&self) -> CsrResult<String> {
        self.key
            .to_pkcs1_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| CsrError::Encoding(e.to_string()))
    }
}

impl fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyHandle")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Generates key pairs and signing requests.
#[derive(Debug, Clone, Default)]
pub struct CsrGenerator {
    config: CsrConfig,
}

impl CsrGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new(config: CsrConfig) -> Self {
        Self { config }
    }

    /// Generator settings.
    #[must_use]
    pub const fn config(&self) -> &CsrConfig {
        &self.config
    }

    /// Generates a fresh key pair and a request for `common_name` signed
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation, encoding or signing fails. No
    /// partial request is ever returned.
    pub fn generate(&self, common_name: &str) -> CsrResult<(SigningRequest, PrivateKeyHandle)> {
        tracing::debug!(
            common_name,
            bits = self.config.key_bits,
            digest = %self.config.digest,
            "Generating signing request"
        );

        let key = RsaPrivateKey::new(&mut OsRng, self.config.key_bits)?;
        let pkcs8 = key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CsrError::Encoding(e.to_string()))?;
        let key_pair =
            KeyPair::from_pem_and_sign_algo(&pkcs8, self.config.digest.signature_algorithm())?;

        let params = self.params(common_name)?;
        let request = params.serialize_request(&key_pair)?;
        let pem = request.pem()?;

        Ok((
            SigningRequest {
                pem,
                common_name: common_name.to_string(),
                digest: self.config.digest,
            },
            PrivateKeyHandle { key },
        ))
    }

    fn params(&self, common_name: &str) -> CsrResult<CertificateParams> {
        let subject = &self.config.subject;
        let mut params = CertificateParams::new(Vec::<String>::new())?;
        params.distinguished_name.push(DnType::CommonName, common_name);
        params
            .distinguished_name
            .push(DnType::OrganizationalUnitName, subject.organizational_unit.as_str());
        params
            .distinguished_name
            .push(DnType::OrganizationName, subject.organization.as_str());
        params
            .distinguished_name
            .push(DnType::LocalityName, subject.locality.as_str());
        params
            .distinguished_name
            .push(DnType::StateOrProvinceName, subject.state.as_str());
        params
            .distinguished_name
            .push(DnType::CountryName, subject.country.as_str());
        Ok(params)
    }
}
