//! # ecp-crypto
//!
//! Key pairs and PKCS#10 signing requests for certificate issuance.
//!
//! - Fresh 2048-bit RSA key per request, from the operating system's
//!   random source (`rsa` + `rand_core::OsRng`)
//! - Requests built and self-signed with `rcgen`
//! - Signature digests: SHA-256 (default), SHA-384, SHA-512. MD5 is not
//!   supported
//! - PEM inspection with `x509-parser`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod csr;
pub mod error;
pub mod inspect;

pub use csr::{
    CsrConfig, CsrDigest, CsrGenerator, DistinguishedNameTemplate, PrivateKeyHandle,
    SigningRequest, DEFAULT_KEY_BITS,
};
pub use error::{CsrError, CsrResult};
pub use inspect::{find_certificates, inspect_csr, CertificateSummary, CsrDetails};
