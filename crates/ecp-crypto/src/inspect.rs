//! PEM inspection.
//!
//! Reads signing requests and certificates back with `x509-parser`, both to
//! check what was generated and to recognise certificate material returned
//! by a server.

use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::oid_registry::{
    OID_PKCS1_SHA256WITHRSA, OID_PKCS1_SHA384WITHRSA, OID_PKCS1_SHA512WITHRSA,
};
use x509_parser::pem::{parse_x509_pem, Pem};
use x509_parser::prelude::FromDer;
use x509_parser::x509::AttributeTypeAndValue;

use crate::csr::CsrDigest;
use crate::error::{CsrError, CsrResult};

/// Subject and signature details of a signing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrDetails {
    /// `CN`
    pub common_name: Option<String>,
    /// `OU`
    pub organizational_unit: Option<String>,
    /// `O`
    pub organization: Option<String>,
    /// `L`
    pub locality: Option<String>,
    /// `ST`
    pub state: Option<String>,
    /// `C`
    pub country: Option<String>,
    /// Full subject in RFC 4514 form.
    pub subject: String,
    /// Signature digest, if it is one this crate produces.
    pub digest: Option<CsrDigest>,
}

/// Summary of a certificate found in a PEM document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// Subject in RFC 4514 form.
    pub subject: String,
    /// Issuer in RFC 4514 form.
    pub issuer: String,
    /// End of validity, RFC 2822 formatted.
    pub not_after: String,
}

/// Parses a PEM signing request and verifies its self-signature.
///
/// # Errors
///
/// Fails if the text is not a `CERTIFICATE REQUEST` PEM block, the DER does
/// not parse, or the signature does not verify.
pub fn inspect_csr(pem: &str) -> CsrResult<CsrDetails> {
    let (_, block) =
        parse_x509_pem(pem.as_bytes()).map_err(|e| CsrError::InvalidPem(e.to_string()))?;
    if block.label != "CERTIFICATE REQUEST" {
        return Err(CsrError::InvalidPem(format!(
            "expected CERTIFICATE REQUEST, found {}",
            block.label
        )));
    }

    let (_, request) = X509CertificationRequest::from_der(&block.contents)
        .map_err(|e| CsrError::InvalidPem(e.to_string()))?;
    request
        .verify_signature()
        .map_err(|e| CsrError::Verification(e.to_string()))?;

    let subject = &request.certification_request_info.subject;
    let algorithm = &request.signature_algorithm.algorithm;
    let digest = if *algorithm == OID_PKCS1_SHA256WITHRSA {
        Some(CsrDigest::Sha256)
    } else if *algorithm == OID_PKCS1_SHA384WITHRSA {
        Some(CsrDigest::Sha384)
    } else if *algorithm == OID_PKCS1_SHA512WITHRSA {
        Some(CsrDigest::Sha512)
    } else {
        None
    };

    Ok(CsrDetails {
        common_name: first(subject.iter_common_name()),
        organizational_unit: first(subject.iter_organizational_unit()),
        organization: first(subject.iter_organization()),
        locality: first(subject.iter_locality()),
        state: first(subject.iter_state_or_province()),
        country: first(subject.iter_country()),
        subject: subject.to_string(),
        digest,
    })
}

/// Finds every well-formed X.509 certificate in a PEM document.
///
/// Blocks with other labels (keys, requests) are skipped, and so are
/// certificate blocks whose DER does not parse.
#[must_use]
pub fn find_certificates(text: &str) -> Vec<CertificateSummary> {
    Pem::iter_from_buffer(text.as_bytes())
        .map_while(Result::ok)
        .filter(|block| block.label == "CERTIFICATE")
        .filter_map(|block| {
            let cert = block.parse_x509().ok()?;
            Some(CertificateSummary {
                subject: cert.subject().to_string(),
                issuer: cert.issuer().to_string(),
                not_after: cert.validity().not_after.to_rfc2822().unwrap_or_default(),
            })
        })
        .collect()
}

fn first<'a, 'b>(mut values: impl Iterator<Item = &'a AttributeTypeAndValue<'b>>) -> Option<String>
where
    'b: 'a,
{
    values
        .next()
        .and_then(|v| v.as_str().ok())
        .map(str::to_string)
}
