//! # ecp-client
//!
//! SAML2 ECP client: authenticates a user at an identity provider on behalf
//! of a service provider without a browser, then trades the resulting SP
//! session for an X.509 certificate.
//!
//! ## Modules
//!
//! - [`orchestrator`] - the SP -> IdP -> SP handshake state machine
//! - [`certificate`] - signing request submission and bundle assembly
//! - [`transport`] - HTTP abstraction and the `reqwest` implementation
//! - [`providers`] - credential sources and IdP directories
//! - [`cookie`] - session cookie accumulation
//! - [`flow`] - handshake states
//! - [`options`] - per-attempt endpoints and credentials
//! - [`config`] - timeouts and certificate settings
//! - [`error`] - error type and kinds
//!
//! ## Quick Start
//!
//! ```ignore
//! use ecp_client::{CertificateFetcher, EcpConfig};
//!
//! let fetcher = CertificateFetcher::new(EcpConfig::default())?;
//! let bundle = fetcher
//!     .authenticate(
//!         "https://cilogon.example/secure/getcert",
//!         "https://idp.example/idp/profile/SAML2/SOAP/ECP",
//!         "alice",
//!         &password,
//!     )
//!     .await?;
//! std::fs::write("usercert.pem", bundle)?;
//! ```
//!
//! ## Handshake
//!
//! | Step | Request | Expect |
//! |------|---------|--------|
//! | 1 | `GET` SP resource with `PAOS` and `Accept` headers | `paos:Request` envelope |
//! | 2 | `POST` `AuthnRequest` to IdP, HTTP Basic | `ecp:Response` with matching consumer URL |
//! | 3 | `POST` `Response` (+ `RelayState`) to consumer URL | session cookie |
//!
//! Requests are strictly sequential; each step depends on the previous one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod certificate;
pub mod config;
pub mod cookie;
pub mod error;
pub mod flow;
pub mod options;
pub mod orchestrator;
pub mod providers;
pub mod transport;

#[cfg(test)]
mod testing;

pub use certificate::{CertificateExchange, CertificateFetcher, FORM_CONTENT_TYPE};
pub use config::{CertificateConfig, EcpConfig, HttpConfig};
pub use cookie::SessionCookies;
pub use error::{EcpError, EcpResult, ErrorKind};
pub use flow::HandshakeState;
pub use options::{parse_http_url, ClientOptions};
pub use orchestrator::{EcpOrchestrator, EcpOrchestratorBuilder, EcpSession};
pub use providers::{
    resolve_idp, CredentialSource, Credentials, IdpDirectory, NoCredentials, StaticIdpDirectory,
};
pub use transport::{HttpExchange, HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
