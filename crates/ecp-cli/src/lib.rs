//! # ecp-cli
//!
//! The `ecp` command: fetches a short-lived X.509 certificate from a
//! SAML2 ECP-protected certificate service.
//!
//! - `ecp fetch` - authenticate, submit a fresh signing request, print the
//!   private key and certificate
//! - `ecp idps` - list the IdPs known from the configuration
//! - `ecp csr` - generate or inspect a signing request
//! - `ecp config` - show the configuration

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
