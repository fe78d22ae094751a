//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ECP client - fetch an X.509 certificate through SAML2 ECP.
#[derive(Debug, Parser)]
#[command(name = "ecp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ~/.ecp/ecp.toml).
    #[arg(short, long, env = "ECP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authenticate and print the private key and certificate.
    Fetch(FetchArgs),

    /// List registered identity providers.
    Idps,

    /// Generate a signing request, or inspect one.
    Csr(CsrArgs),

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Fetch arguments.
///
/// Missing values are taken from the configuration or prompted for.
#[derive(Debug, clap::Args)]
pub struct FetchArgs {
    /// Certificate service URL at the SP.
    #[arg(env = "ECP_SP_URL")]
    pub sp_url: Option<String>,

    /// Registered IdP ID or the IdP's ECP endpoint URL.
    #[arg(env = "ECP_IDP")]
    pub idp: Option<String>,

    /// User name at the IdP.
    #[arg(env = "ECP_USERNAME")]
    pub username: Option<String>,

    /// Password (prompted for if not provided).
    #[arg(env = "ECP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Protected resource that starts the handshake, if not the SP URL.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Common name for the signing request (overrides config).
    #[arg(long)]
    pub cn: Option<String>,

    /// Requested certificate lifetime in hours (overrides config).
    #[arg(long)]
    pub lifetime: Option<u32>,

    /// Write the bundle to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// CSR arguments.
#[derive(Debug, clap::Args)]
pub struct CsrArgs {
    /// Common name (overrides config).
    #[arg(long)]
    pub cn: Option<String>,

    /// Inspect and verify a PEM signing request instead of generating one.
    #[arg(long, value_name = "FILE")]
    pub inspect: Option<PathBuf>,
}

/// Config commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,

    /// Print the configuration file path.
    Path,
}
