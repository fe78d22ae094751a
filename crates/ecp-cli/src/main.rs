//! # ECP CLI
//!
//! Command-line certificate retrieval over SAML2 ECP.

#![forbid(unsafe_code)]

use clap::Parser;
use ecp_cli::{
    cli::{Cli, Command},
    commands::{run_config, run_csr, run_fetch, run_idps},
    output::error,
    CliConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error(&e.to_string());
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Fetch(args) => run_fetch(args, &config).await,
        Command::Idps => run_idps(&config),
        Command::Csr(args) => run_csr(args, &config),
        Command::Config(cmd) => run_config(cmd, &config, cli.config.as_deref()),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
