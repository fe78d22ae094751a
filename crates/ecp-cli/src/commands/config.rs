//! Configuration commands.

use std::path::Path;

use crate::cli::ConfigCommand;
use crate::output::info;
use crate::{CliConfig, CliResult};

/// Runs a config command.
pub fn run_config(cmd: ConfigCommand, config: &CliConfig, path: Option<&Path>) -> CliResult<()> {
    match cmd {
        ConfigCommand::Show => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => CliConfig::config_path()?,
            };
            info(&format!("Configuration file: {}", path.display()));
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Path => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => CliConfig::config_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
