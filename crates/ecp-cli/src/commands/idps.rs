//! IdP listing.

use ecp_client::IdpDirectory;
use ecp_protocol::MessageCodec;

use crate::output::info;
use crate::{CliConfig, CliResult};

/// Prints every registered IdP, one per line, as `ID<TAB>URL`.
pub fn run_idps(config: &CliConfig) -> CliResult<()> {
    let directory = config.idp_directory(&MessageCodec::default())?;
    let entries = directory.entries();
    if entries.is_empty() {
        info("No IdPs registered. Add an [idps] table or metadata_file to the configuration.");
        return Ok(());
    }
    for entry in entries {
        let location = entry.login_url.as_deref().unwrap_or("-");
        match entry.name.as_deref() {
            Some(name) => println!("{}\t{location}\t{name}", entry.provider_id),
            None => println!("{}\t{location}", entry.provider_id),
        }
    }
    Ok(())
}
