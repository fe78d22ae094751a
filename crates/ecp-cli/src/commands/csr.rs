//! Signing request commands.

use ecp_crypto::{inspect_csr, CsrDetails, CsrGenerator};

use crate::cli::CsrArgs;
use crate::output::success;
use crate::{CliConfig, CliResult};

/// Generates a signing request (the key is discarded) or inspects one.
pub fn run_csr(args: CsrArgs, config: &CliConfig) -> CliResult<()> {
    if let Some(path) = &args.inspect {
        let pem = std::fs::read_to_string(path)?;
        let details = inspect_csr(&pem)?;
        success("Signature verified");
        print_details(&details);
        return Ok(());
    }

    let common_name = args
        .cn
        .as_deref()
        .unwrap_or(&config.client.certificate.common_name);
    let (request, _key) = CsrGenerator::new(config.client.csr.clone()).generate(common_name)?;
    print!("{}", request.pem());
    Ok(())
}

fn print_details(details: &CsrDetails) {
    println!("subject: {}", details.subject);
    for (label, value) in [
        ("CN", &details.common_name),
        ("OU", &details.organizational_unit),
        ("O", &details.organization),
        ("L", &details.locality),
        ("ST", &details.state),
        ("C", &details.country),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
    match details.digest {
        Some(digest) => println!("digest: {digest}"),
        None => println!("digest: unknown"),
    }
}
