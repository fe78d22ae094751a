//! Certificate retrieval.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use ecp_client::{
    CertificateExchange, EcpOrchestrator, IdpDirectory, ReqwestTransport, SessionCookies,
};
use ecp_crypto::CsrGenerator;
use ecp_protocol::MessageCodec;

use crate::cli::FetchArgs;
use crate::output::{success, warning, PromptingCredentials};
use crate::{CliConfig, CliError, CliResult};

/// Runs the handshake, exchanges a fresh signing request and prints or
/// writes the PEM bundle.
pub async fn run_fetch(args: FetchArgs, config: &CliConfig) -> CliResult<()> {
    let mut client_config = config.client.clone();
    if let Some(cn) = &args.cn {
        client_config.certificate.common_name.clone_from(cn);
    }
    if let Some(hours) = args.lifetime {
        client_config.certificate.lifetime_hours = hours;
    }

    let sp_url = args
        .sp_url
        .or_else(|| config.sp_url.clone())
        .ok_or_else(|| {
            CliError::InvalidArgument("no SP URL given (argument, ECP_SP_URL or sp_url)".to_string())
        })?;

    let codec = MessageCodec::default();
    let directory = config.idp_directory(&codec)?;
    let idp = args
        .idp
        .or_else(|| config.default_idp.clone())
        .ok_or_else(|| {
            let known: Vec<String> = directory.entries().into_iter().map(|e| e.provider_id).collect();
            CliError::InvalidArgument(format!(
                "no IdP given (known IdPs: {})",
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            ))
        })?;

    let transport = Arc::new(ReqwestTransport::new(&client_config.http)?);
    let mut builder = EcpOrchestrator::builder()
        .transport(transport)
        .http_config(client_config.http.clone())
        .codec(codec)
        .credential_source(Arc::new(PromptingCredentials::new(args.username, args.password)))
        .idp_directory(Arc::new(directory));
    if let Some(endpoint) = args.endpoint {
        builder = builder.sp_endpoint(endpoint);
    }
    let mut orchestrator = builder.build()?;
    let session = orchestrator
        .authenticate(&sp_url, &idp, config.username.as_deref())
        .await?;
    tracing::info!(message_id = session.message_id(), "Session established");
    if let Some(notice) = missing_cookie_notice(session.cookies()) {
        warning(notice);
    }

    let (csr, key) =
        CsrGenerator::new(client_config.csr.clone()).generate(&client_config.certificate.common_name)?;
    let bundle = CertificateExchange::new(orchestrator.exchange().clone(), client_config.certificate)
        .fetch_certificate(&session, &csr, &key)
        .await?;

    match &args.out {
        Some(path) => {
            write_private(path, &bundle)?;
            success(&format!("Wrote key and certificate to {}", path.display()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bundle.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// Warning shown when the SP accepted the assertion without a session cookie.
fn missing_cookie_notice(cookies: &SessionCookies) -> Option<&'static str> {
    cookies
        .is_empty()
        .then_some("SP set no session cookie; the certificate service may refuse the request")
}

/// Writes `contents` readable by the owner only.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()
}
