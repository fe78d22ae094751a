//! ECP handshake scenarios against mock SP and IdP servers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ecp_client::{
    CertificateConfig, CertificateExchange, ClientOptions, Credentials, EcpConfig, EcpOrchestrator,
    ErrorKind, HandshakeState, ReqwestTransport,
};
use ecp_crypto::CsrGenerator;
use ecp_protocol::{PAOS_HEADER_VALUE, PAOS_MEDIA_TYPE, SAML_STATUS_SUCCESS};

use crate::common::{
    header, idp_success, issued_certificate, paos_request, Federation, ACS_PATH, CERT_PATH,
    SESSION_COOKIE,
};

fn orchestrator() -> anyhow::Result<EcpOrchestrator> {
    let config = EcpConfig::default();
    Ok(EcpOrchestrator::builder()
        .transport(Arc::new(ReqwestTransport::new(&config.http)?))
        .http_config(config.http)
        .build()?)
}

fn options(federation: &Federation) -> ClientOptions {
    ClientOptions::new(
        federation.sp_url(),
        federation.idp_url(),
        Credentials::new("alice", "hunter2"),
    )
}

/// Scenario B: the SP accepts the assertion and sets a session cookie.
#[tokio::test]
async fn test_session_established() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation.mount_paos_request(1).await;
    federation
        .mount_idp_response(&federation.acs_url(), SAML_STATUS_SUCCESS, 1)
        .await;
    federation.mount_acs(1).await;

    let mut orchestrator = orchestrator()?;
    let session = orchestrator.establish(&options(&federation)).await?;

    assert_eq!(orchestrator.state(), HandshakeState::SessionEstablished);
    assert_eq!(session.cookies().as_str(), SESSION_COOKIE);
    assert_eq!(session.response_consumer_url(), federation.acs_url());

    let sp_get = &federation.sp_requests(CERT_PATH).await[0];
    assert_eq!(header(sp_get, "paos"), Some(PAOS_HEADER_VALUE));
    assert!(header(sp_get, "accept").is_some_and(|v| v.contains(PAOS_MEDIA_TYPE)));

    let idp_post = &federation.idp_requests().await[0];
    let expected = format!("Basic {}", STANDARD.encode("alice:hunter2"));
    assert_eq!(header(idp_post, "authorization"), Some(expected.as_str()));
    assert_eq!(header(idp_post, "cookie"), None);
    let body = String::from_utf8(idp_post.body.clone())?;
    assert!(body.contains("AuthnRequest"));
    assert!(!body.contains("paos:Request"), "PAOS header must be stripped");

    let acs_post = &federation.sp_requests(ACS_PATH).await[0];
    assert_eq!(header(acs_post, "content-type"), Some(PAOS_MEDIA_TYPE));
    let body = String::from_utf8(acs_post.body.clone())?;
    assert!(body.contains("ss:mem:relay"));
    assert!(body.contains("Response"));
    assert!(!body.contains("paos:Request"));
    assert!(!body.contains("ecp:Response"));
    Ok(())
}

/// Scenario A: the SP answers with a login page instead of a PAOS request.
#[tokio::test]
async fn test_sp_without_ecp_support() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_raw("<html><body>Login</body></html>", "text/html"),
        )
        .expect(1)
        .mount(&federation.sp)
        .await;
    federation.forbid_idp().await;

    let mut orchestrator = orchestrator()?;
    let err = orchestrator
        .establish(&options(&federation))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(err.to_string().contains("SP does not support ECP"));
    assert_eq!(orchestrator.state(), HandshakeState::Failed);
    Ok(())
}

/// Scenario D: the IdP rejects the credentials.
#[tokio::test]
async fn test_bad_credentials() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation.mount_paos_request(1).await;
    federation.mount_idp_status(401, 1).await;
    federation.mount_acs(0).await;

    let mut orchestrator = orchestrator()?;
    let err = orchestrator
        .establish(&options(&federation))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!err.to_string().contains("hunter2"));
    Ok(())
}

/// The IdP names a different consumer than the SP asked for.
#[tokio::test]
async fn test_consumer_url_mismatch() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation.mount_paos_request(1).await;
    federation
        .mount_idp_response("https://evil.example/acs", SAML_STATUS_SUCCESS, 1)
        .await;
    federation.mount_acs(0).await;

    let mut orchestrator = orchestrator()?;
    let err = orchestrator
        .establish(&options(&federation))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(err.to_string().contains("mismatch"));
    assert!(orchestrator.cookies().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cookies_accumulate_across_sp_responses() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation
        .mount_paos_request_with(
            paos_request(&federation.acs_url(), None),
            Some("_opensaml_req_ss%3Amem%3A1=_a1; path=/"),
            1,
        )
        .await;
    federation
        .mount_idp_response(&federation.acs_url(), SAML_STATUS_SUCCESS, 1)
        .await;
    federation.mount_acs(1).await;
    federation.mount_certificate(200, issued_certificate(), 1).await;

    let mut orchestrator = orchestrator()?;
    let session = orchestrator.establish(&options(&federation)).await?;

    let both = format!("_opensaml_req_ss%3Amem%3A1=_a1; {SESSION_COOKIE}");
    assert_eq!(session.cookies().as_str(), both);

    let (csr, key) = CsrGenerator::new(EcpConfig::default().csr).generate("ignoreMe")?;
    CertificateExchange::new(orchestrator.exchange().clone(), CertificateConfig::default())
        .fetch_certificate(&session, &csr, &key)
        .await?;
    let certificate_post = federation
        .sp_requests(CERT_PATH)
        .await
        .into_iter()
        .find(|r| r.method.as_str() == "POST")
        .ok_or_else(|| anyhow::anyhow!("no certificate request"))?;
    assert_eq!(
        header(&certificate_post, "cookie"),
        Some(format!("{both}; CSRF=fetchMyCertificate").as_str())
    );
    let acs_post = &federation.sp_requests(ACS_PATH).await[0];
    assert_eq!(
        header(acs_post, "cookie"),
        Some("_opensaml_req_ss%3Amem%3A1=_a1")
    );
    assert_eq!(header(&federation.idp_requests().await[0], "cookie"), None);

    let body = String::from_utf8(acs_post.body.clone())?;
    assert!(!body.contains("RelayState"));
    Ok(())
}

#[tokio::test]
async fn test_attempts_use_distinct_message_ids() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation.mount_paos_request(2).await;
    federation
        .mount_idp_response(&federation.acs_url(), SAML_STATUS_SUCCESS, 2)
        .await;
    federation.mount_acs(2).await;

    let first = orchestrator()?.establish(&options(&federation)).await?;
    let second = orchestrator()?.establish(&options(&federation)).await?;

    assert_ne!(first.message_id(), second.message_id());
    assert_eq!(first.cookies(), second.cookies());
    Ok(())
}

#[tokio::test]
async fn test_invalid_url_sends_nothing() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation.mount_paos_request(0).await;
    federation.forbid_idp().await;

    let mut orchestrator = orchestrator()?;
    let err = orchestrator
        .establish(&ClientOptions::new(
            federation.sp_url(),
            "idp.example/no-scheme",
            Credentials::new("alice", "hunter2"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_sp_is_transport_error() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation.forbid_idp().await;

    // Nothing listens on the discard port.
    let mut orchestrator = orchestrator()?;
    let err = orchestrator
        .establish(&ClientOptions::new(
            "http://127.0.0.1:9/secure",
            federation.idp_url(),
            Credentials::new("alice", "hunter2"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    Ok(())
}

#[tokio::test]
async fn test_idp_saml_failure_status() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    federation.mount_paos_request(1).await;
    federation
        .mount_idp_response(
            &federation.acs_url(),
            "urn:oasis:names:tc:SAML:2.0:status:Requester",
            1,
        )
        .await;
    federation.mount_acs(0).await;

    let err = orchestrator()?
        .establish(&options(&federation))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    Ok(())
}

#[tokio::test]
async fn test_idp_success_fixture_is_well_formed() -> anyhow::Result<()> {
    let codec = ecp_protocol::MessageCodec::default();
    let envelope = codec.decode_envelope(idp_success("https://sp/acs").as_bytes())?;
    let header = codec
        .paos_response(&envelope)?
        .ok_or_else(|| anyhow::anyhow!("no ecp:Response"))?;
    assert_eq!(header.response_consumer_url(), "https://sp/acs");
    Ok(())
}

#[tokio::test]
async fn test_stalled_sp_times_out_as_transport_error() -> anyhow::Result<()> {
    let federation = Federation::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_raw(paos_request(&federation.acs_url(), None), PAOS_MEDIA_TYPE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&federation.sp)
        .await;
    federation.forbid_idp().await;

    let mut config = EcpConfig::default();
    config.http.idle_timeout = Duration::from_millis(300);
    let mut orchestrator = EcpOrchestrator::builder()
        .transport(Arc::new(ReqwestTransport::new(&config.http)?))
        .http_config(config.http)
        .build()?;

    let started = Instant::now();
    let err = orchestrator
        .establish(&options(&federation))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(orchestrator.state(), HandshakeState::Failed);
    Ok(())
}
