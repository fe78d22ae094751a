//! End-to-end tests for the ECP client.
//!
//! These run the real `reqwest` transport against `wiremock` servers
//! playing the SP and the IdP.

mod common;
mod certificate;
mod handshake;
