// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::CollectorConfig;

/// Create the shared HTTP client.
///
/// No client-wide timeout is set; every call site passes its own short
/// per-request timeout because the counterpart server is
/// attacker-controlled and may hang.
pub fn create_client(config: &CollectorConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(true)
        .build()?;
    Ok(client)
}
