//! Service factory for building the API client from configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::bling::BlingClient;

use super::config::Config;

const USER_AGENT: &str = "boleto-cli";

/// Build an HTTP client with an optional bearer token and a per-request timeout
pub fn build_http_client(token: Option<&str>, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Token contains characters not allowed in an HTTP header")?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("HTTP client configured with authentication");
    }

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()?;

    Ok(client)
}

/// Build the Bling client from configuration
pub fn build_bling_client(config: &Config) -> Result<BlingClient> {
    let client = build_http_client(config.token.as_deref(), config.timeout)?;
    Ok(BlingClient::new(client, Some(config.api_url.clone())))
}
