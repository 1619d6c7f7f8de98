//! Token Transport
//!
//! Stateless HTTP mapping for the token backend. No caching and no retries
//! here; retry policy belongs to the cache handler.

mod backend;
mod payload;

pub use backend::BackendTokenClient;

/// HTTP client shared by every component of one process
pub type HttpClient = reqwest::Client;

use std::time::Duration;

use anyhow::{Context, Result};
use spotmux_core::{BrokerConfig, TransportError};

const USER_AGENT: &str = concat!("SpotMux/", env!("CARGO_PKG_VERSION"));

/// Longest response excerpt kept in error messages
const BODY_EXCERPT_LEN: usize = 200;

/// Build the shared HTTP client with the configured request timeout
pub fn http_client(config: &BrokerConfig) -> Result<reqwest::Client> {
    build_http_client(config.request_timeout)
}

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Map a reqwest failure onto the transport taxonomy
pub(crate) fn transport_error(err: &reqwest::Error) -> TransportError {
    let status = err.status().map(|s| s.as_u16());
    if err.is_timeout() {
        TransportError::timeout(format!("request timed out: {}", err))
    } else if err.is_connect() {
        TransportError::connect(format!("connection failed: {}", err))
    } else if err.is_decode() {
        TransportError::malformed(status, format!("failed to decode response: {}", err))
    } else {
        TransportError::other(status, err.to_string())
    }
}

/// Trim a response body for inclusion in an error message
pub(crate) fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let cut: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{}…", cut)
}
