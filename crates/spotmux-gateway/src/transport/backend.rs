//! HTTP client for the token backend's three endpoints

use chrono::Utc;
use reqwest::StatusCode;
use spotmux_core::{TokenRecord, TransportError};
use tracing::{debug, warn};

use super::payload::{ExchangeCodeBody, StoreTokensBody, TokenPayload};
use super::{excerpt, transport_error};

const MCP_TOKEN_PATH: &str = "/spotify/mcp-token";
const EXCHANGE_PATH: &str = "/spotify/token";

/// Stateless client for the token backend.
///
/// Timeouts come from the shared `reqwest::Client`; nothing here retries.
#[derive(Clone)]
pub struct BackendTokenClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendTokenClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /spotify/mcp-token`
    ///
    /// 404, 204, an empty body or a JSON `null` mean no record is stored.
    pub async fn fetch_tokens(&self) -> Result<Option<TokenRecord>, TransportError> {
        let url = self.url(MCP_TOKEN_PATH);
        let requested_at = Utc::now();
        debug!(url = %url, "[Transport] Fetching shared token");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
            debug!(status = status.as_u16(), "[Transport] No shared token stored");
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "[Transport] Token fetch failed");
            return Err(TransportError::status(status.as_u16(), excerpt(&body)));
        }

        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            debug!("[Transport] Backend returned an empty token body");
            return Ok(None);
        }

        let payload: TokenPayload = serde_json::from_str(trimmed).map_err(|e| {
            TransportError::malformed(
                Some(status.as_u16()),
                format!("invalid token payload: {}", e),
            )
        })?;

        let record = payload.into_record(requested_at, status.as_u16())?;
        debug!(
            expires_at = %record.expires_at,
            has_refresh_token = record.can_refresh(),
            "[Transport] Fetched shared token"
        );
        Ok(Some(record))
    }

    /// `POST /spotify/mcp-token` with `{access_token, refresh_token, expires_in}`
    pub async fn store_tokens(&self, record: &TokenRecord) -> Result<(), TransportError> {
        let url = self.url(MCP_TOKEN_PATH);
        let body = StoreTokensBody::from_record(record, Utc::now());
        debug!(url = %url, expires_in = body.expires_in, "[Transport] Storing shared token");

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "[Transport] Token store failed");
            return Err(TransportError::status(status.as_u16(), excerpt(&text)));
        }

        Ok(())
    }

    /// `POST /spotify/token` with `{code}`
    ///
    /// The backend performs the authorization-code grant and returns the new
    /// token set. An empty body is an error here, unlike on fetch.
    pub async fn exchange_auth_code(&self, code: &str) -> Result<TokenRecord, TransportError> {
        let url = self.url(EXCHANGE_PATH);
        let requested_at = Utc::now();
        debug!(url = %url, "[Transport] Exchanging authorization code");

        let response = self
            .http
            .post(&url)
            .json(&ExchangeCodeBody { code })
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "[Transport] Code exchange failed");
            return Err(TransportError::status(status.as_u16(), excerpt(&body)));
        }

        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(TransportError::malformed(
                Some(status.as_u16()),
                "code exchange returned an empty body",
            ));
        }

        let payload: TokenPayload = serde_json::from_str(trimmed).map_err(|e| {
            TransportError::malformed(
                Some(status.as_u16()),
                format!("invalid token payload: {}", e),
            )
        })?;
        payload.into_record(requested_at, status.as_u16())
    }
}

impl std::fmt::Debug for BackendTokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendTokenClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
