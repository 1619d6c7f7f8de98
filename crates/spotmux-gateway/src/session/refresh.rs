//! Refresh grant against the provider token endpoint

use chrono::{DateTime, Utc};
use oauth2::basic::BasicErrorResponse;
use reqwest::StatusCode;
use serde::Deserialize;
use spotmux_core::{ClientSecret, RefreshFailure, TransportError};
use tracing::{debug, warn};

use crate::transport::{excerpt, transport_error};

/// Successful refresh grant response
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    pub access_token: String,
    /// Present only when the provider rotated the refresh token
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    /// When the grant request was sent
    pub issued_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct GrantResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

/// Client for `grant_type=refresh_token` with HTTP Basic client credentials
#[derive(Clone)]
pub struct ProviderTokenClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: ClientSecret,
}

impl ProviderTokenClient {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: ClientSecret,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshGrant, RefreshFailure> {
        if refresh_token.trim().is_empty() {
            return Err(RefreshFailure::MissingRefreshToken);
        }

        let issued_at = Utc::now();
        debug!(token_url = %self.token_url, "[Session] Sending refresh grant");

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose()))
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| RefreshFailure::Transport(transport_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RefreshFailure::Transport(transport_error(&e)))?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        let grant: GrantResponse = serde_json::from_str(&body).map_err(|e| {
            RefreshFailure::Transport(TransportError::malformed(
                Some(status.as_u16()),
                format!("invalid refresh grant response: {}", e),
            ))
        })?;

        if grant.access_token.trim().is_empty() {
            return Err(RefreshFailure::Transport(TransportError::malformed(
                Some(status.as_u16()),
                "refresh grant returned an empty access_token",
            )));
        }

        Ok(RefreshGrant {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.filter(|t| !t.trim().is_empty()),
            expires_in: grant.expires_in,
            scope: grant.scope.filter(|s| !s.trim().is_empty()),
            issued_at,
        })
    }
}

/// Rate limits and server errors stay transport failures; an OAuth error
/// body on any other status is a rejection.
fn classify_failure(status: StatusCode, body: &str) -> RefreshFailure {
    let code = status.as_u16();
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        warn!(status = code, "[Session] Provider unavailable for refresh grant");
        return RefreshFailure::Transport(TransportError::status(code, excerpt(body)));
    }

    match serde_json::from_str::<BasicErrorResponse>(body) {
        Ok(error) => {
            warn!(
                status = code,
                error = %error.error(),
                "[Session] Provider rejected refresh grant"
            );
            RefreshFailure::Rejected {
                error: error.error().to_string(),
                description: error.error_description().cloned(),
            }
        }
        Err(_) => RefreshFailure::Transport(TransportError::status(code, excerpt(body))),
    }
}

impl std::fmt::Debug for ProviderTokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTokenClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}
