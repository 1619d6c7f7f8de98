//! OAuth Session Manager
//!
//! Turns the shared token record into a usable access token. The state is
//! derived from the cache on every call and never kept between calls.
//!
//! ```text
//! NoToken ──────────────────────────────► AuthenticationRequired
//! Valid ────────────────────────────────► access_token
//! Expired ─► RefreshInFlight ─┬─► Valid ─► save() ─► access_token
//!                             └─► RefreshFailed ─► ReauthenticationRequired
//! ```

mod refresh;

pub use refresh::{ProviderTokenClient, RefreshGrant};

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use oauth2::basic::BasicClient;
use oauth2::url::Url;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use spotmux_core::{BrokerConfig, CacheError, CacheHandler, SessionError, TokenRecord};
use tracing::{debug, error, info, warn};

/// Per-call session state, logged on each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoToken,
    Valid,
    Expired,
    RefreshInFlight,
    RefreshFailed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::NoToken => "no_token",
            SessionState::Valid => "valid",
            SessionState::Expired => "expired",
            SessionState::RefreshInFlight => "refresh_in_flight",
            SessionState::RefreshFailed => "refresh_failed",
        };
        f.write_str(name)
    }
}

/// Snapshot of the shared session, read without refreshing
#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    /// No record stored
    NotAuthenticated,
    /// Usable outside the safety margin
    Valid { expires_at: DateTime<Utc> },
    /// Inside the safety margin or past expiry
    Expired { refreshable: bool },
    /// The cache could not be read
    Unavailable { cause: CacheError },
}

/// Provider authorize endpoint parameters for the web sign-in flow
#[derive(Debug, Clone)]
struct AuthorizeParams {
    client_id: String,
    authorize_url: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

/// Keeps one access token valid on top of a `CacheHandler`
pub struct SessionManager {
    cache: Arc<dyn CacheHandler>,
    provider: ProviderTokenClient,
    authorize: AuthorizeParams,
    safety_margin: chrono::Duration,
}

impl SessionManager {
    pub fn new(config: &BrokerConfig, cache: Arc<dyn CacheHandler>, http: reqwest::Client) -> Self {
        let provider = ProviderTokenClient::new(
            http,
            config.token_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        );
        Self {
            cache,
            provider,
            authorize: AuthorizeParams {
                client_id: config.client_id.clone(),
                authorize_url: config.authorize_url.clone(),
                redirect_uri: config.redirect_uri.clone(),
                scopes: config.scopes.clone(),
            },
            safety_margin: config.safety_margin_chrono(),
        }
    }

    /// Return an access token that is valid beyond the safety margin
    pub async fn valid_token(&self) -> Result<String, SessionError> {
        self.valid_record().await.map(|record| record.access_token)
    }

    /// Like `valid_token`, but return the whole record
    pub async fn valid_record(&self) -> Result<TokenRecord, SessionError> {
        let record = match self.cache.get().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                log_state(SessionState::NoToken);
                return Err(SessionError::AuthenticationRequired);
            }
            Err(e) => {
                warn!(error = %e, "[Session] Token cache unavailable");
                return Err(SessionError::CacheUnavailable(e));
            }
        };

        let now = Utc::now();
        if record.is_fresh(self.safety_margin, now) {
            log_state(SessionState::Valid);
            return Ok(record);
        }

        log_state(SessionState::Expired);
        debug!(
            expires_at = %record.expires_at,
            expired = record.is_expired_at(now),
            "[Session] Token inside safety margin"
        );
        self.refresh(record).await
    }

    async fn refresh(&self, current: TokenRecord) -> Result<TokenRecord, SessionError> {
        log_state(SessionState::RefreshInFlight);

        let refresh_token = current.refresh_token.as_deref().unwrap_or_default();
        let grant = match self.provider.refresh(refresh_token).await {
            Ok(grant) => grant,
            Err(cause) => {
                log_state(SessionState::RefreshFailed);
                warn!(cause = %cause, "[Session] Refresh failed, re-authentication required");
                return Err(SessionError::ReauthenticationRequired { cause });
            }
        };

        // Built in full before the write so a dropped future never saves half a record
        let next = current.refreshed(
            grant.access_token,
            grant.refresh_token,
            grant.expires_in,
            grant.scope,
            grant.issued_at,
        );
        if !next.same_scope(&current) {
            info!(
                scope = next.scope.as_deref().unwrap_or(""),
                "[Session] Granted scope changed on refresh"
            );
        }

        if let Err(e) = self.cache.save(&next).await {
            // The fresh token is still good for this caller
            error!(error = %e, "[Session] Failed to store refreshed token");
        }

        log_state(SessionState::Valid);
        info!(expires_at = %next.expires_at, "[Session] Access token refreshed");
        Ok(next)
    }

    /// Read the shared record without refreshing it
    pub async fn status(&self) -> AuthStatus {
        match self.cache.get().await {
            Ok(None) => AuthStatus::NotAuthenticated,
            Ok(Some(record)) if record.is_fresh(self.safety_margin, Utc::now()) => {
                AuthStatus::Valid {
                    expires_at: record.expires_at,
                }
            }
            Ok(Some(record)) => AuthStatus::Expired {
                refreshable: record.can_refresh(),
            },
            Err(cause) => AuthStatus::Unavailable { cause },
        }
    }

    /// Build the provider authorize URL for the out-of-band web flow
    pub fn authorization_url(&self) -> Result<(Url, CsrfToken)> {
        let client = BasicClient::new(ClientId::new(self.authorize.client_id.clone()))
            .set_auth_uri(
                AuthUrl::new(self.authorize.authorize_url.clone())
                    .context("Invalid authorize URL")?,
            )
            .set_redirect_uri(
                RedirectUrl::new(self.authorize.redirect_uri.clone())
                    .context("Invalid redirect URI")?,
            );

        let (url, state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.authorize.scopes.iter().cloned().map(Scope::new))
            .url();
        Ok((url, state))
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("provider", &self.provider)
            .field("safety_margin", &self.safety_margin)
            .finish()
    }
}

fn log_state(state: SessionState) {
    debug!(state = %state, "[Session] State");
}
