//! Wire shapes for the token backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spotmux_core::{TokenRecord, TransportError};
use tracing::warn;

/// Token set as returned by the backend
#[derive(Debug, Deserialize)]
pub(crate) struct TokenPayload {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix seconds; some writers store it as a float
    #[serde(default)]
    pub expires_at: Option<f64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenPayload {
    /// Convert to a record. `requested_at` stands in for issuance time when
    /// only a relative lifetime is present.
    pub fn into_record(
        self,
        requested_at: DateTime<Utc>,
        status: u16,
    ) -> Result<TokenRecord, TransportError> {
        if self.access_token.trim().is_empty() {
            return Err(TransportError::malformed(
                Some(status),
                "token payload has an empty access_token",
            ));
        }

        let refresh_token = self.refresh_token.filter(|t| !t.trim().is_empty());

        let mut record = match (self.expires_at, self.expires_in) {
            (Some(at), _) => {
                let expires_at = DateTime::<Utc>::from_timestamp(at.trunc() as i64, 0)
                    .ok_or_else(|| {
                        TransportError::malformed(
                            Some(status),
                            format!("expires_at out of range: {}", at),
                        )
                    })?;
                TokenRecord::new(self.access_token, refresh_token, expires_at)
            }
            (None, Some(secs)) => {
                TokenRecord::from_grant(self.access_token, refresh_token, Some(secs), requested_at)
            }
            (None, None) => {
                // No way to judge freshness; force a refresh before first use
                warn!("[Transport] Token payload has no expiry, treating it as expired");
                TokenRecord::new(self.access_token, refresh_token, requested_at)
            }
        };

        record.scope = self.scope.filter(|s| !s.trim().is_empty());
        if let Some(token_type) = self.token_type.filter(|t| !t.is_empty()) {
            record.token_type = token_type;
        }
        Ok(record)
    }
}

/// Body of `POST /spotify/mcp-token`.
///
/// `expires_at` pins the expiry so a backend that echoes the body back does
/// not restart the lifetime at fetch time.
#[derive(Debug, Serialize)]
pub(crate) struct StoreTokensBody<'a> {
    pub access_token: &'a str,
    pub refresh_token: Option<&'a str>,
    pub expires_in: i64,
    /// Unix seconds
    pub expires_at: i64,
}

impl<'a> StoreTokensBody<'a> {
    pub fn from_record(record: &'a TokenRecord, now: DateTime<Utc>) -> Self {
        Self {
            access_token: &record.access_token,
            refresh_token: record.refresh_token.as_deref(),
            expires_in: record.expires_in_secs(now),
            expires_at: record.expires_at.timestamp(),
        }
    }
}

/// Body of `POST /spotify/token`
#[derive(Debug, Serialize)]
pub(crate) struct ExchangeCodeBody<'a> {
    pub code: &'a str,
}
