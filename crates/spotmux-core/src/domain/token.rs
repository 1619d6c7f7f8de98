//! Token record - the single shared OAuth session
//!
//! The backend holds exactly one record per identity. Every process reads it
//! fresh for each operation and replaces it after a refresh.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime assumed when a grant response omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// OAuth token pair with absolute expiry
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    /// Bearer credential for API calls
    pub access_token: String,

    /// Long-lived credential for the refresh grant
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Absolute expiry, computed from issuance time
    pub expires_at: DateTime<Utc>,

    /// Space-delimited granted scopes
    #[serde(default)]
    pub scope: Option<String>,

    /// Token type (usually "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl TokenRecord {
    /// Create a record with an absolute expiry
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at,
            scope: None,
            token_type: default_token_type(),
        }
    }

    /// Create a record from a grant response.
    ///
    /// `issued_at` is the instant the grant request was sent, so the stored
    /// expiry never outlives the provider's.
    pub fn from_grant(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let lifetime = expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS).max(0);
        Self::new(
            access_token,
            refresh_token,
            issued_at + Duration::seconds(lifetime),
        )
    }

    /// Set the granted scopes
    pub fn with_scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope;
        self
    }

    /// Check if the token is past its expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check if the token expires within `margin` of `now`
    pub fn expires_within(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - margin
    }

    /// Check if the token can be handed out: not inside the safety margin
    pub fn is_fresh(&self, margin: Duration, now: DateTime<Utc>) -> bool {
        !self.expires_within(margin, now)
    }

    /// Check if the record carries a usable refresh token
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// Remaining lifetime in whole seconds, never negative
    pub fn expires_in_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Build the replacement record after a successful refresh grant.
    ///
    /// Keeps the current refresh token unless the provider rotated it, keeps
    /// the current scope unless a new one was granted, and never moves the
    /// expiry backward.
    pub fn refreshed(
        &self,
        access_token: impl Into<String>,
        rotated_refresh_token: Option<String>,
        expires_in: Option<i64>,
        scope: Option<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let refresh_token = rotated_refresh_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.refresh_token.clone());

        let mut next = Self::from_grant(access_token, refresh_token, expires_in, issued_at);
        if next.expires_at < self.expires_at {
            next.expires_at = self.expires_at;
        }
        next.scope = scope.or_else(|| self.scope.clone());
        next.token_type = self.token_type.clone();
        next
    }

    /// Get scopes as a vector
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Compare granted scopes as sets (order and duplicates ignored)
    pub fn same_scope(&self, other: &TokenRecord) -> bool {
        let mut mine = self.scopes();
        let mut theirs = other.scopes();
        mine.sort_unstable();
        mine.dedup();
        theirs.sort_unstable();
        theirs.dedup();
        mine == theirs
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &redact(&self.access_token))
            .field(
                "refresh_token",
                &self.refresh_token.as_deref().map(redact),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Keep a short prefix for log correlation
fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}…", prefix)
}
