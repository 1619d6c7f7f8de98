//! Broker configuration
//!
//! Read once at process start and shared by reference afterwards.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;
use zeroize::Zeroizing;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SAFETY_MARGIN_SECS: u64 = 60;
const DEFAULT_FETCH_ATTEMPTS: u32 = 2;
const DEFAULT_FETCH_BACKOFF_MS: u64 = 250;
const CACHE_FILE_NAME: &str = "token.json";
const FALLBACK_CACHE_FILE: &str = ".spotmux-token.json";

/// Scopes requested by the web sign-in flow
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-library-read",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-private",
    "playlist-modify-public",
];

/// OAuth client secret, wiped from memory on drop
#[derive(Clone)]
pub struct ClientSecret(Zeroizing<String>);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientSecret(***)")
    }
}

/// Process-wide broker configuration
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: ClientSecret,
    /// Redirect URI registered with the provider (normalized)
    pub redirect_uri: String,
    /// Token backend base URL; `None` selects the local file cache
    pub backend_url: Option<String>,
    /// Provider refresh-grant endpoint
    pub token_url: String,
    /// Provider authorization endpoint (web flow only)
    pub authorize_url: String,
    /// Music API base URL
    pub api_base_url: String,
    /// Bound on every outbound HTTP call
    pub request_timeout: Duration,
    /// Tokens expiring within this window are refreshed before use
    pub safety_margin: Duration,
    /// Attempts for the idempotent token fetch
    pub fetch_attempts: u32,
    /// Delay between fetch attempts
    pub fetch_backoff: Duration,
    /// Token file used when no backend is configured
    pub cache_path: PathBuf,
    /// Scopes requested by the web flow
    pub scopes: Vec<String>,
}

impl BrokerConfig {
    /// Create a config with defaults for everything but the client credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: &str,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: ClientSecret::new(client_secret),
            redirect_uri: normalize_redirect_uri(redirect_uri),
            backend_url: None,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            safety_margin: Duration::from_secs(DEFAULT_SAFETY_MARGIN_SECS),
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            fetch_backoff: Duration::from_millis(DEFAULT_FETCH_BACKOFF_MS),
            cache_path: default_cache_path(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build the config from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{} is not set", key));

        let mut config = Self::new(
            require("SPOTIFY_CLIENT_ID")?,
            require("SPOTIFY_CLIENT_SECRET")?,
            &require("SPOTIFY_REDIRECT_URI")?,
        );

        if let Some(url) = get("SPOTIFY_BACKEND_URL") {
            config = config.with_backend_url(url);
        }
        if let Some(url) = get("SPOTIFY_TOKEN_URL") {
            config.token_url = url;
        }
        if let Some(url) = get("SPOTIFY_AUTHORIZE_URL") {
            config.authorize_url = url;
        }
        if let Some(url) = get("SPOTIFY_API_BASE_URL") {
            config = config.with_api_base_url(url);
        }
        if let Some(path) = get("SPOTMUX_TOKEN_CACHE_PATH") {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(secs) = get("SPOTMUX_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number(&secs, "SPOTMUX_REQUEST_TIMEOUT_SECS")?);
        }
        if let Some(secs) = get("SPOTMUX_SAFETY_MARGIN_SECS") {
            config.safety_margin = Duration::from_secs(parse_number(&secs, "SPOTMUX_SAFETY_MARGIN_SECS")?);
        }
        if let Some(attempts) = get("SPOTMUX_FETCH_ATTEMPTS") {
            config.fetch_attempts = parse_number(&attempts, "SPOTMUX_FETCH_ATTEMPTS")?;
        }

        config.validate()?;
        debug!(
            backend_url = ?config.backend_url,
            request_timeout_secs = config.request_timeout.as_secs(),
            safety_margin_secs = config.safety_margin.as_secs(),
            "[Config] Loaded broker configuration"
        );
        Ok(config)
    }

    /// Use the remote token backend (trailing slashes are dropped)
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    pub fn with_fetch_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.fetch_attempts = attempts;
        self.fetch_backoff = backoff;
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Reject values that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            bail!("request timeout must be greater than zero");
        }
        if self.fetch_attempts == 0 {
            bail!("fetch attempts must be at least 1");
        }
        if let Some(url) = &self.backend_url {
            url::Url::parse(url).with_context(|| format!("invalid backend URL: {}", url))?;
        }
        url::Url::parse(&self.token_url)
            .with_context(|| format!("invalid token URL: {}", self.token_url))?;
        url::Url::parse(&self.redirect_uri)
            .with_context(|| format!("invalid redirect URI: {}", self.redirect_uri))?;
        Ok(())
    }

    /// Safety margin as a chrono duration for expiry arithmetic
    pub fn safety_margin_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.safety_margin).unwrap_or_else(|_| chrono::Duration::seconds(0))
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer, got '{}'", key, value))
}

/// Token file under the user cache directory, or the working directory
fn default_cache_path() -> PathBuf {
    cache_path_in(dirs::cache_dir())
}

fn cache_path_in(cache_dir: Option<PathBuf>) -> PathBuf {
    cache_dir
        .map(|dir| dir.join("spotmux").join(CACHE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_FILE))
}

/// Rewrite a `localhost` redirect host to `127.0.0.1`.
///
/// The provider no longer accepts `localhost` redirect URIs. Everything else
/// in the URI is kept byte-for-byte.
pub fn normalize_redirect_uri(uri: &str) -> String {
    let uri = uri.trim();
    let is_localhost = url::Url::parse(uri)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case("localhost")))
        .unwrap_or(false);

    if !is_localhost {
        return uri.to_string();
    }

    match uri.find("://") {
        Some(idx) => {
            let (scheme, rest) = uri.split_at(idx + 3);
            let host_len = "localhost".len();
            if rest.len() >= host_len && rest[..host_len].eq_ignore_ascii_case("localhost") {
                format!("{}127.0.0.1{}", scheme, &rest[host_len..])
            } else {
                uri.to_string()
            }
        }
        None => uri.to_string(),
    }
}
