//! Error taxonomy
//!
//! Errors are re-labelled where their meaning changes: a transport failure
//! becomes `CacheError::Unavailable` at the cache handler, then
//! `SessionError::CacheUnavailable` at the session manager, and finally a
//! user-facing message at the tool dispatcher.

use thiserror::Error;

/// Classification of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Request exceeded the configured timeout
    Timeout,
    /// Connection could not be established
    Connect,
    /// Peer answered with an unexpected HTTP status
    Status,
    /// Response body could not be parsed
    MalformedBody,
    Other,
}

/// Backend or provider unreachable, non-2xx, or malformed payload
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render_transport(.status, .cause))]
pub struct TransportError {
    pub status: Option<u16>,
    pub cause: String,
    pub kind: TransportErrorKind,
}

fn render_transport(status: &Option<u16>, cause: &str) -> String {
    match status {
        Some(code) => format!("HTTP {}: {}", code, cause),
        None => cause.to_string(),
    }
}

impl TransportError {
    pub fn timeout(cause: impl Into<String>) -> Self {
        Self {
            status: None,
            cause: cause.into(),
            kind: TransportErrorKind::Timeout,
        }
    }

    pub fn connect(cause: impl Into<String>) -> Self {
        Self {
            status: None,
            cause: cause.into(),
            kind: TransportErrorKind::Connect,
        }
    }

    pub fn status(status: u16, cause: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            cause: cause.into(),
            kind: TransportErrorKind::Status,
        }
    }

    pub fn malformed(status: Option<u16>, cause: impl Into<String>) -> Self {
        Self {
            status,
            cause: cause.into(),
            kind: TransportErrorKind::MalformedBody,
        }
    }

    pub fn other(status: Option<u16>, cause: impl Into<String>) -> Self {
        Self {
            status,
            cause: cause.into(),
            kind: TransportErrorKind::Other,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }

    /// Whether repeating the same request could succeed (timeouts,
    /// connection failures, 429 and 5xx)
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            TransportErrorKind::Timeout | TransportErrorKind::Connect => true,
            TransportErrorKind::Status => {
                matches!(self.status, Some(429) | Some(500..=599))
            }
            TransportErrorKind::MalformedBody | TransportErrorKind::Other => false,
        }
    }
}

/// Failure reading or writing the token cache
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// The backend could not answer
    #[error("token cache unavailable: {0}")]
    Unavailable(#[source] TransportError),

    /// Local token file unreadable or unwritable
    #[error("token cache storage error: {0}")]
    Storage(String),
}

/// Why a refresh grant could not produce a new token
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefreshFailure {
    #[error("stored record has no refresh token")]
    MissingRefreshToken,

    /// Provider refused the grant (e.g. `invalid_grant` for a revoked token)
    #[error("provider rejected refresh grant: {}{}", .error, render_description(.description))]
    Rejected {
        error: String,
        description: Option<String>,
    },

    /// Provider unreachable or answered with a retryable failure
    #[error("refresh grant failed: {0}")]
    Transport(TransportError),
}

fn render_description(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

/// Failure to produce a valid access token
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Temporary: the token store could not be read
    #[error("could not read the shared token: {0}")]
    CacheUnavailable(#[source] CacheError),

    /// No record exists; complete the web sign-in flow
    #[error("authentication required: no token has been stored yet")]
    AuthenticationRequired,

    /// A record exists but could not be refreshed; sign in again
    #[error("re-authentication required: {cause}")]
    ReauthenticationRequired { cause: RefreshFailure },
}

impl SessionError {
    /// Whether the same call may succeed later without user action
    pub fn is_temporary(&self) -> bool {
        match self {
            SessionError::CacheUnavailable(_) => true,
            SessionError::ReauthenticationRequired {
                cause: RefreshFailure::Transport(e),
            } => e.is_retryable(),
            _ => false,
        }
    }
}

/// Operational failure reported by the music API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("no active device")]
    NoActiveDevice,

    #[error("nothing to resume")]
    NothingToResume,

    #[error("premium account required")]
    PremiumRequired,

    #[error("access token rejected")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<u64> },

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Transport(TransportError),
}

/// Failure of a single tool invocation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ToolError {
    /// Text returned to the MCP caller as the tool result
    pub fn user_message(&self) -> String {
        match self {
            ToolError::UnknownTool(name) => format!("Unknown tool: {}", name),
            ToolError::InvalidParams(message) => format!("Error: {}", message),
            ToolError::Session(SessionError::AuthenticationRequired) => {
                "Spotify is not connected yet. Sign in through the web app to authorize access, \
                 then try again."
                    .to_string()
            }
            ToolError::Session(e @ SessionError::ReauthenticationRequired { cause })
                if e.is_temporary() =>
            {
                format!(
                    "Spotify could not renew the session right now ({}). Please try again shortly.",
                    cause
                )
            }
            ToolError::Session(SessionError::ReauthenticationRequired { cause }) => format!(
                "Spotify authorization is no longer valid ({}). Sign in through the web app again.",
                cause
            ),
            ToolError::Session(SessionError::CacheUnavailable(e)) => format!(
                "The token service is temporarily unavailable ({}). Please try again shortly.",
                e
            ),
            ToolError::Provider(ProviderError::NoActiveDevice) => {
                "No active device. Is Spotify open?".to_string()
            }
            ToolError::Provider(ProviderError::NothingToResume) => {
                "No track_id provided and no current playback to resume.".to_string()
            }
            ToolError::Provider(ProviderError::PremiumRequired) => {
                "This action requires a Spotify Premium account.".to_string()
            }
            ToolError::Provider(ProviderError::Unauthorized) => {
                "Spotify rejected the access token. Try again; sign in through the web app if \
                 the problem persists."
                    .to_string()
            }
            ToolError::Provider(ProviderError::NotFound(message)) => {
                format!("Not found: {}", message)
            }
            ToolError::Provider(ProviderError::RateLimited { retry_after }) => match retry_after {
                Some(secs) => format!(
                    "Spotify rate limit reached. Retry after {} seconds.",
                    secs
                ),
                None => "Spotify rate limit reached. Retry shortly.".to_string(),
            },
            ToolError::Provider(ProviderError::Api { status, message }) => format!(
                "An error occurred with the Spotify Client: HTTP {}: {}",
                status, message
            ),
            ToolError::Provider(ProviderError::Transport(e)) => {
                format!("Could not reach Spotify: {}", e)
            }
        }
    }
}
