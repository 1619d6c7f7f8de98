//! Mapping of music API error responses onto `ProviderError`

use serde::Deserialize;
use spotmux_core::ProviderError;

use crate::transport::excerpt;

/// `{"error": {"status": 404, "message": "...", "reason": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

pub(crate) fn provider_error(status: u16, retry_after: Option<u64>, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let reason = parsed.as_ref().and_then(|e| e.reason.as_deref());
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| excerpt(body));

    match (status, reason) {
        (_, Some("NO_ACTIVE_DEVICE")) => ProviderError::NoActiveDevice,
        (_, Some("PREMIUM_REQUIRED")) => ProviderError::PremiumRequired,
        (401, _) => ProviderError::Unauthorized,
        (404, _) => ProviderError::NotFound(message),
        (429, _) => ProviderError::RateLimited { retry_after },
        _ => ProviderError::Api { status, message },
    }
}
