//! Cache handler backed by the shared token backend

use std::time::Duration;

use async_trait::async_trait;
use spotmux_core::{BrokerConfig, CacheError, CacheHandler, TokenRecord};
use tracing::{debug, warn};

use crate::transport::BackendTokenClient;

/// Retry policy for the idempotent fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
}

impl Default for FetchRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

impl FetchRetryPolicy {
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self {
            max_attempts: config.fetch_attempts.max(1),
            backoff: config.fetch_backoff,
        }
    }

    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// `CacheHandler` that reads and writes through the backend on every call
#[derive(Debug, Clone)]
pub struct RemoteCacheHandler {
    transport: BackendTokenClient,
    retry: FetchRetryPolicy,
}

impl RemoteCacheHandler {
    pub fn new(transport: BackendTokenClient, retry: FetchRetryPolicy) -> Self {
        Self { transport, retry }
    }
}

#[async_trait]
impl CacheHandler for RemoteCacheHandler {
    async fn get(&self) -> Result<Option<TokenRecord>, CacheError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.transport.fetch_tokens().await {
                Ok(record) => return Ok(record),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "[CacheHandler] Token fetch failed, retrying"
                    );
                    attempt += 1;
                    if !self.retry.backoff.is_zero() {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "[CacheHandler] Token fetch failed");
                    return Err(CacheError::Unavailable(e));
                }
            }
        }
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), CacheError> {
        // Not retried: a late duplicate could overwrite a newer record
        self.transport
            .store_tokens(record)
            .await
            .map_err(CacheError::Unavailable)?;
        debug!(expires_at = %record.expires_at, "[CacheHandler] Saved shared token");
        Ok(())
    }
}
