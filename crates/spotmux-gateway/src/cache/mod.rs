//! `CacheHandler` implementations
//!
//! - `RemoteCacheHandler`: the shared backend, used when a backend URL is set
//! - `FileCacheHandler`: a local JSON file for single-machine setups

mod file;
mod remote;

pub use file::FileCacheHandler;
pub use remote::{FetchRetryPolicy, RemoteCacheHandler};

use std::sync::Arc;

use spotmux_core::{BrokerConfig, CacheHandler};
use tracing::info;

use crate::transport::BackendTokenClient;

/// Pick the cache handler for this process from the config
pub fn from_config(config: &BrokerConfig, http: reqwest::Client) -> Arc<dyn CacheHandler> {
    match &config.backend_url {
        Some(url) => {
            info!(backend = %url, "[CacheHandler] Using remote token backend");
            let transport = BackendTokenClient::new(http, url.clone());
            Arc::new(RemoteCacheHandler::new(transport, FetchRetryPolicy::from_config(config)))
        }
        None => {
            info!(
                path = %config.cache_path.display(),
                "[CacheHandler] No backend URL configured, using local token file"
            );
            Arc::new(FileCacheHandler::new(config.cache_path.clone()))
        }
    }
}
