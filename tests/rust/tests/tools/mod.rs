//! Tool Dispatcher and MCP handler tests against a mock music API

mod handler;

use std::sync::Arc;

use spotmux_core::TokenRecord;
use spotmux_gateway::{SessionManager, SpotifyMcpHandler, ToolDispatcher};
use tests::{fixtures, InMemoryCacheHandler};
use wiremock::MockServer;

/// Dispatcher, handler and cache wired to one mock server
pub struct Harness {
    pub server: MockServer,
    pub cache: Arc<InMemoryCacheHandler>,
    pub dispatcher: ToolDispatcher,
}

impl Harness {
    pub async fn with_record(record: Option<TokenRecord>) -> Self {
        let server = MockServer::start().await;
        let cache = match record {
            Some(record) => InMemoryCacheHandler::new().with_record(record),
            None => InMemoryCacheHandler::new(),
        };
        let cache = Arc::new(cache);

        let config = fixtures::config(&server.uri());
        let http = fixtures::http(&config);
        let session = Arc::new(SessionManager::new(&config, cache.clone(), http.clone()));
        let dispatcher = ToolDispatcher::new(session, http, config.api_base_url.clone());

        Self {
            server,
            cache,
            dispatcher,
        }
    }

    /// Session holding a token valid for an hour
    pub async fn authenticated() -> Self {
        Self::with_record(Some(fixtures::fresh_record())).await
    }

    pub fn handler(&self) -> SpotifyMcpHandler {
        SpotifyMcpHandler::new(self.dispatcher.clone())
    }
}

/// Tool arguments from a JSON object literal
pub fn args(value: serde_json::Value) -> Option<serde_json::Map<String, serde_json::Value>> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}
