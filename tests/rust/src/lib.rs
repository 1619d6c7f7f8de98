//! Shared test utilities and fixtures for SpotMux integration tests.

use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
pub use spotmux_core::{BrokerConfig, TokenRecord};

/// Mock cache handler implementations
pub mod mocks;
pub use mocks::{InMemoryCacheHandler, UnavailableCacheHandler};

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Token record and payload fixtures
pub mod fixtures {
    use super::*;

    pub const CLIENT_ID: &str = "test-client";
    pub const CLIENT_SECRET: &str = "test-secret";
    pub const REDIRECT_URI: &str = "http://localhost:8888/callback";

    /// Config pointing every endpoint at the given mock server
    pub fn config(server_uri: &str) -> BrokerConfig {
        BrokerConfig::new(CLIENT_ID, CLIENT_SECRET, REDIRECT_URI)
            .with_backend_url(server_uri)
            .with_token_url(format!("{}/api/token", server_uri))
            .with_api_base_url(format!("{}/v1", server_uri))
            .with_request_timeout(Duration::from_millis(500))
            .with_fetch_retry(2, Duration::from_millis(10))
    }

    /// HTTP client with the config's timeout
    pub fn http(config: &BrokerConfig) -> reqwest::Client {
        spotmux_gateway::http_client(config).expect("http client")
    }

    pub fn record(access: &str, refresh: Option<&str>, expires_in_secs: i64) -> TokenRecord {
        TokenRecord::new(
            access,
            refresh.map(String::from),
            Utc::now() + chrono::Duration::seconds(expires_in_secs),
        )
    }

    /// Valid for an hour
    pub fn fresh_record() -> TokenRecord {
        record("fresh-access", Some("refresh-1"), 3600)
    }

    /// Expired one second ago
    pub fn expired_record() -> TokenRecord {
        record("stale-access", Some("refresh-1"), -1)
    }

    /// Backend GET body with a relative lifetime
    pub fn backend_body(access: &str, refresh: &str, expires_in: i64) -> Value {
        json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": expires_in,
        })
    }

    /// Provider refresh grant response
    pub fn grant_body(access: &str, expires_in: i64) -> Value {
        json!({
            "access_token": access,
            "token_type": "Bearer",
            "expires_in": expires_in,
            "scope": "user-read-playback-state user-modify-playback-state",
        })
    }
}

/// Stateful stand-in for the token backend's `/spotify/mcp-token` endpoint
pub mod backend {
    use std::sync::{Arc, Mutex};

    use serde_json::Value;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Last stored body; `None` answers GET with 404
    #[derive(Clone, Default)]
    pub struct MockTokenBackend {
        stored: Arc<Mutex<Option<Value>>>,
    }

    struct Fetch(MockTokenBackend);
    struct Store(MockTokenBackend);

    impl Respond for Fetch {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            match self.0.stored.lock().unwrap().clone() {
                Some(body) => ResponseTemplate::new(200).set_body_json(body),
                None => ResponseTemplate::new(404),
            }
        }
    }

    impl Respond for Store {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            match serde_json::from_slice::<Value>(&request.body) {
                Ok(body) => {
                    *self.0.stored.lock().unwrap() = Some(body);
                    ResponseTemplate::new(200)
                }
                Err(_) => ResponseTemplate::new(400),
            }
        }
    }

    impl MockTokenBackend {
        pub fn with_body(body: Value) -> Self {
            let backend = Self::default();
            *backend.stored.lock().unwrap() = Some(body);
            backend
        }

        pub fn stored(&self) -> Option<Value> {
            self.stored.lock().unwrap().clone()
        }

        /// Mount GET and POST handlers sharing this state
        pub async fn mount(&self, server: &MockServer) {
            Mock::given(method("GET"))
                .and(path("/spotify/mcp-token"))
                .respond_with(Fetch(self.clone()))
                .mount(server)
                .await;
            Mock::given(method("POST"))
                .and(path("/spotify/mcp-token"))
                .respond_with(Store(self.clone()))
                .mount(server)
                .await;
        }
    }
}
