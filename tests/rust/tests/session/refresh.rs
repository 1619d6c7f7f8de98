//! valid_token() state machine: freshness, refresh grant, failure modes

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use spotmux_core::{CacheHandler, RefreshFailure, SessionError, TransportErrorKind};
use spotmux_gateway::{cache, SessionManager};
use tests::backend::MockTokenBackend;
use tests::{fixtures, init_test_tracing, InMemoryCacheHandler, UnavailableCacheHandler};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASIC_AUTH: &str = "Basic dGVzdC1jbGllbnQ6dGVzdC1zZWNyZXQ=";

fn manager(server: &MockServer, cache: Arc<dyn CacheHandler>) -> SessionManager {
    let config = fixtures::config(&server.uri());
    SessionManager::new(&config, cache, fixtures::http(&config))
}

async fn mount_grant(server: &MockServer, body: serde_json::Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// =============================================================================
// Valid and absent records
// =============================================================================

#[tokio::test]
async fn test_fresh_token_returned_without_refresh() {
    init_test_tracing();
    let server = MockServer::start().await;
    mount_grant(&server, fixtures::grant_body("unused", 3600), 0).await;

    let cache = Arc::new(InMemoryCacheHandler::new().with_record(fixtures::fresh_record()));
    let token = manager(&server, cache.clone()).valid_token().await.unwrap();

    assert_eq!(token, "fresh-access");
    assert_eq!(cache.save_count(), 0);
    assert_eq!(cache.get_count(), 1);
}

#[tokio::test]
async fn test_absent_record_requires_authentication() {
    let server = MockServer::start().await;
    mount_grant(&server, fixtures::grant_body("unused", 3600), 0).await;

    let cache = Arc::new(InMemoryCacheHandler::new());
    let err = manager(&server, cache.clone()).valid_token().await.unwrap_err();

    assert_eq!(err, SessionError::AuthenticationRequired);
    assert_eq!(cache.save_count(), 0);
}

#[tokio::test]
async fn test_backend_not_found_requires_authentication() {
    let server = MockServer::start().await;
    MockTokenBackend::default().mount(&server).await;

    let config = fixtures::config(&server.uri());
    let http = fixtures::http(&config);
    let session = SessionManager::new(&config, cache::from_config(&config, http.clone()), http);

    let err = session.valid_token().await.unwrap_err();
    assert_eq!(err, SessionError::AuthenticationRequired);
    assert!(!err.is_temporary());
}

#[tokio::test]
async fn test_backend_timeout_is_cache_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spotify/mcp-token"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = fixtures::config(&server.uri()).with_fetch_retry(1, Duration::ZERO);
    let http = fixtures::http(&config);
    let session = SessionManager::new(&config, cache::from_config(&config, http.clone()), http);

    let err = session.valid_token().await.unwrap_err();

    match &err {
        SessionError::CacheUnavailable(spotmux_core::CacheError::Unavailable(e)) => {
            assert_eq!(e.kind, TransportErrorKind::Timeout);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_ne!(err, SessionError::AuthenticationRequired);
    assert!(err.is_temporary());
}

#[tokio::test]
async fn test_unavailable_cache_never_saves() {
    let server = MockServer::start().await;
    mount_grant(&server, fixtures::grant_body("unused", 3600), 0).await;

    let cache = Arc::new(UnavailableCacheHandler::new());
    let err = manager(&server, cache.clone()).valid_token().await.unwrap_err();

    assert!(matches!(err, SessionError::CacheUnavailable(_)));
    assert_eq!(cache.get_count(), 1);
    assert_eq!(cache.save_count(), 0);
}

// =============================================================================
// Refresh grant
// =============================================================================

#[tokio::test]
async fn test_expired_token_refreshed_before_return() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::grant_body("new-access", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCacheHandler::new().with_record(fixtures::expired_record()));
    let before = Utc::now();
    let token = manager(&server, cache.clone()).valid_token().await.unwrap();

    assert_eq!(token, "new-access");
    let saved = cache.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].access_token, "new-access");
    // Not rotated: the old refresh token is kept
    assert_eq!(saved[0].refresh_token.as_deref(), Some("refresh-1"));
    assert!(saved[0].expires_at >= before + chrono::Duration::seconds(3600));
    assert_eq!(
        saved[0].scope.as_deref(),
        Some("user-read-playback-state user-modify-playback-state")
    );
}

#[tokio::test]
async fn test_token_inside_safety_margin_is_refreshed() {
    let server = MockServer::start().await;
    mount_grant(&server, fixtures::grant_body("new-access", 3600), 1).await;

    // Valid for 30 more seconds, inside the default 60 second margin
    let record = fixtures::record("almost-expired", Some("refresh-1"), 30);
    let cache = Arc::new(InMemoryCacheHandler::new().with_record(record));
    let token = manager(&server, cache.clone()).valid_token().await.unwrap();

    assert_eq!(token, "new-access");
    assert_eq!(cache.save_count(), 1);
}

#[tokio::test]
async fn test_rotated_refresh_token_is_saved() {
    let server = MockServer::start().await;
    mount_grant(
        &server,
        json!({
            "access_token": "new-access",
            "refresh_token": "refresh-2",
            "expires_in": 3600,
        }),
        1,
    )
    .await;

    let cache = Arc::new(InMemoryCacheHandler::new().with_record(fixtures::expired_record()));
    manager(&server, cache.clone()).valid_token().await.unwrap();

    assert_eq!(
        cache.current().unwrap().refresh_token.as_deref(),
        Some("refresh-2")
    );
}

#[tokio::test]
async fn test_refresh_saves_through_backend() {
    let server = MockServer::start().await;
    let backend = MockTokenBackend::with_body(fixtures::backend_body("stale-access", "refresh-1", 0));
    backend.mount(&server).await;
    mount_grant(&server, fixtures::grant_body("new-access", 3600), 1).await;

    let config = fixtures::config(&server.uri());
    let http = fixtures::http(&config);
    let session = SessionManager::new(&config, cache::from_config(&config, http.clone()), http);

    assert_eq!(session.valid_token().await.unwrap(), "new-access");

    let stored = backend.stored().unwrap();
    assert_eq!(stored["access_token"], "new-access");
    assert_eq!(stored["refresh_token"], "refresh-1");
    assert!(stored["expires_in"].as_i64().unwrap() > 3500);

    // The next call sees the refreshed record and does not refresh again
    assert_eq!(session.valid_token().await.unwrap(), "new-access");
}

#[tokio::test]
async fn test_stored_token_ages_into_safety_margin() {
    let server = MockServer::start().await;
    MockTokenBackend::default().mount(&server).await;
    mount_grant(&server, fixtures::grant_body("new-access", 3600), 1).await;

    let config = fixtures::config(&server.uri());
    let http = fixtures::http(&config);
    let cache = cache::from_config(&config, http.clone());
    let session = SessionManager::new(&config, cache.clone(), http);

    // Three seconds outside the 60 second margin when saved
    let record = fixtures::record("old-access", Some("refresh-1"), 63);
    cache.save(&record).await.unwrap();
    assert_eq!(session.valid_token().await.unwrap(), "old-access");

    tokio::time::sleep(Duration::from_secs(4)).await;

    assert_eq!(session.valid_token().await.unwrap(), "new-access");
}

#[tokio::test]
async fn test_cancelled_refresh_saves_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::grant_body("new-access", 3600))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let record = fixtures::expired_record();
    let cache = Arc::new(InMemoryCacheHandler::new().with_record(record.clone()));
    let session = manager(&server, cache.clone());

    let outcome = tokio::time::timeout(Duration::from_millis(50), session.valid_token()).await;
    assert!(outcome.is_err(), "refresh should still be in flight");

    // Give the abandoned grant time to complete on the server side
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(cache.save_count(), 0);
    assert_eq!(cache.current(), Some(record));
}

#[tokio::test]
async fn test_save_failure_still_returns_fresh_token() {
    let server = MockServer::start().await;
    mount_grant(&server, fixtures::grant_body("new-access", 3600), 1).await;

    let cache = Arc::new(
        InMemoryCacheHandler::new()
            .with_record(fixtures::expired_record())
            .failing_saves(),
    );
    let token = manager(&server, cache.clone()).valid_token().await.unwrap();

    assert_eq!(token, "new-access");
    assert_eq!(cache.save_count(), 1);
    assert_eq!(cache.current().unwrap().access_token, "stale-access");
}

#[tokio::test]
async fn test_concurrent_refreshes_both_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::grant_body("new-access", 3600))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCacheHandler::new().with_record(fixtures::expired_record()));
    let session = manager(&server, cache.clone());

    let (first, second) = tokio::join!(session.valid_token(), session.valid_token());

    assert_eq!(first.unwrap(), "new-access");
    assert_eq!(second.unwrap(), "new-access");
    assert_eq!(cache.save_count(), 2);
}

// =============================================================================
// Refresh failures
// =============================================================================

#[tokio::test]
async fn test_revoked_refresh_token_requires_reauthentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCacheHandler::new().with_record(fixtures::expired_record()));
    let err = manager(&server, cache.clone()).valid_token().await.unwrap_err();

    assert_eq!(
        err,
        SessionError::ReauthenticationRequired {
            cause: RefreshFailure::Rejected {
                error: "invalid_grant".to_string(),
                description: Some("Refresh token revoked".to_string()),
            },
        }
    );
    assert_eq!(cache.save_count(), 0);
}

#[tokio::test]
async fn test_missing_refresh_token_fails_without_network() {
    let server = MockServer::start().await;
    mount_grant(&server, fixtures::grant_body("unused", 3600), 0).await;

    let record = fixtures::record("stale-access", None, -1);
    let cache = Arc::new(InMemoryCacheHandler::new().with_record(record));
    let err = manager(&server, cache.clone()).valid_token().await.unwrap_err();

    assert_eq!(
        err,
        SessionError::ReauthenticationRequired {
            cause: RefreshFailure::MissingRefreshToken,
        }
    );
    assert_eq!(cache.save_count(), 0);
}

#[tokio::test]
async fn test_provider_outage_is_reported_as_temporary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(InMemoryCacheHandler::new().with_record(fixtures::expired_record()));
    let err = manager(&server, cache.clone()).valid_token().await.unwrap_err();

    match &err {
        SessionError::ReauthenticationRequired {
            cause: RefreshFailure::Transport(e),
        } => assert_eq!(e.status, Some(503)),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_temporary());
    assert_eq!(cache.save_count(), 0);
}

#[tokio::test]
async fn test_empty_access_token_in_grant_is_failure() {
    let server = MockServer::start().await;
    mount_grant(&server, json!({"access_token": "", "expires_in": 3600}), 1).await;

    let cache = Arc::new(InMemoryCacheHandler::new().with_record(fixtures::expired_record()));
    let err = manager(&server, cache.clone()).valid_token().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::ReauthenticationRequired {
            cause: RefreshFailure::Transport(_)
        }
    ));
    assert_eq!(cache.save_count(), 0);
}
