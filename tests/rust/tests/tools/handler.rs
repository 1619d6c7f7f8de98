//! SpotifyMcpHandler: tool failures become is_error results

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use spotmux_core::ToolName;
use spotmux_gateway::tools::tool_definitions;
use tests::init_test_tracing;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use super::{args, Harness};

fn first_text(result: &impl serde::Serialize) -> String {
    let value = serde_json::to_value(result).unwrap();
    value["content"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_success_is_rendered_text() {
    init_test_tracing();
    let h = Harness::authenticated().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/currently-playing"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let result = h
        .handler()
        .invoke("SpotifyPlayback", args(json!({"action": "get"})))
        .await;

    assert_ne!(result.is_error, Some(true));
    assert_eq!(first_text(&result), "No track playing.");
}

#[tokio::test]
async fn test_json_output_is_pretty_printed() {
    let h = Harness::authenticated().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"name": "Mix", "id": "p1", "uri": "spotify:playlist:p1"}],
        })))
        .mount(&h.server)
        .await;

    let result = h
        .handler()
        .invoke("SpotifyPlaylist", args(json!({"action": "get"})))
        .await;

    let text = first_text(&result);
    assert!(text.contains('\n'));
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed[0]["name"], "Mix");
}

#[tokio::test]
async fn test_no_device_is_error_result() {
    let h = Harness::authenticated().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/player/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"devices": []})))
        .mount(&h.server)
        .await;

    let result = h
        .handler()
        .invoke("SpotifyQueue", args(json!({"action": "add", "track_id": "t1"})))
        .await;

    assert_eq!(result.is_error, Some(true));
    assert_eq!(first_text(&result), "No active device. Is Spotify open?");
}

#[tokio::test]
async fn test_unknown_tool_is_error_result() {
    let h = Harness::authenticated().await;

    let result = h.handler().invoke("SpotifyLibrary", None).await;

    assert_eq!(result.is_error, Some(true));
    assert_eq!(first_text(&result), "Unknown tool: SpotifyLibrary");
}

#[tokio::test]
async fn test_unauthenticated_is_error_result() {
    let h = Harness::with_record(None).await;

    let result = h
        .handler()
        .invoke("SpotifyPlayback", args(json!({"action": "get"})))
        .await;

    assert_eq!(result.is_error, Some(true));
    assert!(first_text(&result).starts_with("Spotify is not connected yet."));
}

#[test]
fn test_every_tool_is_listed_with_object_schema() {
    let tools = tool_definitions();
    let names: Vec<String> = tools.iter().map(|t| t.name.to_string()).collect();
    let expected: Vec<String> = ToolName::ALL.iter().map(|t| t.as_str().to_string()).collect();

    assert_eq!(names, expected);
    for tool in &tools {
        assert_eq!(tool.input_schema.get("type"), Some(&json!("object")));
    }
}
