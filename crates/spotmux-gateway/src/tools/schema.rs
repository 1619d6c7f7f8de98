//! JSON input schemas served from `list_tools`

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde_json::{json, Value};
use spotmux_core::ToolName;

use super::params::MAX_SKIPS;

fn object(schema: Value) -> Arc<JsonObject> {
    match schema {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

/// Input schema for one tool
pub fn input_schema(tool: ToolName) -> Value {
    match tool {
        ToolName::Playback => json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["get", "start", "pause", "skip"],
                    "description": "Action to perform: 'get', 'start', 'pause' or 'skip'."
                },
                "spotify_uri": {
                    "type": "string",
                    "description": "Spotify uri of item to play for 'start' action. If omitted, resumes current playback."
                },
                "num_skips": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_SKIPS,
                    "default": 1,
                    "description": "Number of tracks to skip for 'skip' action."
                }
            },
            "required": ["action"]
        }),
        ToolName::Search => json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Query term."
                },
                "qtype": {
                    "type": "string",
                    "default": "track",
                    "description": "Type of items to search for (track, album, artist, playlist, or comma-separated combination)."
                },
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 50,
                    "default": 10,
                    "description": "Maximum number of items to return."
                }
            },
            "required": ["query"]
        }),
        ToolName::Queue => json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["add", "get"],
                    "description": "Action to perform: 'add' or 'get'."
                },
                "track_id": {
                    "type": "string",
                    "description": "Track ID to add to queue (required for add action)."
                }
            },
            "required": ["action"]
        }),
        ToolName::GetInfo => json!({
            "type": "object",
            "properties": {
                "item_uri": {
                    "type": "string",
                    "description": "URI of the item to get information about. If 'playlist' or 'album', returns its tracks. If 'artist', returns albums and top tracks."
                }
            },
            "required": ["item_uri"]
        }),
        ToolName::Playlist => json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["get", "get_tracks", "add_tracks", "remove_tracks", "change_details", "create"],
                    "description": "Action to perform."
                },
                "playlist_id": {
                    "type": "string",
                    "description": "ID of the playlist to manage."
                },
                "track_ids": {
                    "oneOf": [
                        {"type": "array", "items": {"type": "string"}},
                        {"type": "string"}
                    ],
                    "description": "List of track IDs to add/remove, or a string containing a JSON array."
                },
                "name": {
                    "type": "string",
                    "description": "Name for the playlist (required for create)."
                },
                "description": {
                    "type": "string",
                    "description": "Description for the playlist."
                },
                "public": {
                    "type": "boolean",
                    "default": true,
                    "description": "Whether the playlist should be public."
                }
            },
            "required": ["action"]
        }),
    }
}

/// Definitions for all five tools, in listing order
pub fn tool_definitions() -> Vec<Tool> {
    ToolName::ALL
        .into_iter()
        .map(|tool| Tool::new(tool.as_str(), tool.description(), object(input_schema(tool))))
        .collect()
}
