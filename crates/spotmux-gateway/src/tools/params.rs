//! Typed tool parameters
//!
//! Arguments are decoded and checked here, before any token fetch or API
//! call, so a bad request never costs a network round trip.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use spotmux_core::{ToolError, ToolName};

use crate::spotify::{parse_item_uri, ItemKind};

const MAX_SEARCH_LIMIT: u32 = 50;
/// Each skip is one API call
pub const MAX_SKIPS: u32 = 20;
const SEARCH_TYPES: &[&str] = &["track", "album", "artist", "playlist"];

fn default_num_skips() -> u32 {
    1
}

fn default_qtype() -> String {
    "track".to_string()
}

fn default_limit() -> u32 {
    10
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackAction {
    Get,
    Start,
    Pause,
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackParams {
    pub action: PlaybackAction,
    #[serde(default)]
    pub spotify_uri: Option<String>,
    #[serde(default = "default_num_skips")]
    pub num_skips: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_qtype")]
    pub qtype: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAction {
    Add,
    Get,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueParams {
    pub action: QueueAction,
    #[serde(default)]
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetInfoParams {
    pub item_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistAction {
    Get,
    GetTracks,
    AddTracks,
    RemoveTracks,
    ChangeDetails,
    Create,
}

/// `track_ids` as sent by clients: a JSON array, or a string holding one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrackIdsInput {
    List(Vec<String>),
    Encoded(String),
}

impl TrackIdsInput {
    pub fn resolve(self) -> Result<Vec<String>, ToolError> {
        match self {
            TrackIdsInput::List(ids) => Ok(ids),
            TrackIdsInput::Encoded(raw) => serde_json::from_str::<Vec<String>>(&raw).map_err(|_| {
                ToolError::InvalidParams("track_ids must be a list or a valid JSON array.".to_string())
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistParams {
    pub action: PlaylistAction,
    #[serde(default)]
    pub playlist_id: Option<String>,
    #[serde(default)]
    pub track_ids: Option<TrackIdsInput>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
}

/// A decoded, validated playlist operation
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistCommand {
    List,
    Tracks {
        playlist_id: String,
    },
    AddTracks {
        playlist_id: String,
        track_ids: Vec<String>,
    },
    RemoveTracks {
        playlist_id: String,
        track_ids: Vec<String>,
    },
    ChangeDetails {
        playlist_id: String,
        name: Option<String>,
        description: Option<String>,
        public: Option<bool>,
    },
    Create {
        name: String,
        description: Option<String>,
        public: bool,
    },
}

/// A decoded, validated tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    CurrentTrack,
    StartPlayback { uri: Option<String> },
    Pause,
    Skip { count: u32 },
    Search { query: String, qtype: String, limit: u32 },
    GetQueue,
    AddToQueue { track_id: String },
    GetInfo { kind: ItemKind, id: String },
    Playlist(PlaylistCommand),
}

fn invalid(message: impl Into<String>) -> ToolError {
    ToolError::InvalidParams(message.into())
}

fn decode<P: DeserializeOwned>(arguments: Option<Map<String, Value>>) -> Result<P, ToolError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| invalid(e.to_string()))
}

/// Trimmed, non-empty text or `None`
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(value: Option<String>, field: &str, action: &str) -> Result<String, ToolError> {
    present(value).ok_or_else(|| invalid(format!("{} is required for {} action.", field, action)))
}

impl ToolRequest {
    /// Decode and validate the arguments for `tool`
    pub fn parse(tool: ToolName, arguments: Option<Map<String, Value>>) -> Result<Self, ToolError> {
        match tool {
            ToolName::Playback => Self::playback(decode(arguments)?),
            ToolName::Search => Self::search(decode(arguments)?),
            ToolName::Queue => Self::queue(decode(arguments)?),
            ToolName::GetInfo => Self::get_info(decode(arguments)?),
            ToolName::Playlist => Self::playlist(decode(arguments)?),
        }
    }

    fn playback(params: PlaybackParams) -> Result<Self, ToolError> {
        Ok(match params.action {
            PlaybackAction::Get => ToolRequest::CurrentTrack,
            PlaybackAction::Start => ToolRequest::StartPlayback {
                uri: present(params.spotify_uri),
            },
            PlaybackAction::Pause => ToolRequest::Pause,
            PlaybackAction::Skip => {
                if params.num_skips == 0 || params.num_skips > MAX_SKIPS {
                    return Err(invalid(format!(
                        "num_skips must be between 1 and {}.",
                        MAX_SKIPS
                    )));
                }
                ToolRequest::Skip {
                    count: params.num_skips,
                }
            }
        })
    }

    fn search(params: SearchParams) -> Result<Self, ToolError> {
        let query = present(Some(params.query)).ok_or_else(|| invalid("query must not be empty."))?;
        if params.limit == 0 || params.limit > MAX_SEARCH_LIMIT {
            return Err(invalid(format!(
                "limit must be between 1 and {}.",
                MAX_SEARCH_LIMIT
            )));
        }

        let kinds: Vec<&str> = params
            .qtype
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        if kinds.is_empty() {
            return Err(invalid("qtype must not be empty."));
        }
        if let Some(bad) = kinds.iter().find(|k| !SEARCH_TYPES.contains(k)) {
            return Err(invalid(format!(
                "Unsupported qtype '{}'. Use one or more of: {}.",
                bad,
                SEARCH_TYPES.join(", ")
            )));
        }

        Ok(ToolRequest::Search {
            query,
            qtype: kinds.join(","),
            limit: params.limit,
        })
    }

    fn queue(params: QueueParams) -> Result<Self, ToolError> {
        Ok(match params.action {
            QueueAction::Get => ToolRequest::GetQueue,
            QueueAction::Add => ToolRequest::AddToQueue {
                track_id: require(params.track_id, "track_id", "add")?,
            },
        })
    }

    fn get_info(params: GetInfoParams) -> Result<Self, ToolError> {
        let uri = params.item_uri.trim();
        let (kind, id) = parse_item_uri(uri).ok_or_else(|| {
            invalid(format!(
                "item_uri must look like 'spotify:{{track|album|artist|playlist}}:<id>', got '{}'.",
                uri
            ))
        })?;
        Ok(ToolRequest::GetInfo {
            kind,
            id: id.to_string(),
        })
    }

    fn playlist(params: PlaylistParams) -> Result<Self, ToolError> {
        let command = match params.action {
            PlaylistAction::Get => PlaylistCommand::List,
            PlaylistAction::GetTracks => PlaylistCommand::Tracks {
                playlist_id: require(params.playlist_id, "playlist_id", "get_tracks")?,
            },
            PlaylistAction::AddTracks => PlaylistCommand::AddTracks {
                playlist_id: require(params.playlist_id, "playlist_id", "add_tracks")?,
                track_ids: track_ids(params.track_ids, "add_tracks")?,
            },
            PlaylistAction::RemoveTracks => PlaylistCommand::RemoveTracks {
                playlist_id: require(params.playlist_id, "playlist_id", "remove_tracks")?,
                track_ids: track_ids(params.track_ids, "remove_tracks")?,
            },
            PlaylistAction::ChangeDetails => {
                let playlist_id = require(params.playlist_id, "playlist_id", "change_details")?;
                let name = present(params.name);
                let description = present(params.description);
                if name.is_none() && description.is_none() && params.public.is_none() {
                    return Err(invalid(
                        "At least one of name, description or public is required.",
                    ));
                }
                PlaylistCommand::ChangeDetails {
                    playlist_id,
                    name,
                    description,
                    public: params.public,
                }
            }
            PlaylistAction::Create => PlaylistCommand::Create {
                name: require(params.name, "name", "create")?,
                description: present(params.description),
                public: params.public.unwrap_or_else(default_public),
            },
        };
        Ok(ToolRequest::Playlist(command))
    }
}

fn track_ids(input: Option<TrackIdsInput>, action: &str) -> Result<Vec<String>, ToolError> {
    let ids: Vec<String> = input
        .map(TrackIdsInput::resolve)
        .transpose()?
        .unwrap_or_default()
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(invalid(format!("track_ids is required for {} action.", action)));
    }
    Ok(ids)
}
