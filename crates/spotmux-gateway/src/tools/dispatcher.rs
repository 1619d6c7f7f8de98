//! Tool Dispatcher - routes a tool call to the music API

use std::sync::Arc;

use serde_json::{Map, Value};
use spotmux_core::{ToolError, ToolName};
use tracing::{debug, info};

use super::params::{PlaylistCommand, ToolRequest};
use crate::session::SessionManager;
use crate::spotify::{PlaybackOutcome, SpotifyApi};

/// Successful tool result
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
}

impl ToolOutput {
    fn text(message: impl Into<String>) -> Self {
        ToolOutput::Text(message.into())
    }

    /// Text sent back to the MCP caller
    pub fn render(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Resolves the tool, validates arguments, obtains a token and runs the call.
///
/// Holds no per-call state; one instance serves concurrent invocations.
#[derive(Clone)]
pub struct ToolDispatcher {
    session: Arc<SessionManager>,
    http: reqwest::Client,
    api_base_url: String,
}

impl ToolDispatcher {
    pub fn new(
        session: Arc<SessionManager>,
        http: reqwest::Client,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            session,
            http,
            api_base_url: api_base_url.into(),
        }
    }

    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<ToolOutput, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let request = ToolRequest::parse(tool, arguments)?;
        debug!(tool = %tool, request = ?request, "[Dispatcher] Arguments validated");

        let token = self.session.valid_token().await?;
        let api = SpotifyApi::new(self.http.clone(), self.api_base_url.clone(), token);

        let output = execute(&api, request).await?;
        info!(tool = %tool, "[Dispatcher] Tool call completed");
        Ok(output)
    }
}

async fn execute(api: &SpotifyApi, request: ToolRequest) -> Result<ToolOutput, ToolError> {
    let output = match request {
        ToolRequest::CurrentTrack => match api.current_track().await? {
            Some(track) => ToolOutput::Json(track),
            None => ToolOutput::text("No track playing."),
        },
        ToolRequest::StartPlayback { uri } => match api.start_playback(uri.as_deref()).await? {
            PlaybackOutcome::AlreadyPlaying => ToolOutput::text("Playback already active."),
            PlaybackOutcome::Started => ToolOutput::text("Playback starting."),
        },
        ToolRequest::Pause => {
            if api.pause().await? {
                ToolOutput::text("Playback paused.")
            } else {
                ToolOutput::text("Nothing is playing.")
            }
        }
        ToolRequest::Skip { count } => {
            api.skip(count).await?;
            if count == 1 {
                ToolOutput::text("Skipped to next track.")
            } else {
                ToolOutput::text(format!("Skipped {} tracks.", count))
            }
        }
        ToolRequest::Search { query, qtype, limit } => {
            ToolOutput::Json(api.search(&query, &qtype, limit).await?)
        }
        ToolRequest::GetQueue => ToolOutput::Json(api.queue().await?),
        ToolRequest::AddToQueue { track_id } => {
            api.add_to_queue(&track_id).await?;
            ToolOutput::text("Track added to queue.")
        }
        ToolRequest::GetInfo { kind, id } => ToolOutput::Json(api.item_info(kind, &id).await?),
        ToolRequest::Playlist(command) => playlist(api, command).await?,
    };
    Ok(output)
}

async fn playlist(api: &SpotifyApi, command: PlaylistCommand) -> Result<ToolOutput, ToolError> {
    let output = match command {
        PlaylistCommand::List => ToolOutput::Json(api.playlists().await?),
        PlaylistCommand::Tracks { playlist_id } => {
            ToolOutput::Json(api.playlist_tracks(&playlist_id).await?)
        }
        PlaylistCommand::AddTracks {
            playlist_id,
            track_ids,
        } => {
            api.add_tracks(&playlist_id, &track_ids).await?;
            ToolOutput::text("Tracks added to playlist.")
        }
        PlaylistCommand::RemoveTracks {
            playlist_id,
            track_ids,
        } => {
            api.remove_tracks(&playlist_id, &track_ids).await?;
            ToolOutput::text("Tracks removed from playlist.")
        }
        PlaylistCommand::ChangeDetails {
            playlist_id,
            name,
            description,
            public,
        } => {
            api.change_details(&playlist_id, name.as_deref(), description.as_deref(), public)
                .await?;
            ToolOutput::text("Playlist details changed.")
        }
        PlaylistCommand::Create {
            name,
            description,
            public,
        } => ToolOutput::Json(
            api.create_playlist(&name, description.as_deref(), public)
                .await?,
        ),
    };
    Ok(output)
}
