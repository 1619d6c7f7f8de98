//! Tool names exposed over MCP
//!
//! The tool set is closed: one variant per tool.

use std::fmt;

/// The five tools served by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    Playback,
    Search,
    Queue,
    GetInfo,
    Playlist,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::Playback,
        ToolName::Search,
        ToolName::Queue,
        ToolName::GetInfo,
        ToolName::Playlist,
    ];

    /// Wire name as listed to MCP clients
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::Playback => "SpotifyPlayback",
            ToolName::Search => "SpotifySearch",
            ToolName::Queue => "SpotifyQueue",
            ToolName::GetInfo => "SpotifyGetInfo",
            ToolName::Playlist => "SpotifyPlaylist",
        }
    }

    /// Resolve a wire name; `None` for anything outside the closed set
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::Playback => {
                "Manages the current playback with the following actions:\n\
                 - get: Get information about user's current track.\n\
                 - start: Starts playing new item or resumes current playback if called with no uri.\n\
                 - pause: Pauses current playback.\n\
                 - skip: Skips current track."
            }
            ToolName::Search => "Search for tracks, albums, artists, or playlists on Spotify.",
            ToolName::Queue => "Manage the playback queue - get the queue or add tracks.",
            ToolName::GetInfo => {
                "Get detailed information about a Spotify item (track, album, artist, or playlist)."
            }
            ToolName::Playlist => {
                "Manage Spotify playlists.\n\
                 - get: Get a list of user's playlists.\n\
                 - get_tracks: Get tracks in a specific playlist.\n\
                 - add_tracks: Add tracks to a specific playlist.\n\
                 - remove_tracks: Remove tracks from a specific playlist.\n\
                 - change_details: Change details of a specific playlist.\n\
                 - create: Create a new playlist."
            }
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
