//! Tool Dispatcher and the five Spotify tools
//!
//! - `params`: argument decoding and per-action validation
//! - `schema`: input schemas for `list_tools`
//! - `dispatcher`: token acquisition and routing to `SpotifyApi`

mod dispatcher;
pub mod params;
pub mod schema;

pub use dispatcher::{ToolDispatcher, ToolOutput};
pub use params::{PlaylistCommand, ToolRequest};
pub use schema::tool_definitions;
