//! SpotMux Gateway
//!
//! Shares one Spotify OAuth session across MCP server processes:
//! - Token Transport for the backend's token endpoints
//! - Cache handlers (remote backend or local file)
//! - OAuth Session Manager with refresh-grant handling
//! - Tool Dispatcher and the Spotify Web API client
//! - rmcp ServerHandler exposing the tools

pub mod cache;
pub mod logging;
pub mod mcp;
pub mod session;
pub mod spotify;
pub mod tools;
pub mod transport;

pub use cache::{FetchRetryPolicy, FileCacheHandler, RemoteCacheHandler};
pub use mcp::SpotifyMcpHandler;
pub use session::{AuthStatus, ProviderTokenClient, SessionManager, SessionState};
pub use spotify::SpotifyApi;
pub use tools::{ToolDispatcher, ToolOutput};
pub use transport::{http_client, BackendTokenClient};
