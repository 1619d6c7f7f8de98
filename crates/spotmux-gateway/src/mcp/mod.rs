//! MCP Server Implementation
//!
//! `handler` implements rmcp's ServerHandler on top of the Tool Dispatcher.
//! The binary serves it over stdio.

pub mod handler;

pub use handler::SpotifyMcpHandler;
