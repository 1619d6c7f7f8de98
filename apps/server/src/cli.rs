use clap::{Parser, Subcommand};

/// SpotMux - Spotify MCP server sharing one OAuth session through a token backend
#[derive(Parser)]
#[command(name = "spotmux", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the Spotify tools over MCP stdio (default)
    Serve,

    /// Print whether the shared session is usable, without refreshing it
    Status,

    /// Trade an authorization code for tokens through the backend
    ExchangeCode {
        /// `code` query parameter from the provider redirect
        code: String,
    },
}
