//! Domain entities

mod config;
mod token;
mod tool;

pub use config::{normalize_redirect_uri, BrokerConfig, ClientSecret, DEFAULT_SCOPES};
pub use token::TokenRecord;
pub use tool::ToolName;
