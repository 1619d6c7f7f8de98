//! # SpotMux Core Library
//!
//! Domain types shared by the gateway and the server binary.
//!
//! ## Modules
//!
//! - `domain` - Token record, broker configuration, tool names
//! - `cache` - The `CacheHandler` capability used by the session manager
//! - `error` - Error taxonomy (transport, cache, session, tool, provider)

pub mod cache;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use cache::CacheHandler;
pub use domain::*;
pub use error::*;
