//! Gmail MCP bridge
//!
//! Serves the Gmail API as a set of MCP tools over HTTP, plus a plain send
//! webhook. Credentials travel with each request; the server keeps no token
//! state between requests.

pub mod config;
pub mod error;
pub mod gmail;
pub mod mcp;
pub mod server;

pub use config::Config;
pub use error::{BridgeError, Result};
