//! Gmail API integration
//!
//! Credential handling, the MIME envelope codec, typed API structures and
//! the per-request client.

pub mod auth;
pub mod client;
pub mod filters;
pub mod labels;
pub mod mime;
pub mod types;
