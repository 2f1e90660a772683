//! Model Context Protocol surface
//!
//! Protocol types and the tool catalog the bridge exposes.

pub mod tools;
pub mod types;
