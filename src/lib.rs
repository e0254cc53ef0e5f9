//! obs-mcp: MCP server for AI-assisted OBS Studio control
//!
//! This library exposes OBS Studio operations (scene switching, stream and
//! record control, source visibility and placement) as MCP tools, backed by
//! the obs-websocket v5 protocol.
//!
//! # Modules
//!
//! - [`bridge`]: Command dispatch and OBS connection lifecycle
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol implementation
//! - [`obs`]: obs-websocket client

pub mod bridge;
pub mod config;
pub mod error;
pub mod mcp;
pub mod obs;
