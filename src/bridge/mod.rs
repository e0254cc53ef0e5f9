//! The mapping layer between tool calls and obs-websocket.
//!
//! ```text
//! (name, params) ──▶ Command::parse ──▶ ConnectionManager::ensure_connected
//!                                              │
//!                                              ▼
//!                    CommandResult ◀── Session::call(Request) × 1..2
//! ```
//!
//! Commands that address a source (`toggle_source_visibility`,
//! `set_source_position`) first resolve the source name to a scene item id
//! with `GetSceneItemList`.

pub mod command;
pub mod connection;
pub mod dispatch;

pub use command::{Command, CommandName, CommandResult, Params, Payload};
pub use connection::{ConnectionManager, ConnectionState};
pub use dispatch::{resolve_scene_item_id, CommandBridge};
