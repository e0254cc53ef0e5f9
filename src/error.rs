//! Error types for obs-mcp.
//!
//! # Security Note
//!
//! Error messages are carefully crafted to NEVER include the obs-websocket
//! password. Variants that touch authentication use generic descriptions
//! instead of including the actual values.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised by the obs-websocket client.
#[derive(Error, Debug)]
pub enum ObsError {
    /// The WebSocket transport failed.
    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The Hello/Identify exchange did not complete.
    #[error("obs-websocket handshake failed: {0}")]
    Handshake(String),

    /// OBS requires a password but none is configured.
    #[error("obs-websocket requires authentication but no password is configured")]
    AuthenticationRequired,

    /// The remote side closed the connection.
    #[error("obs-websocket connection closed (code {code}): {reason}")]
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason sent by OBS.
        reason: String,
    },

    /// The session is not connected.
    #[error("not connected to obs-websocket")]
    NotConnected,

    /// No response arrived within the request timeout.
    #[error("request {0} timed out")]
    Timeout(String),

    /// OBS processed the request and reported a failure.
    #[error("{request_type} failed (code {code}){}", comment_suffix(.comment))]
    Rejected {
        /// The request type that failed.
        request_type: String,
        /// obs-websocket request status code.
        code: i64,
        /// Optional human-readable comment from OBS.
        comment: Option<String>,
    },

    /// A frame or response payload could not be decoded.
    #[error("failed to decode obs-websocket message: {0}")]
    Decode(#[from] serde_json::Error),
}

fn comment_suffix(comment: &Option<String>) -> String {
    comment.as_deref().map(|c| format!(": {c}")).unwrap_or_default()
}

/// A session to OBS could not be established.
#[derive(Error, Debug)]
#[error("could not connect to OBS WebSocket at {endpoint}: {source}")]
pub struct ConnectionError {
    /// `host:port` of the endpoint.
    pub endpoint: String,
    /// The underlying cause.
    #[source]
    pub source: ObsError,
}

/// Errors that are caught at the bridge boundary and reported as a failed
/// command result.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The command name is not in the dispatch table.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A required parameter was not supplied.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A parameter was supplied with the wrong JSON type.
    #[error("Invalid parameter '{name}': expected {expected}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },

    /// Scene item lookup found no source with the given name.
    #[error("Source '{source_name}' not found in scene '{scene}'")]
    NotFound {
        /// Scene that was searched.
        scene: String,
        /// Source name that was not found.
        source_name: String,
    },

    /// The request failed at the protocol level.
    #[error(transparent)]
    Protocol(#[from] ObsError),
}
