//! Seams between the bridge and the obs-websocket client.
//!
//! The bridge only depends on these two traits, so tests can substitute a
//! recording session for a live OBS instance.

use serde_json::Value;

use crate::config::ObsConfig;
use crate::error::ObsError;
use crate::obs::requests::Request;

/// An established, identified session with OBS.
#[allow(async_fn_in_trait)] // Only used through generics on a current-thread runtime
pub trait Session {
    /// Sends one request and waits for its response data.
    ///
    /// Requests without response fields yield `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails, the request times out, or OBS
    /// rejects the request.
    async fn call(&mut self, request: &Request<'_>) -> Result<Value, ObsError>;

    /// Whether the underlying transport is still usable.
    fn is_connected(&self) -> bool;

    /// Handles whatever arrived while the session was idle, without waiting,
    /// and reports whether the transport is still usable.
    ///
    /// A close or reset that came in between calls is only noticed here.
    fn poll_connected(&mut self) -> bool {
        self.is_connected()
    }

    /// Closes the transport. Calling this on a closed session does nothing.
    async fn close(&mut self);
}

/// Opens new sessions.
#[allow(async_fn_in_trait)]
pub trait Connector {
    /// The session type this connector produces.
    type Session: Session;

    /// Connects and completes the identification handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable or the handshake fails.
    async fn connect(&self, config: &ObsConfig) -> Result<Self::Session, ObsError>;
}
