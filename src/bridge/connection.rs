//! Ownership of the single OBS session.

use crate::config::ObsConfig;
use crate::error::{ConnectionError, ObsError};
use crate::obs::{Connector, Session};

/// Connection lifecycle as seen by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live session: nothing attempted yet, disconnected, or the last
    /// session has dropped.
    Uninitialized,
    /// The last connection attempt succeeded.
    Connected,
    /// The last connection attempt failed. The next call retries once.
    Failed,
}

/// Holds at most one session and re-establishes it on demand.
///
/// There is no backoff and no retry inside a single call: a failed attempt is
/// reported and the next [`ensure_connected`](Self::ensure_connected) tries again.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    config: ObsConfig,
    session: Option<C::Session>,
    state: ConnectionState,
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates a manager. No connection is made until first use.
    #[must_use]
    pub const fn new(connector: C, config: ObsConfig) -> Self {
        Self {
            connector,
            config,
            session: None,
            state: ConnectionState::Uninitialized,
        }
    }

    /// Returns the lifecycle state.
    ///
    /// A session known to have dropped reports `Uninitialized` until the
    /// next connect attempt.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match self.state {
            ConnectionState::Connected if !self.is_connected() => ConnectionState::Uninitialized,
            state => state,
        }
    }

    /// Whether a session exists and its transport is still up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_connected)
    }

    /// Returns the live session, connecting first if there is none or the
    /// existing one has dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] carrying the underlying cause when the
    /// connection cannot be established.
    pub async fn ensure_connected(&mut self) -> Result<&mut C::Session, ConnectionError> {
        let alive = self.session.as_mut().is_some_and(Session::poll_connected);
        if !alive {
            if let Some(mut stale) = self.session.take() {
                tracing::info!(endpoint = %self.config.endpoint(), "OBS connection lost, reconnecting");
                stale.close().await;
            }

            match self.connector.connect(&self.config).await {
                Ok(session) => {
                    self.session = Some(session);
                    self.state = ConnectionState::Connected;
                }
                Err(source) => {
                    self.state = ConnectionState::Failed;
                    let endpoint = self.config.endpoint();
                    tracing::error!(endpoint = %endpoint, error = %source, "Failed to connect to OBS WebSocket");
                    return Err(ConnectionError { endpoint, source });
                }
            }
        }

        self.session.as_mut().ok_or_else(|| ConnectionError {
            endpoint: self.config.endpoint(),
            source: ObsError::NotConnected,
        })
    }

    /// Closes the session if there is one. Does nothing when already
    /// disconnected.
    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        self.state = ConnectionState::Uninitialized;
    }
}
