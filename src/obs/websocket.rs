//! obs-websocket session over `tokio-tungstenite`.
//!
//! One request is in flight at a time. Frames that are not the awaited
//! response (events, stale responses from timed-out requests) are skipped.

use std::time::Duration;

use futures::{FutureExt, SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use crate::config::ObsConfig;
use crate::error::ObsError;
use crate::obs::protocol::{
    authentication_string, Frame, Hello, Identified, Identify, OpCode, RequestMessage,
    RequestResponse, NO_EVENTS, RPC_VERSION,
};
use crate::obs::requests::Request;
use crate::obs::session::{Connector, Session};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when the socket ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// A live, identified obs-websocket session.
pub struct WebSocketSession {
    /// The socket. `None` once closed or dropped.
    stream: Option<WsStream>,
    /// `host:port`, for log context.
    endpoint: String,
    /// Upper bound for each request round trip.
    timeout: Duration,
    /// RPC version agreed during Identify.
    rpc_version: u32,
}

impl WebSocketSession {
    /// Connects to OBS and completes the Hello/Identify handshake.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be opened, OBS demands a password
    /// that is not configured, authentication is refused, or the handshake
    /// does not finish within the request timeout.
    pub async fn connect(config: &ObsConfig) -> Result<Self, ObsError> {
        let timeout = config.request_timeout();
        let endpoint = config.endpoint();

        tracing::debug!(endpoint = %endpoint, "Opening obs-websocket connection");

        let (stream, _response) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(config.url()))
            .await
            .map_err(|_| ObsError::Timeout("connect".to_string()))??;

        let mut session = Self {
            stream: Some(stream),
            endpoint,
            timeout,
            rpc_version: RPC_VERSION,
        };

        tokio::time::timeout(timeout, session.identify(config.password.as_deref()))
            .await
            .map_err(|_| ObsError::Timeout("Identify".to_string()))??;

        tracing::info!(
            endpoint = %session.endpoint,
            rpc_version = session.rpc_version,
            "Connected to OBS WebSocket"
        );

        Ok(session)
    }

    /// Returns the RPC version agreed with the server.
    #[must_use]
    pub const fn rpc_version(&self) -> u32 {
        self.rpc_version
    }

    async fn identify(&mut self, password: Option<&str>) -> Result<(), ObsError> {
        let hello: Hello = self.expect_frame(OpCode::Hello).await?.into_data()?;

        if hello.rpc_version < RPC_VERSION {
            return Err(ObsError::Handshake(format!(
                "server supports rpc version {}, client requires {RPC_VERSION}",
                hello.rpc_version
            )));
        }

        let authentication = match hello.authentication {
            Some(auth) => {
                let password = password.ok_or(ObsError::AuthenticationRequired)?;
                Some(authentication_string(password, &auth.salt, &auth.challenge))
            }
            None => None,
        };

        self.send_frame(&Frame::new(
            OpCode::Identify,
            &Identify {
                rpc_version: RPC_VERSION,
                authentication,
                event_subscriptions: NO_EVENTS,
            },
        )?)
        .await?;

        let identified: Identified = self.expect_frame(OpCode::Identified).await?.into_data()?;
        self.rpc_version = identified.negotiated_rpc_version;

        Ok(())
    }

    async fn round_trip(&mut self, request: &Request<'_>) -> Result<Value, ObsError> {
        let request_id = Uuid::new_v4().to_string();
        let request_data = request.request_data();

        let frame = Frame::new(
            OpCode::Request,
            &RequestMessage {
                request_type: request.request_type(),
                request_id: &request_id,
                request_data: request_data.as_ref(),
            },
        )?;
        self.send_frame(&frame).await?;

        loop {
            let frame = self.expect_frame(OpCode::RequestResponse).await?;
            let response: RequestResponse = frame.into_data()?;
            if response.request_id == request_id {
                return response.into_result();
            }
            tracing::debug!(
                request_id = %response.request_id,
                "Skipping response to an earlier request"
            );
        }
    }

    /// Reads frames until one with the given op-code arrives.
    async fn expect_frame(&mut self, op: OpCode) -> Result<Frame, ObsError> {
        loop {
            let frame = self.next_frame().await?;
            if frame.opcode() == Some(op) {
                return Ok(frame);
            }
            tracing::trace!(op = frame.op, "Skipping frame");
        }
    }

    async fn next_frame(&mut self) -> Result<Frame, ObsError> {
        loop {
            let stream = self.stream.as_mut().ok_or(ObsError::NotConnected)?;

            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Frame::decode(text.as_str()),
                Some(Ok(Message::Close(close))) => {
                    self.stream = None;
                    let (code, reason) = close.map_or_else(
                        || (ABNORMAL_CLOSURE, String::new()),
                        |c| (u16::from(c.code), c.reason.as_str().to_string()),
                    );
                    tracing::warn!(endpoint = %self.endpoint, code, reason = %reason, "OBS closed the connection");
                    return Err(ObsError::Closed { code, reason });
                }
                // Pings are answered by tungstenite on the next read or write.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.stream = None;
                    return Err(e.into());
                }
                None => {
                    self.stream = None;
                    return Err(ObsError::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: "connection dropped".to_string(),
                    });
                }
            }
        }
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), ObsError> {
        let text = frame.encode()?;
        let stream = self.stream.as_mut().ok_or(ObsError::NotConnected)?;

        if let Err(e) = stream.send(Message::Text(text.into())).await {
            self.stream = None;
            return Err(e.into());
        }
        Ok(())
    }
}

impl Session for WebSocketSession {
    async fn call(&mut self, request: &Request<'_>) -> Result<Value, ObsError> {
        let request_type = request.request_type();
        tracing::debug!(request_type, "Sending obs-websocket request");

        tokio::time::timeout(self.timeout, self.round_trip(request))
            .await
            .map_err(|_| ObsError::Timeout(request_type.to_string()))?
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn poll_connected(&mut self) -> bool {
        while let Some(stream) = self.stream.as_mut() {
            match stream.next().now_or_never() {
                None => return true,
                Some(Some(Ok(Message::Close(close)))) => {
                    self.stream = None;
                    let code = close.map_or(ABNORMAL_CLOSURE, |c| u16::from(c.code));
                    tracing::warn!(endpoint = %self.endpoint, code, "OBS closed the connection while idle");
                }
                Some(Some(Ok(_))) => tracing::trace!("Discarding frame received while idle"),
                Some(Some(Err(e))) => {
                    self.stream = None;
                    tracing::warn!(endpoint = %self.endpoint, error = %e, "obs-websocket connection lost while idle");
                }
                Some(None) => {
                    self.stream = None;
                    tracing::warn!(endpoint = %self.endpoint, "obs-websocket connection dropped while idle");
                }
            }
        }
        false
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                tracing::debug!(error = %e, "Error while closing obs-websocket connection");
            }
            tracing::info!(endpoint = %self.endpoint, "Disconnected from OBS WebSocket");
        }
    }
}

/// Opens [`WebSocketSession`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Session = WebSocketSession;

    async fn connect(&self, config: &ObsConfig) -> Result<Self::Session, ObsError> {
        WebSocketSession::connect(config).await
    }
}
