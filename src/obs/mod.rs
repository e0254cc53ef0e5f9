//! obs-websocket v5 client.
//!
//! - [`protocol`]: `{op, d}` frames, handshake messages, authentication string
//! - [`requests`]: the request catalogue used by the bridge and typed responses
//! - [`session`]: the `Session`/`Connector` traits the bridge is written against
//! - [`websocket`]: the `tokio-tungstenite` implementation of those traits

pub mod protocol;
pub mod requests;
pub mod session;
pub mod websocket;

pub use requests::{Request, Transform};
pub use session::{Connector, Session};
pub use websocket::{WebSocketConnector, WebSocketSession};
