//! obs-websocket v5 wire types.
//!
//! Every message on the socket is a UTF-8 JSON text frame of the form
//! `{"op": <u8>, "d": {...}}`. Only the op-codes needed by a request/response
//! client are modelled; events are decoded as frames and skipped.
//!
//! # Handshake
//!
//! ```text
//! client                         OBS
//!   │ ◀──────── Hello (0) ─────── │   optional { challenge, salt }
//!   │ ───────── Identify (1) ───▶ │   rpcVersion, authentication?
//!   │ ◀──────── Identified (2) ── │
//!   │ ───────── Request (6) ────▶ │
//!   │ ◀──────── RequestResponse (7)
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ObsError;

/// The obs-websocket RPC version this client speaks.
pub const RPC_VERSION: u32 = 1;

/// Event subscription mask sent in Identify. Zero: no events wanted.
pub const NO_EVENTS: u32 = 0;

/// obs-websocket message op-codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// Server greeting, sent on connect.
    Hello,
    /// Client identification and authentication.
    Identify,
    /// Server confirms identification.
    Identified,
    /// Client updates session parameters.
    Reidentify,
    /// Server-pushed event.
    Event,
    /// Client request.
    Request,
    /// Server reply to a request.
    RequestResponse,
    /// Client batch request.
    RequestBatch,
    /// Server reply to a batch request.
    RequestBatchResponse,
}

impl OpCode {
    /// Returns the numeric op-code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Hello => 0,
            Self::Identify => 1,
            Self::Identified => 2,
            Self::Reidentify => 3,
            Self::Event => 5,
            Self::Request => 6,
            Self::RequestResponse => 7,
            Self::RequestBatch => 8,
            Self::RequestBatchResponse => 9,
        }
    }

    /// Maps a numeric op-code back to its variant.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Hello),
            1 => Some(Self::Identify),
            2 => Some(Self::Identified),
            3 => Some(Self::Reidentify),
            5 => Some(Self::Event),
            6 => Some(Self::Request),
            7 => Some(Self::RequestResponse),
            8 => Some(Self::RequestBatch),
            9 => Some(Self::RequestBatchResponse),
            _ => None,
        }
    }
}

/// A raw `{op, d}` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Numeric op-code.
    pub op: u8,
    /// Op-specific payload.
    pub d: Value,
}

impl Frame {
    /// Builds a frame from a serialisable payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialised.
    pub fn new<T: Serialize>(op: OpCode, data: &T) -> Result<Self, ObsError> {
        Ok(Self {
            op: op.code(),
            d: serde_json::to_value(data)?,
        })
    }

    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid frame.
    pub fn decode(text: &str) -> Result<Self, ObsError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialises this frame to JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn encode(&self) -> Result<String, ObsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Returns the op-code, if it is one this client knows.
    #[must_use]
    pub const fn opcode(&self) -> Option<OpCode> {
        OpCode::from_code(self.op)
    }

    /// Decodes the payload into a typed message.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ObsError> {
        Ok(serde_json::from_value(self.d)?)
    }
}

/// Authentication parameters offered in Hello.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    /// Per-connection challenge.
    pub challenge: String,
    /// Per-password salt.
    pub salt: String,
}

/// Hello (op 0).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    /// obs-websocket plugin version.
    #[serde(default)]
    pub obs_web_socket_version: Option<String>,
    /// Latest RPC version supported by the server.
    pub rpc_version: u32,
    /// Present when the server requires authentication.
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

/// Identify (op 1).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    /// RPC version requested by the client.
    pub rpc_version: u32,
    /// Authentication string, when Hello asked for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    /// Event subscription bitmask.
    pub event_subscriptions: u32,
}

/// Identified (op 2).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    /// RPC version the server settled on.
    pub negotiated_rpc_version: u32,
}

/// Request (op 6).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage<'a> {
    /// Request type, e.g. `GetVersion`.
    pub request_type: &'a str,
    /// Client-chosen id echoed back in the response.
    pub request_id: &'a str,
    /// Request-specific fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_data: Option<&'a Value>,
}

/// Status block of a RequestResponse.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestStatus {
    /// Whether the request succeeded.
    pub result: bool,
    /// obs-websocket status code (100 = success).
    pub code: i64,
    /// Optional explanation for failures.
    #[serde(default)]
    pub comment: Option<String>,
}

/// RequestResponse (op 7).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    /// Echo of the request type.
    pub request_type: String,
    /// Echo of the request id.
    pub request_id: String,
    /// Outcome of the request.
    pub request_status: RequestStatus,
    /// Response fields, if the request returns any.
    #[serde(default)]
    pub response_data: Option<Value>,
}

impl RequestResponse {
    /// Converts this response into its data, or the rejection it reports.
    ///
    /// Requests that return nothing yield `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`ObsError::Rejected`] when `requestStatus.result` is false.
    pub fn into_result(self) -> Result<Value, ObsError> {
        if self.request_status.result {
            Ok(self.response_data.unwrap_or(Value::Null))
        } else {
            Err(ObsError::Rejected {
                request_type: self.request_type,
                code: self.request_status.code,
                comment: self.request_status.comment,
            })
        }
    }
}

/// Computes the Identify authentication string.
///
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
#[must_use]
pub fn authentication_string(password: &str, salt: &str, challenge: &str) -> String {
    let secret = BASE64_STANDARD.encode(Sha256::digest(format!("{password}{salt}").as_bytes()));
    BASE64_STANDARD.encode(Sha256::digest(format!("{secret}{challenge}").as_bytes()))
}
