//! Recording stand-ins for the obs-websocket session and connector.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use obs_mcp::bridge::{CommandBridge, ConnectionManager, Params};
use obs_mcp::config::ObsConfig;
use obs_mcp::error::ObsError;
use obs_mcp::obs::{Connector, Request, Session};
use serde_json::Value;

/// A recorded protocol call: request type and request data.
pub type Call = (String, Option<Value>);

/// State shared between a connector, its sessions and the test body.
#[derive(Debug, Default)]
pub struct MockState {
    /// Every request issued, in order.
    pub calls: Vec<Call>,
    /// Number of connect attempts that reached the connector.
    pub handshakes: usize,
    /// Whether the current session's transport is up.
    pub connected: bool,
    /// Make the next connect attempts fail.
    pub fail_connect: bool,
    /// Response data per request type. Missing entries answer `null`.
    pub responses: HashMap<&'static str, Value>,
    /// Request types OBS rejects, with status code and comment.
    pub rejections: HashMap<&'static str, (i64, &'static str)>,
}

pub type Shared = Rc<RefCell<MockState>>;

#[derive(Debug)]
pub struct MockSession {
    state: Shared,
}

impl Session for MockSession {
    async fn call(&mut self, request: &Request<'_>) -> Result<Value, ObsError> {
        let mut state = self.state.borrow_mut();
        let request_type = request.request_type();
        state
            .calls
            .push((request_type.to_string(), request.request_data()));

        if let Some((code, comment)) = state.rejections.get(request_type) {
            return Err(ObsError::Rejected {
                request_type: request_type.to_string(),
                code: *code,
                comment: Some((*comment).to_string()),
            });
        }
        Ok(state
            .responses
            .get(request_type)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    async fn close(&mut self) {
        self.state.borrow_mut().connected = false;
    }
}

#[derive(Debug)]
pub struct MockConnector {
    state: Shared,
}

impl Connector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, _config: &ObsConfig) -> Result<MockSession, ObsError> {
        let mut state = self.state.borrow_mut();
        state.handshakes += 1;
        if state.fail_connect {
            return Err(ObsError::Handshake("connection refused".to_string()));
        }
        state.connected = true;
        Ok(MockSession {
            state: Rc::clone(&self.state),
        })
    }
}

pub fn shared() -> Shared {
    Rc::new(RefCell::new(MockState::default()))
}

pub fn manager(state: &Shared) -> ConnectionManager<MockConnector> {
    ConnectionManager::new(
        MockConnector {
            state: Rc::clone(state),
        },
        ObsConfig::default(),
    )
}

pub fn bridge(state: &Shared) -> CommandBridge<MockConnector> {
    CommandBridge::new(manager(state))
}

pub fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

/// A scene with "Cam" (id 1) and "Screen" (id 2).
pub fn with_two_items(state: &Shared) {
    state.borrow_mut().responses.insert(
        "GetSceneItemList",
        serde_json::json!({
            "sceneItems": [
                {"sourceName": "Cam", "sceneItemId": 1},
                {"sourceName": "Screen", "sceneItemId": 2}
            ]
        }),
    );
}
