//! obs-websocket client tests against an in-process fake OBS.
//!
//! The fake server speaks just enough of the v5 protocol: Hello with optional
//! authentication, Identify checking, and a few canned request behaviours.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use obs_mcp::bridge::{CommandBridge, ConnectionManager, Params};
use obs_mcp::config::ObsConfig;
use obs_mcp::error::ObsError;
use obs_mcp::obs::protocol::authentication_string;
use obs_mcp::obs::{Request, Session, WebSocketConnector, WebSocketSession};

const CHALLENGE: &str = "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=";
const SALT: &str = "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=";
const PASSWORD: &str = "supersecretpassword";

// =============================================================================
// Fake OBS
// =============================================================================

type ServerStream = WebSocketStream<TcpStream>;

/// Starts a fake OBS on an ephemeral port and returns a config pointing at it.
async fn spawn_fake_obs(password: Option<&'static str>) -> ObsConfig {
    spawn_fake_obs_with(password, false).await.0
}

/// Starts a fake OBS that can close each connection right after its first
/// reply. Also returns the number of accepted connections.
async fn spawn_fake_obs_with(
    password: Option<&'static str>,
    close_after_reply: bool,
) -> (ObsConfig, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve_client(tcp, password, close_after_reply));
        }
    });

    let config = ObsConfig {
        host: "127.0.0.1".to_string(),
        port,
        password: None,
        request_timeout_secs: 1,
    };
    (config, accepted)
}

async fn send_op(ws: &mut ServerStream, op: u8, d: Value) {
    let text = json!({"op": op, "d": d}).to_string();
    ws.send(Message::Text(text.into())).await.unwrap();
}

async fn recv_op(ws: &mut ServerStream) -> Option<Value> {
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).ok();
        }
    }
    None
}

async fn respond(ws: &mut ServerStream, request: &Value, ok: bool, code: i64, data: Option<Value>) {
    let mut d = json!({
        "requestType": request["requestType"],
        "requestId": request["requestId"],
        "requestStatus": {"result": ok, "code": code},
    });
    if !ok {
        d["requestStatus"]["comment"] = json!("Stream already active");
    }
    if let Some(data) = data {
        d["responseData"] = data;
    }
    send_op(ws, 7, d).await;
}

async fn serve_client(tcp: TcpStream, password: Option<&'static str>, close_after_reply: bool) {
    let Ok(mut ws) = accept_async(tcp).await else {
        return;
    };

    let mut hello = json!({"obsWebSocketVersion": "5.4.2", "rpcVersion": 1});
    if password.is_some() {
        hello["authentication"] = json!({"challenge": CHALLENGE, "salt": SALT});
    }
    send_op(&mut ws, 0, hello).await;

    let Some(identify) = recv_op(&mut ws).await else {
        return;
    };
    if let Some(password) = password {
        let expected = authentication_string(password, SALT, CHALLENGE);
        if identify["d"]["authentication"].as_str() != Some(expected.as_str()) {
            let _ = ws
                .close(Some(CloseFrame {
                    code: CloseCode::from(4009),
                    reason: "Authentication failed.".into(),
                }))
                .await;
            return;
        }
    }
    send_op(&mut ws, 2, json!({"negotiatedRpcVersion": 1})).await;

    while let Some(frame) = recv_op(&mut ws).await {
        let request = frame["d"].clone();
        match request["requestType"].as_str().unwrap_or_default() {
            "GetVersion" => {
                let data = json!({"obsVersion": "30.1.2", "obsWebSocketVersion": "5.4.2"});
                respond(&mut ws, &request, true, 100, Some(data)).await;
            }
            "GetSceneList" => {
                send_op(
                    &mut ws,
                    5,
                    json!({"eventType": "SceneListChanged", "eventIntent": 4, "eventData": {}}),
                )
                .await;
                let stale = json!({"requestType": "GetSceneList", "requestId": "stale"});
                respond(&mut ws, &stale, true, 100, Some(json!({"scenes": []}))).await;
                let data = json!({"scenes": [{"sceneName": "A"}, {"sceneName": "B"}]});
                respond(&mut ws, &request, true, 100, Some(data)).await;
            }
            "StartStream" => respond(&mut ws, &request, false, 500, None).await,
            // Never answered.
            "StopStream" => {}
            // Drop the socket without a close handshake.
            "StopRecord" => return,
            _ => respond(&mut ws, &request, true, 100, None).await,
        }
        if close_after_reply {
            let _ = ws.close(None).await;
            return;
        }
    }
}

async fn connect(config: &ObsConfig) -> WebSocketSession {
    match WebSocketSession::connect(config).await {
        Ok(session) => session,
        Err(e) => panic!("connect failed: {e}"),
    }
}

async fn connect_err(config: &ObsConfig) -> ObsError {
    match WebSocketSession::connect(config).await {
        Ok(_) => panic!("connect unexpectedly succeeded"),
        Err(e) => e,
    }
}

// =============================================================================
// Handshake
// =============================================================================

#[tokio::test]
async fn connects_without_authentication() {
    let config = spawn_fake_obs(None).await;

    let mut session = connect(&config).await;

    assert!(session.is_connected());
    assert_eq!(session.rpc_version(), 1);
    session.close().await;
    assert!(!session.is_connected());
}

#[tokio::test]
async fn authenticates_with_password() {
    let mut config = spawn_fake_obs(Some(PASSWORD)).await;
    config.password = Some(PASSWORD.to_string());

    let mut session = connect(&config).await;
    let version = session.call(&Request::GetVersion).await.unwrap();

    assert_eq!(version["obsWebSocketVersion"], "5.4.2");
}

#[tokio::test]
async fn missing_password_is_reported() {
    let config = spawn_fake_obs(Some(PASSWORD)).await;

    let err = connect_err(&config).await;

    assert!(matches!(err, ObsError::AuthenticationRequired));
}

#[tokio::test]
async fn wrong_password_is_closed_by_server() {
    let mut config = spawn_fake_obs(Some(PASSWORD)).await;
    config.password = Some("not-the-password".to_string());

    let err = connect_err(&config).await;

    match err {
        ObsError::Closed { code, reason } => {
            assert_eq!(code, 4009);
            assert_eq!(reason, "Authentication failed.");
        }
        other => panic!("Expected Closed, got {other:?}"),
    }
}

// =============================================================================
// Requests
// =============================================================================

#[tokio::test]
async fn rejection_carries_status_and_comment() {
    let config = spawn_fake_obs(None).await;
    let mut session = connect(&config).await;

    let err = session.call(&Request::StartStream).await.unwrap_err();

    match &err {
        ObsError::Rejected {
            request_type,
            code,
            comment,
        } => {
            assert_eq!(request_type, "StartStream");
            assert_eq!(*code, 500);
            assert_eq!(comment.as_deref(), Some("Stream already active"));
        }
        other => panic!("Expected Rejected, got {other:?}"),
    }
    assert!(session.is_connected());
}

#[tokio::test]
async fn events_and_stale_responses_are_skipped() {
    let config = spawn_fake_obs(None).await;
    let mut session = connect(&config).await;

    let data = session.call(&Request::GetSceneList).await.unwrap();

    assert_eq!(
        data["scenes"],
        json!([{"sceneName": "A"}, {"sceneName": "B"}])
    );
}

#[tokio::test]
async fn request_without_data_returns_null() {
    let config = spawn_fake_obs(None).await;
    let mut session = connect(&config).await;

    let data = session
        .call(&Request::SetCurrentProgramScene { scene_name: "A" })
        .await
        .unwrap();

    assert_eq!(data, Value::Null);
}

#[tokio::test]
async fn dropped_socket_marks_session_disconnected() {
    let config = spawn_fake_obs(None).await;
    let mut session = connect(&config).await;

    let result = session.call(&Request::StopRecord).await;

    assert!(result.is_err());
    assert!(!session.is_connected());
    assert!(matches!(
        session.call(&Request::GetVersion).await,
        Err(ObsError::NotConnected)
    ));
}

#[tokio::test]
async fn idle_session_stays_usable() {
    let config = spawn_fake_obs(None).await;
    let mut session = connect(&config).await;

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(session.poll_connected());
    assert!(session.call(&Request::GetVersion).await.is_ok());
}

#[tokio::test]
async fn close_while_idle_is_noticed_before_reuse() {
    let (config, _) = spawn_fake_obs_with(None, true).await;
    let mut session = connect(&config).await;
    session.call(&Request::GetVersion).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!session.poll_connected());
    assert!(!session.is_connected());
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let config = spawn_fake_obs(None).await;
    let mut session = connect(&config).await;

    let err = session.call(&Request::StopStream).await.unwrap_err();

    assert!(matches!(&err, ObsError::Timeout(request) if request == "StopStream"));
    assert!(session.is_connected());
}

// =============================================================================
// Through the bridge
// =============================================================================

#[tokio::test]
async fn bridge_runs_commands_over_websocket() {
    let config = spawn_fake_obs(None).await;
    let mut bridge = CommandBridge::new(ConnectionManager::new(WebSocketConnector, config));

    let scenes = bridge.execute("get_scene_list", &Params::new()).await.unwrap();
    let version = bridge.execute("get_version", &Params::new()).await.unwrap();
    let stream = bridge.execute("start_streaming", &Params::new()).await.unwrap();

    assert_eq!(
        scenes.scenes(),
        Some(&["A".to_string(), "B".to_string()][..])
    );
    assert_eq!(version.message, "OBS WebSocket version: 5.4.2");
    assert!(!stream.success);
    assert!(stream.message.contains("Stream already active"));

    bridge.disconnect().await;
    assert!(!bridge.connections().is_connected());
}

#[tokio::test]
async fn bridge_reconnects_after_drop() {
    let config = spawn_fake_obs(None).await;
    let mut bridge = CommandBridge::new(ConnectionManager::new(WebSocketConnector, config));

    let dropped = bridge.execute("stop_recording", &Params::new()).await.unwrap();
    assert!(!dropped.success);
    assert!(!bridge.connections().is_connected());

    let version = bridge.execute("get_version", &Params::new()).await.unwrap();
    assert!(version.success);
    assert!(bridge.connections().is_connected());
}

#[tokio::test]
async fn bridge_reconnects_after_idle_close() {
    let (config, accepted) = spawn_fake_obs_with(None, true).await;
    let mut bridge = CommandBridge::new(ConnectionManager::new(WebSocketConnector, config));

    let first = bridge.execute("get_version", &Params::new()).await.unwrap();
    assert!(first.success, "{}", first.message);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let second = bridge.execute("get_version", &Params::new()).await.unwrap();
    assert!(second.success, "{}", second.message);
    assert_eq!(second.message, "OBS WebSocket version: 5.4.2");
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ObsConfig {
        host: "127.0.0.1".to_string(),
        port,
        password: None,
        request_timeout_secs: 2,
    };
    let mut bridge = CommandBridge::new(ConnectionManager::new(WebSocketConnector, config));

    let err = bridge
        .execute("get_version", &Params::new())
        .await
        .unwrap_err();

    assert_eq!(err.endpoint, format!("127.0.0.1:{port}"));
    assert!(err
        .to_string()
        .starts_with(&format!("could not connect to OBS WebSocket at 127.0.0.1:{port}")));
}
