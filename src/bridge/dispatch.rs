//! The command dispatch table.

use serde_json::Value;

use crate::bridge::command::{Command, CommandResult, Params, Payload};
use crate::bridge::connection::ConnectionManager;
use crate::error::{BridgeError, ConnectionError, ObsError};
use crate::obs::requests::{SceneItemList, SceneList, Version, MONITOR_CAPTURE_KIND};
use crate::obs::{Connector, Request, Session};

/// Maps bridge commands onto obs-websocket requests.
pub struct CommandBridge<C: Connector> {
    connections: ConnectionManager<C>,
}

impl<C: Connector> CommandBridge<C> {
    /// Creates a bridge that owns the given connection manager.
    #[must_use]
    pub const fn new(connections: ConnectionManager<C>) -> Self {
        Self { connections }
    }

    /// Returns the connection manager.
    #[must_use]
    pub const fn connections(&self) -> &ConnectionManager<C> {
        &self.connections
    }

    /// Runs a command by name.
    ///
    /// Unknown names, bad parameters, and every protocol-level failure come
    /// back as a failed [`CommandResult`]. Parameters are validated before any
    /// connection attempt, so a rejected command never touches OBS.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] only when no session to OBS can be
    /// established.
    pub async fn execute(
        &mut self,
        name: &str,
        params: &Params,
    ) -> Result<CommandResult, ConnectionError> {
        let command = match Command::parse(name, params) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(command = name, error = %e, "Rejected command");
                return Ok(CommandResult::failure(e.to_string()));
            }
        };

        let session = self.connections.ensure_connected().await?;

        match run(session, &command).await {
            Ok(result) => {
                tracing::info!(command = %command.name(), message = %result.message, "Command succeeded");
                Ok(result)
            }
            Err(e) => {
                tracing::error!(command = %command.name(), error = %e, "OBS command error");
                Ok(CommandResult::failure(e.to_string()))
            }
        }
    }

    /// Closes the OBS session, if any.
    pub async fn disconnect(&mut self) {
        self.connections.disconnect().await;
    }
}

async fn run<S: Session>(session: &mut S, command: &Command) -> Result<CommandResult, BridgeError> {
    match command {
        Command::SwitchScene { scene_name } => {
            session
                .call(&Request::SetCurrentProgramScene {
                    scene_name: scene_name.as_str(),
                })
                .await?;
            Ok(CommandResult::ok(format!("Switched to scene '{scene_name}'")))
        }
        Command::StartStreaming => {
            session.call(&Request::StartStream).await?;
            Ok(CommandResult::ok("Streaming started"))
        }
        Command::StopStreaming => {
            session.call(&Request::StopStream).await?;
            Ok(CommandResult::ok("Streaming stopped"))
        }
        Command::StartRecording => {
            session.call(&Request::StartRecord).await?;
            Ok(CommandResult::ok("Recording started"))
        }
        Command::StopRecording => {
            session.call(&Request::StopRecord).await?;
            Ok(CommandResult::ok("Recording stopped"))
        }
        Command::ToggleSourceVisibility {
            scene_name,
            source_name,
            enabled,
        } => {
            let scene_item_id = resolve_scene_item_id(session, scene_name, source_name).await?;
            session
                .call(&Request::SetSceneItemEnabled {
                    scene_name: scene_name.as_str(),
                    scene_item_id,
                    enabled: *enabled,
                })
                .await?;
            let visibility = if *enabled { "visible" } else { "hidden" };
            Ok(CommandResult::ok(format!(
                "Source '{source_name}' set to {visibility}"
            )))
        }
        Command::AddDisplayCapture {
            scene_name,
            source_name,
        } => {
            session
                .call(&Request::CreateInput {
                    scene_name: scene_name.as_str(),
                    input_name: source_name.as_str(),
                    input_kind: MONITOR_CAPTURE_KIND,
                    scene_item_enabled: true,
                })
                .await?;
            Ok(CommandResult::ok(format!(
                "Added display capture source '{source_name}' to scene '{scene_name}'"
            )))
        }
        Command::SetSourcePosition {
            scene_name,
            source_name,
            transform,
        } => {
            let scene_item_id = resolve_scene_item_id(session, scene_name, source_name).await?;
            session
                .call(&Request::SetSceneItemTransform {
                    scene_name: scene_name.as_str(),
                    scene_item_id,
                    transform: *transform,
                })
                .await?;
            Ok(CommandResult::ok(format!(
                "Set position of source '{source_name}' in scene '{scene_name}'"
            )))
        }
        Command::GetSceneList => {
            let list: SceneList = decode(session.call(&Request::GetSceneList).await?)?;
            let scenes = list.scenes.into_iter().map(|s| s.scene_name).collect();
            Ok(CommandResult::with_payload(
                "Scenes retrieved",
                Payload::Scenes(scenes),
            ))
        }
        Command::GetVersion => {
            let version: Version = decode(session.call(&Request::GetVersion).await?)?;
            Ok(CommandResult::with_payload(
                format!("OBS WebSocket version: {}", version.obs_web_socket_version),
                Payload::Version(version.obs_web_socket_version),
            ))
        }
    }
}

/// Resolves a source name to its scene item id within a scene.
///
/// The lookup is repeated on every call; ids are never cached.
///
/// # Errors
///
/// Returns [`BridgeError::NotFound`] naming both the scene and the source when
/// no item matches exactly, or a protocol error if the listing fails.
pub async fn resolve_scene_item_id<S: Session>(
    session: &mut S,
    scene_name: &str,
    source_name: &str,
) -> Result<i64, BridgeError> {
    let list: SceneItemList = decode(
        session
            .call(&Request::GetSceneItemList { scene_name })
            .await?,
    )?;

    list.scene_items
        .into_iter()
        .find(|item| item.source_name == source_name)
        .map(|item| item.scene_item_id)
        .ok_or_else(|| {
            tracing::error!(scene = scene_name, source = source_name, "Source not found in scene");
            BridgeError::NotFound {
                scene: scene_name.to_string(),
                source_name: source_name.to_string(),
            }
        })
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Result<T, BridgeError> {
    serde_json::from_value(data).map_err(|e| BridgeError::Protocol(ObsError::Decode(e)))
}
