//! Command names, parsed commands, and the uniform result record.

use serde_json::{json, Map, Value};

use crate::error::BridgeError;
use crate::obs::Transform;

/// Named parameters accompanying a command.
pub type Params = Map<String, Value>;

/// Default name for sources created by `add_display_capture`.
pub const DEFAULT_DISPLAY_CAPTURE_NAME: &str = "DisplayCapture";

/// The fixed set of commands the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    /// Switch the program scene.
    SwitchScene,
    /// Start streaming.
    StartStreaming,
    /// Stop streaming.
    StopStreaming,
    /// Start recording.
    StartRecording,
    /// Stop recording.
    StopRecording,
    /// Show or hide a source in a scene.
    ToggleSourceVisibility,
    /// Add a display capture source to a scene.
    AddDisplayCapture,
    /// Move or scale a source in a scene.
    SetSourcePosition,
    /// List scenes.
    GetSceneList,
    /// Query the obs-websocket version.
    GetVersion,
}

impl CommandName {
    /// Every command, in tool-listing order.
    pub const ALL: [Self; 10] = [
        Self::SwitchScene,
        Self::StartStreaming,
        Self::StopStreaming,
        Self::StartRecording,
        Self::StopRecording,
        Self::ToggleSourceVisibility,
        Self::AddDisplayCapture,
        Self::SetSourcePosition,
        Self::GetSceneList,
        Self::GetVersion,
    ];

    /// Returns the wire name of this command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SwitchScene => "switch_scene",
            Self::StartStreaming => "start_streaming",
            Self::StopStreaming => "stop_streaming",
            Self::StartRecording => "start_recording",
            Self::StopRecording => "stop_recording",
            Self::ToggleSourceVisibility => "toggle_source_visibility",
            Self::AddDisplayCapture => "add_display_capture",
            Self::SetSourcePosition => "set_source_position",
            Self::GetSceneList => "get_scene_list",
            Self::GetVersion => "get_version",
        }
    }

    /// Looks up a command by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated command with its parameters filled in.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `switch_scene`
    SwitchScene {
        /// Target scene.
        scene_name: String,
    },
    /// `start_streaming`
    StartStreaming,
    /// `stop_streaming`
    StopStreaming,
    /// `start_recording`
    StartRecording,
    /// `stop_recording`
    StopRecording,
    /// `toggle_source_visibility`
    ToggleSourceVisibility {
        /// Scene containing the source.
        scene_name: String,
        /// Source to show or hide.
        source_name: String,
        /// `true` shows the source.
        enabled: bool,
    },
    /// `add_display_capture`
    AddDisplayCapture {
        /// Scene to add the capture to.
        scene_name: String,
        /// Name of the new source.
        source_name: String,
    },
    /// `set_source_position`
    SetSourcePosition {
        /// Scene containing the source.
        scene_name: String,
        /// Source to move.
        source_name: String,
        /// New position and scale.
        transform: Transform,
    },
    /// `get_scene_list`
    GetSceneList,
    /// `get_version`
    GetVersion,
}

impl Command {
    /// Parses a command name and its parameters, applying defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownCommand`] for names outside the dispatch
    /// table, and a parameter error when a required parameter is missing or has
    /// the wrong type.
    pub fn parse(name: &str, params: &Params) -> Result<Self, BridgeError> {
        let command = CommandName::from_name(name)
            .ok_or_else(|| BridgeError::UnknownCommand(name.to_string()))?;

        Ok(match command {
            CommandName::SwitchScene => Self::SwitchScene {
                scene_name: required_str(params, "scene_name")?,
            },
            CommandName::StartStreaming => Self::StartStreaming,
            CommandName::StopStreaming => Self::StopStreaming,
            CommandName::StartRecording => Self::StartRecording,
            CommandName::StopRecording => Self::StopRecording,
            CommandName::ToggleSourceVisibility => Self::ToggleSourceVisibility {
                scene_name: required_str(params, "scene_name")?,
                source_name: required_str(params, "source_name")?,
                enabled: optional_bool(params, "enabled")?.unwrap_or(true),
            },
            CommandName::AddDisplayCapture => Self::AddDisplayCapture {
                scene_name: required_str(params, "scene_name")?,
                source_name: optional_str(params, "source_name")?
                    .unwrap_or_else(|| DEFAULT_DISPLAY_CAPTURE_NAME.to_string()),
            },
            CommandName::SetSourcePosition => {
                let defaults = Transform::default();
                Self::SetSourcePosition {
                    scene_name: required_str(params, "scene_name")?,
                    source_name: required_str(params, "source_name")?,
                    transform: Transform {
                        position_x: optional_f64(params, "x")?.unwrap_or(defaults.position_x),
                        position_y: optional_f64(params, "y")?.unwrap_or(defaults.position_y),
                        scale_x: optional_f64(params, "scale_x")?.unwrap_or(defaults.scale_x),
                        scale_y: optional_f64(params, "scale_y")?.unwrap_or(defaults.scale_y),
                    },
                }
            }
            CommandName::GetSceneList => Self::GetSceneList,
            CommandName::GetVersion => Self::GetVersion,
        })
    }

    /// Returns the name this command was parsed from.
    #[must_use]
    pub const fn name(&self) -> CommandName {
        match self {
            Self::SwitchScene { .. } => CommandName::SwitchScene,
            Self::StartStreaming => CommandName::StartStreaming,
            Self::StopStreaming => CommandName::StopStreaming,
            Self::StartRecording => CommandName::StartRecording,
            Self::StopRecording => CommandName::StopRecording,
            Self::ToggleSourceVisibility { .. } => CommandName::ToggleSourceVisibility,
            Self::AddDisplayCapture { .. } => CommandName::AddDisplayCapture,
            Self::SetSourcePosition { .. } => CommandName::SetSourcePosition,
            Self::GetSceneList => CommandName::GetSceneList,
            Self::GetVersion => CommandName::GetVersion,
        }
    }
}

// JSON `null` is treated the same as an absent parameter.
fn lookup<'a>(params: &'a Params, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|v| !v.is_null())
}

fn required_str(params: &Params, name: &'static str) -> Result<String, BridgeError> {
    optional_str(params, name)?.ok_or(BridgeError::MissingParameter(name))
}

fn optional_str(params: &Params, name: &'static str) -> Result<Option<String>, BridgeError> {
    lookup(params, name)
        .map(|v| {
            v.as_str().map(str::to_string).ok_or(BridgeError::InvalidParameter {
                name,
                expected: "string",
            })
        })
        .transpose()
}

fn optional_bool(params: &Params, name: &'static str) -> Result<Option<bool>, BridgeError> {
    lookup(params, name)
        .map(|v| {
            v.as_bool().ok_or(BridgeError::InvalidParameter {
                name,
                expected: "boolean",
            })
        })
        .transpose()
}

fn optional_f64(params: &Params, name: &'static str) -> Result<Option<f64>, BridgeError> {
    lookup(params, name)
        .map(|v| {
            v.as_f64().ok_or(BridgeError::InvalidParameter {
                name,
                expected: "number",
            })
        })
        .transpose()
}

/// Data returned alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Scene names, in the order OBS reported them.
    Scenes(Vec<String>),
    /// obs-websocket version string.
    Version(String),
}

/// Outcome of a bridge command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,
    /// Human-readable description of the outcome.
    pub message: String,
    /// Optional data.
    pub payload: Option<Payload>,
}

impl CommandResult {
    /// A successful result without payload.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: None,
        }
    }

    /// A successful result carrying data.
    #[must_use]
    pub fn with_payload(message: impl Into<String>, payload: Payload) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: Some(payload),
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: None,
        }
    }

    /// Returns the scene names if this result carries them.
    #[must_use]
    pub fn scenes(&self) -> Option<&[String]> {
        match &self.payload {
            Some(Payload::Scenes(scenes)) => Some(scenes),
            _ => None,
        }
    }

    /// Renders the `{status, message, ...}` object returned to tool callers.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = json!({
            "status": if self.success { "success" } else { "error" },
            "message": self.message,
        });
        match &self.payload {
            Some(Payload::Scenes(scenes)) => object["scenes"] = json!(scenes),
            Some(Payload::Version(version)) => object["version"] = json!(version),
            None => {}
        }
        object
    }
}
