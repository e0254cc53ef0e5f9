//! The obs-websocket requests issued by the bridge, and their typed responses.

use serde::Deserialize;
use serde_json::{json, Value};

/// Input kind used for display capture sources.
pub const MONITOR_CAPTURE_KIND: &str = "monitor_capture";

/// Position and scale applied to a scene item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Horizontal position in canvas pixels.
    pub position_x: f64,
    /// Vertical position in canvas pixels.
    pub position_y: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position_x: 0.0,
            position_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// A single obs-websocket request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request<'a> {
    /// Switch the program output to a scene.
    SetCurrentProgramScene {
        /// Target scene.
        scene_name: &'a str,
    },
    /// Start the stream output.
    StartStream,
    /// Stop the stream output.
    StopStream,
    /// Start the record output.
    StartRecord,
    /// Stop the record output.
    StopRecord,
    /// Create an input and add it to a scene.
    CreateInput {
        /// Scene to add the new scene item to.
        scene_name: &'a str,
        /// Name of the new input.
        input_name: &'a str,
        /// Input kind, e.g. `monitor_capture`.
        input_kind: &'a str,
        /// Whether the new scene item starts enabled.
        scene_item_enabled: bool,
    },
    /// List the items of a scene.
    GetSceneItemList {
        /// Scene to list.
        scene_name: &'a str,
    },
    /// Show or hide a scene item.
    SetSceneItemEnabled {
        /// Scene containing the item.
        scene_name: &'a str,
        /// Numeric scene item id.
        scene_item_id: i64,
        /// New enabled state.
        enabled: bool,
    },
    /// Move or scale a scene item.
    SetSceneItemTransform {
        /// Scene containing the item.
        scene_name: &'a str,
        /// Numeric scene item id.
        scene_item_id: i64,
        /// New transform.
        transform: Transform,
    },
    /// List all scenes.
    GetSceneList,
    /// Query plugin and OBS versions.
    GetVersion,
}

impl Request<'_> {
    /// Returns the `requestType` string.
    #[must_use]
    pub const fn request_type(&self) -> &'static str {
        match self {
            Self::SetCurrentProgramScene { .. } => "SetCurrentProgramScene",
            Self::StartStream => "StartStream",
            Self::StopStream => "StopStream",
            Self::StartRecord => "StartRecord",
            Self::StopRecord => "StopRecord",
            Self::CreateInput { .. } => "CreateInput",
            Self::GetSceneItemList { .. } => "GetSceneItemList",
            Self::SetSceneItemEnabled { .. } => "SetSceneItemEnabled",
            Self::SetSceneItemTransform { .. } => "SetSceneItemTransform",
            Self::GetSceneList => "GetSceneList",
            Self::GetVersion => "GetVersion",
        }
    }

    /// Returns the `requestData` object, or `None` for requests without fields.
    #[must_use]
    pub fn request_data(&self) -> Option<Value> {
        match *self {
            Self::SetCurrentProgramScene { scene_name } | Self::GetSceneItemList { scene_name } => {
                Some(json!({ "sceneName": scene_name }))
            }
            Self::CreateInput {
                scene_name,
                input_name,
                input_kind,
                scene_item_enabled,
            } => Some(json!({
                "sceneName": scene_name,
                "inputName": input_name,
                "inputKind": input_kind,
                "inputSettings": {},
                "sceneItemEnabled": scene_item_enabled,
            })),
            Self::SetSceneItemEnabled {
                scene_name,
                scene_item_id,
                enabled,
            } => Some(json!({
                "sceneName": scene_name,
                "sceneItemId": scene_item_id,
                "sceneItemEnabled": enabled,
            })),
            Self::SetSceneItemTransform {
                scene_name,
                scene_item_id,
                transform,
            } => Some(json!({
                "sceneName": scene_name,
                "sceneItemId": scene_item_id,
                "sceneItemTransform": {
                    "positionX": transform.position_x,
                    "positionY": transform.position_y,
                    "scaleX": transform.scale_x,
                    "scaleY": transform.scale_y,
                },
            })),
            Self::StartStream
            | Self::StopStream
            | Self::StartRecord
            | Self::StopRecord
            | Self::GetSceneList
            | Self::GetVersion => None,
        }
    }
}

/// One entry of a `GetSceneItemList` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
    /// Name of the source this item instantiates.
    pub source_name: String,
    /// Numeric scene item id.
    pub scene_item_id: i64,
}

/// `GetSceneItemList` response data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItemList {
    /// Items in the scene.
    pub scene_items: Vec<SceneItem>,
}

/// One entry of a `GetSceneList` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntry {
    /// Scene name.
    pub scene_name: String,
}

/// `GetSceneList` response data.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneList {
    /// Scenes in the order OBS reports them.
    pub scenes: Vec<SceneEntry>,
}

/// `GetVersion` response data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// obs-websocket plugin version.
    pub obs_web_socket_version: String,
    /// OBS Studio version.
    #[serde(default)]
    pub obs_version: Option<String>,
}
