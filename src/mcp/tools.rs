//! Tool definitions advertised through `tools/list`.
//!
//! Each tool maps onto one bridge command. `test_obs_connection` is kept as an
//! alias of `get_version` for clients written against its older name.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::bridge::CommandName;

/// Tool name kept as an alias of `get_version`.
pub const TEST_CONNECTION_TOOL: &str = "test_obs_connection";

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Wraps a `{status, message, ...}` object as text content.
    ///
    /// `isError` follows the object's `status` field.
    #[must_use]
    pub fn from_status(body: &Value) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: body.to_string(),
            }],
            is_error: body.get("status").and_then(Value::as_str) != Some("success"),
        }
    }
}

/// Maps a tool name to the bridge command it runs.
#[must_use]
pub fn command_for_tool(tool: &str) -> Option<CommandName> {
    if tool == TEST_CONNECTION_TOOL {
        return Some(CommandName::GetVersion);
    }
    CommandName::from_name(tool)
}

fn scene_name_property() -> Value {
    json!({
        "type": "string",
        "description": "Name of the scene"
    })
}

fn source_name_property() -> Value {
    json!({
        "type": "string",
        "description": "Name of the source within the scene"
    })
}

fn no_arguments() -> Value {
    json!({
        "type": "object",
        "properties": {}
    })
}

fn describe(command: CommandName) -> (&'static str, Value) {
    match command {
        CommandName::SwitchScene => (
            "Switches to the specified scene in OBS Studio.",
            json!({
                "type": "object",
                "properties": { "scene_name": scene_name_property() },
                "required": ["scene_name"]
            }),
        ),
        CommandName::StartStreaming => ("Starts streaming in OBS Studio.", no_arguments()),
        CommandName::StopStreaming => ("Stops streaming in OBS Studio.", no_arguments()),
        CommandName::StartRecording => ("Starts recording in OBS Studio.", no_arguments()),
        CommandName::StopRecording => (
            "Stops recording in OBS Studio and saves the video.",
            no_arguments(),
        ),
        CommandName::ToggleSourceVisibility => (
            "Shows or hides a source in a specific scene.",
            json!({
                "type": "object",
                "properties": {
                    "scene_name": scene_name_property(),
                    "source_name": source_name_property(),
                    "enabled": {
                        "type": "boolean",
                        "description": "true to show the source, false to hide it",
                        "default": true
                    }
                },
                "required": ["scene_name", "source_name"]
            }),
        ),
        CommandName::AddDisplayCapture => (
            "Adds a display capture source to the specified scene to share the desktop screen.",
            json!({
                "type": "object",
                "properties": {
                    "scene_name": scene_name_property(),
                    "source_name": {
                        "type": "string",
                        "description": "Name for the new display capture source",
                        "default": "DisplayCapture"
                    }
                },
                "required": ["scene_name"]
            }),
        ),
        CommandName::SetSourcePosition => (
            "Sets the position and scale of a source in a specific scene.",
            json!({
                "type": "object",
                "properties": {
                    "scene_name": scene_name_property(),
                    "source_name": source_name_property(),
                    "x": { "type": "number", "description": "Horizontal position in pixels", "default": 0 },
                    "y": { "type": "number", "description": "Vertical position in pixels", "default": 0 },
                    "scale_x": { "type": "number", "description": "Horizontal scale factor", "default": 1.0 },
                    "scale_y": { "type": "number", "description": "Vertical scale factor", "default": 1.0 }
                },
                "required": ["scene_name", "source_name"]
            }),
        ),
        CommandName::GetSceneList => (
            "Retrieves a list of all scenes in OBS Studio.",
            no_arguments(),
        ),
        CommandName::GetVersion => (
            "Returns the obs-websocket version reported by OBS Studio.",
            no_arguments(),
        ),
    }
}

/// Returns every tool definition.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let mut tools: Vec<ToolDefinition> = CommandName::ALL
        .into_iter()
        .map(|command| {
            let (description, input_schema) = describe(command);
            ToolDefinition {
                name: command.as_str().to_string(),
                description: Some(description.to_string()),
                input_schema,
            }
        })
        .collect();

    tools.push(ToolDefinition {
        name: TEST_CONNECTION_TOOL.to_string(),
        description: Some("Tests the connection to OBS WebSocket.".to_string()),
        input_schema: no_arguments(),
    });

    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definitions_valid() {
        let tools = tool_definitions();
        assert_eq!(tools.len(), CommandName::ALL.len() + 1);

        for tool in &tools {
            assert!(!tool.name.is_empty());
            assert!(tool.input_schema.is_object());
            assert!(command_for_tool(&tool.name).is_some(), "{}", tool.name);
        }
    }

    #[test]
    fn required_fields_are_declared_properties() {
        for tool in tool_definitions() {
            let properties = tool.input_schema["properties"].as_object().unwrap();
            if let Some(required) = tool.input_schema["required"].as_array() {
                for field in required {
                    assert!(properties.contains_key(field.as_str().unwrap()));
                }
            }
        }
    }

    #[test]
    fn alias_maps_to_get_version() {
        assert_eq!(
            command_for_tool("test_obs_connection"),
            Some(CommandName::GetVersion)
        );
        assert_eq!(command_for_tool("format_disk"), None);
    }

    #[test]
    fn status_drives_is_error() {
        let ok = ToolCallResult::from_status(&json!({"status": "success", "message": "ok"}));
        assert!(!ok.is_error);

        let failed = ToolCallResult::from_status(&json!({"status": "error", "message": "no"}));
        assert!(failed.is_error);
        match &failed.content[0] {
            ToolContent::Text { text } => assert!(text.contains(r#""message":"no""#)),
        }
    }
}
