//! Prompts advertised through `prompts/list` and `prompts/get`.

use serde_json::{json, Value};

struct PromptDef {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

const PROMPTS: &[PromptDef] = &[PromptDef {
    name: "obs_usage",
    description: "How to drive OBS Studio for recording and streaming with these tools",
    content: "\
To manage OBS Studio for video recording and streaming, use these tools:
- `switch_scene(scene_name)`: Switch to a specific scene.
- `start_streaming()`: Start streaming to the configured platform.
- `stop_streaming()`: Stop the current stream.
- `start_recording()`: Start recording a video.
- `stop_recording()`: Stop recording and save the video.
- `toggle_source_visibility(scene_name, source_name, enabled)`: Show or hide a source in a scene.
- `add_display_capture(scene_name, source_name)`: Add a display capture source to share your desktop screen.
- `set_source_position(scene_name, source_name, x, y, scale_x, scale_y)`: Reposition or resize a source in a scene.
- `get_scene_list()`: Retrieve a list of all scenes in OBS Studio.
- `get_version()` / `test_obs_connection()`: Test the connection to OBS WebSocket.
Start by testing the connection, then set up your scene with a display capture for screen sharing, \
adjust positions if needed, and manage recording.",
}];

/// Returns the `prompts/list` result.
#[must_use]
pub fn list_prompts() -> Value {
    let prompts: Vec<Value> = PROMPTS
        .iter()
        .map(|p| json!({ "name": p.name, "description": p.description }))
        .collect();
    json!({ "prompts": prompts })
}

/// Returns the `prompts/get` result, or `None` for an unknown prompt.
#[must_use]
pub fn get_prompt(name: &str) -> Option<Value> {
    PROMPTS.iter().find(|p| p.name == name).map(|p| {
        json!({
            "description": p.description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": p.content }
            }]
        })
    })
}
