use serde::{Deserialize, Serialize};

/// Event name for streaming generation chunks
pub const EVT_GENERATE_STREAM: &str = "generate-stream";
/// Event name for request completion
pub const EVT_GENERATE_DONE: &str = "generate-done";
/// Event name for request failure
pub const EVT_GENERATE_ERROR: &str = "generate-error";

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn. Immutable once appended; ordering is chronological.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Session status. `Creating`/`Updating` are the only loading states; the
/// machine cycles between settled and loading states for the life of the app.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Initial,
    Creating,
    Created,
    Updating,
    Updated,
}

impl GenerationStatus {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Creating | Self::Updating)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RequestKind {
    Create,
    Modify,
}

/// Model and component-library choice captured at a successful creation and
/// reused unchanged by every later modification request.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedConfig {
    pub model: String,
    pub use_component_library: bool,
}

/// JSON body sent to the generation endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateRequestBody<'a> {
    pub(super) model: &'a str,
    pub(super) use_component_library: bool,
    pub(super) messages: &'a [ChatMessage],
}

/// Streaming chunk payload sent to the webview.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStreamPayload {
    pub request_id: String,
    pub delta: String,
    pub done: bool,
}

/// Completion payload carrying the settled status.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDonePayload {
    pub request_id: String,
    pub status: GenerationStatus,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateErrorPayload {
    pub request_id: String,
    pub error: super::error::GenerateError,
}

/// Full session view returned to the webview on demand.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "camelCase"))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: GenerationStatus,
    pub generated_code: String,
    pub messages: Vec<ChatMessage>,
    pub locked_config: Option<LockedConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_wire_format() {
        let messages = vec![ChatMessage::user("Build me a calculator app")];
        let body = GenerateRequestBody {
            model: "google/gemma-2-27b-it",
            use_component_library: true,
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "google/gemma-2-27b-it");
        assert_eq!(json["useComponentLibrary"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Build me a calculator app");
    }

    #[test]
    fn test_status_loading_states() {
        assert!(GenerationStatus::Creating.is_loading());
        assert!(GenerationStatus::Updating.is_loading());
        assert!(!GenerationStatus::Initial.is_loading());
        assert!(!GenerationStatus::Created.is_loading());
        assert!(!GenerationStatus::Updated.is_loading());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(GenerationStatus::Creating).unwrap(),
            "creating"
        );
        assert_eq!(
            serde_json::to_value(Role::Assistant).unwrap(),
            "assistant"
        );
    }
}
