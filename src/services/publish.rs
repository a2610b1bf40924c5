//! Publish/share adapter.
//!
//! Hands the current artifact, the last user prompt, and the locked model
//! identifier to the share endpoint; the returned identifier becomes a
//! shareable URL. Failures are returned to the webview for a notification
//! and leave the session untouched so the user may retry. No retry here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clipboard;
use super::config::{load_config, AppConfig};
use super::generate::{GeneratorState, Role};

/// Minimum time the publish action stays busy, so the affordance does not
/// flash on fast responses.
const PUBLISH_MIN_DELAY: Duration = Duration::from_millis(1000);

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "camelCase"))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PublishError {
    Transport { message: String },
    Server { status: u16, message: String },
    /// The endpoint answered success but returned no usable identifier.
    MalformedId { message: String },
    NoArtifact { message: String },
    Busy { message: String },
    Internal { message: String },
}

impl PublishError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn malformed_id(message: impl Into<String>) -> Self {
        Self::MalformedId {
            message: message.into(),
        }
    }

    pub fn no_artifact(message: impl Into<String>) -> Self {
        Self::NoArtifact {
            message: message.into(),
        }
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Server { message, .. }
            | Self::MalformedId { message }
            | Self::NoArtifact { message }
            | Self::Busy { message }
            | Self::Internal { message } => message,
        }
    }
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "Transport: {}", message),
            Self::Server { status, message } => write!(f, "Server {}: {}", status, message),
            Self::MalformedId { message } => write!(f, "MalformedId: {}", message),
            Self::NoArtifact { message } => write!(f, "NoArtifact: {}", message),
            Self::Busy { message } => write!(f, "Busy: {}", message),
            Self::Internal { message } => write!(f, "Internal: {}", message),
        }
    }
}

impl std::error::Error for PublishError {}

/// JSON body sent to the share endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShareRequestBody<'a> {
    generated_code: &'a str,
    prompt: &'a str,
    model: &'a str,
}

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "camelCase"))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    pub app_id: String,
    pub share_url: String,
}

/// Build the shareable URL for a published app id.
fn share_link(site_domain: &str, app_id: &str) -> String {
    format!("{}/share/{}", site_domain.trim_end_matches('/'), app_id)
}

async fn request_share_id(
    client: &reqwest::Client,
    config: &AppConfig,
    body: &ShareRequestBody<'_>,
) -> Result<String, PublishError> {
    let mut request = client.post(config.share_endpoint()).json(body);
    if !config.api_key.is_empty() {
        request = request.bearer_auth(&config.api_key);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PublishError::server(
            status.as_u16(),
            status.canonical_reason().unwrap_or("request failed"),
        ));
    }

    let app_id = response.text().await?.trim().to_string();
    if app_id.is_empty() {
        return Err(PublishError::malformed_id(
            "Share endpoint returned an empty identifier",
        ));
    }
    Ok(app_id)
}

/// Publish the current artifact and copy the share URL to the clipboard.
#[tauri::command]
pub async fn publish_app(
    state: tauri::State<'_, GeneratorState>,
) -> Result<PublishResult, PublishError> {
    let snapshot = state
        .snapshot()
        .map_err(|err| PublishError::internal(err.message()))?;

    if snapshot.status.is_loading() {
        return Err(PublishError::busy("A generation request is in flight"));
    }
    if snapshot.generated_code.is_empty() {
        return Err(PublishError::no_artifact("Nothing to publish yet"));
    }
    let prompt = snapshot
        .messages
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
        .map(|message| message.content.clone())
        .ok_or_else(|| PublishError::no_artifact("No prompt recorded for this app"))?;
    let model = snapshot
        .locked_config
        .map(|locked| locked.model)
        .ok_or_else(|| PublishError::no_artifact("No locked model configuration"))?;

    let config = load_config();
    let body = ShareRequestBody {
        generated_code: &snapshot.generated_code,
        prompt: &prompt,
        model: &model,
    };

    let (app_id, _) = tokio::join!(
        request_share_id(state.http_client(), &config, &body),
        tokio::time::sleep(PUBLISH_MIN_DELAY)
    );
    let app_id = app_id?;

    let share_url = share_link(&config.site_domain, &app_id);
    if let Err(err) = clipboard::copy_text(&share_url) {
        log::warn!("Clipboard copy failed: {}", err);
    }

    Ok(PublishResult { app_id, share_url })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_link_contains_id_verbatim() {
        assert_eq!(
            share_link("https://example.com", "abc123"),
            "https://example.com/share/abc123"
        );
        assert_eq!(
            share_link("https://example.com/", "abc123"),
            "https://example.com/share/abc123"
        );
    }

    #[test]
    fn test_share_body_wire_format() {
        let body = ShareRequestBody {
            generated_code: "function App() {}",
            prompt: "Calculator app",
            model: "google/gemma-2-27b-it",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generatedCode"], "function App() {}");
        assert_eq!(json["prompt"], "Calculator app");
        assert_eq!(json["model"], "google/gemma-2-27b-it");
    }

    #[test]
    fn test_error_serializes_tagged() {
        let json = serde_json::to_value(PublishError::no_artifact("Nothing to publish yet")).unwrap();
        assert_eq!(json["type"], "noArtifact");
        assert_eq!(json["message"], "Nothing to publish yet");
    }
}
