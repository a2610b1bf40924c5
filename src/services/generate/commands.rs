use tauri::Emitter;

use crate::services::config::{load_config, AppConfig};
use crate::services::models;

use super::error::GenerateError;
use super::session::{GeneratorState, RequestPlan};
use super::stream;
use super::types::{
    GenerateDonePayload, GenerateErrorPayload, GenerateStreamPayload, SessionSnapshot,
    EVT_GENERATE_DONE, EVT_GENERATE_ERROR, EVT_GENERATE_STREAM,
};

fn start_generation_task(
    app: tauri::AppHandle,
    state: GeneratorState,
    plan: RequestPlan,
    config: AppConfig,
) {
    tauri::async_runtime::spawn(async move {
        match stream::run_generation_stream(&app, &state, &plan, &config).await {
            Ok(_) => match state.commit(&plan) {
                Ok(status) => {
                    let _ = app.emit(
                        EVT_GENERATE_STREAM,
                        GenerateStreamPayload {
                            request_id: plan.request_id.clone(),
                            delta: String::new(),
                            done: true,
                        },
                    );
                    let _ = app.emit(
                        EVT_GENERATE_DONE,
                        GenerateDonePayload {
                            request_id: plan.request_id.clone(),
                            status,
                        },
                    );
                }
                Err(err) => emit_failure(&app, &state, &plan, err),
            },
            Err(err) => emit_failure(&app, &state, &plan, err),
        }
    });
}

fn emit_failure(
    app: &tauri::AppHandle,
    state: &GeneratorState,
    plan: &RequestPlan,
    err: GenerateError,
) {
    log::warn!("Generation request {} failed: {}", plan.request_id, err);
    if let Err(revert) = state.fail(plan) {
        log::warn!("Status revert failed: {}", revert);
    }
    let _ = app.emit(
        EVT_GENERATE_ERROR,
        GenerateErrorPayload {
            request_id: plan.request_id.clone(),
            error: err,
        },
    );
    let _ = app.emit(
        EVT_GENERATE_STREAM,
        GenerateStreamPayload {
            request_id: plan.request_id.clone(),
            delta: String::new(),
            done: true,
        },
    );
}

/// Start a creation request for the current prompt.
///
/// Emits chunks via the `generate-stream` event and completion via
/// `generate-done`. Returns the request id; rejects with `Busy` while
/// another request is in flight.
#[tauri::command]
pub async fn generate_create(
    app: tauri::AppHandle,
    state: tauri::State<'_, GeneratorState>,
    prompt: String,
    model: Option<String>,
    use_component_library: Option<bool>,
) -> Result<String, GenerateError> {
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(GenerateError::invalid_input("Prompt is required"));
    }
    let model = model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| models::default_model().to_string());

    let plan = state.begin_create(prompt, model, use_component_library.unwrap_or(false))?;
    let request_id = plan.request_id.clone();
    start_generation_task(app, state.inner().clone(), plan, load_config());
    Ok(request_id)
}

/// Start a modification request against the current artifact.
///
/// Uses the locked model configuration and the committed conversation;
/// rejects with `Busy` while another request is in flight and with
/// `InvalidInput` before anything was created.
#[tauri::command]
pub async fn generate_modify(
    app: tauri::AppHandle,
    state: tauri::State<'_, GeneratorState>,
    modification: String,
) -> Result<String, GenerateError> {
    let modification = modification.trim().to_string();
    if modification.is_empty() {
        return Err(GenerateError::invalid_input("Modification is required"));
    }

    let plan = state.begin_modify(modification)?;
    let request_id = plan.request_id.clone();
    start_generation_task(app, state.inner().clone(), plan, load_config());
    Ok(request_id)
}

/// Current session state for the webview (status, artifact, conversation).
#[tauri::command]
pub fn get_session(
    state: tauri::State<'_, GeneratorState>,
) -> Result<SessionSnapshot, GenerateError> {
    state.snapshot()
}
