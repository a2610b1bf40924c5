//! Generation session state and the single-slot request guard.
//!
//! Status transitions go through the pure reducer [`next_status`]; all other
//! session fields are only touched under the mutex by the request that holds
//! the loading slot.

use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwapOption;
use uuid::Uuid;

use super::error::GenerateError;
use super::types::{ChatMessage, GenerationStatus, LockedConfig, RequestKind, SessionSnapshot};

#[derive(Debug, Clone, Copy)]
pub(super) enum SessionEvent {
    Submitted(RequestKind),
    Completed(RequestKind),
    Failed { prior: GenerationStatus },
}

/// Pure reducer for the status machine:
/// `initial -> creating -> created -> updating -> updated -> updating -> ...`
///
/// Returns `None` for transitions the machine does not permit: submitting
/// while a request is loading, modifying before anything was created, or
/// settling a request that is not in flight.
pub(super) fn next_status(
    status: GenerationStatus,
    event: SessionEvent,
) -> Option<GenerationStatus> {
    use GenerationStatus::*;

    match event {
        SessionEvent::Submitted(RequestKind::Create) if !status.is_loading() => Some(Creating),
        SessionEvent::Submitted(RequestKind::Modify) if matches!(status, Created | Updated) => {
            Some(Updating)
        }
        SessionEvent::Submitted(_) => None,
        SessionEvent::Completed(RequestKind::Create) if status == Creating => Some(Created),
        SessionEvent::Completed(RequestKind::Modify) if status == Updating => Some(Updated),
        SessionEvent::Completed(_) => None,
        SessionEvent::Failed { prior } if status.is_loading() => Some(prior),
        SessionEvent::Failed { .. } => None,
    }
}

/// Everything a request task needs, captured while the loading slot is taken.
pub(super) struct RequestPlan {
    pub(super) request_id: String,
    pub(super) kind: RequestKind,
    pub(super) model: String,
    pub(super) use_component_library: bool,
    /// Full message history to send; becomes the conversation on success.
    pub(super) messages: Vec<ChatMessage>,
    pub(super) prior_status: GenerationStatus,
}

#[derive(Default)]
struct SessionCore {
    status: GenerationStatus,
    generated_code: String,
    messages: Vec<ChatMessage>,
}

/// Managed state: one generation session for the life of the app process.
#[derive(Clone)]
pub struct GeneratorState {
    http_client: reqwest::Client,
    // NOTE: std::sync::Mutex since the lock is never held across .await.
    session: Arc<Mutex<SessionCore>>,
    /// Captured at each successful creation; read lock-free on modification.
    locked: Arc<ArcSwapOption<LockedConfig>>,
}

impl Default for GeneratorState {
    fn default() -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            session: Arc::new(Mutex::new(SessionCore::default())),
            locked: Arc::new(ArcSwapOption::empty()),
        }
    }
}

fn new_request_id() -> String {
    format!("req_{}", Uuid::new_v4())
}

impl GeneratorState {
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, SessionCore>, GenerateError> {
        self.session
            .lock()
            .map_err(|_| GenerateError::internal("Generation session lock poisoned"))
    }

    /// Take the loading slot for a creation request.
    pub(super) fn begin_create(
        &self,
        prompt: String,
        model: String,
        use_component_library: bool,
    ) -> Result<RequestPlan, GenerateError> {
        let mut session = self.lock_session()?;
        let prior_status = session.status;
        let Some(next) = next_status(prior_status, SessionEvent::Submitted(RequestKind::Create))
        else {
            return Err(GenerateError::busy(
                "A generation request is already in flight",
            ));
        };
        session.status = next;

        Ok(RequestPlan {
            request_id: new_request_id(),
            kind: RequestKind::Create,
            model,
            use_component_library,
            messages: vec![ChatMessage::user(prompt)],
            prior_status,
        })
    }

    /// Take the loading slot for a modification request.
    ///
    /// The message history becomes the prior conversation plus exactly two
    /// appended messages: the previous assistant artifact and the new user
    /// modification. Model and component-library flag come from the locked
    /// configuration, never from the current UI selection.
    pub(super) fn begin_modify(&self, modification: String) -> Result<RequestPlan, GenerateError> {
        let locked = self.locked.load_full();
        let mut session = self.lock_session()?;
        let prior_status = session.status;
        let Some(next) = next_status(prior_status, SessionEvent::Submitted(RequestKind::Modify))
        else {
            return Err(if prior_status.is_loading() {
                GenerateError::busy("A generation request is already in flight")
            } else {
                GenerateError::invalid_input("No generated app to modify yet")
            });
        };
        let Some(locked) = locked else {
            return Err(GenerateError::invalid_input(
                "No locked model configuration; create an app first",
            ));
        };

        let mut messages = session.messages.clone();
        messages.push(ChatMessage::assistant(session.generated_code.clone()));
        messages.push(ChatMessage::user(modification));
        session.status = next;

        Ok(RequestPlan {
            request_id: new_request_id(),
            kind: RequestKind::Modify,
            model: locked.model.clone(),
            use_component_library: locked.use_component_library,
            messages,
            prior_status,
        })
    }

    /// Clear the artifact for the arriving stream.
    ///
    /// Called only after the response status has been validated, so a failed
    /// request cannot destroy the previous artifact.
    pub(super) fn open_stream(&self) -> Result<(), GenerateError> {
        self.lock_session()?.generated_code.clear();
        Ok(())
    }

    pub(super) fn append_chunk(&self, delta: &str) -> Result<(), GenerateError> {
        self.lock_session()?.generated_code.push_str(delta);
        Ok(())
    }

    /// Settle a finished request: commit the conversation, advance the
    /// status, and (for a creation) capture the locked configuration.
    pub(super) fn commit(&self, plan: &RequestPlan) -> Result<GenerationStatus, GenerateError> {
        let mut session = self.lock_session()?;
        let Some(next) = next_status(session.status, SessionEvent::Completed(plan.kind)) else {
            return Err(GenerateError::internal(
                "Request settled in an unexpected session state",
            ));
        };
        session.status = next;
        session.messages = plan.messages.clone();
        drop(session);

        if plan.kind == RequestKind::Create {
            self.locked.store(Some(Arc::new(LockedConfig {
                model: plan.model.clone(),
                use_component_library: plan.use_component_library,
            })));
        }

        Ok(next)
    }

    /// Release the loading slot after a failed request, reverting the status
    /// to its prior settled value. Conversation and locked configuration are
    /// left untouched.
    pub(super) fn fail(&self, plan: &RequestPlan) -> Result<(), GenerateError> {
        let mut session = self.lock_session()?;
        if let Some(prior) = next_status(
            session.status,
            SessionEvent::Failed {
                prior: plan.prior_status,
            },
        ) {
            session.status = prior;
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Result<SessionSnapshot, GenerateError> {
        let session = self.lock_session()?;
        Ok(SessionSnapshot {
            status: session.status,
            generated_code: session.generated_code.clone(),
            messages: session.messages.clone(),
            locked_config: self.locked.load_full().map(|locked| (*locked).clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generate::types::Role;

    fn run_creation(state: &GeneratorState, prompt: &str, model: &str, chunks: &[&str]) {
        let plan = state
            .begin_create(prompt.to_string(), model.to_string(), false)
            .unwrap();
        state.open_stream().unwrap();
        for chunk in chunks {
            state.append_chunk(chunk).unwrap();
        }
        state.commit(&plan).unwrap();
    }

    #[test]
    fn test_reducer_full_cycle() {
        use GenerationStatus::*;

        let mut status = Initial;
        for (event, expected) in [
            (SessionEvent::Submitted(RequestKind::Create), Creating),
            (SessionEvent::Completed(RequestKind::Create), Created),
            (SessionEvent::Submitted(RequestKind::Modify), Updating),
            (SessionEvent::Completed(RequestKind::Modify), Updated),
            (SessionEvent::Submitted(RequestKind::Modify), Updating),
            (SessionEvent::Completed(RequestKind::Modify), Updated),
        ] {
            status = next_status(status, event).unwrap();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_reducer_rejects_illegal_transitions() {
        use GenerationStatus::*;

        // No submission while loading.
        assert!(next_status(Creating, SessionEvent::Submitted(RequestKind::Create)).is_none());
        assert!(next_status(Updating, SessionEvent::Submitted(RequestKind::Modify)).is_none());
        // No modification before the first creation.
        assert!(next_status(Initial, SessionEvent::Submitted(RequestKind::Modify)).is_none());
        // No settling without an in-flight request.
        assert!(next_status(Created, SessionEvent::Completed(RequestKind::Create)).is_none());
        assert!(next_status(Initial, SessionEvent::Failed { prior: Created }).is_none());
    }

    #[test]
    fn test_creation_accumulates_chunks_in_order() {
        let state = GeneratorState::default();
        run_creation(
            &state,
            "Build me a calculator app",
            "google/gemma-2-27b-it",
            &["function ", "App() ", "{}"],
        );

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.status, GenerationStatus::Created);
        assert_eq!(snapshot.generated_code, "function App() {}");
        assert_eq!(
            snapshot.messages,
            vec![ChatMessage::user("Build me a calculator app")]
        );
    }

    #[test]
    fn test_locked_config_captured_at_creation() {
        let state = GeneratorState::default();
        run_creation(&state, "Daily quotes", "google/gemma-2-27b-it", &["code"]);

        let locked = state.snapshot().unwrap().locked_config.unwrap();
        assert_eq!(locked.model, "google/gemma-2-27b-it");
        assert!(!locked.use_component_library);

        // A modification reuses the locked choice, whatever the UI selects now.
        let plan = state.begin_modify("Make it blue".to_string()).unwrap();
        assert_eq!(plan.model, "google/gemma-2-27b-it");
        assert!(!plan.use_component_library);
    }

    #[test]
    fn test_modification_appends_exactly_two_messages() {
        let state = GeneratorState::default();
        run_creation(
            &state,
            "Recipe finder",
            "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo",
            &["<App/>"],
        );

        let plan = state.begin_modify("Add a search box".to_string()).unwrap();
        assert_eq!(plan.messages.len(), 3);
        assert_eq!(plan.messages[0], ChatMessage::user("Recipe finder"));
        assert_eq!(plan.messages[1], ChatMessage::assistant("<App/>"));
        assert_eq!(plan.messages[2], ChatMessage::user("Add a search box"));

        state.open_stream().unwrap();
        state.append_chunk("<App2/>").unwrap();
        state.commit(&plan).unwrap();

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.status, GenerationStatus::Updated);
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages[2].role, Role::User);
    }

    #[test]
    fn test_second_submission_rejected_while_in_flight() {
        let state = GeneratorState::default();
        let _plan = state
            .begin_create("Expense tracker".to_string(), "m".to_string(), false)
            .unwrap();

        let err = state
            .begin_create("Another".to_string(), "m".to_string(), false)
            .unwrap_err();
        assert!(matches!(err, GenerateError::Busy { .. }));

        let err = state.begin_modify("tweak".to_string()).unwrap_err();
        assert!(matches!(err, GenerateError::Busy { .. }));
    }

    #[test]
    fn test_modify_before_create_is_invalid() {
        let state = GeneratorState::default();
        let err = state.begin_modify("tweak".to_string()).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidInput { .. }));
    }

    #[test]
    fn test_failed_request_reverts_status_and_keeps_artifact() {
        let state = GeneratorState::default();
        run_creation(&state, "Time zone dashboard", "m", &["old artifact"]);

        // Request fails before the stream opened: nothing was cleared.
        let plan = state.begin_modify("break it".to_string()).unwrap();
        assert_eq!(
            state.snapshot().unwrap().status,
            GenerationStatus::Updating
        );
        state.fail(&plan).unwrap();

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.status, GenerationStatus::Created);
        assert_eq!(snapshot.generated_code, "old artifact");
        assert_eq!(snapshot.messages.len(), 1);
    }

    #[test]
    fn test_recreation_replaces_conversation_and_relocks() {
        let state = GeneratorState::default();
        run_creation(&state, "Daily quotes", "model-a", &["v1"]);
        run_creation(&state, "Calculator app", "model-b", &["v2"]);

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.generated_code, "v2");
        assert_eq!(
            snapshot.messages,
            vec![ChatMessage::user("Calculator app")]
        );
        assert_eq!(snapshot.locked_config.unwrap().model, "model-b");
    }
}
