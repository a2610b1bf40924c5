//! Streaming code generation.
//!
//! One request task per user action (create or modify). The response body is
//! consumed incrementally; each decoded chunk is appended to the session
//! artifact in arrival order and surfaced to the webview as an event while
//! the stream is still open.

pub(crate) mod commands;
mod error;
mod session;
mod stream;
mod types;

pub use commands::{generate_create, generate_modify, get_session};
pub use error::GenerateError;
pub use session::GeneratorState;
pub use types::{
    ChatMessage, GenerateDonePayload, GenerateErrorPayload, GenerateStreamPayload,
    GenerationStatus, LockedConfig, Role, SessionSnapshot, EVT_GENERATE_DONE, EVT_GENERATE_ERROR,
    EVT_GENERATE_STREAM,
};
