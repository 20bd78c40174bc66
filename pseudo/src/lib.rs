//! Pseudo is a small teaching language. Programs are checked line by line,
//! translated into a script, and run in a sandbox with a timeout and
//! interactive input.
//!
//! ## Example Usage
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() {
//! use pseudo::futures::StreamExt;
//! use pseudo::{run, ExecutionEvent, SandboxConfig};
//!
//! let source = "Algorithm Demo\nvar x = 5\nprint x\nEndAlgorithm";
//! let events = run(source, &SandboxConfig::default())
//!     .collect::<Vec<_>>()
//!     .await;
//!
//! assert_eq!(
//!     events,
//!     vec![
//!         ExecutionEvent::Stdout { text: "5".to_string() },
//!         ExecutionEvent::Done,
//!     ]
//! );
//! # }
//! ```

pub use pseudo_grammar;
pub use pseudo_impl;
pub use pseudo_impl::futures;

pub use pseudo_grammar::{
    has_errors, translate, validate, IssueKind, TranslatedProgram, ValidationIssue,
};
pub use pseudo_impl::formatter;
pub use pseudo_impl::{
    execute, ErrorPayload, Execution, ExecutionEvent, Inbound, InputError, InputResponder, Phase,
    RunState, SandboxConfig, Severity, TimeoutPolicy,
};

mod server;
mod session;
pub use server::{encode_line, Server};
pub use session::{Session, DEFAULT_HISTORY_LIMIT};

use pseudo_grammar::try_translate;
use pseudo_impl::formatter::{format_translation, format_validation, format_warning};
use tracing::{debug, instrument, warn};

/// Validate, translate and execute `source`.
///
/// Validation and translation failures come back as an [`Execution`] that
/// yields a single error event, so every caller consumes one event stream.
/// Validation warnings do not stop the run; they arrive first as `stderr`
/// events.
#[instrument(skip(source, config), fields(bytes = source.len()))]
pub fn run(source: &str, config: &SandboxConfig) -> Execution {
    debug!(state = %RunState::Validating, "run state");
    let issues = validate(source);
    if has_errors(&issues) {
        debug!(issues = issues.len(), "validation failed");
        return Execution::failed(format_validation(&issues));
    }
    let warnings: Vec<String> = issues.iter().map(format_warning).collect();

    debug!(state = %RunState::Translating, "run state");
    let program = match try_translate(source) {
        Ok(program) => program,
        Err(error) => {
            warn!(%error, "translation failed");
            return Execution::failed(format_translation(&error));
        }
    };

    debug!(state = %RunState::SyntaxChecking, "run state");
    execute(&program, config).with_notices(warnings)
}

/// Sandbox settings for a start request carrying an optional timeout in milliseconds.
pub fn config_for(timeout: Option<u64>, policy: TimeoutPolicy) -> SandboxConfig {
    let config = SandboxConfig::new().timeout_policy(policy);
    match timeout {
        Some(millis) => config.timeout_ms(millis),
        None => config,
    }
}

/// One outbound protocol line.
pub fn encode_event(event: &ExecutionEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}
