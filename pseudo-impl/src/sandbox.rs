//! The execution sandbox.
//!
//! [`execute`] runs a translated program on its own worker thread and hands
//! back an [`Execution`], a [`Stream`] of [`ExecutionEvent`]s. The worker
//! parses the wrapped program first (the syntax check), then interprets it.
//!
//! `input(prompt)` parks the worker: it records the pending request id, emits
//! an [`ExecutionEvent::InputRequest`] and blocks until the host answers via
//! [`InputResponder::respond`]. The watchdog is paused for the whole wait.
//!
//! Dropping the [`Execution`] cancels the run; the worker stops at its next
//! statement or wakes from its input wait and exits without further events.

use crate::config::SandboxConfig;
use crate::error::{InputError, Unwind};
use crate::event::{ErrorPayload, ExecutionEvent, Phase};
use crate::formatter::{format_internal, format_runtime, format_syntax, format_timeout};
use crate::interpreter::{Host, Interpreter};
use crate::parser::parse_program;
use crate::watchdog::Watchdog;
use crate::worker;
use futures::channel::{mpsc, oneshot};
use futures::task::{Context, Poll};
use futures::Stream;
use parking_lot::Mutex;
use pseudo_grammar::TranslatedProgram;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

/// File name used for positions in stack traces.
pub const SANDBOX_FILE: &str = "<sandbox>";

/// Name of the function the generated code is wrapped in.
pub const ENTRY_POINT: &str = "__program__";

/// Wrap generated code in the entry function. The wrapper adds exactly one
/// line above the code.
pub fn wrap(code: &str) -> String {
    format!("async function {ENTRY_POINT}(print, input) {{\n{code}\n}}")
}

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    Translating,
    SyntaxChecking,
    Running,
    Failed(Phase),
    TimedOut,
    Done,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Failed(_) | RunState::TimedOut | RunState::Done)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Validating => f.write_str("validating"),
            RunState::Translating => f.write_str("translating"),
            RunState::SyntaxChecking => f.write_str("syntax-checking"),
            RunState::Running => f.write_str("running"),
            RunState::Failed(phase) => write!(f, "failed({phase})"),
            RunState::TimedOut => f.write_str("timed-out"),
            RunState::Done => f.write_str("done"),
        }
    }
}

enum InputSlot {
    Idle,
    Waiting {
        id: String,
        reply: oneshot::Sender<String>,
    },
    Closed,
}

struct Shared {
    state: Mutex<RunState>,
    slot: Mutex<InputSlot>,
    cancelled: Arc<AtomicBool>,
}

impl Shared {
    fn new(state: RunState) -> Arc<Self> {
        Arc::new(Shared {
            state: Mutex::new(state),
            slot: Mutex::new(InputSlot::Idle),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    fn transition(&self, next: RunState) {
        let mut state = self.state.lock();
        debug!(from = %*state, to = %next, "run state");
        *state = next;
    }

    fn close(&self) {
        // Dropping a pending reply sender wakes the worker with a cancellation.
        *self.slot.lock() = InputSlot::Closed;
    }
}

/// Answers input requests for one run. Cheap to clone and `Send`, so it can be
/// handed to whatever reads the host's responses.
#[derive(Clone)]
pub struct InputResponder {
    shared: Arc<Shared>,
}

impl InputResponder {
    /// Resolve the outstanding request `id` with `value`.
    pub fn respond(&self, id: &str, value: impl Into<String>) -> Result<(), InputError> {
        let mut slot = self.shared.slot.lock();
        match std::mem::replace(&mut *slot, InputSlot::Idle) {
            InputSlot::Waiting { id: pending, reply } if pending == id => {
                trace!(%id, "input response");
                reply.send(value.into()).map_err(|_| InputError::Closed)
            }
            InputSlot::Closed => {
                *slot = InputSlot::Closed;
                Err(InputError::Closed)
            }
            other => {
                *slot = other;
                Err(InputError::UnknownRequest(id.to_string()))
            }
        }
    }

    /// Id of the request currently waiting for an answer.
    pub fn pending(&self) -> Option<String> {
        match &*self.shared.slot.lock() {
            InputSlot::Waiting { id, .. } => Some(id.clone()),
            _ => None,
        }
    }
}

impl fmt::Debug for InputResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputResponder")
            .field("pending", &self.pending())
            .finish()
    }
}

/// A running (or finished) program. Yields events in the order they were
/// produced and ends after the terminal event.
pub struct Execution {
    events: mpsc::UnboundedReceiver<ExecutionEvent>,
    shared: Arc<Shared>,
    notices: VecDeque<ExecutionEvent>,
    finished: bool,
}

impl Execution {
    /// An execution that failed before reaching the sandbox.
    pub fn failed(error: ErrorPayload) -> Self {
        let (sender, events) = mpsc::unbounded();
        let shared = Shared::new(RunState::Failed(error.phase));
        shared.close();
        // The receiver is alive, so this cannot fail.
        let _ = sender.unbounded_send(ExecutionEvent::Error { error });
        Execution {
            events,
            shared,
            notices: VecDeque::new(),
            finished: false,
        }
    }

    /// Yield each notice as a `stderr` event before anything the run produces.
    pub fn with_notices(mut self, notices: impl IntoIterator<Item = String>) -> Self {
        self.notices
            .extend(notices.into_iter().map(|text| ExecutionEvent::Stderr { text }));
        self
    }

    pub fn responder(&self) -> InputResponder {
        InputResponder {
            shared: self.shared.clone(),
        }
    }

    pub fn respond(&self, id: &str, value: impl Into<String>) -> Result<(), InputError> {
        self.responder().respond(id, value)
    }

    pub fn state(&self) -> RunState {
        *self.shared.state.lock()
    }

    /// Stop the run. No further events are produced.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Relaxed);
        self.shared.close();
    }
}

impl Stream for Execution {
    type Item = ExecutionEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if let Some(notice) = this.notices.pop_front() {
            return Poll::Ready(Some(notice));
        }
        match Pin::new(&mut this.events).poll_next(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    this.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Execution {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("state", &self.state())
            .field("finished", &self.finished)
            .finish()
    }
}

/// The [`Host`] a worker's interpreter talks to.
struct SandboxHost {
    events: mpsc::UnboundedSender<ExecutionEvent>,
    shared: Arc<Shared>,
}

impl Host for SandboxHost {
    fn print(&mut self, text: String) {
        let _ = self.events.unbounded_send(ExecutionEvent::Stdout { text });
    }

    fn input(&mut self, prompt: String) -> Option<String> {
        let (reply, response) = oneshot::channel();
        let id = Uuid::new_v4().to_string();
        {
            let mut slot = self.shared.slot.lock();
            if matches!(*slot, InputSlot::Closed) {
                return None;
            }
            *slot = InputSlot::Waiting {
                id: id.clone(),
                reply,
            };
        }
        trace!(%id, %prompt, "input request");
        self.events
            .unbounded_send(ExecutionEvent::InputRequest { id, prompt })
            .ok()?;
        futures::executor::block_on(response).ok()
    }
}

struct Job {
    program: TranslatedProgram,
    config: SandboxConfig,
    events: mpsc::UnboundedSender<ExecutionEvent>,
    shared: Arc<Shared>,
}

impl Job {
    fn finish(&self, event: ExecutionEvent, state: RunState) {
        self.shared.transition(state);
        self.shared.close();
        let _ = self.events.unbounded_send(event);
    }

    fn run(self) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.interpret()));
        if let Err(payload) = outcome {
            let message = worker::panic_message(&*payload);
            warn!(%message, "sandbox worker panicked");
            let _ = self.events.unbounded_send(ExecutionEvent::Stderr {
                text: format!("internal error: {message}"),
            });
            self.finish(
                ExecutionEvent::Error {
                    error: format_internal(&message),
                },
                RunState::Failed(Phase::Execution),
            );
        }
    }

    fn interpret(&self) {
        let statements = match parse_program(&wrap(&self.program.code)) {
            Ok(statements) => statements,
            Err(error) => {
                debug!(%error, "generated code failed the syntax check");
                let error = format_syntax(&error, &self.program);
                self.finish(ExecutionEvent::Error { error }, RunState::Failed(Phase::Syntax));
                return;
            }
        };

        self.shared.transition(RunState::Running);
        let watchdog = Watchdog::start(
            self.config.budget(),
            self.config.policy(),
            self.shared.cancelled.clone(),
        );
        let host = SandboxHost {
            events: self.events.clone(),
            shared: self.shared.clone(),
        };
        let mut interpreter = Interpreter::new(host, watchdog, self.config.call_depth_limit());

        match interpreter.run(&statements) {
            Ok(()) => self.finish(ExecutionEvent::Done, RunState::Done),
            Err(Unwind::Throw(error)) => {
                debug!(%error, "program threw");
                let error = format_runtime(&error, &self.program);
                self.finish(ExecutionEvent::Error { error }, RunState::Failed(Phase::Runtime));
            }
            Err(Unwind::Timeout { pos }) => {
                warn!(budget_ms = self.config.budget().as_millis() as u64, %pos, "program timed out");
                let error = format_timeout(self.config.budget(), pos, &self.program);
                self.finish(ExecutionEvent::Error { error }, RunState::TimedOut);
            }
            Err(Unwind::Cancelled) => {
                debug!("run cancelled");
                self.shared.close();
            }
        }
    }
}

/// Run a translated program. Events arrive on the returned [`Execution`].
#[instrument(skip_all, fields(lines = program.line_count(), timeout_ms = config.budget().as_millis() as u64))]
pub fn execute(program: &TranslatedProgram, config: &SandboxConfig) -> Execution {
    let (events, receiver) = mpsc::unbounded();
    let shared = Shared::new(RunState::SyntaxChecking);
    let job = Job {
        program: program.clone(),
        config: config.clone(),
        events: events.clone(),
        shared: shared.clone(),
    };

    if let Err(error) = worker::spawn("pseudo-sandbox", move || job.run()) {
        warn!(%error, "could not start sandbox worker");
        let _ = events.unbounded_send(ExecutionEvent::Stderr {
            text: format!("could not start sandbox worker: {error}"),
        });
        shared.transition(RunState::Failed(Phase::Execution));
        shared.close();
        let _ = events.unbounded_send(ExecutionEvent::Error {
            error: format_internal(&error.to_string()),
        });
    }

    Execution {
        events: receiver,
        shared,
        notices: VecDeque::new(),
        finished: false,
    }
}
