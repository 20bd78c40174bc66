pub use futures;
pub use pseudo_grammar;

pub mod ast;
pub mod builtins;
pub mod config;
pub mod error;
pub mod event;
pub mod formatter;
pub mod interpreter;
pub mod parser;
pub mod protocol;
pub mod sandbox;
pub mod scope;
pub mod value;
pub mod watchdog;
pub mod worker;

pub use config::{SandboxConfig, TimeoutPolicy};
pub use error::{ErrorName, InputError, ScriptError};
pub use event::{ErrorPayload, ExecutionEvent, Phase, Severity};
pub use protocol::Inbound;
pub use sandbox::{execute, Execution, InputResponder, RunState};
