use crate::ast::Pos;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The JavaScript error constructor a script failure is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorName {
    Error,
    ReferenceError,
    TypeError,
    RangeError,
    SyntaxError,
}

impl ErrorName {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorName::Error => "Error",
            ErrorName::ReferenceError => "ReferenceError",
            ErrorName::TypeError => "TypeError",
            ErrorName::RangeError => "RangeError",
            ErrorName::SyntaxError => "SyntaxError",
        }
    }
}

impl fmt::Display for ErrorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by a running script, with the stack text at the throw site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name}: {message}")]
pub struct ScriptError {
    pub name: ErrorName,
    pub message: String,
    pub stack: String,
    pub pos: Pos,
}

/// A failure raised by a builtin before it has a position attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thrown {
    pub name: ErrorName,
    pub message: String,
}

impl Thrown {
    pub fn type_error(message: impl Into<String>) -> Self {
        Thrown {
            name: ErrorName::TypeError,
            message: message.into(),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Thrown {
            name: ErrorName::RangeError,
            message: message.into(),
        }
    }
}

/// Why evaluation stopped before the program finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unwind {
    Throw(ScriptError),
    /// The execution budget ran out while at `pos`.
    Timeout { pos: Pos },
    /// The host went away; nothing more will be reported.
    Cancelled,
}

impl From<ScriptError> for Unwind {
    fn from(error: ScriptError) -> Self {
        Unwind::Throw(error)
    }
}

/// Errors answering an input request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("no pending input request with id '{0}'")]
    UnknownRequest(String),
    #[error("the run has already finished")]
    Closed,
}
