//! Outbound events and the error payload they carry.

use pseudo_grammar::ValidationIssue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Validation,
    Translation,
    Syntax,
    Runtime,
    Execution,
    Timeout,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validation => "validation",
            Phase::Translation => "translation",
            Phase::Syntax => "syntax",
            Phase::Runtime => "runtime",
            Phase::Execution => "execution",
            Phase::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// How prominently a UI should decorate an error. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn of(error_name: &str) -> Self {
        match error_name {
            "SyntaxError" => Severity::High,
            "ReferenceError" | "TypeError" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub name: String,
    /// Human-readable text: the raw message followed by source context and suggestions.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub phase: Phase,
    /// 1-based line in the pseudocode source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<ValidationIssue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<bool>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// One message from a run to its host. A run ends with exactly one of
/// [`ExecutionEvent::Done`] or [`ExecutionEvent::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ExecutionEvent {
    Stdout { text: String },
    Stderr { text: String },
    Error { error: ErrorPayload },
    Done,
    InputRequest { id: String, prompt: String },
}

impl ExecutionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionEvent::Done | ExecutionEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_format() {
        let event = ExecutionEvent::InputRequest {
            id: "abc".to_string(),
            prompt: "Name:".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "input-request", "id": "abc", "prompt": "Name:"})
        );
        assert_eq!(
            serde_json::to_value(&ExecutionEvent::Done).unwrap(),
            json!({"type": "done"})
        );
    }

    #[test]
    fn error_payload_fields_are_camel_case() {
        let event = ExecutionEvent::Error {
            error: ErrorPayload {
                name: "TimeoutError".to_string(),
                message: "Execution timed out".to_string(),
                stack: None,
                phase: Phase::Timeout,
                line: Some(3),
                column: None,
                issues: None,
                original_text: Some("while true".to_string()),
                formatted: Some(true),
                severity: Severity::Low,
                suggestions: vec![],
            },
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "error",
                "error": {
                    "name": "TimeoutError",
                    "message": "Execution timed out",
                    "phase": "timeout",
                    "line": 3,
                    "originalText": "while true",
                    "formatted": true,
                    "severity": "low"
                }
            })
        );
    }

    #[test]
    fn severity_by_name() {
        assert_eq!(Severity::of("SyntaxError"), Severity::High);
        assert_eq!(Severity::of("TypeError"), Severity::Medium);
        assert_eq!(Severity::of("RangeError"), Severity::Low);
    }
}
