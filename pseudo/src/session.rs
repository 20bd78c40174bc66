use crate::{ErrorPayload, Execution, ExecutionEvent, SandboxConfig};
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Error history for one editing session.
///
/// The pipeline itself keeps no state between runs; callers that want to show
/// recent failures feed every event they receive through [`Session::observe`].
#[derive(Debug, Clone)]
pub struct Session {
    history: VecDeque<ErrorPayload>,
    limit: usize,
}

impl Default for Session {
    fn default() -> Self {
        Session::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` errors, dropping the oldest first.
    pub fn with_limit(limit: usize) -> Self {
        Session {
            history: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit: limit.max(1),
        }
    }

    pub fn run(&self, source: &str, config: &SandboxConfig) -> Execution {
        crate::run(source, config)
    }

    /// Record `event` if it is a terminal error.
    pub fn observe(&mut self, event: &ExecutionEvent) {
        if let ExecutionEvent::Error { error } = event {
            if self.history.len() == self.limit {
                self.history.pop_front();
            }
            self.history.push_back(error.clone());
        }
    }

    /// Recorded errors, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ErrorPayload> + '_ {
        self.history.iter()
    }

    pub fn last_error(&self) -> Option<&ErrorPayload> {
        self.history.back()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::format_internal;
    use crate::futures::StreamExt;

    fn error(message: &str) -> ExecutionEvent {
        ExecutionEvent::Error {
            error: format_internal(message),
        }
    }

    #[test]
    fn records_only_errors() {
        let mut session = Session::new();
        session.observe(&ExecutionEvent::Stdout {
            text: "hi".to_string(),
        });
        session.observe(&ExecutionEvent::Done);
        assert!(session.is_empty());

        session.observe(&error("first"));
        assert_eq!(session.len(), 1);
        assert!(session.last_error().is_some_and(|e| e.message.contains("first")));
    }

    #[test]
    fn history_is_bounded() {
        let mut session = Session::with_limit(2);
        for message in ["a", "b", "c"] {
            session.observe(&error(message));
        }
        let messages: Vec<_> = session.history().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["InternalError: b", "InternalError: c"]);

        session.clear();
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn observes_runs() {
        let mut session = Session::new();
        let mut execution = session.run(
            "Algorithm Oops\nprint missing\nEndAlgorithm",
            &SandboxConfig::default(),
        );
        while let Some(event) = execution.next().await {
            session.observe(&event);
        }
        let last = session.last_error().expect("an error was recorded");
        assert_eq!(last.name, "ReferenceError");
        assert_eq!(last.line, Some(2));
    }
}
