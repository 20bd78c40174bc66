//! The JSON-lines host protocol: one inbound message per line, one outbound
//! event per line. At most one program runs at a time.

use crate::futures::{future, StreamExt};
use crate::{config_for, encode_event, Execution, ExecutionEvent, Inbound, TimeoutPolicy};
use tracing::debug;

/// Protocol state for one connected host.
#[derive(Debug, Default)]
pub struct Server {
    policy: TimeoutPolicy,
    current: Option<Execution>,
}

fn stderr(text: impl Into<String>) -> ExecutionEvent {
    ExecutionEvent::Stderr { text: text.into() }
}

impl Server {
    pub fn new(policy: TimeoutPolicy) -> Self {
        Server {
            policy,
            current: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Handle one inbound line. Returns the event to report back right away,
    /// if the line was rejected.
    pub fn handle_line(&mut self, line: &str) -> Option<ExecutionEvent> {
        if line.trim().is_empty() {
            return None;
        }
        match Inbound::parse(line) {
            Ok(Inbound::Start { code, timeout }) => {
                if self.current.is_some() {
                    return Some(stderr("a program is already running"));
                }
                debug!(bytes = code.len(), ?timeout, "starting program");
                self.current = Some(crate::run(&code, &config_for(timeout, self.policy)));
                None
            }
            Ok(Inbound::InputResponse { id, value, .. }) => {
                let answered = match &self.current {
                    Some(execution) => execution.respond(&id, value).map_err(|e| e.to_string()),
                    None => Err("no program is running".to_string()),
                };
                answered.err().map(stderr)
            }
            Err(error) => Some(stderr(format!("invalid message: {error}"))),
        }
    }

    /// Next event of the running program. Never resolves while nothing runs,
    /// so it can sit in a `select!` next to the input reader.
    pub async fn next_event(&mut self) -> Option<ExecutionEvent> {
        let Some(execution) = self.current.as_mut() else {
            return future::pending().await;
        };
        let event = execution.next().await;
        if event.as_ref().map_or(true, ExecutionEvent::is_terminal) {
            self.current = None;
        }
        event
    }

    /// Give up the connection. The running program, if any, is handed back so
    /// its remaining output can still be drained.
    pub fn into_running(self) -> Option<Execution> {
        self.current
    }
}

/// One outbound protocol line, newline included.
pub fn encode_line(event: &ExecutionEvent) -> serde_json::Result<String> {
    let mut line = encode_event(event)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn next(server: &mut Server) -> Option<ExecutionEvent> {
        tokio::time::timeout(Duration::from_secs(10), server.next_event())
            .await
            .expect("event in time")
    }

    fn start(code: &str) -> String {
        serde_json::json!({ "code": code }).to_string()
    }

    #[tokio::test]
    async fn runs_a_program_to_completion() {
        let mut server = Server::default();
        assert_eq!(
            server.handle_line(&start("Algorithm A\nprint 7\nEndAlgorithm")),
            None
        );
        assert!(server.is_running());
        assert_eq!(
            next(&mut server).await,
            Some(ExecutionEvent::Stdout {
                text: "7".to_string()
            })
        );
        assert_eq!(next(&mut server).await, Some(ExecutionEvent::Done));
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn second_start_while_running_is_refused() {
        let mut server = Server::new(TimeoutPolicy::ResetAfterInput);
        server.handle_line(&start("Algorithm A\nvar n = input \"n?\"\nprint n\nEndAlgorithm"));
        let Some(ExecutionEvent::InputRequest { id, .. }) = next(&mut server).await else {
            panic!("expected an input request");
        };

        assert_eq!(
            server.handle_line(&start("Algorithm B\nprint 1\nEndAlgorithm")),
            Some(stderr("a program is already running"))
        );

        let response = Inbound::input_response(id, "4");
        assert_eq!(
            server.handle_line(&serde_json::to_string(&response).unwrap()),
            None
        );
        assert_eq!(
            next(&mut server).await,
            Some(ExecutionEvent::Stdout {
                text: "4".to_string()
            })
        );
        assert_eq!(next(&mut server).await, Some(ExecutionEvent::Done));

        // Once the first run is over a new one may start.
        assert_eq!(
            server.handle_line(&start("Algorithm B\nprint 1\nEndAlgorithm")),
            None
        );
    }

    #[tokio::test]
    async fn bad_lines_are_reported_on_stderr() {
        let mut server = Server::default();
        assert_eq!(server.handle_line("   "), None);
        assert!(matches!(
            server.handle_line("{not json"),
            Some(ExecutionEvent::Stderr { text }) if text.starts_with("invalid message:")
        ));
        let response = Inbound::input_response("nope", "x");
        assert_eq!(
            server.handle_line(&serde_json::to_string(&response).unwrap()),
            Some(stderr("no program is running"))
        );
    }

    #[tokio::test]
    async fn answers_to_unknown_requests_are_rejected() {
        let mut server = Server::default();
        server.handle_line(&start("Algorithm A\nvar n = input \"n?\"\nEndAlgorithm"));
        assert!(matches!(
            next(&mut server).await,
            Some(ExecutionEvent::InputRequest { .. })
        ));
        let response = Inbound::input_response("stale", "x");
        assert!(matches!(
            server.handle_line(&serde_json::to_string(&response).unwrap()),
            Some(ExecutionEvent::Stderr { .. })
        ));
        assert!(server.is_running());
    }

    #[tokio::test]
    async fn validation_errors_end_the_run_at_once() {
        let mut server = Server::default();
        server.handle_line(&start("print 1"));
        let Some(ExecutionEvent::Error { error }) = next(&mut server).await else {
            panic!("expected a validation error");
        };
        assert_eq!(error.phase, crate::Phase::Validation);
        assert!(!server.is_running());
    }

    #[test]
    fn lines_end_with_a_newline() {
        assert_eq!(
            encode_line(&ExecutionEvent::Done).unwrap(),
            "{\"type\":\"done\"}\n"
        );
    }
}
