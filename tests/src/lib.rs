#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use pseudo::{run, Execution, ExecutionEvent, Inbound, Phase, SandboxConfig, Session};
    use std::time::{Duration, Instant};

    const GRADES: &str = include_str!("../../pseudo-grammar/tests/programs/grades.pseudo");
    const FACTORIAL: &str = include_str!("../../pseudo-grammar/tests/programs/factorial.pseudo");
    const COUNTDOWN: &str = include_str!("../../pseudo-grammar/tests/programs/countdown.pseudo");

    async fn all_events(execution: Execution) -> Vec<ExecutionEvent> {
        tokio::time::timeout(Duration::from_secs(10), execution.collect::<Vec<_>>())
            .await
            .expect("run did not finish in time")
    }

    async fn next(execution: &mut Execution) -> ExecutionEvent {
        tokio::time::timeout(Duration::from_secs(10), execution.next())
            .await
            .expect("no event in time")
            .expect("stream ended early")
    }

    fn stdout(events: &[ExecutionEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|event| match event {
                ExecutionEvent::Stdout { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn terminal_error(events: &[ExecutionEvent]) -> &pseudo::ErrorPayload {
        match events.last() {
            Some(ExecutionEvent::Error { error }) => error,
            other => panic!("expected a terminal error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn demo_prints_then_finishes() {
        let source = "Algorithm Demo\nvar x = 5\nprint x\nEndAlgorithm";
        assert!(pseudo::validate(source).is_empty());
        assert_eq!(
            all_events(run(source, &SandboxConfig::default())).await,
            vec![
                ExecutionEvent::Stdout {
                    text: "5".to_string()
                },
                ExecutionEvent::Done
            ]
        );
    }

    #[tokio::test]
    async fn missing_envelope_never_runs() {
        let events = all_events(run(
            "for i = 1 to 3\n  print i\nendfor",
            &SandboxConfig::default(),
        ))
        .await;
        assert!(stdout(&events).is_empty());
        let error = terminal_error(&events);
        assert_eq!(error.phase, Phase::Validation);
        let issues = error.issues.as_ref().expect("issues are attached");
        assert!(issues.iter().any(|issue| issue.line == 1));
        assert!(issues.iter().any(|issue| issue.line == 3));
    }

    #[tokio::test]
    async fn input_response_is_printed() {
        let source = "Algorithm Greet\nvar name = input \"Name:\"\nprint name\nEndAlgorithm";
        let mut execution = run(source, &SandboxConfig::new().timeout_ms(1000));

        let ExecutionEvent::InputRequest { id, prompt } = next(&mut execution).await else {
            panic!("expected an input request");
        };
        assert_eq!(prompt, "Name:");

        // Longer than the whole budget: waiting must not count.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        execution.respond(&id, "Ada").unwrap();

        assert_eq!(
            all_events(execution).await,
            vec![
                ExecutionEvent::Stdout {
                    text: "Ada".to_string()
                },
                ExecutionEvent::Done
            ]
        );
    }

    #[tokio::test]
    async fn infinite_loop_times_out_once() {
        let source = "Algorithm Forever\nvar n = 0\nwhile true\n  n = n + 1\nendwhile\nEndAlgorithm";
        let started = Instant::now();
        let events = all_events(run(source, &SandboxConfig::new().timeout_ms(1000))).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(2500), "took {elapsed:?}");
        assert_eq!(events.len(), 1);
        assert!(!events.contains(&ExecutionEvent::Done));
        let error = terminal_error(&events);
        assert_eq!(error.phase, Phase::Timeout);
        assert!(matches!(error.line, Some(3..=4)));
    }

    #[tokio::test]
    async fn undeclared_variable_is_explained() {
        let source = "Algorithm Oops\nvar total = 1\nprint totl\nEndAlgorithm";
        let events = all_events(run(source, &SandboxConfig::default())).await;
        let error = terminal_error(&events);

        assert_eq!(error.phase, Phase::Runtime);
        assert_eq!(error.name, "ReferenceError");
        assert_eq!(error.line, Some(3));
        assert!(error.message.contains("totl is not defined"));
        assert!(error.message.contains("print totl"));
        assert!(error.message.contains("may need to be declared"));
    }

    #[tokio::test]
    async fn grades() {
        let events = all_events(run(GRADES, &SandboxConfig::default())).await;
        assert_eq!(
            stdout(&events),
            vec![
                "score 0 is an A",
                "score 1 passes",
                "score 2 fails",
                "score 3 fails",
                "passed: 2"
            ]
        );
        assert_eq!(events.last(), Some(&ExecutionEvent::Done));
    }

    #[tokio::test]
    async fn factorial() {
        let events = all_events(run(FACTORIAL, &SandboxConfig::default())).await;
        assert_eq!(
            stdout(&events),
            vec!["1 1", "2 2", "3 6", "4 24", "5 120", "6 720"]
        );
    }

    #[tokio::test]
    async fn countdown_over_the_wire_protocol() {
        let mut execution = run(COUNTDOWN, &SandboxConfig::default());
        let ExecutionEvent::InputRequest { id, .. } = next(&mut execution).await else {
            panic!("expected an input request");
        };

        let message = serde_json::json!({"type": "input-response", "id": id, "value": "Ada"});
        let Inbound::InputResponse { id, value, .. } = Inbound::parse(&message.to_string()).unwrap()
        else {
            panic!("expected an input response");
        };
        execution.respond(&id, value).unwrap();

        let events = all_events(execution).await;
        assert_eq!(stdout(&events), vec!["3", "2", "1", "Ada liftoff"]);
        assert_eq!(events.last(), Some(&ExecutionEvent::Done));
    }

    #[tokio::test]
    async fn numeric_input_is_a_number() {
        let source = "Algorithm Double\nvar n = input \"n?\"\nprint n * 2, n + 1\nEndAlgorithm";
        let mut execution = run(source, &SandboxConfig::default());
        let ExecutionEvent::InputRequest { id, .. } = next(&mut execution).await else {
            panic!("expected an input request");
        };
        execution.respond(&id, "21").unwrap();
        assert_eq!(stdout(&all_events(execution).await), vec!["42 22"]);
    }

    #[tokio::test]
    async fn session_keeps_recent_errors() {
        let mut session = Session::with_limit(2);
        for source in [
            "print 1",
            "Algorithm A\nprint nope\nEndAlgorithm",
            "Algorithm B\nvar a[2]\nprint a.size.x\nEndAlgorithm",
        ] {
            let mut execution = session.run(source, &SandboxConfig::default());
            while let Some(event) = execution.next().await {
                session.observe(&event);
            }
        }

        let names: Vec<_> = session.history().map(|error| error.name.as_str()).collect();
        assert_eq!(names, vec!["ReferenceError", "TypeError"]);
        assert!(session
            .last_error()
            .is_some_and(|error| error.message.contains("Cannot read properties of undefined")));
    }

    #[tokio::test]
    async fn unindented_blocks_run_with_a_warning() {
        let source = "Algorithm Flat\nvar total = 0\nfor i = 1 to 3\ntotal = total + i\nendfor\nprint total\nEndAlgorithm";
        let events = all_events(run(source, &SandboxConfig::default())).await;
        assert!(matches!(
            &events[0],
            ExecutionEvent::Stderr { text } if text.starts_with("warning: line 4:")
        ));
        assert_eq!(stdout(&events), vec!["6"]);
        assert_eq!(events.last(), Some(&ExecutionEvent::Done));
    }

    #[tokio::test]
    async fn self_containing_array_prints() {
        let source = "Algorithm Loop\nvar a[1]\na[0] = a\nprint a\nprint \"after\"\nEndAlgorithm";
        let events = all_events(run(source, &SandboxConfig::default())).await;
        assert_eq!(stdout(&events), vec!["", "after"]);
        assert_eq!(events.last(), Some(&ExecutionEvent::Done));
    }

    #[tokio::test]
    async fn redeclaring_fails_before_any_output() {
        let source = "Algorithm Twice\nvar x = 1\nprint x\nvar x = 2\nEndAlgorithm";
        let events = all_events(run(source, &SandboxConfig::default())).await;
        assert!(stdout(&events).is_empty());
        let error = terminal_error(&events);
        assert_eq!(error.phase, Phase::Syntax);
        assert_eq!(error.line, Some(4));
    }

    #[tokio::test]
    async fn runs_are_isolated() {
        let first = "Algorithm One\nx = 1\nprint x\nEndAlgorithm";
        let second = "Algorithm Two\nprint x\nEndAlgorithm";
        let events = all_events(run(first, &SandboxConfig::default())).await;
        assert_eq!(stdout(&events), vec!["1"]);
        let events = all_events(run(second, &SandboxConfig::default())).await;
        assert_eq!(terminal_error(&events).name, "ReferenceError");
    }
}
