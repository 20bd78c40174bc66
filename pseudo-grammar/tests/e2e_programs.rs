use pseudo_grammar::{has_errors, translate, validate, IssueKind, ValidationIssue};

fn read_program(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path}: {e}"))
}

fn issues_of(path: &str) -> Vec<ValidationIssue> {
    validate(&read_program(path))
}

#[test]
fn demo() {
    let source = read_program("tests/programs/demo.pseudo");
    assert!(validate(&source).is_empty());
    let program = translate(&source);
    assert_eq!(
        program.code,
        "// Algorithm Demo\nlet x = 5;\nprint(x);\n// EndAlgorithm"
    );
}

#[test]
fn grades() {
    let source = read_program("tests/programs/grades.pseudo");
    assert_eq!(validate(&source), vec![]);

    let program = translate(&source);
    assert_eq!(program.mapping.len(), source.lines().count());
    let code: Vec<&str> = program.code.lines().collect();
    assert_eq!(code[2], "let scores = new Array(4).fill(0);");
    assert_eq!(code[8], "for (let i = 0; i <= 3; i += 1) {");
    assert_eq!(code[9], "    if (scores[i] >= 90) {");
    assert_eq!(code[11], "    } else if (scores[i] >= 65) {");
    assert_eq!(code[15], "        continue;");
    assert_eq!(code[18], "}");
}

#[test]
fn factorial() {
    let source = read_program("tests/programs/factorial.pseudo");
    assert_eq!(validate(&source), vec![]);

    let program = translate(&source);
    let code: Vec<&str> = program.code.lines().collect();
    assert_eq!(code[1], "function fact(n) {");
    assert_eq!(code[5], "    return n * fact(n - 1);");
    assert_eq!(code[7], "");
    assert_eq!(code[8], "const LIMIT = 6;");
    assert_eq!(code[10], "while (k <= LIMIT) {");
    assert_eq!(code[12], "    k += 1;");
}

#[test]
fn countdown() {
    let source = read_program("tests/programs/countdown.pseudo");
    assert_eq!(validate(&source), vec![]);

    let program = translate(&source);
    let code: Vec<&str> = program.code.lines().collect();
    assert_eq!(code[1], r#"let name = await input("Who is launching?");"#);
    assert_eq!(code[2], "for (let t = 3; t >= 1; t -= 1) {");
    assert_eq!(code[5], r#"status = "liftoff";"#);
}

#[test]
fn unclosed() {
    let issues = issues_of("tests/programs/unclosed.pseudo");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].line, 2);
    assert_eq!(issues[0].message, "Unclosed for block");
    assert_eq!(issues[0].text, "for i = 1 to 3");
}

#[test]
fn misplaced_control() {
    let issues = issues_of("tests/programs/misplaced_control.pseudo");
    let found: Vec<(usize, &str)> = issues
        .iter()
        .map(|i| (i.line, i.message.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            (2, "break outside of a loop"),
            (8, "return outside of a function"),
            (10, "continue outside of a loop"),
        ]
    );
}

#[test]
fn flat_indentation_only_warns() {
    let source = read_program("tests/programs/flat.pseudo");
    let issues = validate(&source);
    assert!(!has_errors(&issues));
    assert_eq!(issues.len(), 1);
    assert_eq!((issues[0].line, issues[0].kind), (4, IssueKind::Warning));

    let program = translate(&source);
    let code: Vec<&str> = program.code.lines().collect();
    assert_eq!(code[3], "total = total + i;");
}

#[test]
fn translation_is_repeatable_for_every_program() {
    for name in ["demo", "grades", "factorial", "countdown"] {
        let source = read_program(&format!("tests/programs/{name}.pseudo"));
        assert_eq!(translate(&source), translate(&source), "{name}");
    }
}
