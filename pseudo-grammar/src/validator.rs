//! Structural validation of pseudocode programs.
//!
//! The validator makes one full pass over the program and collects every issue
//! it can find instead of stopping at the first one. It tracks open blocks on a
//! stack of [`BlockFrame`]s and checks the `Algorithm`/`EndAlgorithm` envelope.
//! Any [`IssueKind::Error`] is fatal: callers must not translate or run the
//! program. Warnings (the indentation heuristic) are advice only.

use crate::line::{split_lines, Line};
use crate::statement::{classify, BlockKind, Statement};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    #[default]
    Error,
    Warning,
}

/// One structural problem, anchored to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub line: usize,
    pub text: String,
    pub message: String,
    #[serde(default)]
    pub kind: IssueKind,
}

impl ValidationIssue {
    pub fn is_error(&self) -> bool {
        self.kind == IssueKind::Error
    }
}

/// Whether any issue blocks translation.
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

/// An open `for`/`while`/`if`/`function` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFrame {
    pub kind: BlockKind,
    /// Line that opened the block.
    pub line: usize,
    /// Loop variable, for `for` blocks.
    pub loop_var: Option<String>,
    pub indent: usize,
    /// Set once an `else` branch has been seen, for `if` blocks.
    pub has_else: bool,
}

/// Validate a program, returning every issue found.
#[instrument(skip(source), fields(bytes = source.len()))]
pub fn validate(source: &str) -> Vec<ValidationIssue> {
    let lines = split_lines(source);
    let mut validator = Validator::new(&lines);
    for line in &lines {
        validator.visit(line);
    }
    let issues = validator.finish();
    debug!(
        issues = issues.len(),
        errors = issues.iter().filter(|issue| issue.is_error()).count(),
        "validation finished"
    );
    issues
}

struct Validator<'a> {
    lines: &'a [Line<'a>],
    stack: Vec<BlockFrame>,
    issues: Vec<ValidationIssue>,
    seen_statement: bool,
    header_line: Option<usize>,
    end_line: Option<usize>,
}

impl<'a> Validator<'a> {
    fn new(lines: &'a [Line<'a>]) -> Self {
        Validator {
            lines,
            stack: Vec::new(),
            issues: Vec::new(),
            seen_statement: false,
            header_line: None,
            end_line: None,
        }
    }

    fn text_of(&self, number: usize) -> String {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|line| line.raw.to_string())
            .unwrap_or_default()
    }

    fn report_at(&mut self, number: usize, message: impl Into<String>) {
        let text = self.text_of(number);
        self.issues.push(ValidationIssue {
            line: number,
            text,
            message: message.into(),
            kind: IssueKind::Error,
        });
    }

    fn report(&mut self, line: &Line<'_>, message: impl Into<String>) {
        self.push(line, message, IssueKind::Error);
    }

    fn warn(&mut self, line: &Line<'_>, message: impl Into<String>) {
        self.push(line, message, IssueKind::Warning);
    }

    fn push(&mut self, line: &Line<'_>, message: impl Into<String>, kind: IssueKind) {
        self.issues.push(ValidationIssue {
            line: line.number,
            text: line.raw.to_string(),
            message: message.into(),
            kind,
        });
    }

    fn visit(&mut self, line: &Line<'_>) {
        if line.is_trivial() {
            return;
        }
        let statement = classify(line.trimmed);

        self.check_envelope(line, &statement);
        self.check_indentation(line, &statement);

        match statement {
            Statement::Blank | Statement::Comment(_) => {}
            Statement::Algorithm { .. } => {}
            Statement::EndAlgorithm => {}
            Statement::For { var, .. } => {
                if let Some(outer) = self
                    .stack
                    .iter()
                    .find(|frame| frame.loop_var.as_deref() == Some(var.as_str()))
                {
                    let message = format!(
                        "Loop variable '{var}' is already used by the enclosing for loop at line {}",
                        outer.line
                    );
                    self.report(line, message);
                }
                self.open(line, BlockKind::For, Some(var));
            }
            Statement::While { .. } => self.open(line, BlockKind::While, None),
            Statement::If { .. } => self.open(line, BlockKind::If, None),
            Statement::Function { .. } => self.open(line, BlockKind::Function, None),
            Statement::ElseIf { .. } => match self.innermost() {
                Some((BlockKind::If, true)) => {
                    self.report(line, "elseif cannot follow else in the same if block")
                }
                Some((BlockKind::If, false)) => {}
                _ => self.report(line, "elseif without matching if"),
            },
            Statement::Else => match self.innermost() {
                Some((BlockKind::If, false)) => {
                    if let Some(top) = self.stack.last_mut() {
                        top.has_else = true;
                    }
                }
                Some((BlockKind::If, true)) => self.report(line, "Duplicate else in the same if block"),
                _ => self.report(line, "else without matching if"),
            },
            Statement::Return { .. } => {
                if !self.stack.iter().any(|f| f.kind == BlockKind::Function) {
                    self.report(line, "return outside of a function");
                }
            }
            Statement::Break => self.check_loop_control(line, "break"),
            Statement::Continue => self.check_loop_control(line, "continue"),
            Statement::EndBlock(kind) => self.close(line, kind),
            Statement::Declaration {
                kind, name, init, ..
            } => {
                if !kind.is_mutable() && init.is_none() {
                    self.report(line, format!("Constant '{name}' must be initialized"));
                }
            }
            Statement::Set { .. }
            | Statement::Declare { .. }
            | Statement::Print { .. }
            | Statement::Input { .. }
            | Statement::Assignment { .. }
            | Statement::Call { .. } => {}
            Statement::Malformed { keyword, reason } => {
                self.report(line, format!("Malformed {keyword} statement: {reason}"))
            }
            Statement::Raw(_) => self.report(line, "Unrecognized statement"),
        }
    }

    /// Kind of the top frame and whether it already saw an `else`.
    fn innermost(&self) -> Option<(BlockKind, bool)> {
        self.stack.last().map(|frame| (frame.kind, frame.has_else))
    }

    /// `Algorithm <name>` must come first and `EndAlgorithm` last, once each.
    fn check_envelope(&mut self, line: &Line<'_>, statement: &Statement) {
        let is_header = matches!(
            statement,
            Statement::Algorithm { .. }
                | Statement::Malformed {
                    keyword: "Algorithm",
                    ..
                }
        );
        let first = !self.seen_statement;
        self.seen_statement = true;

        if let Some(end) = self.end_line {
            if matches!(statement, Statement::EndAlgorithm) {
                self.report(line, format!("Duplicate EndAlgorithm (first at line {end})"));
            } else {
                self.report(line, format!("Statement after EndAlgorithm (line {end})"));
            }
            return;
        }

        if is_header {
            match self.header_line {
                Some(header) => {
                    self.report(line, format!("Duplicate Algorithm header (first at line {header})"))
                }
                None if first => self.header_line = Some(line.number),
                None => {
                    self.header_line = Some(line.number);
                    self.report(line, "Algorithm header must be the first statement");
                }
            }
        } else if first {
            self.report_at(1, "Program must begin with 'Algorithm <name>'");
        }

        if matches!(statement, Statement::EndAlgorithm) {
            self.end_line = Some(line.number);
        }
    }

    /// Heuristic: inside a block, body lines sit deeper than the opening line.
    fn check_indentation(&mut self, line: &Line<'_>, statement: &Statement) {
        if statement.continues_block() {
            return;
        }
        if let Some(top) = self.stack.last() {
            if line.indent <= top.indent {
                let message = format!(
                    "Line should be indented inside the {} block opened at line {}",
                    top.kind, top.line
                );
                self.warn(line, message);
            }
        }
    }

    /// `break`/`continue` need an enclosing loop, searching outwards but never
    /// past a function boundary.
    fn check_loop_control(&mut self, line: &Line<'_>, keyword: &str) {
        let enclosing = self
            .stack
            .iter()
            .rev()
            .find(|frame| frame.kind.is_loop() || frame.kind == BlockKind::Function);
        match enclosing {
            Some(frame) if frame.kind.is_loop() => {}
            _ => self.report(line, format!("{keyword} outside of a loop")),
        }
    }

    fn open(&mut self, line: &Line<'_>, kind: BlockKind, loop_var: Option<String>) {
        self.stack.push(BlockFrame {
            kind,
            line: line.number,
            loop_var,
            indent: line.indent,
            has_else: false,
        });
    }

    fn close(&mut self, line: &Line<'_>, kind: BlockKind) {
        match self.innermost() {
            None => self.report(line, format!("Unexpected end{kind}")),
            Some((top, _)) if top == kind => {
                self.stack.pop();
            }
            Some((top, _)) => self.report(line, format!("Expected end{top} but found end{kind}")),
        }
    }

    fn finish(mut self) -> Vec<ValidationIssue> {
        if !self.seen_statement {
            self.report_at(1, "Program must begin with 'Algorithm <name>'");
        }
        for frame in std::mem::take(&mut self.stack) {
            self.report_at(frame.line, format!("Unclosed {} block", frame.kind));
        }
        if self.end_line.is_none() {
            let last = self.lines.len().max(1);
            self.report_at(last, "Program must end with 'EndAlgorithm'");
        }
        self.issues.sort_by_key(|issue| issue.line);
        self.issues
    }
}
