//! Turns failures from every stage into [`ErrorPayload`]s a person can act on.
//!
//! Runtime locations are recovered from the stack text (`<sandbox>:line:col`),
//! shifted past the wrapper's first line and mapped back to the pseudocode
//! through the [`TranslatedProgram`] mapping.

use crate::ast::Pos;
use crate::error::ScriptError;
use crate::event::{ErrorPayload, Phase, Severity};
use crate::parser::ScriptSyntaxError;
use once_cell::sync::Lazy;
use pseudo_grammar::{IssueKind, MappingEntry, TranslateError, TranslatedProgram, ValidationIssue};
use regex::Regex;
use std::fmt::Write;
use std::time::Duration;

pub const VALIDATION_ERROR: &str = "ValidationError";
pub const TRANSLATION_ERROR: &str = "TranslationError";
pub const TIMEOUT_ERROR: &str = "TimeoutError";
pub const INTERNAL_ERROR: &str = "InternalError";

/// Lines the sandbox wrapper adds above the generated code.
const WRAPPER_LINES: usize = 1;

static STACK_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<sandbox>:(\d+):(\d+)").expect("valid location regex"));

static NOT_DEFINED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+) is not defined").expect("valid reference regex"));

/// Where a failure sits in the pseudocode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation<'a> {
    pub line: usize,
    pub column: Option<usize>,
    pub text: &'a str,
}

/// The first `<sandbox>:line:column` in a stack trace.
pub fn locate_in_stack(stack: &str) -> Option<(usize, usize)> {
    let captures = STACK_LOCATION.captures(stack)?;
    let line = captures.get(1)?.as_str().parse().ok()?;
    let column = captures.get(2)?.as_str().parse().ok()?;
    Some((line, column))
}

/// Map a line of the wrapped program back to its mapping entry.
pub fn map_wrapped_line(program: &TranslatedProgram, wrapped_line: usize) -> Option<&MappingEntry> {
    program.lookup(wrapped_line.checked_sub(WRAPPER_LINES)?)
}

fn source_location(
    program: &TranslatedProgram,
    wrapped_line: usize,
    column: Option<usize>,
) -> Option<SourceLocation<'_>> {
    let entry = map_wrapped_line(program, wrapped_line)?;
    let column = column.and_then(|column| {
        let generated = program.generated_text(entry.generated_line)?;
        map_column(generated, &entry.source_text, column)
    });
    Some(SourceLocation {
        line: entry.source_line,
        column,
        text: &entry.source_text,
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Char offsets at which `word` appears as a whole word.
fn word_offsets(chars: &[char], word: &[char]) -> Vec<usize> {
    (0..chars.len())
        .filter(|&at| {
            chars[at..].starts_with(word)
                && (at == 0 || !is_word_char(chars[at - 1]))
                && chars.get(at + word.len()).map_or(true, |c| !is_word_char(*c))
        })
        .collect()
}

/// Carry a 1-based column of a generated line over to its pseudocode line.
///
/// Translation changes widths, so only the word under the column is followed:
/// its n-th occurrence in the generated line maps to the n-th in the source
/// (or to the only one). Columns on operators and punctuation have no
/// counterpart.
pub fn map_column(generated: &str, source: &str, column: usize) -> Option<usize> {
    if generated == source {
        return Some(column);
    }
    let generated: Vec<char> = generated.chars().collect();
    let at = column.checked_sub(1)?;
    if !is_word_char(*generated.get(at)?) {
        return None;
    }
    let start = generated[..at]
        .iter()
        .rposition(|c| !is_word_char(*c))
        .map_or(0, |p| p + 1);
    let end = generated[at..]
        .iter()
        .position(|c| !is_word_char(*c))
        .map_or(generated.len(), |p| at + p);
    let word = &generated[start..end];
    let occurrence = word_offsets(&generated, word)
        .iter()
        .position(|&offset| offset == start)?;

    let source: Vec<char> = source.chars().collect();
    let candidates = word_offsets(&source, word);
    let offset = match candidates.get(occurrence) {
        Some(offset) => *offset,
        None if candidates.len() == 1 => candidates[0],
        None => return None,
    };
    Some(offset + 1)
}

/// Heuristic hints for well-known failure messages.
pub fn suggestions(message: &str) -> Vec<String> {
    let mut tips = Vec::new();
    if let Some(captures) = NOT_DEFINED.captures(message) {
        let name = &captures[1];
        tips.push(format!(
            "'{name}' may need to be declared before it is used (for example `var {name} = 0`); also check its spelling."
        ));
    }
    if message.contains("Cannot read propert") || message.contains("Cannot set propert") {
        tips.push(
            "A value here is undefined or null. Check that the variable or array element was given a value first."
                .to_string(),
        );
    }
    if message.contains("is not a function") {
        tips.push(
            "Only functions can be called. Check the name and that it is declared with `function`."
                .to_string(),
        );
    }
    if message.contains("Assignment to constant") {
        tips.push(
            "Constants cannot change after they are declared. Use `var` for values that change."
                .to_string(),
        );
    }
    if message.contains("has already been declared") {
        tips.push(
            "Each name can be declared once per block. Assign to the existing variable instead."
                .to_string(),
        );
    }
    if message.contains("Maximum call stack size exceeded") {
        tips.push(
            "A function keeps calling itself. Make sure the recursion has a case that returns without calling again."
                .to_string(),
        );
    }
    if message.contains("Invalid array length") {
        tips.push("Array sizes must be whole numbers that are not negative.".to_string());
    }
    if message.contains("timed out") {
        tips.push(
            "The program ran too long. Check for a loop whose condition never becomes false."
                .to_string(),
        );
    }
    tips
}

/// The raw message followed by source context and suggestions.
fn render(
    headline: &str,
    location: Option<&SourceLocation<'_>>,
    program: Option<&TranslatedProgram>,
    tips: &[String],
) -> String {
    let mut out = headline.to_string();
    if let Some(location) = location {
        let _ = write!(out, "\n  at line {}: {}", location.line, location.text.trim());
        let width = location.line.to_string().len();
        if let Some(previous) = location
            .line
            .checked_sub(1)
            .and_then(|line| program?.source_text(line).map(|text| (line, text)))
        {
            let _ = write!(out, "\n     {:>width$} | {}", previous.0, previous.1);
        }
        let _ = write!(out, "\n  >  {:>width$} | {}", location.line, location.text);
        if let Some(column) = location.column {
            let clamped = column.clamp(1, location.text.chars().count().max(1));
            let _ = write!(
                out,
                "\n     {:>width$} | {}^",
                "",
                " ".repeat(clamped - 1)
            );
        }
    }
    if !tips.is_empty() {
        out.push_str("\nSuggestions:");
        for tip in tips {
            let _ = write!(out, "\n  - {tip}");
        }
    }
    out
}

fn payload(name: &str, message: String, phase: Phase) -> ErrorPayload {
    ErrorPayload {
        severity: Severity::of(name),
        name: name.to_string(),
        message,
        stack: None,
        phase,
        line: None,
        column: None,
        issues: None,
        original_text: None,
        formatted: Some(true),
        suggestions: Vec::new(),
    }
}

fn with_location(mut payload: ErrorPayload, location: Option<&SourceLocation<'_>>) -> ErrorPayload {
    if let Some(location) = location {
        payload.line = Some(location.line);
        payload.column = location.column;
        payload.original_text = Some(location.text.to_string());
    }
    payload
}

pub fn format_validation(issues: &[ValidationIssue]) -> ErrorPayload {
    let mut message = match issues.len() {
        1 => "Validation failed with 1 issue:".to_string(),
        n => format!("Validation failed with {n} issues:"),
    };
    for issue in issues {
        let label = match issue.kind {
            IssueKind::Error => "",
            IssueKind::Warning => " (warning)",
        };
        let _ = write!(message, "\n  line {}{label}: {}", issue.line, issue.message);
        if !issue.text.trim().is_empty() {
            let _ = write!(message, "\n      {}", issue.text.trim());
        }
    }

    let mut payload = payload(VALIDATION_ERROR, message, Phase::Validation);
    let first = issues
        .iter()
        .find(|issue| issue.is_error())
        .or_else(|| issues.first());
    if let Some(first) = first {
        payload.line = Some(first.line);
        payload.original_text = Some(first.text.clone());
    }
    payload.issues = Some(issues.to_vec());
    payload
}

/// One line of advice for a warning that does not stop the run.
pub fn format_warning(issue: &ValidationIssue) -> String {
    format!("warning: line {}: {}", issue.line, issue.message)
}

pub fn format_translation(error: &TranslateError) -> ErrorPayload {
    payload(TRANSLATION_ERROR, error.to_string(), Phase::Translation)
}

/// A generated program that failed to parse.
pub fn format_syntax(error: &ScriptSyntaxError, program: &TranslatedProgram) -> ErrorPayload {
    let location = source_location(program, error.line, Some(error.column));
    let headline = format!("SyntaxError: {}", error.message);
    let tips = suggestions(&error.message);
    let message = render(&headline, location.as_ref(), Some(program), &tips);

    let mut payload = with_location(payload("SyntaxError", message, Phase::Syntax), location.as_ref());
    payload.suggestions = tips;
    payload
}

/// An error thrown while the program ran.
pub fn format_runtime(error: &ScriptError, program: &TranslatedProgram) -> ErrorPayload {
    let (line, column) =
        locate_in_stack(&error.stack).unwrap_or((error.pos.line, error.pos.column));
    let location = source_location(program, line, Some(column));
    let headline = error.to_string();
    let tips = suggestions(&error.message);
    let message = render(&headline, location.as_ref(), Some(program), &tips);

    let mut payload = with_location(
        payload(error.name.as_str(), message, Phase::Runtime),
        location.as_ref(),
    );
    payload.stack = Some(error.stack.clone());
    payload.suggestions = tips;
    payload
}

/// The execution budget ran out while the program was at `pos`.
pub fn format_timeout(budget: Duration, pos: Pos, program: &TranslatedProgram) -> ErrorPayload {
    let location = source_location(program, pos.line, None);
    let headline = format!(
        "{TIMEOUT_ERROR}: Execution timed out after {}ms",
        budget.as_millis()
    );
    let tips = suggestions(&headline);
    let message = render(&headline, location.as_ref(), Some(program), &tips);

    let mut payload = with_location(payload(TIMEOUT_ERROR, message, Phase::Timeout), location.as_ref());
    payload.suggestions = tips;
    payload
}

/// A failure of the sandbox itself rather than of the program.
pub fn format_internal(message: &str) -> ErrorPayload {
    let mut payload = payload(
        INTERNAL_ERROR,
        format!("{INTERNAL_ERROR}: {message}"),
        Phase::Execution,
    );
    payload.formatted = Some(false);
    payload
}
