//! Pseudocode to script translation.
//!
//! Translation is strictly line-for-line: every source line produces exactly one
//! generated line (blank lines and comments included) and one [`MappingEntry`].
//! Generated line `n` therefore always originates from source line `n`, which is
//! what lets runtime positions be mapped back by plain indexing.

use crate::expr::{rewrite, ExprContext};
use crate::line::{split_lines, Line};
use crate::statement::{classify, Initializer, Statement};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, instrument};

/// Links one generated line back to the pseudocode it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    /// 1-based line in the generated code.
    pub generated_line: usize,
    /// 1-based line in the pseudocode source.
    pub source_line: usize,
    pub source_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedProgram {
    pub code: String,
    pub mapping: Vec<MappingEntry>,
}

impl TranslatedProgram {
    /// Mapping entry for a 1-based generated line.
    pub fn lookup(&self, generated_line: usize) -> Option<&MappingEntry> {
        self.mapping.get(generated_line.checked_sub(1)?)
    }

    /// Source text of a 1-based source line, if it exists.
    pub fn source_text(&self, source_line: usize) -> Option<&str> {
        self.mapping
            .get(source_line.checked_sub(1)?)
            .map(|entry| entry.source_text.as_str())
    }

    /// Generated text of a 1-based generated line.
    pub fn generated_text(&self, generated_line: usize) -> Option<&str> {
        self.code.split('\n').nth(generated_line.checked_sub(1)?)
    }

    pub fn line_count(&self) -> usize {
        self.mapping.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("internal translator failure: {0}")]
    Internal(String),
}

/// Translate a (validated) pseudocode program.
#[instrument(skip(source), fields(bytes = source.len()))]
pub fn translate(source: &str) -> TranslatedProgram {
    let lines = split_lines(source);
    let mut generated = Vec::with_capacity(lines.len());
    let mut mapping = Vec::with_capacity(lines.len());

    for line in &lines {
        let statement = classify(line.trimmed);
        let body = emit(&statement, line);
        generated.push(if body.is_empty() {
            body
        } else {
            format!("{}{body}", line.leading_whitespace())
        });
        mapping.push(MappingEntry {
            generated_line: generated.len(),
            source_line: line.number,
            source_text: line.raw.to_string(),
        });
    }

    debug!(lines = generated.len(), "translated program");
    TranslatedProgram {
        code: generated.join("\n"),
        mapping,
    }
}

/// [`translate`], with a translator panic turned into an error.
pub fn try_translate(source: &str) -> Result<TranslatedProgram, TranslateError> {
    panic::catch_unwind(AssertUnwindSafe(|| translate(source))).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        TranslateError::Internal(message)
    })
}

fn value(expr: &str) -> String {
    rewrite(expr, ExprContext::Value)
}

fn condition(expr: &str) -> String {
    rewrite(expr, ExprContext::Condition)
}

fn input_call(prompt: Option<&str>) -> String {
    match prompt {
        Some(prompt) => format!("await input({})", value(prompt)),
        None => r#"await input("")"#.to_string(),
    }
}

fn emit(statement: &Statement, line: &Line<'_>) -> String {
    match statement {
        Statement::Blank => String::new(),
        Statement::Comment(text) if text.is_empty() => "//".to_string(),
        Statement::Comment(text) => format!("// {text}"),
        Statement::Algorithm { name } => format!("// Algorithm {name}"),
        Statement::EndAlgorithm => "// EndAlgorithm".to_string(),
        Statement::For {
            var,
            from,
            to,
            step,
        } => emit_for(var, from, to, step.as_deref()),
        Statement::While { condition: c } => format!("while ({}) {{", condition(c)),
        Statement::If { condition: c } => format!("if ({}) {{", condition(c)),
        Statement::ElseIf { condition: c } => format!("}} else if ({}) {{", condition(c)),
        Statement::Else => "} else {".to_string(),
        Statement::Function { name, params } => {
            format!("function {name}({}) {{", params.join(", "))
        }
        Statement::Return { value: Some(v) } => format!("return {};", value(v)),
        Statement::Return { value: None } => "return;".to_string(),
        Statement::Break => "break;".to_string(),
        Statement::Continue => "continue;".to_string(),
        Statement::EndBlock(_) => "}".to_string(),
        Statement::Declaration {
            kind,
            name,
            size,
            init,
        } => {
            let keyword = if kind.is_mutable() { "let" } else { "const" };
            match (size, init) {
                (Some(size), _) => {
                    format!("{keyword} {name} = new Array({}).fill(0);", value(size))
                }
                (None, Some(Initializer::Expr(expr))) => {
                    format!("{keyword} {name} = {};", value(expr))
                }
                (None, Some(Initializer::Input { prompt })) => {
                    format!("{keyword} {name} = {};", input_call(prompt.as_deref()))
                }
                (None, None) => format!("let {name};"),
            }
        }
        Statement::Set { value: v, target } => format!("{} = {};", value(target), value(v)),
        Statement::Declare { name, type_name } => format!("let {name}; // {type_name}"),
        Statement::Print { args } => {
            format!("print({});", args.iter().map(|arg| value(arg)).join(", "))
        }
        Statement::Input {
            prompt,
            target: Some(target),
        } => format!("{} = {};", value(target), input_call(prompt.as_deref())),
        Statement::Input {
            prompt,
            target: None,
        } => format!("{};", input_call(prompt.as_deref())),
        Statement::Assignment {
            target,
            op,
            value: Initializer::Expr(expr),
        } => format!("{} {op} {};", value(target), value(expr)),
        Statement::Assignment {
            target,
            value: Initializer::Input { prompt },
            ..
        } => format!("{} = {};", value(target), input_call(prompt.as_deref())),
        Statement::Call { expr } => format!("{};", value(expr)),
        Statement::Malformed { .. } | Statement::Raw(_) => passthrough(line.trimmed),
    }
}

/// Counted loop header. The comparison direction follows the sign of a literal
/// step and is decided at runtime for any other step expression.
fn emit_for(var: &str, from: &str, to: &str, step: Option<&str>) -> String {
    let from = value(from);
    let to = value(to);
    let Some(step) = step else {
        return format!("for (let {var} = {from}; {var} <= {to}; {var} += 1) {{");
    };

    let literal: Option<f64> = step.split_whitespace().collect::<String>().parse().ok();
    match literal {
        Some(n) if n < 0.0 => format!(
            "for (let {var} = {from}; {var} >= {to}; {var} -= {}) {{",
            -n
        ),
        Some(n) => format!("for (let {var} = {from}; {var} <= {to}; {var} += {n}) {{"),
        None => {
            let step = value(step);
            format!(
                "for (let {var} = {from}; ({step}) > 0 ? {var} <= {to} : {var} >= {to}; {var} += {step}) {{"
            )
        }
    }
}

/// Unrecognized lines are kept as written, terminated like any other statement.
fn passthrough(text: &str) -> String {
    if text.ends_with(';') || text.ends_with('{') || text.ends_with('}') {
        text.to_string()
    } else {
        format!("{text};")
    }
}
