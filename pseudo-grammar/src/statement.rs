//! Single-pass statement classification.
//!
//! Every non-trivial line is classified exactly once into a [`Statement`]. The
//! validator and the transpiler both consume the classified form, so the shape
//! rules for each keyword live here and nowhere else.
//!
//! Dispatch is on the leading word of the line (case-insensitive). A line whose
//! keyword is recognized but whose shape does not parse becomes
//! [`Statement::Malformed`]; a line with no recognizable keyword or shape
//! becomes [`Statement::Raw`].

use crate::expr::{check_balanced, split_top_level};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ALGORITHM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^algorithm\s+(\S.*?)\s*$").unwrap());
static END_ALGORITHM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^end\s*algorithm$").unwrap());
static END_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^end\s*(for|if|while|function)$").unwrap());
static FOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^for\s+(?P<var>[A-Za-z_]\w*)\s*(?:=|<-|←)\s*(?P<from>.+?)\s+to\s+(?P<to>.+?)(?:\s+step\s+(?P<step>.+?))?(?:\s+do)?$",
    )
    .unwrap()
});
static WHILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^while\b\s*(?P<cond>.+?)(?:\s+(?:then|do))?$").unwrap());
static IF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^if\b\s*(?P<cond>.+?)(?:\s+then)?$").unwrap());
static ELSE_IF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:elseif|else\s+if)\b\s*(?P<cond>.+?)(?:\s+then)?$").unwrap());
static ELSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^else$").unwrap());
static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^function\s+(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^()]*)\)$").unwrap()
});
static RETURN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^return(?:\s+(?P<value>.+))?$").unwrap());
static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<kind>constant|const|variable|var)\s+(?P<name>[A-Za-z_]\w*)\s*(?:\[\s*(?P<size>.+?)\s*\]\s*)?(?:=\s*(?P<init>.+))?$",
    )
    .unwrap()
});
static SET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^set\s+(?P<value>.+?)\s+to\s+(?P<target>[A-Za-z_]\w*(?:\[.+\])?)$").unwrap()
});
static DECLARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^declare\s+(?P<name>[A-Za-z_]\w*)\s+as\s+(?P<ty>[A-Za-z_][\w\[\]]*)$").unwrap()
});
static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<target>[A-Za-z_]\w*(?:\s*\[[^=]+?\])*)\s*(?P<op>[+\-*/%]?=|<-|←)(?P<value>[^=].*)$",
    )
    .unwrap()
});
static CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][\w.]*\s*\(.*\)\s*;?$").unwrap());
static TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*(?:\s*\[.+?\])*$").unwrap());
static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").unwrap());

/// The kinds of block a [`crate::validator::BlockFrame`] can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    For,
    While,
    If,
    Function,
}

impl BlockKind {
    fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "for" => Some(BlockKind::For),
            "while" => Some(BlockKind::While),
            "if" => Some(BlockKind::If),
            "function" => Some(BlockKind::Function),
            _ => None,
        }
    }

    pub fn is_loop(self) -> bool {
        matches!(self, BlockKind::For | BlockKind::While)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            BlockKind::For => "for",
            BlockKind::While => "while",
            BlockKind::If => "if",
            BlockKind::Function => "function",
        };
        f.write_str(keyword)
    }
}

/// Declaration keyword. `var`/`variable` bind mutably, `const`/`constant` immutably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Variable,
    Const,
    Constant,
}

impl DeclKind {
    fn from_keyword(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "variable" => DeclKind::Variable,
            "const" => DeclKind::Const,
            "constant" => DeclKind::Constant,
            _ => DeclKind::Var,
        }
    }

    pub fn is_mutable(self) -> bool {
        matches!(self, DeclKind::Var | DeclKind::Variable)
    }
}

/// Right-hand side of a declaration or assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initializer {
    Expr(String),
    /// `input "prompt"` used as a value; a suspension point at runtime.
    Input { prompt: Option<String> },
}

/// One classified pseudocode line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Blank,
    Comment(String),
    Algorithm {
        name: String,
    },
    EndAlgorithm,
    For {
        var: String,
        from: String,
        to: String,
        step: Option<String>,
    },
    While {
        condition: String,
    },
    If {
        condition: String,
    },
    ElseIf {
        condition: String,
    },
    Else,
    Function {
        name: String,
        params: Vec<String>,
    },
    Return {
        value: Option<String>,
    },
    Break,
    Continue,
    EndBlock(BlockKind),
    Declaration {
        kind: DeclKind,
        name: String,
        size: Option<String>,
        init: Option<Initializer>,
    },
    Set {
        value: String,
        target: String,
    },
    Declare {
        name: String,
        type_name: String,
    },
    Print {
        args: Vec<String>,
    },
    Input {
        prompt: Option<String>,
        target: Option<String>,
    },
    Assignment {
        target: String,
        op: String,
        value: Initializer,
    },
    Call {
        expr: String,
    },
    /// Recognized keyword, unparseable shape.
    Malformed {
        keyword: &'static str,
        reason: String,
    },
    /// Nothing recognizable.
    Raw(String),
}

impl Statement {
    /// Block terminators and `else` branches are exempt from the indentation heuristic.
    pub fn continues_block(&self) -> bool {
        matches!(
            self,
            Statement::EndBlock(_)
                | Statement::Else
                | Statement::ElseIf { .. }
                | Statement::EndAlgorithm
        )
    }
}

fn malformed(keyword: &'static str, reason: impl Into<String>) -> Statement {
    Statement::Malformed {
        keyword,
        reason: reason.into(),
    }
}

/// The first unterminated string or unbalanced bracket among a statement's fragments.
fn unbalanced(parts: &[&str]) -> Option<String> {
    parts.iter().find_map(|part| check_balanced(part).err())
}

/// Leading keyword of a trimmed line, lowercased.
fn head_word(trimmed: &str) -> String {
    trimmed
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Classify one line of pseudocode.
pub fn classify(text: &str) -> Statement {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Statement::Blank;
    }
    if let Some(comment) = trimmed.strip_prefix('#') {
        return Statement::Comment(comment.trim().to_string());
    }

    match head_word(trimmed).as_str() {
        "endalgorithm" => classify_end_algorithm(trimmed),
        "end" | "endfor" | "endif" | "endwhile" | "endfunction" => classify_end(trimmed),
        "algorithm" => match ALGORITHM.captures(trimmed) {
            Some(caps) => Statement::Algorithm {
                name: caps[1].to_string(),
            },
            None => malformed("Algorithm", "expected 'Algorithm <name>'"),
        },
        "for" => classify_for(trimmed),
        "while" => match WHILE.captures(trimmed) {
            Some(caps) if !is_then(&caps["cond"]) => match unbalanced(&[&caps["cond"]]) {
                Some(reason) => malformed("while", reason),
                None => Statement::While {
                    condition: caps["cond"].to_string(),
                },
            },
            _ => malformed("while", "expected 'while <condition>'"),
        },
        "if" => match IF.captures(trimmed) {
            Some(caps) if !is_then(&caps["cond"]) => match unbalanced(&[&caps["cond"]]) {
                Some(reason) => malformed("if", reason),
                None => Statement::If {
                    condition: caps["cond"].to_string(),
                },
            },
            _ => malformed("if", "expected 'if <condition> [then]'"),
        },
        "elseif" => classify_else_if(trimmed),
        "else" => {
            if ELSE.is_match(trimmed) {
                Statement::Else
            } else {
                classify_else_if(trimmed)
            }
        }
        "function" => classify_function(trimmed),
        "return" => match RETURN.captures(trimmed) {
            Some(caps) => {
                let value = caps.name("value").map(|m| m.as_str().trim());
                match unbalanced(&[value.unwrap_or_default()]) {
                    Some(reason) => malformed("return", reason),
                    None => Statement::Return {
                        value: value.map(str::to_string),
                    },
                }
            }
            None => malformed("return", "expected 'return [value]'"),
        },
        "break" if trimmed.eq_ignore_ascii_case("break") => Statement::Break,
        "continue" if trimmed.eq_ignore_ascii_case("continue") => Statement::Continue,
        "break" => malformed("break", "'break' takes no operands"),
        "continue" => malformed("continue", "'continue' takes no operands"),
        "var" | "const" | "constant" | "variable" => classify_declaration(trimmed),
        "set" => match SET.captures(trimmed) {
            Some(caps) => match unbalanced(&[&caps["value"], &caps["target"]]) {
                Some(reason) => malformed("set", reason),
                None => Statement::Set {
                    value: caps["value"].to_string(),
                    target: caps["target"].to_string(),
                },
            },
            None => malformed("set", "expected 'set <value> to <name>'"),
        },
        "declare" => match DECLARE.captures(trimmed) {
            Some(caps) => Statement::Declare {
                name: caps["name"].to_string(),
                type_name: caps["ty"].to_string(),
            },
            None => malformed("declare", "expected 'declare <name> as <type>'"),
        },
        "print" => classify_print(&trimmed["print".len()..]),
        "input" => classify_input(&trimmed["input".len()..]),
        _ => classify_fallback(trimmed),
    }
}

fn is_then(condition: &str) -> bool {
    condition.eq_ignore_ascii_case("then") || condition.eq_ignore_ascii_case("do")
}

fn classify_end_algorithm(trimmed: &str) -> Statement {
    if END_ALGORITHM.is_match(trimmed) {
        Statement::EndAlgorithm
    } else {
        malformed("EndAlgorithm", "'EndAlgorithm' takes no operands")
    }
}

fn classify_end(trimmed: &str) -> Statement {
    if END_ALGORITHM.is_match(trimmed) {
        return Statement::EndAlgorithm;
    }
    match END_BLOCK.captures(trimmed) {
        Some(caps) => match BlockKind::from_keyword(&caps[1]) {
            Some(kind) => Statement::EndBlock(kind),
            None => malformed("end", "unknown block kind"),
        },
        None => malformed("end", "expected endfor, endif, endwhile or endfunction"),
    }
}

fn classify_for(trimmed: &str) -> Statement {
    match FOR.captures(trimmed) {
        Some(caps) => {
            let step = caps.name("step").map(|m| m.as_str());
            match unbalanced(&[&caps["from"], &caps["to"], step.unwrap_or_default()]) {
                Some(reason) => malformed("for", reason),
                None => Statement::For {
                    var: caps["var"].to_string(),
                    from: caps["from"].to_string(),
                    to: caps["to"].to_string(),
                    step: step.map(str::to_string),
                },
            }
        }
        None => malformed("for", "expected 'for <var> = <start> to <end> [step <step>]'"),
    }
}

fn classify_else_if(trimmed: &str) -> Statement {
    match ELSE_IF.captures(trimmed) {
        Some(caps) if !is_then(&caps["cond"]) => match unbalanced(&[&caps["cond"]]) {
            Some(reason) => malformed("elseif", reason),
            None => Statement::ElseIf {
                condition: caps["cond"].to_string(),
            },
        },
        _ => malformed("elseif", "expected 'elseif <condition> [then]'"),
    }
}

fn classify_function(trimmed: &str) -> Statement {
    let Some(caps) = FUNCTION.captures(trimmed) else {
        return malformed("function", "expected 'function <name>(<params>)'");
    };
    let params: Vec<String> = split_top_level(&caps["params"]);
    if let Some(bad) = params.iter().find(|p| !IDENT.is_match(p)) {
        return malformed("function", format!("invalid parameter name '{bad}'"));
    }
    Statement::Function {
        name: caps["name"].to_string(),
        params,
    }
}

fn classify_declaration(trimmed: &str) -> Statement {
    let Some(caps) = DECLARATION.captures(trimmed) else {
        return malformed("declaration", "expected '<var|const> <name> [= <value>]' or '<var> <name>[<size>]'");
    };
    let kind = DeclKind::from_keyword(&caps["kind"]);
    let name = caps["name"].to_string();
    let size = caps.name("size").map(|m| m.as_str().to_string());
    let init = caps.name("init").map(|m| initializer(m.as_str()));

    if size.is_some() && init.is_some() {
        return malformed("declaration", "an array declaration cannot also have an initializer");
    }

    let init_text = match &init {
        Some(Initializer::Expr(expr)) => expr.as_str(),
        Some(Initializer::Input { prompt: Some(prompt) }) => prompt.as_str(),
        _ => "",
    };
    if let Some(reason) = unbalanced(&[size.as_deref().unwrap_or_default(), init_text]) {
        return malformed("declaration", reason);
    }
    Statement::Declaration {
        kind,
        name,
        size,
        init,
    }
}

/// `input "prompt"` on the right-hand side is a suspension, anything else an expression.
fn initializer(value: &str) -> Initializer {
    let value = value.trim();
    if head_word(value) == "input" {
        let rest = &value["input".len()..];
        if rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with('(') {
            return Initializer::Input {
                prompt: prompt_operand(rest),
            };
        }
    }
    Initializer::Expr(value.to_string())
}

/// Strip one layer of call parentheses from an `input` operand.
fn prompt_operand(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let inner = match rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) if check_balanced(inner).is_ok() => inner.trim(),
        _ => rest,
    };
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

fn classify_print(rest: &str) -> Statement {
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) && !rest.starts_with('(') {
        return classify_fallback(&format!("print{rest}"));
    }
    let operand = rest.trim();
    let list = match operand.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) if check_balanced(inner).is_ok() => inner,
        _ => operand,
    };
    if let Err(reason) = check_balanced(list) {
        return malformed("print", reason);
    }
    let args = split_top_level(list);
    if args.iter().any(String::is_empty) {
        return malformed("print", "empty argument in print list");
    }
    Statement::Print { args }
}

fn classify_input(rest: &str) -> Statement {
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) && !rest.starts_with('(') {
        return classify_fallback(&format!("input{rest}"));
    }
    let Some(operand) = prompt_operand(rest) else {
        return Statement::Input {
            prompt: None,
            target: None,
        };
    };
    if let Err(reason) = check_balanced(&operand) {
        return malformed("input", reason);
    }
    if TARGET.is_match(&operand) {
        Statement::Input {
            prompt: None,
            target: Some(operand),
        }
    } else {
        Statement::Input {
            prompt: Some(operand),
            target: None,
        }
    }
}

/// Plain assignment, bare call, or nothing recognizable.
fn classify_fallback(trimmed: &str) -> Statement {
    if let Some(caps) = ASSIGNMENT.captures(trimmed) {
        let target = caps["target"].to_string();
        let op = match &caps["op"] {
            "<-" | "←" => "=".to_string(),
            op => op.to_string(),
        };
        let value = initializer(&caps["value"]);
        if matches!(value, Initializer::Input { .. }) && op != "=" {
            return malformed("assignment", "input can only be assigned with '='");
        }
        let value_text = match &value {
            Initializer::Expr(expr) => expr.as_str(),
            Initializer::Input { prompt } => prompt.as_deref().unwrap_or_default(),
        };
        if let Some(reason) = unbalanced(&[&target, value_text]) {
            return malformed("assignment", reason);
        }
        return Statement::Assignment { target, op, value };
    }
    if CALL.is_match(trimmed) {
        let expr = trimmed.trim_end_matches(';').trim_end();
        return match unbalanced(&[expr]) {
            Some(reason) => malformed("call", reason),
            None => Statement::Call {
                expr: expr.to_string(),
            },
        };
    }
    Statement::Raw(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope() {
        assert_eq!(
            classify("Algorithm Demo"),
            Statement::Algorithm {
                name: "Demo".to_string()
            }
        );
        assert_eq!(classify("EndAlgorithm"), Statement::EndAlgorithm);
        assert_eq!(classify("End Algorithm"), Statement::EndAlgorithm);
        assert!(matches!(
            classify("Algorithm"),
            Statement::Malformed {
                keyword: "Algorithm",
                ..
            }
        ));
    }

    #[test]
    fn counted_loops() {
        assert_eq!(
            classify("for i = 1 to n step 2"),
            Statement::For {
                var: "i".to_string(),
                from: "1".to_string(),
                to: "n".to_string(),
                step: Some("2".to_string()),
            }
        );
        assert_eq!(
            classify("FOR k = 10 TO 1 STEP -1 do"),
            Statement::For {
                var: "k".to_string(),
                from: "10".to_string(),
                to: "1".to_string(),
                step: Some("-1".to_string()),
            }
        );
        assert!(matches!(
            classify("for i in items"),
            Statement::Malformed { keyword: "for", .. }
        ));
    }

    #[test]
    fn conditionals_strip_then() {
        assert_eq!(
            classify("if x > 3 then"),
            Statement::If {
                condition: "x > 3".to_string()
            }
        );
        assert_eq!(
            classify("else if x = 2 then"),
            Statement::ElseIf {
                condition: "x = 2".to_string()
            }
        );
        assert_eq!(
            classify("elseif done"),
            Statement::ElseIf {
                condition: "done".to_string()
            }
        );
        assert_eq!(classify("else"), Statement::Else);
        assert!(matches!(
            classify("if then"),
            Statement::Malformed { keyword: "if", .. }
        ));
        assert!(matches!(
            classify("while (x > 1"),
            Statement::Malformed { keyword: "while", .. }
        ));
    }

    #[test]
    fn block_terminators() {
        assert_eq!(classify("endfor"), Statement::EndBlock(BlockKind::For));
        assert_eq!(classify("ENDIF"), Statement::EndBlock(BlockKind::If));
        assert_eq!(classify("end while"), Statement::EndBlock(BlockKind::While));
        assert_eq!(
            classify("endfunction"),
            Statement::EndBlock(BlockKind::Function)
        );
        assert!(matches!(
            classify("end loop"),
            Statement::Malformed { keyword: "end", .. }
        ));
    }

    #[test]
    fn functions() {
        assert_eq!(
            classify("function add(a, b)"),
            Statement::Function {
                name: "add".to_string(),
                params: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert_eq!(
            classify("function noop()"),
            Statement::Function {
                name: "noop".to_string(),
                params: vec![],
            }
        );
        assert!(matches!(
            classify("function bad(1x)"),
            Statement::Malformed {
                keyword: "function",
                ..
            }
        ));
        assert_eq!(
            classify("return a + b"),
            Statement::Return {
                value: Some("a + b".to_string())
            }
        );
        assert_eq!(classify("return"), Statement::Return { value: None });
    }

    #[test]
    fn declarations() {
        assert_eq!(
            classify("var x = 5"),
            Statement::Declaration {
                kind: DeclKind::Var,
                name: "x".to_string(),
                size: None,
                init: Some(Initializer::Expr("5".to_string())),
            }
        );
        assert_eq!(
            classify("var scores[10]"),
            Statement::Declaration {
                kind: DeclKind::Var,
                name: "scores".to_string(),
                size: Some("10".to_string()),
                init: None,
            }
        );
        assert_eq!(
            classify("constant PI = 3.14"),
            Statement::Declaration {
                kind: DeclKind::Constant,
                name: "PI".to_string(),
                size: None,
                init: Some(Initializer::Expr("3.14".to_string())),
            }
        );
        assert_eq!(
            classify(r#"variable name = input "Name:""#),
            Statement::Declaration {
                kind: DeclKind::Variable,
                name: "name".to_string(),
                size: None,
                init: Some(Initializer::Input {
                    prompt: Some(r#""Name:""#.to_string())
                }),
            }
        );
        assert!(matches!(
            classify("var = 3"),
            Statement::Malformed {
                keyword: "declaration",
                ..
            }
        ));
    }

    #[test]
    fn set_and_declare() {
        assert_eq!(
            classify("set 10 to total"),
            Statement::Set {
                value: "10".to_string(),
                target: "total".to_string()
            }
        );
        assert_eq!(
            classify("declare count as Integer"),
            Statement::Declare {
                name: "count".to_string(),
                type_name: "Integer".to_string()
            }
        );
        assert!(matches!(
            classify("declare count"),
            Statement::Malformed {
                keyword: "declare",
                ..
            }
        ));
    }

    #[test]
    fn print_forms() {
        assert_eq!(
            classify(r#"print "Total:", total"#),
            Statement::Print {
                args: vec![r#""Total:""#.to_string(), "total".to_string()]
            }
        );
        assert_eq!(
            classify("print(x)"),
            Statement::Print {
                args: vec!["x".to_string()]
            }
        );
        assert_eq!(classify("print"), Statement::Print { args: vec![] });
        assert!(matches!(
            classify(r#"print "unterminated"#),
            Statement::Malformed {
                keyword: "print",
                ..
            }
        ));
        assert!(matches!(
            classify("print a,,b"),
            Statement::Malformed {
                keyword: "print",
                ..
            }
        ));
    }

    #[test]
    fn input_forms() {
        assert_eq!(
            classify(r#"input "Name:""#),
            Statement::Input {
                prompt: Some(r#""Name:""#.to_string()),
                target: None
            }
        );
        assert_eq!(
            classify("input age"),
            Statement::Input {
                prompt: None,
                target: Some("age".to_string())
            }
        );
        assert_eq!(
            classify(r#"name = input("Name:")"#),
            Statement::Assignment {
                target: "name".to_string(),
                op: "=".to_string(),
                value: Initializer::Input {
                    prompt: Some(r#""Name:""#.to_string())
                },
            }
        );
    }

    #[test]
    fn assignments_and_calls() {
        assert_eq!(
            classify("total = total + x"),
            Statement::Assignment {
                target: "total".to_string(),
                op: "=".to_string(),
                value: Initializer::Expr("total + x".to_string()),
            }
        );
        assert_eq!(
            classify("a[i + 1] <- 0"),
            Statement::Assignment {
                target: "a[i + 1]".to_string(),
                op: "=".to_string(),
                value: Initializer::Expr("0".to_string()),
            }
        );
        assert_eq!(
            classify("count += 1"),
            Statement::Assignment {
                target: "count".to_string(),
                op: "+=".to_string(),
                value: Initializer::Expr("1".to_string()),
            }
        );
        assert_eq!(
            classify("greet(name)"),
            Statement::Call {
                expr: "greet(name)".to_string()
            }
        );
        assert_eq!(classify("x == 3"), Statement::Raw("x == 3".to_string()));
        assert_eq!(
            classify("printer = 1"),
            Statement::Assignment {
                target: "printer".to_string(),
                op: "=".to_string(),
                value: Initializer::Expr("1".to_string()),
            }
        );
    }

    #[test]
    fn comments_and_blanks() {
        assert_eq!(classify("   "), Statement::Blank);
        assert_eq!(
            classify("# sum the list"),
            Statement::Comment("sum the list".to_string())
        );
    }
}
