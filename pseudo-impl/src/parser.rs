#![forbid(unsafe_code)]

//! Parsing for the script dialect.
//!
//! Parsing happens in two stages, mirroring a syntax check before execution:
//!
//! 1. [`ScriptPestParser`] tokenizes and parses the text into a pest parse tree.
//! 2. [`AstBuilder`] turns the parse tree into [`crate::ast`] nodes, rejecting
//!    programs that parse but are not valid (assignment to a non-target,
//!    `break` outside a loop, a `let` declared twice in one block, ...).
//!
//! Both stages report a [`ScriptSyntaxError`] carrying the line and column in
//! the parsed text.

use crate::ast::*;
use pest::error::{InputLocation, LineColLocation};
use pest::iterators::Pair;
use pest::Parser;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(pest_derive::Parser)]
#[grammar = "script.pest"]
pub struct ScriptPestParser;

/// A program that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("SyntaxError: {message} ({line}:{column})")]
pub struct ScriptSyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// Parse a complete program into statements without running anything.
pub fn parse_program(input: &str) -> Result<Vec<Stmt>, ScriptSyntaxError> {
    let pairs = ScriptPestParser::parse(Rule::program, input)
        .map_err(|error| syntax_error_from_pest(&error, input))?;

    let mut builder = AstBuilder::new(input);
    let mut statements = Vec::new();
    for pair in pairs {
        for inner in pair.into_inner() {
            if inner.as_rule() != Rule::EOI {
                statements.push(builder.statement(inner)?);
            }
        }
    }
    Ok(statements)
}

fn syntax_error_from_pest(error: &pest::error::Error<Rule>, input: &str) -> ScriptSyntaxError {
    let (line, column) = match error.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    let offset = match error.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let rest = input.get(offset..).unwrap_or_default();
    ScriptSyntaxError {
        message: unexpected(rest),
        line,
        column,
    }
}

/// JavaScript-style description of the token a parse failed on.
fn unexpected(rest: &str) -> String {
    let Some(first) = rest.chars().next() else {
        return "Unexpected end of input".to_string();
    };
    if first.is_ascii_alphabetic() || first == '_' || first == '$' {
        let word: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
            .collect();
        format!("Unexpected identifier '{word}'")
    } else if first.is_ascii_digit() {
        "Unexpected number".to_string()
    } else if first == '"' || first == '\'' {
        "Unexpected string".to_string()
    } else {
        format!("Unexpected token '{first}'")
    }
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_async
            | Rule::kw_function
            | Rule::kw_if
            | Rule::kw_else
            | Rule::kw_while
            | Rule::kw_for
            | Rule::kw_return
            | Rule::kw_break
            | Rule::kw_continue
            | Rule::kw_new
    )
}

/// Children of a pair, without keyword tokens.
fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

/// Deepest expression nesting the builder accepts. Evaluation recurses once
/// per level, so this bounds the interpreter's stack use.
pub const MAX_EXPRESSION_DEPTH: usize = 2_000;

/// Line starts of the parsed text, for offset to line/column lookups.
#[derive(Debug)]
struct LineIndex<'i> {
    input: &'i str,
    starts: Vec<usize>,
}

impl<'i> LineIndex<'i> {
    fn new(input: &'i str) -> Self {
        let starts = std::iter::once(0)
            .chain(input.match_indices('\n').map(|(at, _)| at + 1))
            .collect();
        LineIndex { input, starts }
    }

    fn pos(&self, offset: usize) -> Pos {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let start = self.starts.get(line - 1).copied().unwrap_or(0);
        let column = self
            .input
            .get(start..offset)
            .map_or(1, |text| text.chars().count() + 1);
        Pos { line, column }
    }
}

/// Converts pest parse trees into [`Stmt`]/[`Expr`] nodes.
///
/// Also tracks the bindings of each block, so redeclaring a `let`/`const`
/// name fails here instead of when the declaration runs.
#[derive(Debug)]
pub struct AstBuilder<'i> {
    lines: LineIndex<'i>,
    loop_depth: usize,
    function_depth: usize,
    expression_depth: usize,
    scopes: Vec<HashMap<String, DeclKind>>,
}

impl<'i> AstBuilder<'i> {
    pub fn new(input: &'i str) -> Self {
        AstBuilder {
            lines: LineIndex::new(input),
            loop_depth: 0,
            function_depth: 0,
            expression_depth: 0,
            scopes: vec![HashMap::new()],
        }
    }

    fn pos_of(&self, pair: &Pair<Rule>) -> Pos {
        self.lines.pos(pair.as_span().start())
    }

    fn error_at(&self, pair: &Pair<Rule>, message: impl Into<String>) -> ScriptSyntaxError {
        let pos = self.pos_of(pair);
        ScriptSyntaxError {
            message: message.into(),
            line: pos.line,
            column: pos.column,
        }
    }

    fn next_child<'p>(
        &self,
        children: &mut impl Iterator<Item = Pair<'p, Rule>>,
        parent: &Pair<'p, Rule>,
    ) -> Result<Pair<'p, Rule>, ScriptSyntaxError> {
        children
            .next()
            .ok_or_else(|| self.error_at(parent, format!("Incomplete {:?}", parent.as_rule())))
    }

    fn scoped<T>(&mut self, build: impl FnOnce(&mut Self) -> T) -> T {
        self.scopes.push(HashMap::new());
        let built = build(self);
        self.scopes.pop();
        built
    }

    /// Record `name` in the innermost block. `let`/`const` clash with any
    /// binding of the same name there, `var` and functions only with those.
    fn bind(&mut self, name: &str, kind: DeclKind, at: &Pair<Rule>) -> Result<(), ScriptSyntaxError> {
        let clash = self
            .scopes
            .last()
            .and_then(|scope| scope.get(name))
            .is_some_and(|existing| kind != DeclKind::Var || *existing != DeclKind::Var);
        if clash {
            return Err(self.error_at(at, format!("Identifier '{name}' has already been declared")));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.entry(name.to_string()).or_insert(kind);
        }
        Ok(())
    }

    /// Fails once `extra` more levels would pass [`MAX_EXPRESSION_DEPTH`].
    fn check_depth(&self, extra: usize, at: &Pair<Rule>) -> Result<(), ScriptSyntaxError> {
        if self.expression_depth + extra > MAX_EXPRESSION_DEPTH {
            return Err(self.error_at(at, "Expression is too deeply nested"));
        }
        Ok(())
    }

    pub fn statement(&mut self, pair: Pair<Rule>) -> Result<Stmt, ScriptSyntaxError> {
        let pos = self.pos_of(&pair);
        match pair.as_rule() {
            Rule::block => Ok(Stmt::Block(self.scoped(|builder| builder.statements(pair))?)),
            Rule::function_decl => Ok(Stmt::Function(Rc::new(self.function(pair)?))),
            Rule::if_stmt => {
                let mut children = significant(pair.clone());
                let test = self.expression(self.next_child(&mut children, &pair)?)?;
                let consequent = Box::new(self.statement(self.next_child(&mut children, &pair)?)?);
                let alternate = match children.next() {
                    Some(alt) => Some(Box::new(self.statement(alt)?)),
                    None => None,
                };
                Ok(Stmt::If {
                    test,
                    consequent,
                    alternate,
                })
            }
            Rule::while_stmt => {
                let mut children = significant(pair.clone());
                let test = self.expression(self.next_child(&mut children, &pair)?)?;
                let body = self.loop_body(self.next_child(&mut children, &pair)?)?;
                Ok(Stmt::While { test, body })
            }
            Rule::for_stmt => self.scoped(|builder| builder.for_statement(pair)),
            Rule::var_stmt => {
                let decl = self.next_child(&mut pair.clone().into_inner(), &pair)?;
                let (kind, declarators) = self.declaration(decl)?;
                Ok(Stmt::Decl(kind, declarators))
            }
            Rule::return_stmt => {
                if self.function_depth == 0 {
                    return Err(self.error_at(&pair, "Illegal return statement"));
                }
                let value = match significant(pair).next() {
                    Some(expr) => Some(self.expression(expr)?),
                    None => None,
                };
                Ok(Stmt::Return(value, pos))
            }
            Rule::break_stmt => {
                if self.loop_depth == 0 {
                    return Err(self.error_at(&pair, "Illegal break statement"));
                }
                Ok(Stmt::Break(pos))
            }
            Rule::continue_stmt => {
                if self.loop_depth == 0 {
                    return Err(self.error_at(
                        &pair,
                        "Illegal continue statement: no surrounding iteration statement",
                    ));
                }
                Ok(Stmt::Continue(pos))
            }
            Rule::empty_stmt => Ok(Stmt::Empty),
            Rule::expr_stmt => {
                let expr = self.next_child(&mut pair.clone().into_inner(), &pair)?;
                Ok(Stmt::Expr(self.expression(expr)?))
            }
            rule => Err(self.error_at(&pair, format!("Unexpected {rule:?}"))),
        }
    }

    fn statements(&mut self, pair: Pair<Rule>) -> Result<Vec<Stmt>, ScriptSyntaxError> {
        pair.into_inner()
            .map(|inner| self.statement(inner))
            .collect()
    }

    fn loop_body(&mut self, pair: Pair<Rule>) -> Result<Box<Stmt>, ScriptSyntaxError> {
        self.loop_depth += 1;
        let body = self.statement(pair);
        self.loop_depth -= 1;
        body.map(Box::new)
    }

    fn function(&mut self, pair: Pair<Rule>) -> Result<FunctionDecl, ScriptSyntaxError> {
        let pos = self.pos_of(&pair);
        let is_async = pair
            .clone()
            .into_inner()
            .any(|p| p.as_rule() == Rule::kw_async);
        let mut children = significant(pair.clone());
        let name_pair = self.next_child(&mut children, &pair)?;
        let name = name_pair.as_str().to_string();
        self.bind(&name, DeclKind::Var, &name_pair)?;
        let params: Vec<String> = self
            .next_child(&mut children, &pair)?
            .into_inner()
            .map(|p| p.as_str().to_string())
            .collect();
        let body_pair = self.next_child(&mut children, &pair)?;

        let saved_loops = std::mem::take(&mut self.loop_depth);
        self.function_depth += 1;
        let body = self.scoped(|builder| {
            for param in &params {
                builder.bind(param, DeclKind::Var, &body_pair)?;
            }
            builder.statements(body_pair)
        });
        self.function_depth -= 1;
        self.loop_depth = saved_loops;

        Ok(FunctionDecl {
            name,
            params,
            body: body?,
            is_async,
            pos,
        })
    }

    fn for_statement(&mut self, pair: Pair<Rule>) -> Result<Stmt, ScriptSyntaxError> {
        let pos = self.pos_of(&pair);
        let mut init = None;
        let mut test = None;
        let mut update = None;
        let mut body = None;

        for child in significant(pair.clone()) {
            match child.as_rule() {
                Rule::for_init => {
                    let inner = self.next_child(&mut child.clone().into_inner(), &child)?;
                    init = Some(match inner.as_rule() {
                        Rule::var_decl => {
                            let (kind, declarators) = self.declaration(inner)?;
                            ForInit::Decl(kind, declarators)
                        }
                        _ => ForInit::Expr(self.expression(inner)?),
                    });
                }
                Rule::for_test => test = Some(self.first_expression(child)?),
                Rule::for_update => update = Some(self.first_expression(child)?),
                _ => body = Some(self.loop_body(child)?),
            }
        }

        let body = body.ok_or_else(|| self.error_at(&pair, "Missing loop body"))?;
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
            pos,
        })
    }

    fn declaration(
        &mut self,
        pair: Pair<Rule>,
    ) -> Result<(DeclKind, Vec<Declarator>), ScriptSyntaxError> {
        let mut children = pair.clone().into_inner();
        let kind = match self.next_child(&mut children, &pair)?.as_str() {
            "const" => DeclKind::Const,
            "var" => DeclKind::Var,
            _ => DeclKind::Let,
        };

        let mut declarators = Vec::new();
        for declarator in children {
            let pos = self.pos_of(&declarator);
            let mut parts = declarator.clone().into_inner();
            let name = self.next_child(&mut parts, &declarator)?.as_str().to_string();
            self.bind(&name, kind, &declarator)?;
            let init = match parts.next() {
                Some(expr) => Some(self.expression(expr)?),
                None if kind == DeclKind::Const => {
                    return Err(self.error_at(&declarator, "Missing initializer in const declaration"))
                }
                None => None,
            };
            declarators.push(Declarator { name, init, pos });
        }
        Ok((kind, declarators))
    }

    fn first_expression(&mut self, pair: Pair<Rule>) -> Result<Expr, ScriptSyntaxError> {
        let inner = self.next_child(&mut pair.clone().into_inner(), &pair)?;
        self.expression(inner)
    }

    pub fn expression(&mut self, pair: Pair<Rule>) -> Result<Expr, ScriptSyntaxError> {
        self.check_depth(1, &pair)?;
        self.expression_depth += 1;
        let expr = self.expression_node(pair);
        self.expression_depth -= 1;
        expr
    }

    fn expression_node(&mut self, pair: Pair<Rule>) -> Result<Expr, ScriptSyntaxError> {
        let pos = self.pos_of(&pair);
        match pair.as_rule() {
            Rule::expression => self.first_expression(pair),
            Rule::assignment => {
                let mut children = pair.clone().into_inner();
                let target = self.expression(self.next_child(&mut children, &pair)?)?;
                let Some(op) = children.next() else {
                    return Ok(target);
                };
                if !target.is_target() {
                    return Err(self.error_at(&pair, "Invalid left-hand side in assignment"));
                }
                let op = match op.as_str() {
                    "=" => AssignOp::Assign,
                    compound => {
                        let symbol = compound.trim_end_matches('=');
                        let binary = BinaryOp::from_symbol(symbol).ok_or_else(|| {
                            self.error_at(&op, format!("Unknown assignment operator '{compound}'"))
                        })?;
                        AssignOp::Compound(binary)
                    }
                };
                let value = self.expression(self.next_child(&mut children, &pair)?)?;
                Ok(Expr::new(
                    ExprKind::Assign(op, Box::new(target), Box::new(value)),
                    pos,
                ))
            }
            Rule::conditional => {
                let mut children = pair.clone().into_inner();
                let test = self.expression(self.next_child(&mut children, &pair)?)?;
                let Some(consequent) = children.next() else {
                    return Ok(test);
                };
                let consequent = self.expression(consequent)?;
                let alternate = self.expression(self.next_child(&mut children, &pair)?)?;
                Ok(Expr::new(
                    ExprKind::Conditional(
                        Box::new(test),
                        Box::new(consequent),
                        Box::new(alternate),
                    ),
                    pos,
                ))
            }
            Rule::logical_or
            | Rule::logical_and
            | Rule::equality
            | Rule::relational
            | Rule::additive
            | Rule::multiplicative => self.binary_chain(pair),
            Rule::unary => {
                let mut ops = Vec::new();
                let mut operand = None;
                for child in pair.clone().into_inner() {
                    if child.as_rule() == Rule::unary_op {
                        ops.push((unary_op(child.as_str()), self.pos_of(&child)));
                    } else {
                        operand = Some(self.expression(child)?);
                    }
                }
                self.check_depth(ops.len(), &pair)?;
                let mut expr = operand.ok_or_else(|| self.error_at(&pair, "Missing operand"))?;
                for (op, op_pos) in ops.into_iter().rev() {
                    expr = Expr::new(ExprKind::Unary(op, Box::new(expr)), op_pos);
                }
                Ok(expr)
            }
            Rule::postfix => self.postfix(pair),
            Rule::number => pair
                .as_str()
                .parse::<f64>()
                .map(|n| Expr::new(ExprKind::Number(n), pos))
                .map_err(|_| self.error_at(&pair, "Invalid or unexpected token")),
            Rule::string => {
                let raw = pair
                    .clone()
                    .into_inner()
                    .next()
                    .map(|inner| inner.as_str())
                    .unwrap_or_default();
                Ok(Expr::new(ExprKind::Str(Rc::from(unescape(raw))), pos))
            }
            Rule::boolean => Ok(Expr::new(ExprKind::Bool(pair.as_str() == "true"), pos)),
            Rule::null => Ok(Expr::new(ExprKind::Null, pos)),
            Rule::undefined => Ok(Expr::new(ExprKind::Undefined, pos)),
            Rule::array_literal => {
                let items = pair
                    .into_inner()
                    .map(|item| self.expression(item))
                    .collect::<Result<_, _>>()?;
                Ok(Expr::new(ExprKind::Array(items), pos))
            }
            Rule::new_expr => {
                let mut children = significant(pair.clone());
                let callee = self.next_child(&mut children, &pair)?.as_str().to_string();
                let args = match children.next() {
                    Some(args) => self.arguments(args)?,
                    None => Vec::new(),
                };
                Ok(Expr::new(ExprKind::New(callee, args), pos))
            }
            Rule::identifier => Ok(Expr::new(ExprKind::Ident(pair.as_str().to_string()), pos)),
            rule => Err(self.error_at(&pair, format!("Unexpected {rule:?} in expression"))),
        }
    }

    /// Left-associative chain `operand (op operand)*`.
    fn binary_chain(&mut self, pair: Pair<Rule>) -> Result<Expr, ScriptSyntaxError> {
        let mut children = pair.clone().into_inner();
        let mut left = self.expression(self.next_child(&mut children, &pair)?)?;
        let mut chained = 0;
        while let Some(op_pair) = children.next() {
            chained += 1;
            self.check_depth(chained, &op_pair)?;
            let op = BinaryOp::from_symbol(op_pair.as_str())
                .ok_or_else(|| self.error_at(&op_pair, format!("Unknown operator '{}'", op_pair.as_str())))?;
            let right = self.expression(self.next_child(&mut children, &pair)?)?;
            let pos = left.pos;
            left = Expr::new(ExprKind::Binary(op, Box::new(left), Box::new(right)), pos);
        }
        Ok(left)
    }

    fn postfix(&mut self, pair: Pair<Rule>) -> Result<Expr, ScriptSyntaxError> {
        let mut children = pair.clone().into_inner();
        let mut expr = self.expression(self.next_child(&mut children, &pair)?)?;
        for (chained, suffix) in children.enumerate() {
            self.check_depth(chained + 1, &suffix)?;
            let pos = self.pos_of(&suffix);
            expr = match suffix.as_rule() {
                Rule::call_args => {
                    let callee_pos = expr.pos;
                    let args = self.arguments(suffix)?;
                    Expr::new(ExprKind::Call(Box::new(expr), args), callee_pos)
                }
                Rule::index => {
                    let index = self.first_expression(suffix)?;
                    Expr::new(ExprKind::Index(Box::new(expr), Box::new(index)), pos)
                }
                Rule::member => {
                    let name = self.next_child(&mut suffix.clone().into_inner(), &suffix)?;
                    let property_pos = self.pos_of(&name);
                    Expr::new(
                        ExprKind::Member(Box::new(expr), name.as_str().to_string()),
                        property_pos,
                    )
                }
                rule => return Err(self.error_at(&suffix, format!("Unexpected {rule:?}"))),
            };
        }
        Ok(expr)
    }

    fn arguments(&mut self, pair: Pair<Rule>) -> Result<Vec<Expr>, ScriptSyntaxError> {
        pair.into_inner()
            .map(|arg| self.expression(arg))
            .collect()
    }
}

fn unary_op(symbol: &str) -> UnaryOp {
    match symbol {
        "!" => UnaryOp::Not,
        "-" => UnaryOp::Neg,
        "+" => UnaryOp::Plus,
        "typeof" => UnaryOp::TypeOf,
        _ => UnaryOp::Await,
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        let program = parse_program(&format!("{source};")).unwrap();
        match program.into_iter().next() {
            Some(Stmt::Expr(expr)) => expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn precedence() {
        let parsed = expr("1 + 2 * 3");
        let ExprKind::Binary(BinaryOp::Add, left, right) = parsed.kind else {
            panic!("expected addition");
        };
        assert_eq!(left.kind, ExprKind::Number(1.0));
        assert!(matches!(right.kind, ExprKind::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn assignment_and_conditional() {
        assert!(matches!(
            expr("x += 2").kind,
            ExprKind::Assign(AssignOp::Compound(BinaryOp::Add), _, _)
        ));
        assert!(matches!(
            expr("(s) > 0 ? i <= b : i >= b").kind,
            ExprKind::Conditional(..)
        ));
        assert!(matches!(expr("a[i] = 3").kind, ExprKind::Assign(AssignOp::Assign, _, _)));
    }

    #[test]
    fn postfix_chains() {
        let parsed = expr("new Array(5).fill(0)");
        let ExprKind::Call(callee, args) = parsed.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(callee.kind, ExprKind::Member(_, ref name) if name == "fill"));
    }

    #[test]
    fn strings_and_keywords() {
        assert_eq!(expr(r#""a\"b\n""#).kind, ExprKind::Str(Rc::from("a\"b\n")));
        assert_eq!(expr("'it\\'s'").kind, ExprKind::Str(Rc::from("it's")));
        assert_eq!(expr("newValue").kind, ExprKind::Ident("newValue".to_string()));
        assert!(matches!(
            expr("await input(\"x\")").kind,
            ExprKind::Unary(UnaryOp::Await, _)
        ));
    }

    #[test]
    fn wrapped_program_parses() {
        let source = "async function __program__(print, input) {\nlet x = 5;\n\nprint(x); // note\nfor (let i = 1; i <= 3; i += 1) {\n  if (i == 2) {\n    continue;\n  } else {\n    print(i);\n  }\n}\n}";
        let program = parse_program(source).unwrap();
        assert_eq!(program.len(), 1);
        let Stmt::Function(main) = &program[0] else {
            panic!("expected function");
        };
        assert!(main.is_async);
        assert_eq!(main.params, vec!["print", "input"]);
        assert_eq!(main.body.len(), 3);
    }

    #[test]
    fn reports_position_of_syntax_errors() {
        let error = parse_program("let x = 5;\nprint(x y);").unwrap_err();
        assert_eq!(error.line, 2);
        assert_eq!(error.message, "Unexpected identifier 'y'");

        let error = parse_program("let x = (1 + 2;").unwrap_err();
        assert_eq!(error.line, 1);
        assert_eq!(error.message, "Unexpected token ';'");
    }

    #[test]
    fn rejects_invalid_targets_and_loop_control() {
        let error = parse_program("1 = 2;").unwrap_err();
        assert_eq!(error.message, "Invalid left-hand side in assignment");
        let error = parse_program("break;").unwrap_err();
        assert_eq!(error.message, "Illegal break statement");
        let error = parse_program("while (true) { function f() { break; } }").unwrap_err();
        assert_eq!(error.message, "Illegal break statement");
        let error = parse_program("return 1;").unwrap_err();
        assert_eq!(error.message, "Illegal return statement");
        assert!(parse_program("while (true) { if (x) { break; } }").is_ok());
    }

    #[test]
    fn redeclaring_in_one_block_is_rejected() {
        let error = parse_program("let x = 1;\nprint(x);\nlet x = 2;").unwrap_err();
        assert_eq!(error.message, "Identifier 'x' has already been declared");
        assert_eq!((error.line, error.column), (3, 5));

        let error = parse_program("function f(a) {\n  const a = 1;\n}").unwrap_err();
        assert_eq!(error.message, "Identifier 'a' has already been declared");
        let error = parse_program("function g() {}\nlet g = 1;").unwrap_err();
        assert_eq!(error.message, "Identifier 'g' has already been declared");
        let error = parse_program("let v = 1;\nvar v = 2;").unwrap_err();
        assert_eq!(error.line, 2);
    }

    #[test]
    fn separate_blocks_may_reuse_names() {
        assert!(parse_program("let x = 1;\nif (x) {\n  let x = 2;\n} else {\n  let x = 3;\n}").is_ok());
        assert!(parse_program("for (let i = 0; i < 2; i += 1) {\n  let i = 5;\n}\nfor (let i = 0; i < 2; i += 1) {}").is_ok());
        assert!(parse_program("var a = 1;\nvar a = 2;").is_ok());
    }

    #[test]
    fn positions_are_found_without_rescanning() {
        let line = "let t = a + b * 2 - c;\n";
        let small = line.replace("let t", "t").repeat(1_000);
        let large = line.replace("let t", "t").repeat(16_000);

        let started = std::time::Instant::now();
        assert_eq!(parse_program(&small).map(|p| p.len()), Ok(1_000));
        let small_time = started.elapsed();

        let started = std::time::Instant::now();
        let program = parse_program(&format!("{large}print(t);")).unwrap();
        let large_time = started.elapsed();

        assert_eq!(program.len(), 16_001);
        let Stmt::Expr(last) = &program[16_000] else {
            panic!("expected the final print");
        };
        assert_eq!(last.pos, Pos { line: 16_001, column: 1 });
        // Sixteen times the input stays within a linear factor.
        assert!(
            large_time < small_time * 64 + std::time::Duration::from_millis(500),
            "{small_time:?} vs {large_time:?}"
        );
    }

    #[test]
    fn columns_count_characters() {
        let error = parse_program("let s = \"héllo\"; let s = 1;").unwrap_err();
        assert_eq!((error.line, error.column), (1, 22));
    }

    #[test]
    fn overly_long_chains_are_rejected() {
        let terms = vec!["1"; MAX_EXPRESSION_DEPTH + 10].join(" + ");
        let error = parse_program(&format!("print({terms});")).unwrap_err();
        assert_eq!(error.message, "Expression is too deeply nested");

        let terms = vec!["1"; 500].join(" + ");
        assert!(parse_program(&format!("print({terms});")).is_ok());
    }
}
