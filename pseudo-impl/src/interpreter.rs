//! Tree-walking evaluation of parsed scripts.
//!
//! The interpreter is single-threaded and synchronous: `await input(..)` blocks
//! inside [`Host::input`] until the host answers. The [`Watchdog`] is polled
//! before every statement, loop iteration and call, so a runaway loop is
//! stopped at the position it was executing.

use crate::ast::*;
use crate::builtins;
use crate::error::{ErrorName, ScriptError, Thrown, Unwind};
use crate::sandbox::{ENTRY_POINT, SANDBOX_FILE};
use crate::scope::{Scope, ScopeError};
use crate::value::{from_input, Closure, Native, Value};
use crate::watchdog::{Stop, Watchdog};
use itertools::Itertools;
use std::cmp::Ordering;
use std::rc::Rc;
use tracing::trace;

/// The side of the sandbox the running program talks to.
pub trait Host {
    fn print(&mut self, text: String);

    /// Ask for a line of input. `None` means the run was cancelled while waiting.
    fn input(&mut self, prompt: String) -> Option<String>;
}

type Exec<T> = Result<T, Unwind>;

enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

struct CallFrame {
    name: String,
    call_site: Pos,
}

pub struct Interpreter<H: Host> {
    host: H,
    watchdog: Watchdog,
    max_call_depth: usize,
    globals: Scope,
    frames: Vec<CallFrame>,
    // Scopes holding function declarations; cleared on teardown to break
    // closure <-> scope cycles.
    hoisted: Vec<Scope>,
}

impl<H: Host> Interpreter<H> {
    pub fn new(host: H, watchdog: Watchdog, max_call_depth: usize) -> Self {
        let globals = Scope::root();
        for (name, value) in builtins::globals() {
            globals.define(name, value);
        }
        Interpreter {
            host,
            watchdog,
            max_call_depth,
            globals,
            frames: Vec::new(),
            hoisted: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Run the top level of `program`, then invoke the wrapper function with
    /// `print` and `input` if the program declares one.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), Unwind> {
        let result = self.run_program(program);
        self.teardown();
        result
    }

    fn run_program(&mut self, program: &[Stmt]) -> Exec<()> {
        let globals = self.globals.clone();
        self.frames.push(CallFrame {
            name: "<anonymous>".to_string(),
            call_site: Pos::default(),
        });
        let flow = self.exec_block(program, &globals);
        self.frames.pop();
        flow?;

        if let Some(Value::Function(entry)) = globals.get(ENTRY_POINT) {
            let args = vec![Value::Native(Native::Print), Value::Native(Native::Input)];
            self.call_closure(&entry, args, entry.decl.pos)?;
        }
        Ok(())
    }

    fn teardown(&mut self) {
        for scope in self.hoisted.drain(..) {
            scope.clear();
        }
        self.globals.clear();
    }

    fn tick(&self, pos: Pos) -> Exec<()> {
        self.watchdog.check().map_err(|stop| match stop {
            Stop::TimedOut => Unwind::Timeout { pos },
            Stop::Cancelled => Unwind::Cancelled,
        })
    }

    fn stack_trace(&self, header: &str, pos: Pos) -> String {
        let mut lines = vec![header.to_string()];
        let mut at = pos;
        for frame in self.frames.iter().rev() {
            lines.push(format!(
                "    at {} ({SANDBOX_FILE}:{}:{})",
                frame.name, at.line, at.column
            ));
            at = frame.call_site;
        }
        lines.join("\n")
    }

    fn error(&self, name: ErrorName, message: impl Into<String>, pos: Pos) -> Unwind {
        let message = message.into();
        let stack = self.stack_trace(&format!("{name}: {message}"), pos);
        Unwind::Throw(ScriptError {
            name,
            message,
            stack,
            pos,
        })
    }

    fn thrown(&self, thrown: Thrown, pos: Pos) -> Unwind {
        self.error(thrown.name, thrown.message, pos)
    }

    fn hoist(&mut self, statements: &[Stmt], scope: &Scope) {
        let mut declared = false;
        for statement in statements {
            if let Stmt::Function(decl) = statement {
                let closure = Closure {
                    decl: decl.clone(),
                    scope: scope.clone(),
                };
                scope.define(&decl.name, Value::Function(Rc::new(closure)));
                declared = true;
            }
        }
        if declared {
            self.hoisted.push(scope.clone());
        }
    }

    fn exec_block(&mut self, statements: &[Stmt], scope: &Scope) -> Exec<Flow> {
        self.hoist(statements, scope);
        for statement in statements {
            match self.exec(statement, scope)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, statement: &Stmt, scope: &Scope) -> Exec<Flow> {
        match statement {
            Stmt::Expr(expr) => {
                self.tick(expr.pos)?;
                self.eval(expr, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Decl(kind, declarators) => {
                self.declare(*kind, declarators, scope)?;
                Ok(Flow::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Return(value, pos) => {
                self.tick(*pos)?;
                let value = match value {
                    Some(expr) => self.eval(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                self.tick(test.pos)?;
                if self.eval(test, scope)?.truthy() {
                    self.exec(consequent, scope)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate, scope)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { test, body } => {
                loop {
                    self.tick(test.pos)?;
                    if !self.eval(test, scope)?.truthy() {
                        break;
                    }
                    match self.exec(body, scope)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
                pos,
            } => {
                let loop_scope = scope.child();
                match init {
                    Some(ForInit::Decl(kind, declarators)) => {
                        self.declare(*kind, declarators, &loop_scope)?
                    }
                    Some(ForInit::Expr(expr)) => {
                        self.eval(expr, &loop_scope)?;
                    }
                    None => {}
                }
                loop {
                    self.tick(*pos)?;
                    if let Some(test) = test {
                        if !self.eval(test, &loop_scope)?.truthy() {
                            break;
                        }
                    }
                    match self.exec(body, &loop_scope)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    if let Some(update) = update {
                        self.eval(update, &loop_scope)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Block(statements) => self.exec_block(statements, &scope.child()),
            Stmt::Break(pos) => {
                self.tick(*pos)?;
                Ok(Flow::Break)
            }
            Stmt::Continue(pos) => {
                self.tick(*pos)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn declare(&mut self, kind: DeclKind, declarators: &[Declarator], scope: &Scope) -> Exec<()> {
        for declarator in declarators {
            self.tick(declarator.pos)?;
            let value = match &declarator.init {
                Some(init) => self.eval(init, scope)?,
                None => Value::Undefined,
            };
            let declared = match kind {
                DeclKind::Let => scope.declare(&declarator.name, value, true),
                DeclKind::Const => scope.declare(&declarator.name, value, false),
                DeclKind::Var => {
                    scope.define(&declarator.name, value);
                    Ok(())
                }
            };
            if declared.is_err() {
                return Err(self.error(
                    ErrorName::SyntaxError,
                    format!("Identifier '{}' has already been declared", declarator.name),
                    declarator.pos,
                ));
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr, scope: &Scope) -> Exec<Value> {
        let value = match &expr.kind {
            ExprKind::Number(n) => Value::Number(*n),
            ExprKind::Str(s) => Value::Str(s.clone()),
            ExprKind::Bool(b) => Value::Bool(*b),
            ExprKind::Null => Value::Null,
            ExprKind::Undefined => Value::Undefined,
            ExprKind::Array(items) => {
                let items = self.eval_all(items, scope)?;
                Value::array(items)
            }
            ExprKind::Ident(name) => self.lookup(name, scope, expr.pos)?,
            ExprKind::Unary(UnaryOp::TypeOf, operand) => match &operand.kind {
                ExprKind::Ident(name) => {
                    let value = scope.get(name).unwrap_or(Value::Undefined);
                    Value::str(value.type_of())
                }
                _ => Value::str(self.eval(operand, scope)?.type_of()),
            },
            ExprKind::Unary(op, operand) => {
                let value = self.eval(operand, scope)?;
                match op {
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Await | UnaryOp::TypeOf => value,
                }
            }
            ExprKind::Binary(BinaryOp::And, left, right) => {
                let left = self.eval(left, scope)?;
                if left.truthy() {
                    self.eval(right, scope)?
                } else {
                    left
                }
            }
            ExprKind::Binary(BinaryOp::Or, left, right) => {
                let left = self.eval(left, scope)?;
                if left.truthy() {
                    left
                } else {
                    self.eval(right, scope)?
                }
            }
            ExprKind::Binary(op, left, right) => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                binary(*op, &left, &right)
            }
            ExprKind::Conditional(test, consequent, alternate) => {
                if self.eval(test, scope)?.truthy() {
                    self.eval(consequent, scope)?
                } else {
                    self.eval(alternate, scope)?
                }
            }
            ExprKind::Assign(op, target, value) => self.assign(*op, target, value, scope)?,
            ExprKind::Call(callee, args) => {
                self.tick(expr.pos)?;
                match &callee.kind {
                    ExprKind::Member(object, method) => {
                        let object = self.eval(object, scope)?;
                        let args = self.eval_all(args, scope)?;
                        self.call_method(object, method, args, callee, expr.pos)?
                    }
                    _ => {
                        let function = self.eval(callee, scope)?;
                        let args = self.eval_all(args, scope)?;
                        self.call(function, args, callee, expr.pos)?
                    }
                }
            }
            ExprKind::Index(object, key) => {
                let object = self.eval(object, scope)?;
                let key = self.eval(key, scope)?;
                self.get_index(&object, &key, expr.pos)?
            }
            ExprKind::Member(object, name) => {
                let object = self.eval(object, scope)?;
                self.get_member(&object, name, expr.pos)?
            }
            ExprKind::New(name, args) => {
                self.tick(expr.pos)?;
                let constructor = self.lookup(name, scope, expr.pos)?;
                let args = self.eval_all(args, scope)?;
                match constructor {
                    Value::Native(Native::Array) => {
                        builtins::construct_array(args).map_err(|t| self.thrown(t, expr.pos))?
                    }
                    _ => {
                        return Err(self.error(
                            ErrorName::TypeError,
                            format!("{name} is not a constructor"),
                            expr.pos,
                        ))
                    }
                }
            }
        };
        Ok(value)
    }

    fn eval_all(&mut self, exprs: &[Expr], scope: &Scope) -> Exec<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr, scope)).collect()
    }

    fn lookup(&self, name: &str, scope: &Scope, pos: Pos) -> Exec<Value> {
        scope.get(name).ok_or_else(|| {
            self.error(
                ErrorName::ReferenceError,
                format!("{name} is not defined"),
                pos,
            )
        })
    }

    fn assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, scope: &Scope) -> Exec<Value> {
        let value = match op {
            AssignOp::Assign => self.eval(value, scope)?,
            AssignOp::Compound(op) => {
                let current = self.eval(target, scope)?;
                let rhs = self.eval(value, scope)?;
                binary(op, &current, &rhs)
            }
        };

        match &target.kind {
            ExprKind::Ident(name) => match scope.assign(name, value.clone()) {
                Ok(()) => {}
                Err(ScopeError::NotFound) => self.globals.define(name, value.clone()),
                Err(_) => {
                    return Err(self.error(
                        ErrorName::TypeError,
                        "Assignment to constant variable.",
                        target.pos,
                    ))
                }
            },
            ExprKind::Index(object, key) => {
                let object = self.eval(object, scope)?;
                let key = self.eval(key, scope)?;
                self.set_property(&object, &key.to_display(), value.clone(), target.pos)?;
            }
            ExprKind::Member(object, name) => {
                let object = self.eval(object, scope)?;
                self.set_property(&object, name, value.clone(), target.pos)?;
            }
            _ => {
                return Err(self.error(
                    ErrorName::SyntaxError,
                    "Invalid left-hand side in assignment",
                    target.pos,
                ))
            }
        }
        Ok(value)
    }

    fn set_property(&self, object: &Value, key: &str, value: Value, pos: Pos) -> Exec<()> {
        match object {
            Value::Undefined | Value::Null => Err(self.error(
                ErrorName::TypeError,
                format!("Cannot set properties of {object} (setting '{key}')"),
                pos,
            )),
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    let length = value.to_number();
                    if length < 0.0
                        || length.fract() != 0.0
                        || length > builtins::MAX_ARRAY_LENGTH as f64
                    {
                        return Err(self.error(ErrorName::RangeError, "Invalid array length", pos));
                    }
                    items.resize(length as usize, Value::Undefined);
                } else if let Some(index) = array_index(key) {
                    if index >= builtins::MAX_ARRAY_LENGTH {
                        return Err(self.error(ErrorName::RangeError, "Invalid array length", pos));
                    }
                    if index >= items.len() {
                        items.resize(index + 1, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(())
            }
            // Primitives and builtins silently ignore property writes.
            _ => Ok(()),
        }
    }

    fn get_index(&self, object: &Value, key: &Value, pos: Pos) -> Exec<Value> {
        let key = key.to_display();
        if let Some(index) = array_index(&key) {
            match object {
                Value::Array(items) => {
                    return Ok(items.borrow().get(index).cloned().unwrap_or(Value::Undefined))
                }
                Value::Str(s) => {
                    return Ok(s
                        .chars()
                        .nth(index)
                        .map_or(Value::Undefined, |c| Value::str(c.to_string())))
                }
                _ => {}
            }
        }
        self.get_member(object, &key, pos)
    }

    fn get_member(&self, object: &Value, name: &str, pos: Pos) -> Exec<Value> {
        let value = match (object, name) {
            (Value::Undefined | Value::Null, _) => {
                return Err(self.error(
                    ErrorName::TypeError,
                    format!("Cannot read properties of {object} (reading '{name}')"),
                    pos,
                ))
            }
            (Value::Array(items), "length") => Value::Number(items.borrow().len() as f64),
            (Value::Str(s), "length") => Value::Number(s.chars().count() as f64),
            (Value::Math, _) => builtins::math_constant(name).map_or(Value::Undefined, Value::Number),
            (Value::Function(closure), "name") => Value::str(&closure.decl.name),
            (Value::Function(closure), "length") => Value::Number(closure.decl.params.len() as f64),
            (Value::Native(native), "name") => Value::str(native.name()),
            _ => Value::Undefined,
        };
        Ok(value)
    }

    fn call_method(
        &mut self,
        object: Value,
        method: &str,
        args: Vec<Value>,
        callee: &Expr,
        pos: Pos,
    ) -> Exec<Value> {
        let result = match &object {
            Value::Undefined | Value::Null => {
                return Err(self.error(
                    ErrorName::TypeError,
                    format!("Cannot read properties of {object} (reading '{method}')"),
                    pos,
                ))
            }
            Value::Math => builtins::math_call(method, &args).map(|n| Ok(Value::Number(n))),
            Value::Array(items) => builtins::array_method(items, method, args),
            Value::Str(s) => builtins::string_method(s, method, args),
            Value::Number(n) => builtins::number_method(*n, method, args),
            Value::Bool(_) | Value::Function(_) | Value::Native(_) if method == "toString" => {
                Some(Ok(Value::str(object.to_display())))
            }
            _ => None,
        };
        match result {
            Some(result) => result.map_err(|thrown| self.thrown(thrown, pos)),
            None => Err(self.error(
                ErrorName::TypeError,
                format!("{} is not a function", callee.describe()),
                pos,
            )),
        }
    }

    fn call(&mut self, function: Value, args: Vec<Value>, callee: &Expr, pos: Pos) -> Exec<Value> {
        match function {
            Value::Native(Native::Print) => {
                let text = args.iter().map(Value::to_display).join(" ");
                self.host.print(text);
                Ok(Value::Undefined)
            }
            Value::Native(Native::Input) => {
                let prompt = args.first().map(Value::to_display).unwrap_or_default();
                trace!(%prompt, "waiting for input");
                self.watchdog.pause();
                let response = self.host.input(prompt);
                self.watchdog.resume();
                match response {
                    Some(response) => Ok(from_input(response)),
                    None => Err(Unwind::Cancelled),
                }
            }
            Value::Native(native) => {
                builtins::call_native(native, args).map_err(|thrown| self.thrown(thrown, pos))
            }
            Value::Function(closure) => self.call_closure(&closure, args, pos),
            _ => Err(self.error(
                ErrorName::TypeError,
                format!("{} is not a function", callee.describe()),
                pos,
            )),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>, call_site: Pos) -> Exec<Value> {
        if self.frames.len() > self.max_call_depth {
            return Err(self.error(
                ErrorName::RangeError,
                "Maximum call stack size exceeded",
                call_site,
            ));
        }
        let decl = &closure.decl;
        let scope = closure.scope.child();
        let mut args = args.into_iter();
        for param in &decl.params {
            scope.define(param, args.next().unwrap_or(Value::Undefined));
        }

        self.frames.push(CallFrame {
            name: decl.name.clone(),
            call_site,
        });
        let flow = self.exec_block(&decl.body, &scope);
        self.frames.pop();

        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }
}

/// Canonical non-negative integer keys such as `"3"`; `"03"` and `"-1"` are plain names.
fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left.to_primitive(), right.to_primitive()) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let numeric = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    match op {
        BinaryOp::Add => match (left.to_primitive(), right.to_primitive()) {
            (l @ Value::Str(_), r) | (l, r @ Value::Str(_)) => {
                Value::str(format!("{}{}", l.to_display(), r.to_display()))
            }
            (l, r) => Value::Number(l.to_number() + r.to_number()),
        },
        BinaryOp::Sub => numeric(|a, b| a - b),
        BinaryOp::Mul => numeric(|a, b| a * b),
        BinaryOp::Div => numeric(|a, b| a / b),
        BinaryOp::Rem => numeric(|a, b| a % b),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
        BinaryOp::And => {
            if left.truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOp::Or => {
            if left.truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
    }
}
