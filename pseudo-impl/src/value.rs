//! Runtime values and the JavaScript conversion rules the interpreter relies on.

use crate::ast::FunctionDecl;
use crate::scope::Scope;
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Functions implemented by the interpreter itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    Print,
    Input,
    ParseInt,
    ParseFloat,
    Number,
    String,
    Boolean,
    Array,
    IsNaN,
}

impl Native {
    pub fn name(self) -> &'static str {
        match self {
            Native::Print => "print",
            Native::Input => "input",
            Native::ParseInt => "parseInt",
            Native::ParseFloat => "parseFloat",
            Native::Number => "Number",
            Native::String => "String",
            Native::Boolean => "Boolean",
            Native::Array => "Array",
            Native::IsNaN => "isNaN",
        }
    }
}

/// A user function together with the scope it was declared in.
#[derive(Debug)]
pub struct Closure {
    pub decl: Rc<FunctionDecl>,
    pub scope: Scope,
}

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Closure>),
    Native(Native),
    /// The `Math` namespace object.
    Math,
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Function(_) | Value::Native(_) | Value::Math => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Math => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    /// `Number(value)`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Array(items) => {
                let items = items.borrow();
                match items.as_slice() {
                    [] => 0.0,
                    [single] => Value::str(single.to_display()).to_number(),
                    _ => f64::NAN,
                }
            }
            Value::Function(_) | Value::Native(_) | Value::Math => f64::NAN,
        }
    }

    /// `String(value)`, which is also what `print` shows.
    pub fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::Str(s) => s.to_string(),
            Value::Array(items) => join_items(items, ","),
            Value::Function(closure) => format!(
                "function {}({}) {{ ... }}",
                closure.decl.name,
                closure.decl.params.join(", ")
            ),
            Value::Native(native) => format!("function {}() {{ [native code] }}", native.name()),
            Value::Math => "[object Math]".to_string(),
        }
    }

    /// `===`.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Math, Value::Math) => true,
            _ => false,
        }
    }

    /// `==`, with the coercions between numbers, strings and booleans.
    pub fn loose_equals(&self, other: &Value) -> bool {
        if self.is_nullish() || other.is_nullish() {
            return self.is_nullish() && other.is_nullish();
        }
        if self.is_object() && other.is_object() {
            return self.strict_equals(other);
        }
        if self.is_object() || other.is_object() {
            return self.to_primitive().loose_equals(&other.to_primitive());
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => self.to_number() == other.to_number(),
        }
    }

    fn is_object(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Function(_) | Value::Native(_) | Value::Math
        )
    }

    /// Objects compare and add through their string form.
    pub fn to_primitive(&self) -> Value {
        if self.is_object() {
            Value::str(self.to_display())
        } else {
            self.clone()
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Arrays nested deeper than this render as empty.
const MAX_RENDER_DEPTH: usize = 10_000;

type ArrayCell = RefCell<Vec<Value>>;

/// `array.join(separator)`. Nullish items render empty, and so does an array
/// reached again while it is still being rendered.
pub fn join_items(items: &Rc<ArrayCell>, separator: &str) -> String {
    join_guarded(items, separator, &mut HashSet::new())
}

fn join_guarded(items: &Rc<ArrayCell>, separator: &str, open: &mut HashSet<*const ArrayCell>) -> String {
    let this = Rc::as_ptr(items);
    if open.len() >= MAX_RENDER_DEPTH || !open.insert(this) {
        return String::new();
    }
    let joined = items
        .borrow()
        .iter()
        .map(|item| match item {
            Value::Undefined | Value::Null => String::new(),
            Value::Array(inner) => join_guarded(inner, ",", open),
            other => other.to_display(),
        })
        .join(separator);
    open.remove(&this);
    joined
}

/// `Number(string)`: surrounding whitespace is ignored and the empty string is zero.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Input responses that read as a finite number are delivered as numbers.
pub fn from_input(response: String) -> Value {
    let trimmed = response.trim();
    if !trimmed.is_empty() {
        let n = string_to_number(trimmed);
        if n.is_finite() {
            return Value::Number(n);
        }
    }
    Value::Str(Rc::from(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_print_like_javascript() {
        assert_eq!(number_to_string(5.0), "5");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1e6), "1000000");
    }

    #[test]
    fn display_of_compound_values() {
        let array = Value::array(vec![
            Value::Number(1.0),
            Value::Undefined,
            Value::str("x"),
        ]);
        assert_eq!(array.to_display(), "1,,x");
        assert_eq!(Value::Null.to_display(), "null");
        assert_eq!(Value::Bool(true).to_display(), "true");
    }

    #[test]
    fn arrays_containing_themselves_render_once() {
        let array = Value::array(vec![Value::Number(1.0)]);
        let Value::Array(items) = &array else {
            unreachable!()
        };
        items.borrow_mut().push(array.clone());
        assert_eq!(array.to_display(), "1,");
        assert_eq!(join_items(items, "-"), "1-");
        assert!(array.to_number().is_nan());
        assert!(array.loose_equals(&Value::str("1,")));

        // The same array twice side by side is not a cycle.
        let shared = Value::array(vec![Value::Number(2.0)]);
        let pair = Value::array(vec![shared.clone(), shared]);
        assert_eq!(pair.to_display(), "2,2");

        items.borrow_mut().clear();
    }

    #[test]
    fn truthiness() {
        assert!(!Value::str("").truthy());
        assert!(Value::str("0").truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(Value::array(vec![]).truthy());
        assert!(!Value::Undefined.truthy());
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Number(5.0).loose_equals(&Value::str("5")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(Value::Bool(true).loose_equals(&Value::Number(1.0)));
        assert!(Value::str("").loose_equals(&Value::Number(0.0)));
        assert!(!Value::str("a").loose_equals(&Value::str("b")));
        assert!(!Value::Number(5.0).strict_equals(&Value::str("5")));
    }

    #[test]
    fn string_conversion() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert_eq!(string_to_number("0x1F"), 31.0);
    }

    #[test]
    fn input_responses() {
        assert!(matches!(from_input("42".to_string()), Value::Number(n) if n == 42.0));
        assert!(matches!(from_input("3.5".to_string()), Value::Number(n) if n == 3.5));
        assert!(matches!(from_input("Ada".to_string()), Value::Str(_)));
        assert!(matches!(from_input("".to_string()), Value::Str(_)));
        assert!(matches!(from_input("Infinity".to_string()), Value::Str(_)));
    }
}
