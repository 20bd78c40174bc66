//! Global functions, `Math`, and the array/string/number methods scripts can call.

use crate::error::Thrown;
use crate::value::{join_items, number_to_string, string_to_number, Native, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Largest array a script may allocate.
pub const MAX_ARRAY_LENGTH: usize = 1_000_000;

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

/// Globals visible to every program, apart from the `print`/`input` parameters.
pub fn globals() -> Vec<(&'static str, Value)> {
    vec![
        ("Math", Value::Math),
        ("parseInt", Value::Native(Native::ParseInt)),
        ("parseFloat", Value::Native(Native::ParseFloat)),
        ("Number", Value::Native(Native::Number)),
        ("String", Value::Native(Native::String)),
        ("Boolean", Value::Native(Native::Boolean)),
        ("Array", Value::Native(Native::Array)),
        ("isNaN", Value::Native(Native::IsNaN)),
        ("NaN", Value::Number(f64::NAN)),
        ("Infinity", Value::Number(f64::INFINITY)),
    ]
}

/// Call a native that does not talk to the host.
pub fn call_native(native: Native, args: Vec<Value>) -> Result<Value, Thrown> {
    let value = match native {
        Native::ParseInt => {
            let radix = args.get(1).map(Value::to_number);
            Value::Number(parse_int(&arg(&args, 0).to_display(), radix))
        }
        Native::ParseFloat => Value::Number(parse_float(&arg(&args, 0).to_display())),
        Native::Number => Value::Number(args.first().map_or(0.0, Value::to_number)),
        Native::String => Value::str(args.first().map(Value::to_display).unwrap_or_default()),
        Native::Boolean => Value::Bool(arg(&args, 0).truthy()),
        Native::Array => return construct_array(args),
        Native::IsNaN => Value::Bool(arg(&args, 0).to_number().is_nan()),
        Native::Print | Native::Input => {
            return Err(Thrown::type_error(format!(
                "{} is not available here",
                native.name()
            )))
        }
    };
    Ok(value)
}

/// `Array(n)` / `new Array(n)` allocate `n` empty slots; other arguments become elements.
pub fn construct_array(args: Vec<Value>) -> Result<Value, Thrown> {
    match args.as_slice() {
        [Value::Number(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || *n > MAX_ARRAY_LENGTH as f64 {
                return Err(Thrown::range_error("Invalid array length"));
            }
            Ok(Value::array(vec![Value::Undefined; *n as usize]))
        }
        _ => Ok(Value::array(args)),
    }
}

pub fn math_constant(name: &str) -> Option<f64> {
    let value = match name {
        "PI" => std::f64::consts::PI,
        "E" => std::f64::consts::E,
        "SQRT2" => std::f64::consts::SQRT_2,
        "LN2" => std::f64::consts::LN_2,
        "LN10" => std::f64::consts::LN_10,
        _ => return None,
    };
    Some(value)
}

/// `Math.<name>(args)`, or `None` when `Math` has no such function.
pub fn math_call(name: &str, args: &[Value]) -> Option<f64> {
    let x = || arg(args, 0).to_number();
    let value = match name {
        "floor" => x().floor(),
        "ceil" => x().ceil(),
        "round" => (x() + 0.5).floor(),
        "trunc" => x().trunc(),
        "abs" => x().abs(),
        "sqrt" => x().sqrt(),
        "sign" => {
            let n = x();
            if n.is_nan() || n == 0.0 {
                n
            } else {
                n.signum()
            }
        }
        "pow" => x().powf(arg(args, 1).to_number()),
        "min" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) }),
        "max" => args
            .iter()
            .map(Value::to_number)
            .fold(f64::NEG_INFINITY, |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) }),
        _ => return None,
    };
    Some(value)
}

/// Resolve a possibly negative `slice`-style index against `len`.
fn relative_index(value: Option<&Value>, len: usize, default: usize) -> usize {
    match value {
        None | Some(Value::Undefined) => default,
        Some(v) => {
            let n = v.to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            if n < 0.0 {
                (len as f64 + n).max(0.0) as usize
            } else {
                (n as usize).min(len)
            }
        }
    }
}

/// Methods on arrays. `None` when there is no such method.
pub fn array_method(
    array: &Rc<RefCell<Vec<Value>>>,
    method: &str,
    args: Vec<Value>,
) -> Option<Result<Value, Thrown>> {
    let result = match method {
        "push" => {
            let mut items = array.borrow_mut();
            if items.len() + args.len() > MAX_ARRAY_LENGTH {
                return Some(Err(Thrown::range_error("Invalid array length")));
            }
            items.extend(args);
            Value::Number(items.len() as f64)
        }
        "pop" => array.borrow_mut().pop().unwrap_or(Value::Undefined),
        "fill" => {
            let mut items = array.borrow_mut();
            let len = items.len();
            let start = relative_index(args.get(1), len, 0);
            let end = relative_index(args.get(2), len, len);
            let value = arg(&args, 0);
            for item in items.iter_mut().take(end).skip(start) {
                *item = value.clone();
            }
            Value::Array(array.clone())
        }
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(sep) => sep.to_display(),
            };
            Value::str(join_items(array, &separator))
        }
        "indexOf" => {
            let needle = arg(&args, 0);
            let position = array
                .borrow()
                .iter()
                .position(|item| item.strict_equals(&needle));
            Value::Number(position.map_or(-1.0, |p| p as f64))
        }
        "includes" => {
            let needle = arg(&args, 0);
            let needle_nan = matches!(needle, Value::Number(n) if n.is_nan());
            let found = array.borrow().iter().any(|item| {
                item.strict_equals(&needle)
                    || (needle_nan && matches!(item, Value::Number(n) if n.is_nan()))
            });
            Value::Bool(found)
        }
        "slice" => {
            let items = array.borrow();
            let len = items.len();
            let start = relative_index(args.first(), len, 0);
            let end = relative_index(args.get(1), len, len);
            let slice = if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            };
            Value::array(slice)
        }
        "reverse" => {
            array.borrow_mut().reverse();
            Value::Array(array.clone())
        }
        "toString" => Value::str(Value::Array(array.clone()).to_display()),
        _ => return None,
    };
    Some(Ok(result))
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Char index of `needle` in `haystack`.
fn char_index_of(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| char_count(&haystack[..byte]))
}

/// Methods on strings. `None` when there is no such method.
pub fn string_method(s: &str, method: &str, args: Vec<Value>) -> Option<Result<Value, Thrown>> {
    let result = match method {
        "toUpperCase" => Value::str(s.to_uppercase()),
        "toLowerCase" => Value::str(s.to_lowercase()),
        "trim" => Value::str(s.trim()),
        "charAt" => {
            let index = arg(&args, 0).to_number();
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            let ch = if index < 0.0 {
                None
            } else {
                s.chars().nth(index as usize)
            };
            Value::str(ch.map(String::from).unwrap_or_default())
        }
        "substring" => {
            let len = char_count(s);
            let clamp = |v: Option<&Value>, default: usize| match v {
                None | Some(Value::Undefined) => default,
                Some(v) => {
                    let n = v.to_number();
                    if n.is_nan() || n < 0.0 {
                        0
                    } else {
                        (n.trunc() as usize).min(len)
                    }
                }
            };
            let a = clamp(args.first(), 0);
            let b = clamp(args.get(1), len);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Value::str(s.chars().skip(start).take(end - start).collect::<String>())
        }
        "indexOf" => {
            let needle = arg(&args, 0).to_display();
            Value::Number(char_index_of(s, &needle).map_or(-1.0, |i| i as f64))
        }
        "includes" => Value::Bool(s.contains(arg(&args, 0).to_display().as_str())),
        "split" => {
            let parts: Vec<Value> = match args.first() {
                None | Some(Value::Undefined) => vec![Value::str(s)],
                Some(separator) => {
                    let separator = separator.to_display();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::str(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::str).collect()
                    }
                }
            };
            Value::array(parts)
        }
        "toString" => Value::str(s),
        _ => return None,
    };
    Some(Ok(result))
}

/// Methods on numbers. `None` when there is no such method.
pub fn number_method(n: f64, method: &str, args: Vec<Value>) -> Option<Result<Value, Thrown>> {
    let result = match method {
        "toFixed" => {
            let digits = match args.first() {
                None | Some(Value::Undefined) => 0.0,
                Some(v) => v.to_number().trunc(),
            };
            if !(0.0..=100.0).contains(&digits) {
                return Some(Err(Thrown::range_error(
                    "toFixed() digits argument must be between 0 and 100",
                )));
            }
            if n.is_finite() {
                Value::str(format!("{:.*}", digits as usize, n))
            } else {
                Value::str(number_to_string(n))
            }
        }
        "toString" => Value::str(number_to_string(n)),
        _ => return None,
    };
    Some(Ok(result))
}

/// `parseInt`: the longest run of digits in `radix` after optional whitespace and sign.
pub fn parse_int(text: &str, radix: Option<f64>) -> f64 {
    let mut rest = text.trim_start();
    let mut sign = 1.0;
    if let Some(stripped) = rest.strip_prefix('-') {
        sign = -1.0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    let explicit = match radix {
        Some(r) if !r.is_nan() && r.trunc() != 0.0 => Some(r.trunc()),
        _ => None,
    };
    let mut radix = match explicit {
        Some(r) if !(2.0..=36.0).contains(&r) => return f64::NAN,
        Some(r) => r as u32,
        None => 10,
    };
    if explicit.is_none() || radix == 16 {
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            rest = hex;
            radix = 16;
        }
    }

    let digits: Vec<u32> = rest.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    sign * digits
        .into_iter()
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d))
}

/// `parseFloat`: the longest numeric prefix after optional whitespace.
pub fn parse_float(text: &str) -> f64 {
    let rest = text.trim_start();
    for infinity in ["Infinity", "+Infinity"] {
        if rest.starts_with(infinity) {
            return f64::INFINITY;
        }
    }
    if rest.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }

    let bytes = rest.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &rest[digits_start..end] == "." {
        return f64::NAN;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    string_to_number(&rest[..end])
}
