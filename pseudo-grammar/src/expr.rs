//! Expression-level rewriting from pseudocode operators to the script dialect.
//!
//! Pseudocode expressions are mostly passed through untouched. The rewriter only
//! swaps word operators (`and`, `or`, `not`, `mod`) and the alternative comparison
//! spellings for their symbolic forms, always leaving string literals alone.

/// Where an expression appears. Inside conditions a lone `=` means equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprContext {
    Value,
    Condition,
}

fn word_replacement(word: &str) -> Option<&'static str> {
    match word.to_ascii_lowercase().as_str() {
        "and" => Some("&&"),
        "or" => Some("||"),
        "not" => Some("!"),
        "mod" => Some("%"),
        "true" => Some("true"),
        "false" => Some("false"),
        _ => None,
    }
}

/// Rewrite a pseudocode expression into the script dialect.
pub fn rewrite(expr: &str, context: ExprContext) -> String {
    let chars: Vec<char> = expr.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '"' || ch == '\'' {
            let end = string_end(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            // member names such as `.length` are never operators
            let after_dot = start > 0 && chars[start - 1] == '.';
            match word_replacement(&word) {
                Some(replacement) if !after_dot => out.push_str(replacement),
                _ => out.push_str(&word),
            }
            continue;
        }

        match ch {
            '<' if chars.get(i + 1) == Some(&'>') => {
                out.push_str("!=");
                i += 2;
                continue;
            }
            '≠' => out.push_str("!="),
            '≤' => out.push_str("<="),
            '≥' => out.push_str(">="),
            '=' if context == ExprContext::Condition => {
                let prev = i.checked_sub(1).map(|p| chars[p]);
                let next = chars.get(i + 1).copied();
                let lone = !matches!(prev, Some('=' | '!' | '<' | '>'))
                    && next != Some('=');
                if lone {
                    out.push_str("==");
                } else {
                    out.push('=');
                }
            }
            _ => out.push(ch),
        }
        i += 1;
    }

    out
}

/// Index one past the closing quote of the literal starting at `start`,
/// or the end of input when the literal is unterminated.
fn string_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// Report unterminated strings and unbalanced brackets.
pub fn check_balanced(expr: &str) -> Result<(), String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut stack = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '"' | '\'' => {
                if !has_closing_quote(&chars, i) {
                    return Err("unterminated string literal".to_string());
                }
                i = string_end(&chars, i);
                continue;
            }
            open @ ('(' | '[') => stack.push(open),
            close @ (')' | ']') => {
                let expected = if close == ')' { '(' } else { '[' };
                if stack.pop() != Some(expected) {
                    return Err(format!("unbalanced '{close}'"));
                }
            }
            _ => {}
        }
        i += 1;
    }

    match stack.pop() {
        Some(open) => Err(format!("unclosed '{open}'")),
        None => Ok(()),
    }
}

fn has_closing_quote(chars: &[char], start: usize) -> bool {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return true,
            _ => i += 1,
        }
    }
    false
}

/// Split a comma separated list, ignoring commas nested in strings or brackets.
pub fn split_top_level(list: &str) -> Vec<String> {
    let chars: Vec<char> = list.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '"' | '\'' => {
                let end = string_end(&chars, i);
                current.extend(&chars[i..end]);
                i = end;
                continue;
            }
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
                i += 1;
                continue;
            }
            _ => {}
        }
        current.push(ch);
        i += 1;
    }

    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_operators_become_symbols() {
        assert_eq!(
            rewrite("a > 1 and not done or x mod 2 = 0", ExprContext::Value),
            "a > 1 && ! done || x % 2 = 0"
        );
    }

    #[test]
    fn lone_equals_is_equality_in_conditions() {
        assert_eq!(rewrite("x = 5", ExprContext::Condition), "x == 5");
        assert_eq!(rewrite("x == 5", ExprContext::Condition), "x == 5");
        assert_eq!(rewrite("x <= 5", ExprContext::Condition), "x <= 5");
        assert_eq!(rewrite("x != 5", ExprContext::Condition), "x != 5");
        assert_eq!(rewrite("x <> 5", ExprContext::Condition), "x != 5");
        assert_eq!(rewrite("x ≥ 5", ExprContext::Condition), "x >= 5");
    }

    #[test]
    fn strings_are_left_alone() {
        assert_eq!(
            rewrite(r#""cats and dogs" + 'x = y'"#, ExprContext::Condition),
            r#""cats and dogs" + 'x = y'"#
        );
    }

    #[test]
    fn member_names_are_not_operators() {
        assert_eq!(rewrite("list.not", ExprContext::Value), "list.not");
        assert_eq!(rewrite("TRUE or False", ExprContext::Value), "true || false");
    }

    #[test]
    fn balance_checks() {
        assert!(check_balanced(r#"f(a[1], "x)")"#).is_ok());
        assert_eq!(
            check_balanced(r#""open"#),
            Err("unterminated string literal".to_string())
        );
        assert_eq!(check_balanced("f(1"), Err("unclosed '('".to_string()));
        assert_eq!(check_balanced("a]"), Err("unbalanced ']'".to_string()));
    }

    #[test]
    fn splits_on_top_level_commas_only() {
        assert_eq!(
            split_top_level(r#""a, b", f(1, 2), x[0]"#),
            vec![r#""a, b""#, "f(1, 2)", "x[0]"]
        );
        assert_eq!(split_top_level("x,"), vec!["x", ""]);
        assert!(split_top_level("  ").is_empty());
    }
}
