//! Line model shared by the validator and the transpiler.

/// Columns a tab contributes to the indentation width.
pub const TAB_WIDTH: usize = 4;

/// One physical line of a source program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    pub raw: &'a str,
    pub trimmed: &'a str,
    /// Leading whitespace width, tabs counted as [`TAB_WIDTH`] columns.
    pub indent: usize,
}

impl<'a> Line<'a> {
    pub fn new(number: usize, raw: &'a str) -> Self {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        Line {
            number,
            raw,
            trimmed: raw.trim(),
            indent: indent_width(raw),
        }
    }

    /// The leading whitespace exactly as written.
    pub fn leading_whitespace(&self) -> &'a str {
        &self.raw[..self.raw.len() - self.raw.trim_start().len()]
    }

    /// Blank lines and `#` comments never take part in block or indentation checks.
    pub fn is_trivial(&self) -> bool {
        self.trimmed.is_empty() || self.trimmed.starts_with('#')
    }
}

pub fn indent_width(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Split a program into numbered lines.
pub fn split_lines(source: &str) -> Vec<Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| Line::new(i + 1, raw))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_lines_from_one() {
        let lines = split_lines("Algorithm A\n  var x = 1\r\nEndAlgorithm");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].trimmed, "var x = 1");
        assert_eq!(lines[1].raw, "  var x = 1");
        assert_eq!(lines[1].indent, 2);
    }

    #[test]
    fn tabs_count_as_four_columns() {
        assert_eq!(indent_width("\t\tprint x"), 8);
        assert_eq!(indent_width(" \tprint x"), 5);
        assert_eq!(Line::new(1, "\tx = 1").leading_whitespace(), "\t");
    }

    #[test]
    fn comments_and_blanks_are_trivial() {
        assert!(Line::new(1, "   ").is_trivial());
        assert!(Line::new(1, "  # note").is_trivial());
        assert!(!Line::new(1, "print 1 # trailing").is_trivial());
    }
}
