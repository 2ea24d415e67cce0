//! Source location tracking for error reporting.
//!
//! The parser hands the compiler line numbers only, so a [`Span`] is a line
//! with an optional column. Column `0` means "unknown".

use std::fmt;

/// A source position attached to AST nodes and diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, `0` when unknown).
    pub line: u32,
    /// Column number (1-indexed, `0` when unknown).
    pub col: u32,
}

impl Span {
    /// Create a span from a line and column.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create a span that only knows its line.
    #[inline]
    pub fn line(line: u32) -> Self {
        Self { line, col: 0 }
    }

    /// Whether the position is entirely unknown.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl From<u32> for Span {
    fn from(line: u32) -> Self {
        Span::line(line)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col == 0 {
            write!(f, "line {}", self.line)
        } else {
            write!(f, "line {}:{}", self.line, self.col)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_without_column() {
        assert_eq!(Span::line(12).to_string(), "line 12");
    }

    #[test]
    fn display_with_column() {
        assert_eq!(Span::new(3, 7).to_string(), "line 3:7");
    }

    #[test]
    fn from_line_number() {
        let span: Span = 9.into();
        assert_eq!(span, Span::line(9));
        assert!(!span.is_unknown());
        assert!(Span::default().is_unknown());
    }
}
