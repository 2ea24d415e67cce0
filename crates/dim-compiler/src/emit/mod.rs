//! C text emitter.
//!
//! [`CEmitter`] accumulates generated C one line at a time, indenting by
//! four spaces per open brace. Expression text is built as plain strings by
//! the expression compiler; only statements go through the emitter.
//!
//! # Example
//!
//! ```
//! use dim_compiler::emit::CEmitter;
//!
//! let mut out = CEmitter::new();
//! out.line("if (x)");
//! out.open();
//! out.line("gc_force;");
//! out.close();
//! assert_eq!(out.finish(), "if (x)\n{\n    gc_force;\n}\n");
//! ```

mod naming;

pub use naming::{escape_string, fn_pointer_cast, method_symbol, signature, strip_parens};

/// Line-oriented C writer.
#[derive(Debug, Default)]
pub struct CEmitter {
    out: String,
    indent: usize,
}

impl CEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str("    ");
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `{` and indent.
    pub fn open(&mut self) {
        self.line("{");
        self.indent += 1;
    }

    /// Dedent and `}`.
    pub fn close(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    /// Dedent and `}` followed by a suffix such as `;`.
    pub fn close_with(&mut self, suffix: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(format!("}}{suffix}"));
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// An empty writer at the same indentation, for text that is lowered
    /// before the lines that must precede it.
    pub fn nested(&self) -> Self {
        Self { out: String::new(), indent: self.indent }
    }

    pub fn append(&mut self, other: CEmitter) {
        self.out.push_str(&other.out);
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}
