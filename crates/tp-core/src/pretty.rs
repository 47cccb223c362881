//! Line-oriented rendering of statement trees as pseudo-code.

use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone)]
pub struct PrettyOptions {
    /// Spaces per nesting level.
    pub indent_size: usize,
    /// Print declared types on `let` lines.
    pub show_types: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent_size: 4,
            show_types: true,
        }
    }
}

/// Rendering state: the options and how many blocks deep the next line is.
pub struct PrettyCtx<'a> {
    pub options: &'a PrettyOptions,
    depth: usize,
}

impl<'a> PrettyCtx<'a> {
    pub fn new(options: &'a PrettyOptions) -> Self {
        Self { options, depth: 0 }
    }

    /// Writes one line at the current depth.
    pub fn writeln(&self, f: &mut Formatter<'_>, line: impl AsRef<str>) -> fmt::Result {
        let width = self.depth * self.options.indent_size;
        writeln!(f, "{:width$}{}", "", line.as_ref())
    }

    /// Runs `body` one block deeper.
    pub fn with_indent<F>(&mut self, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }
}

pub trait PrettyPrintable {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result;
}

struct Rendered<'a, T> {
    value: &'a T,
    options: PrettyOptions,
}

impl<T: PrettyPrintable> Display for Rendered<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.value.fmt_pretty(f, &mut PrettyCtx::new(&self.options))
    }
}

/// `value` rendered with `options` wherever a `Display` is expected.
pub fn pretty<T: PrettyPrintable>(value: &T, options: PrettyOptions) -> impl Display + '_ {
    Rendered { value, options }
}
