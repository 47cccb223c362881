use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DiagnosticLevel {
    #[display("INFO")]
    Info,
    #[display("WARNING")]
    Warning,
    #[display("ERROR")]
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub suggestions: Vec<String>,
    pub source_context: Option<String>,
    pub code: Option<String>,
}

impl Diagnostic {
    fn with_level(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            suggestions: Vec::new(),
            source_context: None,
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, message)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source_context(mut self, context: impl Into<String>) -> Self {
        self.source_context = Some(context.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Render as plain text lines; info diagnostics are dropped unless `verbose_info`.
    pub fn render_plain(&self, verbose_info: bool) -> Option<Vec<String>> {
        if matches!(self.level, DiagnosticLevel::Info) && !verbose_info {
            return None;
        }

        let level = self.level;
        let context = self.source_context.as_deref().unwrap_or("synthesis");

        let header = match self.code.as_ref() {
            Some(code) => format!("[{}] {}: {} ({})", context, level, self.message, code),
            None => format!("[{}] {}: {}", context, level, self.message),
        };

        let mut lines = vec![header];
        for suggestion in &self.suggestions {
            lines.push(format!("  help: {}", suggestion));
        }
        Some(lines)
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }

        if !self.suggestions.is_empty() {
            let hints = self.suggestions.join("; ");
            write!(f, " (hints: {})", hints)?;
        }

        Ok(())
    }
}

/// Diagnostics collected while serving a single request, in the order
/// they were raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticBag {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_error_with_code_and_help() {
        let err = Error::not_reachable("A", "B", 7, 12);
        let lines = err.to_diagnostic().render_plain(false).unwrap();
        assert_eq!(
            lines,
            vec![
                "[synthesis] ERROR: no path from `A` to `B` within 7 levels (12 edges explored) (TP0001)"
                    .to_string(),
                "  help: register a known conversion from `A` to `B`".to_string(),
            ]
        );
    }

    #[test]
    fn info_is_hidden_unless_verbose() {
        let diag = Diagnostic::info("picked strategy");
        assert!(diag.render_plain(false).is_none());
        assert!(diag.render_plain(true).is_some());
    }

    #[test]
    fn bag_keeps_raise_order() {
        let mut bag = DiagnosticBag::new();
        assert!(bag.is_empty());
        bag.push(Diagnostic::warning("skipped field"));
        bag.push(Diagnostic::error("boom"));
        let levels: Vec<_> = bag.iter().map(|diag| diag.level).collect();
        assert_eq!(levels, vec![DiagnosticLevel::Warning, DiagnosticLevel::Error]);
        assert_eq!(bag.len(), 2);
    }
}
