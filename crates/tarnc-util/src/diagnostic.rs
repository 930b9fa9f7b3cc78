//! Diagnostic accumulation.
//!
//! The binder/collector/unifier still stop at the first hard
//! [`crate::Error`]-style failure — errors are fatal to the current phase —
//! but a `Handler` is the shared vocabulary anything that *does* want to
//! keep going (the driver, a future language server) accumulates into.

use crate::Span;
use std::cell::RefCell;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
        }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }
}

/// Accumulates diagnostics for a single compilation.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        tracing::debug!(message = %diagnostic.message, level = %diagnostic.level, "diagnostic emitted");
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }

    pub fn diagnostics(&self) -> std::cell::Ref<'_, Vec<Diagnostic>> {
        self.diagnostics.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_errors_false_until_an_error_is_emitted() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        handler.emit(Diagnostic::warning("unused", Span::DUMMY));
        assert!(!handler.has_errors());
        handler.emit(Diagnostic::error("boom", Span::DUMMY));
        assert!(handler.has_errors());
    }

    #[test]
    fn into_diagnostics_preserves_order() {
        let handler = Handler::new();
        handler.emit(Diagnostic::error("first", Span::DUMMY));
        handler.emit(Diagnostic::error("second", Span::DUMMY));
        let diags = handler.into_diagnostics();
        assert_eq!(diags[0].message, "first");
        assert_eq!(diags[1].message, "second");
    }
}
