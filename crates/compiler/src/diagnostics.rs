//! Diagnostic engine.
//!
//! A single [`DiagnosticEngine`] is threaded through every compiler stage.
//! Stages only ever append to it; none of them read it back to make a
//! decision. The pipeline driver (`lib.rs`) checks [`DiagnosticEngine::had_errors`]
//! between stages to decide whether to run the next one.

use crate::span::SourceSpan;
use std::fmt;

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Taxonomy of diagnostic kinds, per the error-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    LexError,
    ParseError,
    NameError,
    TypeError,
    FlowError,
    InternalError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::LexError => "lex",
            DiagnosticKind::ParseError => "parse",
            DiagnosticKind::NameError => "name",
            DiagnosticKind::TypeError => "type",
            DiagnosticKind::FlowError => "flow",
            DiagnosticKind::InternalError => "internal",
        };
        write!(f, "{s}")
    }
}

/// A single reported diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: SourceSpan,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] at offset {}: {}",
            self.severity, self.kind, self.span.offset, self.message
        )
    }
}

/// Append-only diagnostic sink shared by every pipeline stage.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    had_errors: bool,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        DiagnosticEngine::default()
    }

    pub fn error(&mut self, kind: DiagnosticKind, span: SourceSpan, message: impl Into<String>) {
        self.had_errors = true;
        self.diagnostics.push(Diagnostic {
            span,
            severity: Severity::Error,
            kind,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, kind: DiagnosticKind, span: SourceSpan, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            span,
            severity: Severity::Warning,
            kind,
            message: message.into(),
        });
    }

    pub fn had_errors(&self) -> bool {
        self.had_errors
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clean() {
        let engine = DiagnosticEngine::new();
        assert!(!engine.had_errors());
        assert_eq!(engine.diagnostics().len(), 0);
    }

    #[test]
    fn warning_does_not_set_had_errors() {
        let mut engine = DiagnosticEngine::new();
        engine.warning(DiagnosticKind::ParseError, SourceSpan::at(0), "heads up");
        assert!(!engine.had_errors());
        assert_eq!(engine.diagnostics().len(), 1);
    }

    #[test]
    fn error_sets_had_errors_and_counts() {
        let mut engine = DiagnosticEngine::new();
        engine.error(DiagnosticKind::NameError, SourceSpan::at(3), "undefined 'z'");
        engine.error(DiagnosticKind::TypeError, SourceSpan::at(9), "mismatch");
        assert!(engine.had_errors());
        assert_eq!(engine.error_count(), 2);
    }
}
