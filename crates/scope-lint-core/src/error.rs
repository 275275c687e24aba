//! Error types surfaced to the host.

use miette::{Diagnostic, SourceSpan};
use serde::Serialize;
use thiserror::Error;

use crate::types::Span;

/// Source text is not valid for the target grammar.
///
/// Aborts analysis of one unit only; the host keeps going with the rest.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{file_id}:{}:{}: {reason}", .span.line, .span.column)]
pub struct ParseError {
    /// Identifier of the unit that failed.
    pub file_id: String,
    /// What went wrong.
    pub reason: String,
    /// Where it went wrong.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(file_id: impl Into<String>, reason: impl Into<String>, span: Span) -> Self {
        Self {
            file_id: file_id.into(),
            reason: reason.into(),
            span,
        }
    }
}

/// Converts a [`ParseError`] to a miette diagnostic for rich display.
///
/// Attach the unit's text with `miette::Report::with_source_code` to get a
/// labelled snippet.
#[derive(Debug, Error, Diagnostic)]
#[error("failed to parse {file_id}")]
#[diagnostic(code(scope_lint::parse))]
pub struct ParseDiagnostic {
    file_id: String,
    #[label("{reason}")]
    span: SourceSpan,
    reason: String,
}

impl From<&ParseError> for ParseDiagnostic {
    fn from(e: &ParseError) -> Self {
        Self {
            file_id: e.file_id.clone(),
            span: SourceSpan::from((e.span.start_byte, e.span.len())),
            reason: e.reason.clone(),
        }
    }
}

/// Errors that can occur while setting up an analysis run.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Two rules share the same identifier.
    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let e = ParseError::new(
            "src/Main.kt",
            "unexpected `}`",
            Span::new(10, 11, (2, 4), (2, 5)),
        );
        assert_eq!(e.to_string(), "src/Main.kt:2:4: unexpected `}`");
    }

    #[test]
    fn diagnostic_carries_byte_span() {
        let e = ParseError::new("a.kt", "missing `)`", Span::new(3, 5, (1, 4), (1, 6)));
        let d = ParseDiagnostic::from(&e);
        assert_eq!(d.span.offset(), 3);
        assert_eq!(d.span.len(), 2);
    }
}
