//! Core types for findings and results.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Severity level for findings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// Warning that should be addressed.
    #[default]
    #[serde(alias = "warning")]
    Warning,
    /// Error that must be fixed.
    #[serde(alias = "error")]
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source span of a node or finding.
///
/// Byte offsets are half-open (`start_byte..end_byte`). Lines and columns
/// are 1-indexed; columns count bytes within the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first byte.
    pub start_byte: usize,
    /// Byte offset one past the last byte.
    pub end_byte: usize,
    /// Line of the first byte (1-indexed).
    pub line: usize,
    /// Column of the first byte (1-indexed).
    pub column: usize,
    /// Line of the last position (1-indexed).
    pub end_line: usize,
    /// Column one past the last byte (1-indexed).
    pub end_column: usize,
}

impl Span {
    /// Creates a span from byte offsets and 1-indexed start/end positions.
    #[must_use]
    pub fn new(
        start_byte: usize,
        end_byte: usize,
        (line, column): (usize, usize),
        (end_line, end_column): (usize, usize),
    ) -> Self {
        Self {
            start_byte,
            end_byte,
            line,
            column,
            end_line,
            end_column,
        }
    }

    /// Length of the span in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    /// Returns true for a zero-width span.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `other` lies within this span.
    #[must_use]
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }
}

/// One reported rule violation.
///
/// Findings are value objects: every field is fixed at construction.
/// The serialized form is the stable host contract
/// `{ruleId, message, file, line, column, severity}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "FindingRecord")]
pub struct Finding {
    rule_id: String,
    message: String,
    file: String,
    span: Span,
    severity: Severity,
}

impl Finding {
    /// Creates a new finding.
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        file: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            message: message.into(),
            file: file.into(),
            span,
            severity,
        }
    }

    /// Identifier of the rule that produced this finding.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Identifier of the source unit the finding belongs to.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Full source span of the offending construct.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Line (1-indexed).
    #[must_use]
    pub fn line(&self) -> usize {
        self.span.line
    }

    /// Column (1-indexed).
    #[must_use]
    pub fn column(&self) -> usize {
        self.span.column
    }

    /// Severity of this finding.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Formats the finding for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "{} at {}:{}:{}\n  {}: {}\n",
            self.rule_id,
            self.file,
            self.span.line,
            self.span.column,
            self.severity,
            self.message,
        )
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.file,
            self.span.line,
            self.span.column,
            self.severity,
            self.rule_id,
            self.message
        )
    }
}

/// Wire shape of a [`Finding`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FindingRecord {
    rule_id: String,
    message: String,
    file: String,
    line: usize,
    column: usize,
    severity: Severity,
}

impl From<Finding> for FindingRecord {
    fn from(f: Finding) -> Self {
        Self {
            rule_id: f.rule_id,
            message: f.message,
            file: f.file,
            line: f.span.line,
            column: f.span.column,
            severity: f.severity,
        }
    }
}

/// Result of analysing a batch of source units.
#[derive(Debug, Default, Serialize)]
pub struct LintResult {
    /// All findings, ordered by file then position.
    pub findings: Vec<Finding>,
    /// Units that could not be parsed.
    pub parse_errors: Vec<ParseError>,
    /// Number of units parsed and checked.
    pub files_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any error-level findings.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_findings_at(Severity::Error)
    }

    /// Checks if any findings meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_findings_at(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= severity)
    }

    /// Counts findings as `(errors, warnings)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize) {
        let errors = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        (errors, self.findings.len() - errors)
    }

    /// Orders findings by file, then line, then column.
    ///
    /// The sort is stable, so findings at the same position keep their
    /// discovery order.
    pub fn sort(&mut self) {
        self.findings.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.span.line.cmp(&b.span.line))
                .then(a.span.column.cmp(&b.span.column))
        });
        self.parse_errors.sort_by(|a, b| a.file_id.cmp(&b.file_id));
    }

    /// Adds findings and errors from another result.
    pub fn extend(&mut self, other: Self) {
        self.findings.extend(other.findings);
        self.parse_errors.extend(other.parse_errors);
        self.files_checked += other.files_checked;
    }
}
