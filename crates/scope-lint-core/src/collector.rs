//! Per-unit finding accumulation.

use tracing::debug;

use crate::suppress::Suppressions;
use crate::tree::SourceUnit;
use crate::types::Finding;

/// Accumulates the findings of one unit.
///
/// Findings come out of [`FindingCollector::finish`] ordered by line and
/// column; findings at the same position keep their discovery order. No
/// deduplication is done.
#[derive(Debug, Default)]
pub struct FindingCollector {
    findings: Vec<Finding>,
    suppressions: Suppressions,
}

impl FindingCollector {
    /// Creates a collector that keeps every finding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collector that honours the allow directives of `unit`.
    #[must_use]
    pub fn for_unit(unit: &SourceUnit) -> Self {
        Self {
            findings: Vec::new(),
            suppressions: Suppressions::scan(unit.text()),
        }
    }

    /// Records a finding unless an allow directive covers it.
    pub fn push(&mut self, finding: Finding) {
        let allow = self.suppressions.check(finding.line(), finding.rule_id());
        if allow.is_allowed() {
            debug!(
                rule = finding.rule_id(),
                file = finding.file(),
                line = finding.line(),
                reason = allow.reason().unwrap_or("none given"),
                "finding suppressed"
            );
            return;
        }
        self.findings.push(finding);
    }

    /// Number of findings recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns the findings in source order.
    #[must_use]
    pub fn finish(mut self) -> Vec<Finding> {
        self.findings
            .sort_by_key(|f| (f.span().line, f.span().column));
        self.findings
    }
}

impl Extend<Finding> for FindingCollector {
    fn extend<I: IntoIterator<Item = Finding>>(&mut self, iter: I) {
        for finding in iter {
            self.push(finding);
        }
    }
}
