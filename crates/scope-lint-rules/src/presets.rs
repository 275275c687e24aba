//! Rule catalog.

use crate::GlobalScopeUsage;
use scope_lint_core::RuleBox;

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![Box::new(GlobalScopeUsage::new())]
}

/// Looks up a rule by id.
#[must_use]
pub fn rule_by_id(id: &str) -> Option<RuleBox> {
    all_rules().into_iter().find(|r| r.id() == id)
}
