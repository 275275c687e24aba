//! Rule trait for defining lint rules.

use crate::config::RuleConfig;
use crate::tree::SourceUnit;
use crate::types::Finding;

/// A per-unit lint rule.
///
/// Rules receive a parsed [`SourceUnit`] and typically drive a
/// [`crate::Visitor`] over it. All per-analysis state must live inside
/// `check`; the same rule instance is shared by concurrent analyses.
///
/// # Example
///
/// ```ignore
/// use scope_lint_core::{Finding, Rule, RuleConfig, SourceUnit};
///
/// pub struct NoRunBlocking;
///
/// impl Rule for NoRunBlocking {
///     fn id(&self) -> &'static str { "NoRunBlocking" }
///
///     fn check(&self, unit: &SourceUnit, config: &RuleConfig) -> Vec<Finding> {
///         let mut visitor = RunBlockingVisitor::new(unit, config);
///         scope_lint_core::walk_unit(unit, &mut visitor);
///         visitor.finish()
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the rule identifier (e.g., `GlobalScopeUsage`).
    fn id(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the configuration used when the host supplies none.
    fn default_config(&self) -> RuleConfig {
        RuleConfig::default()
    }

    /// Checks a single unit and returns its findings in source order.
    ///
    /// Must return nothing when `config.active_by_default` is false.
    fn check(&self, unit: &SourceUnit, config: &RuleConfig) -> Vec<Finding>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
