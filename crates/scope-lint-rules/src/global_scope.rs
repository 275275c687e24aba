//! Rule to forbid launching coroutines on `GlobalScope`.
//!
//! # Rationale
//!
//! Work launched on `GlobalScope` is not bound to any job. It keeps running
//! after the screen, request or component that started it is gone, and
//! nothing can cancel it through structured means.
//!
//! # Detected Patterns
//!
//! - `GlobalScope.launch { }` and `GlobalScope.async { }`
//! - the same through an import alias, a `val` holding `GlobalScope`, or the
//!   fully qualified `kotlinx.coroutines.GlobalScope`
//!
//! A call made directly on `GlobalScope` is reported even when it sits inside
//! `coroutineScope { }` or a lifecycle owner, because the launcher ignores
//! the enclosing scope.
//!
//! # Allowed Patterns
//!
//! - `launch`/`async` inside `coroutineScope { }` or `supervisorScope { }`
//! - `lifecycleScope.launch { }` and `viewModelScope.launch { }` in lifecycle
//!   owners
//! - any scope the code constructs itself, such as
//!   `CoroutineScope(Dispatchers.Default).launch { }`
//!
//! # Configuration
//!
//! - `active_by_default`: set to `false` to disable the rule
//! - `severity`: `"warning"` (default) or `"error"`
//!
//! # Suppression
//!
//! - `// scope-lint: allow(GlobalScopeUsage) reason="..."` on the call's line
//!   or the line above

use scope_lint_core::{
    walk_unit, Finding, FindingCollector, NodeId, NodeKind, Rule, RuleConfig, ScopeCatalog,
    ScopeClassifier, SourceUnit, VisitFlow, Visitor,
};
use tracing::debug;

/// Rule id for `GlobalScopeUsage`.
pub const ID: &str = "GlobalScopeUsage";

/// Reports coroutines launched on the global scope.
#[derive(Debug, Clone, Default)]
pub struct GlobalScopeUsage {
    catalog: ScopeCatalog,
}

impl GlobalScopeUsage {
    /// Creates the rule with the default catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom catalog of launchers, openers and lifecycle types.
    #[must_use]
    pub fn with_catalog(mut self, catalog: ScopeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &ScopeCatalog {
        &self.catalog
    }
}

impl Rule for GlobalScopeUsage {
    fn id(&self) -> &'static str {
        ID
    }

    fn description(&self) -> &'static str {
        "Forbids launching coroutines on GlobalScope"
    }

    fn check(&self, unit: &SourceUnit, config: &RuleConfig) -> Vec<Finding> {
        if !config.active_by_default {
            return Vec::new();
        }

        let mut visitor = LaunchVisitor {
            classifier: ScopeClassifier::new(unit, &self.catalog),
            config,
            findings: FindingCollector::for_unit(unit),
        };
        walk_unit(unit, &mut visitor);

        let findings = visitor.findings.finish();
        debug!(file = unit.file_id(), count = findings.len(), "{ID} checked");
        findings
    }
}

struct LaunchVisitor<'a> {
    classifier: ScopeClassifier<'a>,
    config: &'a RuleConfig,
    findings: FindingCollector,
}

impl Visitor for LaunchVisitor<'_> {
    fn enter_call(&mut self, unit: &SourceUnit, id: NodeId) -> VisitFlow {
        let node = unit.node(id);
        let NodeKind::CallExpression {
            callee, receiver, ..
        } = &node.kind
        else {
            return VisitFlow::Continue;
        };
        if !self.classifier.catalog().is_launch_operation(callee) {
            return VisitFlow::Continue;
        }

        if self.classifier.classify(id).is_unscoped() {
            let launcher = receiver.map_or_else(
                || self.classifier.catalog().launcher_name().to_string(),
                |r| unit.text_of(r).split_whitespace().collect::<String>(),
            );
            self.findings.push(Finding::new(
                ID,
                self.config.severity,
                unit.file_id(),
                node.span,
                format!(
                    "`{launcher}.{callee}` launches work that outlives every caller; use a structured scope instead"
                ),
            ));
        }
        VisitFlow::Continue
    }
}

/// Checks one unit with [`GlobalScopeUsage`] and the default catalog.
///
/// Returns no findings when `config.active_by_default` is false.
#[must_use]
pub fn evaluate(unit: &SourceUnit, config: &RuleConfig) -> Vec<Finding> {
    GlobalScopeUsage::new().check(unit, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scope_lint_core::Severity;

    fn findings(src: &str) -> Vec<Finding> {
        let unit = scope_lint_kotlin::parse(src, "Test.kt").expect("valid Kotlin");
        evaluate(&unit, &RuleConfig::default())
    }

    #[test]
    fn reports_launch_on_global_scope() {
        let found = findings("fun f() {\n    GlobalScope.launch { }\n}\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id(), ID);
        assert_eq!(found[0].severity(), Severity::Warning);
        assert_eq!((found[0].line(), found[0].column()), (2, 5));
        assert!(found[0].message().starts_with("`GlobalScope.launch`"));
    }

    #[test]
    fn other_calls_on_global_scope_are_ignored() {
        assert!(findings("fun f() {\n    GlobalScope.coroutineContext.cancel()\n}\n").is_empty());
    }

    #[test]
    fn inactive_config_reports_nothing() {
        let unit = scope_lint_kotlin::parse("GlobalScope.launch { }\n", "Test.kt").expect("parse");
        assert!(evaluate(&unit, &RuleConfig::inactive()).is_empty());
    }

    #[test]
    fn custom_catalog_adds_launch_operation() {
        let mut catalog = ScopeCatalog::default();
        catalog.launch_operations.push("produce".to_string());
        let rule = GlobalScopeUsage::new().with_catalog(catalog);
        let unit =
            scope_lint_kotlin::parse("fun f() {\n    GlobalScope.produce { }\n}\n", "Test.kt")
                .expect("parse");
        let found = rule.check(&unit, &RuleConfig::default());
        assert_eq!(found.len(), 1);
        assert!(found[0].message().starts_with("`GlobalScope.produce`"));
    }
}
