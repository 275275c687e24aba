//! Structured-concurrency context of call sites.
//!
//! The [`ScopeClassifier`] answers one question for a call expression: which
//! structured owner, if any, does the launched work belong to. It looks at
//! the call's receiver first and then walks strictly upward through the
//! call's ancestors; the nearest recognised construct wins.

use serde::Serialize;
use tracing::trace;

use crate::symbols::{Symbol, SymbolTable};
use crate::tree::{NodeId, NodeKind, SourceUnit};

/// Kind of owner a structured scope is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OwnerKind {
    /// A class with an externally managed lifecycle.
    LifecycleOwner,
    /// A `coroutineScope { }` block.
    NestedCoroutineScope,
    /// A `supervisorScope { }` block.
    SupervisorScope,
}

/// Classification of one call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeContext {
    /// Launched through the global launcher; no owner can cancel the work.
    Unscoped,
    /// Launched inside a structured scope.
    StructuredScope {
        /// What the scope is bound to.
        owner: OwnerKind,
    },
    /// Nothing recognised. Never reported.
    Unknown,
}

impl ScopeContext {
    /// Returns true for the only context that is a violation.
    #[must_use]
    pub fn is_unscoped(self) -> bool {
        self == Self::Unscoped
    }
}

/// Names the classifier recognises.
///
/// The [`Default`] catalog covers `kotlinx.coroutines` and the Android
/// lifecycle types. Hosts may build their own catalog to extend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeCatalog {
    /// Fully qualified path of the launcher singleton.
    pub launcher: String,
    /// Callee names that launch concurrent work.
    pub launch_operations: Vec<String>,
    /// Callee names whose trailing lambda opens a child scope.
    pub scope_openers: Vec<(String, OwnerKind)>,
    /// Supertypes that mark a class as a lifecycle owner.
    pub lifecycle_supertypes: Vec<String>,
    /// Receiver expressions bound to a lifecycle owner's lifetime.
    pub lifecycle_receivers: Vec<String>,
}

impl Default for ScopeCatalog {
    fn default() -> Self {
        fn owned(names: &[&str]) -> Vec<String> {
            names.iter().map(|s| (*s).to_string()).collect()
        }

        Self {
            launcher: "kotlinx.coroutines.GlobalScope".to_string(),
            launch_operations: owned(&["launch", "async"]),
            scope_openers: vec![
                ("coroutineScope".to_string(), OwnerKind::NestedCoroutineScope),
                ("supervisorScope".to_string(), OwnerKind::SupervisorScope),
            ],
            lifecycle_supertypes: owned(&[
                "Fragment",
                "DialogFragment",
                "Activity",
                "AppCompatActivity",
                "ComponentActivity",
                "FragmentActivity",
                "ViewModel",
                "AndroidViewModel",
                "LifecycleOwner",
                "LifecycleService",
            ]),
            lifecycle_receivers: owned(&[
                "lifecycleScope",
                "viewModelScope",
                "viewLifecycleOwner.lifecycleScope",
                "lifecycle.coroutineScope",
            ]),
        }
    }
}

impl ScopeCatalog {
    /// Simple name of the launcher.
    #[must_use]
    pub fn launcher_name(&self) -> &str {
        self.launcher
            .rsplit_once('.')
            .map_or(self.launcher.as_str(), |(_, name)| name)
    }

    /// Package that declares the launcher.
    #[must_use]
    pub fn launcher_package(&self) -> &str {
        self.launcher.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }

    /// Returns true if `callee` launches concurrent work.
    #[must_use]
    pub fn is_launch_operation(&self, callee: &str) -> bool {
        self.launch_operations.iter().any(|op| op == callee)
    }

    /// Owner kind of a scope-opening callee.
    #[must_use]
    pub fn opener_kind(&self, callee: &str) -> Option<OwnerKind> {
        self.scope_openers
            .iter()
            .find(|(name, _)| name == callee)
            .map(|(_, kind)| *kind)
    }

    /// Returns true if `name` is a lifecycle-owner supertype.
    #[must_use]
    pub fn is_lifecycle_supertype(&self, name: &str) -> bool {
        self.lifecycle_supertypes.iter().any(|s| s == name)
    }

    /// Returns true if a receiver expression is bound to a lifecycle owner.
    #[must_use]
    pub fn is_lifecycle_receiver(&self, text: &str) -> bool {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = compact.strip_prefix("this.").unwrap_or(&compact);
        self.lifecycle_receivers.iter().any(|r| r == compact)
    }
}

/// Classifies call sites of one source unit.
///
/// Owns the unit's [`SymbolTable`], so a classifier must not outlive the
/// analysis of its unit.
pub struct ScopeClassifier<'a> {
    unit: &'a SourceUnit,
    catalog: &'a ScopeCatalog,
    symbols: SymbolTable,
}

impl<'a> ScopeClassifier<'a> {
    /// Runs the symbol pre-pass and prepares a classifier for `unit`.
    #[must_use]
    pub fn new(unit: &'a SourceUnit, catalog: &'a ScopeCatalog) -> Self {
        Self {
            unit,
            catalog,
            symbols: SymbolTable::build(unit, catalog),
        }
    }

    /// The unit's name bindings.
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &ScopeCatalog {
        self.catalog
    }

    /// Determines the scope context of a call expression.
    ///
    /// A call made directly off the launcher is [`ScopeContext::Unscoped`]
    /// no matter what encloses it. Otherwise the nearest enclosing
    /// scope-opener lambda or lifecycle-owner class decides. Non-call nodes
    /// and calls with no recognised context are [`ScopeContext::Unknown`].
    #[must_use]
    pub fn classify(&self, call: NodeId) -> ScopeContext {
        let unit = self.unit;
        let Some(NodeKind::CallExpression { receiver, .. }) = unit.get(call).map(|n| &n.kind)
        else {
            return ScopeContext::Unknown;
        };

        if let Some(receiver) = *receiver {
            if self.symbols.resolve_node(unit, receiver) == Some(Symbol::GlobalLauncher) {
                trace!(line = unit.node(call).span.line, "receiver is the launcher");
                return ScopeContext::Unscoped;
            }
        }

        let lifecycle_bound =
            receiver.is_some_and(|r| self.catalog.is_lifecycle_receiver(unit.text_of(r)));

        for ancestor in unit.ancestors(call) {
            match &unit.node(ancestor).kind {
                NodeKind::CallExpression {
                    callee,
                    trailing_lambda: Some(lambda),
                    ..
                } => {
                    if let Some(owner) = self.catalog.opener_kind(callee) {
                        if unit.is_ancestor(*lambda, call) {
                            trace!(%callee, "inside scope opener");
                            return ScopeContext::StructuredScope { owner };
                        }
                    }
                }
                NodeKind::ClassDeclaration { name, supertypes } if lifecycle_bound => {
                    if supertypes
                        .iter()
                        .any(|s| self.catalog.is_lifecycle_supertype(s))
                    {
                        trace!(class = %name, "inside lifecycle owner");
                        return ScopeContext::StructuredScope {
                            owner: OwnerKind::LifecycleOwner,
                        };
                    }
                }
                _ => {}
            }
        }

        ScopeContext::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_support::Sketch;

    fn opener(s: &mut Sketch, parent: NodeId, name: &str) -> NodeId {
        let (_, lambda) = s.member_call(parent, None, name);
        lambda
    }

    fn lifecycle_class(s: &mut Sketch, parent: NodeId) -> NodeId {
        s.node(
            parent,
            NodeKind::ClassDeclaration {
                name: "HomeFragment".into(),
                supertypes: vec!["Fragment".into()],
            },
        )
    }

    #[test]
    fn catalog_names() {
        let c = ScopeCatalog::default();
        assert_eq!(c.launcher_name(), "GlobalScope");
        assert_eq!(c.launcher_package(), "kotlinx.coroutines");
        assert!(c.is_launch_operation("async"));
        assert!(!c.is_launch_operation("runBlocking"));
        assert_eq!(c.opener_kind("supervisorScope"), Some(OwnerKind::SupervisorScope));
        assert!(c.is_lifecycle_receiver("this.viewModelScope"));
        assert!(c.is_lifecycle_receiver("viewLifecycleOwner\n  .lifecycleScope"));
        assert!(!c.is_lifecycle_receiver("GlobalScope"));
    }

    #[test]
    fn launcher_receiver_wins_over_enclosing_opener() {
        let mut s = Sketch::new("GlobalScope");
        let root = s.root();
        let lambda = opener(&mut s, root, "coroutineScope");
        let (call, _) = s.member_call(lambda, Some(("GlobalScope", 0)), "launch");
        let unit = s.finish();
        let catalog = ScopeCatalog::default();
        assert_eq!(
            ScopeClassifier::new(&unit, &catalog).classify(call),
            ScopeContext::Unscoped
        );
    }

    #[test]
    fn receiverless_launch_in_opener_is_structured() {
        let mut s = Sketch::new("");
        let root = s.root();
        let lambda = opener(&mut s, root, "supervisorScope");
        let (call, _) = s.member_call(lambda, None, "async");
        let unit = s.finish();
        let catalog = ScopeCatalog::default();
        assert_eq!(
            ScopeClassifier::new(&unit, &catalog).classify(call),
            ScopeContext::StructuredScope {
                owner: OwnerKind::SupervisorScope
            }
        );
    }

    #[test]
    fn nearest_construct_wins() {
        let mut s = Sketch::new("viewModelScope");
        let root = s.root();
        let outer = opener(&mut s, root, "supervisorScope");
        let inner = opener(&mut s, outer, "coroutineScope");
        let (call, _) = s.member_call(inner, None, "launch");
        let unit = s.finish();
        let catalog = ScopeCatalog::default();
        assert_eq!(
            ScopeClassifier::new(&unit, &catalog).classify(call),
            ScopeContext::StructuredScope {
                owner: OwnerKind::NestedCoroutineScope
            }
        );
    }

    #[test]
    fn opener_argument_position_is_not_a_scope() {
        // coroutineScope(launch {}) { }: the launch is an argument, not
        // inside the trailing lambda.
        let mut s = Sketch::new("");
        let root = s.root();
        let (opener_call, _) = s.member_call(root, None, "coroutineScope");
        let args = s.other(opener_call);
        let (call, _) = s.member_call(args, None, "launch");
        let unit = s.finish();
        let catalog = ScopeCatalog::default();
        assert_eq!(
            ScopeClassifier::new(&unit, &catalog).classify(call),
            ScopeContext::Unknown
        );
    }

    #[test]
    fn lifecycle_receiver_inside_owner_class() {
        let mut s = Sketch::new("viewModelScope");
        let root = s.root();
        let class = lifecycle_class(&mut s, root);
        let body = s.other(class);
        let (call, _) = s.member_call(body, Some(("viewModelScope", 0)), "launch");
        let unit = s.finish();
        let catalog = ScopeCatalog::default();
        assert_eq!(
            ScopeClassifier::new(&unit, &catalog).classify(call),
            ScopeContext::StructuredScope {
                owner: OwnerKind::LifecycleOwner
            }
        );
    }

    #[test]
    fn owner_class_alone_does_not_scope_other_receivers() {
        let mut s = Sketch::new("CoroutineScope(Dispatchers.IO)");
        let root = s.root();
        let class = lifecycle_class(&mut s, root);
        let (call, _) = s.member_call(class, Some(("CoroutineScope(Dispatchers.IO)", 0)), "launch");
        let unit = s.finish();
        let catalog = ScopeCatalog::default();
        assert_eq!(
            ScopeClassifier::new(&unit, &catalog).classify(call),
            ScopeContext::Unknown
        );
    }

    #[test]
    fn non_call_nodes_are_unknown() {
        let mut s = Sketch::new("");
        let root = s.root();
        let other = s.other(root);
        let unit = s.finish();
        let catalog = ScopeCatalog::default();
        let classifier = ScopeClassifier::new(&unit, &catalog);
        assert_eq!(classifier.classify(other), ScopeContext::Unknown);
        assert!(!classifier.classify(other).is_unscoped());
    }
}
