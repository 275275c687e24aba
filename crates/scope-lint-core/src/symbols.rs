//! Per-file name binding for the launcher singleton.
//!
//! A [`SymbolTable`] maps simple names to what they denote, as far as the
//! scope analysis cares: the global launcher or something else. It is built
//! in a single pre-pass over imports and local declarations and lives only
//! as long as the analysis of one unit.

use std::collections::HashMap;

use crate::scope::ScopeCatalog;
use crate::tree::{Binding, NodeId, NodeKind, SourceUnit};
use crate::walker::{walk_unit, VisitFlow, Visitor};

/// What a name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// The process-wide launcher singleton.
    GlobalLauncher,
    /// Any other declaration.
    Other,
}

/// A `val`/`var` binding and the region it is visible in.
#[derive(Debug, Clone, Copy)]
struct LocalBinding {
    /// Nearest enclosing function, lambda, class or the root.
    region: NodeId,
    /// Function and lambda bodies only see earlier declarations; class
    /// bodies and the file see all of them.
    ordered: bool,
    declared_at: NodeId,
    symbol: Symbol,
}

/// Name bindings of one source unit.
///
/// Imports and type or function declarations bind names for the whole file.
/// Local declarations bind names inside their enclosing function, lambda or
/// class only; a use site sees the innermost region that declares the name.
/// When several declarations of a name are visible from the same region and
/// disagree, the name resolves to [`Symbol::Other`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    file_bindings: HashMap<String, Symbol>,
    local_bindings: HashMap<String, Vec<LocalBinding>>,
    root: NodeId,
    launcher_path: String,
}

impl SymbolTable {
    /// Builds the table for a unit.
    ///
    /// The launcher's simple name starts out bound to the launcher. Imports
    /// and declarations are then applied in source order, so a later
    /// file-level binding of the same name wins.
    #[must_use]
    pub fn build(unit: &SourceUnit, catalog: &ScopeCatalog) -> Self {
        let mut table = Self {
            file_bindings: HashMap::new(),
            local_bindings: HashMap::new(),
            root: unit.root(),
            launcher_path: catalog.launcher.clone(),
        };
        table
            .file_bindings
            .insert(catalog.launcher_name().to_string(), Symbol::GlobalLauncher);

        let mut pass = BindingPass {
            table: &mut table,
            launcher_name: catalog.launcher_name(),
            launcher_package: catalog.launcher_package(),
        };
        walk_unit(unit, &mut pass);
        tracing::trace!(
            file = unit.file_id(),
            file_bindings = table.file_bindings.len(),
            local_names = table.local_bindings.len(),
            "symbol table built"
        );
        table
    }

    /// Looks up a simple name as seen from the top level of the file.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.local_bindings
            .get(name)
            .and_then(|candidates| merge(candidates.iter().filter(|b| b.region == self.root)))
            .or_else(|| self.file_bindings.get(name).copied())
    }

    /// Looks up a simple name as seen from the node `at`.
    #[must_use]
    pub fn lookup_at(&self, unit: &SourceUnit, name: &str, at: NodeId) -> Option<Symbol> {
        if let Some(candidates) = self.local_bindings.get(name) {
            for region in unit.ancestors(at) {
                let visible = candidates
                    .iter()
                    .filter(|b| b.region == region && (!b.ordered || b.declared_at < at));
                if let Some(symbol) = merge(visible) {
                    return Some(symbol);
                }
            }
        }
        self.file_bindings.get(name).copied()
    }

    /// Resolves an expression given as source text, at file level.
    ///
    /// Whitespace and enclosing parentheses are ignored, and a leading
    /// `this.` is dropped. Simple names go through [`Self::lookup`]; the
    /// launcher's fully qualified path resolves to the launcher. Anything
    /// else is not resolvable and yields `None`.
    #[must_use]
    pub fn resolve_expression(&self, text: &str) -> Option<Symbol> {
        self.resolve_with(text, |name| self.lookup(name))
    }

    /// Resolves the expression spanned by a node, with the names visible
    /// at that node.
    #[must_use]
    pub fn resolve_node(&self, unit: &SourceUnit, id: NodeId) -> Option<Symbol> {
        self.resolve_with(unit.text_of(id), |name| self.lookup_at(unit, name, id))
    }

    fn resolve_with(&self, text: &str, lookup: impl Fn(&str) -> Option<Symbol>) -> Option<Symbol> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let mut expr = compact.as_str();
        while let Some(inner) = expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) {
            expr = inner;
        }
        let expr = expr.strip_prefix("this.").unwrap_or(expr);

        if expr == self.launcher_path {
            Some(Symbol::GlobalLauncher)
        } else if is_simple_name(expr) {
            lookup(expr.trim_matches('`'))
        } else {
            None
        }
    }

    fn bind(&mut self, name: &str, symbol: Symbol) {
        self.file_bindings.insert(name.to_string(), symbol);
    }

    fn bind_local(&mut self, name: &str, binding: LocalBinding) {
        self.local_bindings
            .entry(name.to_string())
            .or_default()
            .push(binding);
    }
}

/// Agreeing bindings give their symbol; disagreeing ones give `Other`.
fn merge<'b>(bindings: impl Iterator<Item = &'b LocalBinding>) -> Option<Symbol> {
    bindings.map(|b| b.symbol).reduce(|a, b| {
        if a == b {
            a
        } else {
            Symbol::Other
        }
    })
}

/// Region a declaration is visible in, and whether order matters there.
fn region_of(unit: &SourceUnit, id: NodeId) -> (NodeId, bool) {
    for ancestor in unit.ancestors(id) {
        match unit.node(ancestor).kind {
            NodeKind::FunctionDeclaration { .. } | NodeKind::LambdaBody => return (ancestor, true),
            NodeKind::ClassDeclaration { .. } => return (ancestor, false),
            _ => {}
        }
    }
    (unit.root(), false)
}

fn is_simple_name(s: &str) -> bool {
    let s = s.trim_matches('`');
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

struct BindingPass<'t, 'c> {
    table: &'t mut SymbolTable,
    launcher_name: &'c str,
    launcher_package: &'c str,
}

impl BindingPass<'_, '_> {
    fn shadow(&mut self, name: &str) {
        if name == self.launcher_name {
            self.table.bind(name, Symbol::Other);
        }
    }
}

impl Visitor for BindingPass<'_, '_> {
    fn enter_import(&mut self, unit: &SourceUnit, id: NodeId) -> VisitFlow {
        if let NodeKind::ImportDeclaration {
            path,
            alias,
            wildcard,
        } = &unit.node(id).kind
        {
            if *wildcard {
                if path == self.launcher_package {
                    self.table.bind(self.launcher_name, Symbol::GlobalLauncher);
                }
            } else {
                let name = alias
                    .as_deref()
                    .unwrap_or_else(|| path.rsplit('.').next().unwrap_or(path.as_str()));
                let symbol = if *path == self.table.launcher_path {
                    Symbol::GlobalLauncher
                } else {
                    Symbol::Other
                };
                self.table.bind(name, symbol);
            }
        }
        VisitFlow::SkipChildren
    }

    fn enter_class(&mut self, unit: &SourceUnit, id: NodeId) -> VisitFlow {
        if let NodeKind::ClassDeclaration { name, .. } = &unit.node(id).kind {
            self.shadow(name);
        }
        VisitFlow::Continue
    }

    fn enter_function(&mut self, unit: &SourceUnit, id: NodeId) -> VisitFlow {
        if let NodeKind::FunctionDeclaration { name } = &unit.node(id).kind {
            self.shadow(name);
        }
        VisitFlow::Continue
    }

    fn enter_identifier(&mut self, unit: &SourceUnit, id: NodeId) -> VisitFlow {
        if let NodeKind::Identifier {
            name,
            binding: Binding::Declares { initializer },
        } = &unit.node(id).kind
        {
            let symbol = match initializer.and_then(|init| self.table.resolve_node(unit, init)) {
                Some(Symbol::GlobalLauncher) => Symbol::GlobalLauncher,
                _ => Symbol::Other,
            };
            let (region, ordered) = region_of(unit, id);
            self.table.bind_local(
                name,
                LocalBinding {
                    region,
                    ordered,
                    declared_at: id,
                    symbol,
                },
            );
        }
        VisitFlow::Continue
    }
}
