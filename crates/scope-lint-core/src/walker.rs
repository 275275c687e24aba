//! Depth-first tree traversal.
//!
//! [`walk`] visits nodes in pre-order, children left to right, so visitors
//! observe nodes in source order. The walker keeps no analysis state; it
//! only drives a [`Visitor`].

use crate::tree::{NodeId, NodeKind, SourceUnit};

/// What the walker should do after entering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitFlow {
    /// Descend into the node's children.
    #[default]
    Continue,
    /// Skip the node's children; the walk carries on with its siblings.
    SkipChildren,
}

/// Callbacks invoked by [`walk`].
///
/// The default [`Visitor::enter`] dispatches on the node kind to the
/// `enter_*` hooks, so most visitors only override the hooks they need.
pub trait Visitor {
    /// Called before a node's children are visited.
    fn enter(&mut self, unit: &SourceUnit, id: NodeId) -> VisitFlow {
        match &unit.node(id).kind {
            NodeKind::CallExpression { .. } => self.enter_call(unit, id),
            NodeKind::LambdaBody => self.enter_lambda(unit, id),
            NodeKind::ClassDeclaration { .. } => self.enter_class(unit, id),
            NodeKind::FunctionDeclaration { .. } => self.enter_function(unit, id),
            NodeKind::ImportDeclaration { .. } => self.enter_import(unit, id),
            NodeKind::Identifier { .. } => self.enter_identifier(unit, id),
            NodeKind::ReceiverExpression | NodeKind::Other { .. } => VisitFlow::Continue,
        }
    }

    /// Called after a node's children were visited, or right after
    /// [`Visitor::enter`] returned [`VisitFlow::SkipChildren`].
    fn exit(&mut self, _unit: &SourceUnit, _id: NodeId) {}

    /// Call expression hook.
    fn enter_call(&mut self, _unit: &SourceUnit, _id: NodeId) -> VisitFlow {
        VisitFlow::Continue
    }

    /// Lambda body hook.
    fn enter_lambda(&mut self, _unit: &SourceUnit, _id: NodeId) -> VisitFlow {
        VisitFlow::Continue
    }

    /// Class or object declaration hook.
    fn enter_class(&mut self, _unit: &SourceUnit, _id: NodeId) -> VisitFlow {
        VisitFlow::Continue
    }

    /// Function declaration hook.
    fn enter_function(&mut self, _unit: &SourceUnit, _id: NodeId) -> VisitFlow {
        VisitFlow::Continue
    }

    /// Import declaration hook.
    fn enter_import(&mut self, _unit: &SourceUnit, _id: NodeId) -> VisitFlow {
        VisitFlow::Continue
    }

    /// Identifier hook.
    fn enter_identifier(&mut self, _unit: &SourceUnit, _id: NodeId) -> VisitFlow {
        VisitFlow::Continue
    }
}

enum Step {
    Enter(NodeId),
    Exit(NodeId),
}

/// Walks the subtree rooted at `start`.
///
/// Iterative, so deeply nested sources cannot overflow the call stack.
pub fn walk<V: Visitor + ?Sized>(unit: &SourceUnit, start: NodeId, visitor: &mut V) {
    let mut stack = vec![Step::Enter(start)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                let flow = visitor.enter(unit, id);
                stack.push(Step::Exit(id));
                if flow == VisitFlow::Continue {
                    stack.extend(unit.children(id).iter().rev().map(|&c| Step::Enter(c)));
                }
            }
            Step::Exit(id) => visitor.exit(unit, id),
        }
    }
}

/// Walks the whole unit from its root.
pub fn walk_unit<V: Visitor + ?Sized>(unit: &SourceUnit, visitor: &mut V) {
    walk(unit, unit.root(), visitor);
}
