//! Arena-backed syntax tree.
//!
//! A [`SourceUnit`] owns every [`Node`] of one parsed file in a flat vector.
//! Nodes refer to each other by [`NodeId`] index: children lists point down,
//! the `parent` link points up and is used for navigation only. Front ends
//! build units through [`TreeBuilder`], pushing nodes in pre-order so that
//! arena order equals source order.

use crate::types::Span;

/// Index of a node inside its [`SourceUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// How an identifier participates in name binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// A use of a name.
    Reference,
    /// A local `val`/`var` introducing the name.
    Declares {
        /// Expression the name is initialised with, if any.
        initializer: Option<NodeId>,
    },
}

/// Closed set of node kinds, each with the facts the analysis needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `receiver.callee(args) { lambda }` or `callee(args)`.
    CallExpression {
        /// Simple name of the called function.
        callee: String,
        /// The [`NodeKind::ReceiverExpression`] child for member calls.
        receiver: Option<NodeId>,
        /// The [`NodeKind::LambdaBody`] passed as trailing lambda.
        trailing_lambda: Option<NodeId>,
    },
    /// Body of a lambda literal.
    LambdaBody,
    /// Class or object declaration.
    ClassDeclaration {
        /// Declared name.
        name: String,
        /// Simple names of the declared supertypes, type arguments stripped.
        supertypes: Vec<String>,
    },
    /// Function declaration.
    FunctionDeclaration {
        /// Declared name.
        name: String,
    },
    /// `import a.b.C`, `import a.b.C as D` or `import a.b.*`.
    ImportDeclaration {
        /// Dotted path without the trailing `.*`.
        path: String,
        /// Name introduced by `as`.
        alias: Option<String>,
        /// True for star imports.
        wildcard: bool,
    },
    /// A simple name.
    Identifier {
        /// The name text.
        name: String,
        /// Declaration or use.
        binding: Binding,
    },
    /// Expression a member call is made on.
    ReceiverExpression,
    /// Anything else; the grammar kind is kept for diagnostics.
    Other {
        /// Front-end specific node kind.
        grammar: String,
    },
}

impl NodeKind {
    /// Stable kebab-case tag of the kind.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CallExpression { .. } => "call-expression",
            Self::LambdaBody => "lambda-body",
            Self::ClassDeclaration { .. } => "class-declaration",
            Self::FunctionDeclaration { .. } => "function-declaration",
            Self::ImportDeclaration { .. } => "import-declaration",
            Self::Identifier { .. } => "identifier",
            Self::ReceiverExpression => "receiver-expression",
            Self::Other { .. } => "other",
        }
    }

    /// The declared, called or referenced name, where the kind has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::CallExpression { callee, .. } => Some(callee),
            Self::ClassDeclaration { name, .. }
            | Self::FunctionDeclaration { name }
            | Self::Identifier { name, .. } => Some(name),
            Self::ImportDeclaration { path, alias, .. } => {
                alias.as_deref().or_else(|| path.rsplit('.').next())
            }
            Self::LambdaBody | Self::ReceiverExpression | Self::Other { .. } => None,
        }
    }
}

/// One element of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Kind tag plus per-kind facts.
    pub kind: NodeKind,
    /// Source span.
    pub span: Span,
    /// Enclosing node; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Children in source order.
    pub children: Vec<NodeId>,
}

/// The parsed form of one input file or snippet.
///
/// Immutable once built and safe to share read-only across threads.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    file_id: String,
    text: String,
    nodes: Vec<Node>,
}

impl SourceUnit {
    /// Identifier of the file this unit was parsed from.
    #[must_use]
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Raw source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a unit has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Returns the node for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this unit.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// All nodes in arena (pre-order) order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Source text covered by a node.
    #[must_use]
    pub fn text_of(&self, id: NodeId) -> &str {
        self.get(id)
            .and_then(|n| self.text.get(n.span.start_byte..n.span.end_byte))
            .unwrap_or("")
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of a node in source order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Strict ancestors of a node, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            unit: self,
            next: self.parent(id),
        }
    }

    /// Returns true if `ancestor` strictly encloses `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    unit: &'a SourceUnit,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.unit.parent(current);
        Some(current)
    }
}

/// Incrementally builds a [`SourceUnit`].
///
/// The first pushed node becomes the root. Every later node must name a
/// parent that was pushed before it.
#[derive(Debug)]
pub struct TreeBuilder {
    file_id: String,
    text: String,
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Starts a tree for the given file.
    #[must_use]
    pub fn new(file_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            text: text.into(),
            nodes: Vec::new(),
        }
    }

    /// Appends a node as the last child of `parent`.
    pub fn push(&mut self, parent: Option<NodeId>, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        debug_assert!(
            parent.is_some() || self.nodes.is_empty(),
            "only the root may lack a parent"
        );
        if let Some(parent_node) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            parent_node.children.push(id);
        }
        self.nodes.push(Node {
            kind,
            span,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Looks up a node pushed earlier.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Mutable access to a node's kind, for facts only known after its
    /// children were built.
    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id.0).map(|n| &mut n.kind)
    }

    /// Source text the tree is being built for.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Freezes the tree.
    #[must_use]
    pub fn finish(mut self) -> SourceUnit {
        if self.nodes.is_empty() {
            let span = Span::new(0, self.text.len(), (1, 1), (1, 1));
            self.push(
                None,
                NodeKind::Other {
                    grammar: "source_file".to_string(),
                },
                span,
            );
        }
        SourceUnit {
            file_id: self.file_id,
            text: self.text,
            nodes: self.nodes,
        }
    }
}
