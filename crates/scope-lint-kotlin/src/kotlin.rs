//! Kotlin front end using Tree-sitter.
//!
//! Parses with `tree-sitter-kotlin-ng` and lowers the concrete syntax tree
//! into the shared [`SourceUnit`] shape. Lowering keeps only named nodes,
//! drops comments, and normalises call sites so that each source call
//! appears as exactly one [`NodeKind::CallExpression`].

use scope_lint_core::{
    Binding, NodeId, NodeKind, ParseError, SourceParser, SourceUnit, Span, TreeBuilder,
};
use tracing::debug;
use tree_sitter::{Language, Node, Parser};

/// Parses Kotlin sources into [`SourceUnit`]s.
pub struct KotlinParser {
    language: Language,
}

impl KotlinParser {
    /// Creates a new Kotlin parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_kotlin_ng::LANGUAGE.into(),
        }
    }
}

impl Default for KotlinParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for KotlinParser {
    fn language_id(&self) -> &'static str {
        "kotlin"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".kt", ".kts"]
    }

    fn parse(&self, text: &str, file_id: &str) -> Result<SourceUnit, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language).map_err(|e| {
            ParseError::new(
                file_id,
                format!("cannot load Kotlin grammar: {e}"),
                Span::default(),
            )
        })?;

        let tree = parser
            .parse(text, None)
            .ok_or_else(|| ParseError::new(file_id, "parser returned no tree", Span::default()))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(first_error(root, text, file_id));
        }

        let mut lowering = Lowering {
            builder: TreeBuilder::new(file_id, text),
            src: text.as_bytes(),
        };
        lowering.run(root);
        let unit = lowering.builder.finish();
        debug!(file = file_id, nodes = unit.len(), "parsed Kotlin source");
        Ok(unit)
    }
}

/// Parses one Kotlin source text.
///
/// # Errors
///
/// Returns [`ParseError`] at the first syntax error in source order.
pub fn parse(text: &str, file_id: &str) -> Result<SourceUnit, ParseError> {
    KotlinParser::new().parse(text, file_id)
}

fn span_of(node: &Node<'_>) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span::new(
        node.start_byte(),
        node.end_byte(),
        (start.row + 1, start.column + 1),
        (end.row + 1, end.column + 1),
    )
}

fn is_comment(node: &Node<'_>) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !is_comment(c))
        .collect()
}

/// Locates the first `ERROR` or `MISSING` node in source order.
fn first_error(root: Node<'_>, text: &str, file_id: &str) -> ParseError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            return ParseError::new(
                file_id,
                format!("missing `{}`", node.kind()),
                span_of(&node),
            );
        }
        if node.is_error() {
            let snippet: String = node
                .utf8_text(text.as_bytes())
                .unwrap_or("")
                .lines()
                .next()
                .unwrap_or("")
                .trim()
                .chars()
                .take(40)
                .collect();
            let reason = if snippet.is_empty() {
                "syntax error".to_string()
            } else {
                format!("unexpected `{snippet}`")
            };
            return ParseError::new(file_id, reason, span_of(&node));
        }
        let mut cursor = node.walk();
        let broken: Vec<Node<'_>> = node.children(&mut cursor).filter(|c| c.has_error()).collect();
        stack.extend(broken.into_iter().rev());
    }
    ParseError::new(file_id, "syntax error", span_of(&root))
}

/// Splits a `call_expression` into its callee expression and suffixes.
///
/// `f(args) { }` parses as a lambda call whose callee is the argument call;
/// the two are merged so the suffixes read `(args)`, `{ }`.
fn call_parts(node: Node<'_>) -> (Option<Node<'_>>, Vec<Node<'_>>) {
    let mut parts = named_children(node).into_iter();
    let head = parts.next();
    let suffixes: Vec<Node<'_>> = parts.collect();

    if let Some(inner) = head.filter(|h| h.kind() == "call_expression") {
        let lambda_only =
            !suffixes.is_empty() && suffixes.iter().all(|s| s.kind() == "annotated_lambda");
        if lambda_only {
            let (inner_head, mut inner_suffixes) = call_parts(inner);
            if !inner_suffixes.iter().any(|s| s.kind() == "annotated_lambda") {
                inner_suffixes.extend(suffixes);
                return (inner_head, inner_suffixes);
            }
        }
    }
    (head, suffixes)
}

/// Last simple name of a `user_type`, so `a.b.Fragment<T>` gives `Fragment`.
fn user_type_name(node: Node<'_>, src: &[u8]) -> Option<String> {
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "identifier")
        .last()
        .and_then(|c| c.utf8_text(src).ok())
        .map(str::to_owned)
}

fn supertypes(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    for specifiers in named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "delegation_specifiers")
    {
        for specifier in named_children(specifiers) {
            let Some(inner) = named_children(specifier).into_iter().next() else {
                continue;
            };
            let user_type = match inner.kind() {
                "user_type" => Some(inner),
                "constructor_invocation" | "explicit_delegation" => named_children(inner)
                    .into_iter()
                    .find(|c| c.kind() == "user_type"),
                _ => None,
            };
            if let Some(name) = user_type.and_then(|t| user_type_name(t, src)) {
                names.push(name);
            }
        }
    }
    names
}

struct Lowering<'s> {
    builder: TreeBuilder,
    src: &'s [u8],
}

/// Pending lowering work. Children are queued in source order, so popping
/// from a stack pushes arena nodes in pre-order without recursion.
enum Task<'t> {
    Lower {
        node: Node<'t>,
        parent: Option<NodeId>,
    },
    /// Name of a `variable_declaration`.
    Declare { node: Node<'t>, parent: NodeId },
    /// Marks the lambda child starting at `lambda_start` as trailing.
    TrailingLambda { call: NodeId, lambda_start: usize },
    /// Links the declared name to the first child starting at `from`.
    Initializer { property: NodeId, from: usize },
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        node.utf8_text(self.src).unwrap_or("")
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind, node: Node<'_>) -> NodeId {
        self.builder.push(parent, kind, span_of(&node))
    }

    fn other(node: Node<'_>) -> NodeKind {
        NodeKind::Other {
            grammar: node.kind().to_string(),
        }
    }

    fn run<'t>(&mut self, root: Node<'t>) {
        let mut stack = vec![Task::Lower {
            node: root,
            parent: None,
        }];
        let mut queued = Vec::new();
        while let Some(task) = stack.pop() {
            match task {
                Task::Lower { node, parent } => self.lower(node, parent, &mut queued),
                Task::Declare { node, parent } => {
                    let name = self.text(node).to_string();
                    self.push(
                        Some(parent),
                        NodeKind::Identifier {
                            name,
                            binding: Binding::Declares { initializer: None },
                        },
                        node,
                    );
                }
                Task::TrailingLambda { call, lambda_start } => {
                    self.mark_trailing(call, lambda_start);
                }
                Task::Initializer { property, from } => self.link_initializer(property, from),
            }
            stack.extend(queued.drain(..).rev());
        }
    }

    fn lower<'t>(
        &mut self,
        node: Node<'t>,
        parent: Option<NodeId>,
        queue: &mut Vec<Task<'t>>,
    ) {
        match node.kind() {
            "call_expression" => self.lower_call(node, parent, queue),
            "lambda_literal" => {
                let id = self.push(parent, NodeKind::LambdaBody, node);
                queue_children(node, id, None, queue);
            }
            "class_declaration" | "object_declaration" | "companion_object" | "object_literal" => {
                self.lower_class(node, parent, queue);
            }
            "function_declaration" => {
                let name_node = node.child_by_field_name("name");
                let name = name_node.map_or("", |n| self.text(n)).to_string();
                let id = self.push(parent, NodeKind::FunctionDeclaration { name }, node);
                queue_children(node, id, name_node, queue);
            }
            "import" => {
                self.lower_import(node, parent);
            }
            "property_declaration" => self.lower_property(node, parent, queue),
            "variable_declaration" => self.lower_variable(node, parent, queue),
            "identifier" => {
                let name = self.text(node).to_string();
                self.push(
                    parent,
                    NodeKind::Identifier {
                        name,
                        binding: Binding::Reference,
                    },
                    node,
                );
            }
            _ => {
                let id = self.push(parent, Self::other(node), node);
                queue_children(node, id, None, queue);
            }
        }
    }

    fn lower_call<'t>(
        &mut self,
        node: Node<'t>,
        parent: Option<NodeId>,
        queue: &mut Vec<Task<'t>>,
    ) {
        let call = self.push(
            parent,
            NodeKind::CallExpression {
                callee: String::new(),
                receiver: None,
                trailing_lambda: None,
            },
            node,
        );
        let under_call = move |node: Node<'t>| Task::Lower {
            node,
            parent: Some(call),
        };
        let (head, suffixes) = call_parts(node);

        let mut callee = String::new();
        let mut receiver = None;
        match head {
            Some(h) if h.kind() == "identifier" => {
                callee = self.text(h).to_string();
                queue.push(under_call(h));
            }
            Some(h) if h.kind() == "navigation_expression" => {
                let parts = named_children(h);
                if let [target, .., name] = parts.as_slice() {
                    let r = self.push(Some(call), NodeKind::ReceiverExpression, *target);
                    queue.push(Task::Lower {
                        node: *target,
                        parent: Some(r),
                    });
                    receiver = Some(r);
                    if name.kind() == "identifier" {
                        callee = self.text(*name).to_string();
                    }
                    queue.push(under_call(*name));
                } else {
                    queue.push(under_call(h));
                }
            }
            Some(h) => queue.push(under_call(h)),
            None => {}
        }

        let mut lambda_start = None;
        for part in suffixes {
            if part.kind() == "annotated_lambda" {
                for piece in named_children(part) {
                    if piece.kind() == "lambda_literal" {
                        lambda_start = Some(piece.start_byte());
                    }
                    queue.push(under_call(piece));
                }
            } else {
                queue.push(under_call(part));
            }
        }
        if let Some(lambda_start) = lambda_start {
            queue.push(Task::TrailingLambda { call, lambda_start });
        }

        if let Some(NodeKind::CallExpression {
            callee: c,
            receiver: r,
            ..
        }) = self.builder.kind_mut(call)
        {
            *c = callee;
            *r = receiver;
        }
    }

    fn mark_trailing(&mut self, call: NodeId, lambda_start: usize) {
        let lambda = self.builder.get(call).and_then(|n| {
            n.children.iter().copied().find(|&c| {
                self.builder.get(c).is_some_and(|child| {
                    matches!(child.kind, NodeKind::LambdaBody) && child.span.start_byte == lambda_start
                })
            })
        });
        if let Some(NodeKind::CallExpression {
            trailing_lambda, ..
        }) = self.builder.kind_mut(call)
        {
            *trailing_lambda = lambda;
        }
    }

    fn lower_class<'t>(
        &mut self,
        node: Node<'t>,
        parent: Option<NodeId>,
        queue: &mut Vec<Task<'t>>,
    ) {
        let name_node = node.child_by_field_name("name");
        let name = match name_node {
            Some(n) => self.text(n),
            None if node.kind() == "companion_object" => "Companion",
            None => "",
        }
        .to_string();
        let kind = NodeKind::ClassDeclaration {
            name,
            supertypes: supertypes(node, self.src),
        };
        let id = self.push(parent, kind, node);
        queue_children(node, id, name_node, queue);
    }

    fn lower_import(&mut self, node: Node<'_>, parent: Option<NodeId>) {
        let mut path = String::new();
        let mut alias = None;
        let mut wildcard = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "qualified_identifier" => {
                    path = named_children(child)
                        .into_iter()
                        .map(|part| self.text(part))
                        .collect::<Vec<_>>()
                        .join(".");
                }
                "identifier" if child.is_named() => alias = Some(self.text(child).to_string()),
                "*" => wildcard = true,
                _ => {}
            }
        }

        self.push(
            parent,
            NodeKind::ImportDeclaration {
                path,
                alias,
                wildcard,
            },
            node,
        );
    }

    fn lower_variable<'t>(
        &mut self,
        node: Node<'t>,
        parent: Option<NodeId>,
        queue: &mut Vec<Task<'t>>,
    ) {
        let id = self.push(parent, Self::other(node), node);
        let mut named = false;
        for child in named_children(node) {
            if !named && child.kind() == "identifier" {
                named = true;
                queue.push(Task::Declare {
                    node: child,
                    parent: id,
                });
            } else {
                queue.push(Task::Lower {
                    node: child,
                    parent: Some(id),
                });
            }
        }
    }

    /// `val name = init` links the declared identifier to `init`.
    fn lower_property<'t>(
        &mut self,
        node: Node<'t>,
        parent: Option<NodeId>,
        queue: &mut Vec<Task<'t>>,
    ) {
        let id = self.push(parent, Self::other(node), node);
        let mut initializer_from = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if !child.is_named() {
                if child.kind() == "=" && initializer_from.is_none() {
                    initializer_from = Some(child.end_byte());
                }
                continue;
            }
            if is_comment(&child) {
                continue;
            }
            queue.push(Task::Lower {
                node: child,
                parent: Some(id),
            });
        }
        if let Some(from) = initializer_from {
            queue.push(Task::Initializer { property: id, from });
        }
    }

    fn link_initializer(&mut self, property: NodeId, from: usize) {
        let Some(node) = self.builder.get(property) else {
            return;
        };
        let kind_of = |id: NodeId| self.builder.get(id).map(|n| &n.kind);
        let declared = node
            .children
            .iter()
            .copied()
            .find(|&c| {
                matches!(
                    kind_of(c),
                    Some(NodeKind::Other { grammar }) if grammar == "variable_declaration"
                )
            })
            .and_then(|v| self.builder.get(v))
            .and_then(|v| v.children.first().copied())
            .filter(|&d| matches!(kind_of(d), Some(NodeKind::Identifier { .. })));
        let initializer = node
            .children
            .iter()
            .copied()
            .find(|&c| self.builder.get(c).is_some_and(|n| n.span.start_byte >= from));

        if let (Some(declared), Some(initializer)) = (declared, initializer) {
            if let Some(NodeKind::Identifier { binding, .. }) = self.builder.kind_mut(declared) {
                *binding = Binding::Declares {
                    initializer: Some(initializer),
                };
            }
        }
    }
}

fn queue_children<'t>(
    node: Node<'t>,
    parent: NodeId,
    skip: Option<Node<'t>>,
    queue: &mut Vec<Task<'t>>,
) {
    queue.extend(
        named_children(node)
            .into_iter()
            .filter(|&c| Some(c) != skip)
            .map(|node| Task::Lower {
                node,
                parent: Some(parent),
            }),
    );
}
