//! Integration test: the engine driven by a non-Kotlin front end.
//!
//! A toy block language (`recv.op { ... }` and `op { ... }`) is parsed into a
//! `SourceUnit` through the public `TreeBuilder`, then classified and linted
//! with a custom catalog and rule, so nothing here depends on tree-sitter.

use scope_lint_core::{
    walk_unit, Analyzer, Binding, Config, Finding, FindingCollector, NodeId, NodeKind, OwnerKind,
    ParseError, Rule, RuleConfig, ScopeCatalog, ScopeClassifier, ScopeContext, Severity,
    SourceInput, SourceParser, SourceUnit, Span, TreeBuilder, VisitFlow, Visitor,
};

// ── Toy front end ──

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tok {
    Word,
    Dot,
    Open,
    Close,
}

fn tokenize(text: &str) -> Vec<(Tok, usize, usize)> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'.' => {
                tokens.push((Tok::Dot, i, i + 1));
                i += 1;
            }
            b'{' => {
                tokens.push((Tok::Open, i, i + 1));
                i += 1;
            }
            b'}' => {
                tokens.push((Tok::Close, i, i + 1));
                i += 1;
            }
            c if c.is_ascii_alphanumeric() => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push((Tok::Word, start, i));
            }
            _ => i += 1,
        }
    }
    tokens
}

fn position(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map_or(0, |nl| nl + 1) + 1;
    (line, column)
}

fn span(text: &str, start: usize, end: usize) -> Span {
    Span::new(start, end, position(text, start), position(text, end))
}

struct Blocks<'t> {
    text: &'t str,
    file_id: &'t str,
    tokens: Vec<(Tok, usize, usize)>,
    builder: TreeBuilder,
}

impl Blocks<'_> {
    fn error(&self, at: usize, reason: &str) -> ParseError {
        let offset = self.tokens.get(at).map_or(self.text.len(), |t| t.1);
        ParseError::new(self.file_id, reason, span(self.text, offset, offset))
    }

    fn expect(&self, at: usize, tok: Tok, reason: &str) -> Result<(usize, usize), ParseError> {
        match self.tokens.get(at) {
            Some(&(found, start, end)) if found == tok => Ok((start, end)),
            _ => Err(self.error(at, reason)),
        }
    }

    fn closing(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, (tok, ..)) in self.tokens.iter().enumerate().skip(open) {
            match tok {
                Tok::Open => depth += 1,
                Tok::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn word(&self, range: (usize, usize)) -> String {
        self.text[range.0..range.1].to_string()
    }

    fn statement(&mut self, at: usize, parent: NodeId) -> Result<usize, ParseError> {
        let first = self.expect(at, Tok::Word, "expected a name")?;
        let (receiver, callee, open) = if self.tokens.get(at + 1).map(|t| t.0) == Some(Tok::Dot) {
            let callee = self.expect(at + 2, Tok::Word, "expected a callee")?;
            (Some(first), callee, at + 3)
        } else {
            (None, first, at + 1)
        };
        let open_range = self.expect(open, Tok::Open, "expected `{`")?;
        let close = self
            .closing(open)
            .ok_or_else(|| self.error(open, "unclosed block"))?;
        let close_end = self.tokens[close].2;

        let text = self.text;
        let callee_name = self.word(callee);
        let call = self.builder.push(
            Some(parent),
            NodeKind::CallExpression {
                callee: callee_name.clone(),
                receiver: None,
                trailing_lambda: None,
            },
            span(text, first.0, close_end),
        );
        let mut receiver_id = None;
        if let Some(r) = receiver {
            let name = self.word(r);
            let id = self
                .builder
                .push(Some(call), NodeKind::ReceiverExpression, span(text, r.0, r.1));
            self.builder.push(
                Some(id),
                NodeKind::Identifier {
                    name,
                    binding: Binding::Reference,
                },
                span(text, r.0, r.1),
            );
            receiver_id = Some(id);
        }
        self.builder.push(
            Some(call),
            NodeKind::Identifier {
                name: callee_name,
                binding: Binding::Reference,
            },
            span(text, callee.0, callee.1),
        );
        let lambda = self.builder.push(
            Some(call),
            NodeKind::LambdaBody,
            span(text, open_range.0, close_end),
        );

        let mut inner = open + 1;
        while inner < close {
            inner = self.statement(inner, lambda)?;
        }

        if let Some(NodeKind::CallExpression {
            receiver,
            trailing_lambda,
            ..
        }) = self.builder.kind_mut(call)
        {
            *receiver = receiver_id;
            *trailing_lambda = Some(lambda);
        }
        Ok(close + 1)
    }
}

struct BlockParser;

impl SourceParser for BlockParser {
    fn language_id(&self) -> &'static str {
        "blocks"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".blk"]
    }

    fn parse(&self, text: &str, file_id: &str) -> Result<SourceUnit, ParseError> {
        let mut blocks = Blocks {
            text,
            file_id,
            tokens: tokenize(text),
            builder: TreeBuilder::new(file_id, text),
        };
        let root = blocks.builder.push(
            None,
            NodeKind::Other {
                grammar: "file".to_string(),
            },
            span(text, 0, text.len()),
        );
        let mut at = 0;
        while at < blocks.tokens.len() {
            at = blocks.statement(at, root)?;
        }
        Ok(blocks.builder.finish())
    }
}

// ── Custom catalog and rule ──

fn pool_catalog() -> ScopeCatalog {
    ScopeCatalog {
        launcher: "com.example.Background".to_string(),
        launch_operations: vec!["submit".to_string()],
        scope_openers: vec![("scoped".to_string(), OwnerKind::NestedCoroutineScope)],
        lifecycle_supertypes: Vec::new(),
        lifecycle_receivers: Vec::new(),
    }
}

struct SubmitOnBackground {
    catalog: ScopeCatalog,
}

struct SubmitVisitor<'a> {
    classifier: ScopeClassifier<'a>,
    config: &'a RuleConfig,
    findings: FindingCollector,
}

impl Visitor for SubmitVisitor<'_> {
    fn enter_call(&mut self, unit: &SourceUnit, id: NodeId) -> VisitFlow {
        let node = unit.node(id);
        if let NodeKind::CallExpression { callee, .. } = &node.kind {
            if self.classifier.catalog().is_launch_operation(callee)
                && self.classifier.classify(id).is_unscoped()
            {
                self.findings.push(Finding::new(
                    "SubmitOnBackground",
                    self.config.severity,
                    unit.file_id(),
                    node.span,
                    format!("`{callee}` on the background pool"),
                ));
            }
        }
        VisitFlow::Continue
    }
}

impl Rule for SubmitOnBackground {
    fn id(&self) -> &'static str {
        "SubmitOnBackground"
    }

    fn check(&self, unit: &SourceUnit, config: &RuleConfig) -> Vec<Finding> {
        let mut visitor = SubmitVisitor {
            classifier: ScopeClassifier::new(unit, &self.catalog),
            config,
            findings: FindingCollector::for_unit(unit),
        };
        walk_unit(unit, &mut visitor);
        visitor.findings.finish()
    }
}

fn calls(unit: &SourceUnit) -> Vec<NodeId> {
    unit.nodes()
        .filter(|(_, n)| matches!(n.kind, NodeKind::CallExpression { .. }))
        .map(|(id, _)| id)
        .collect()
}

// ── Tests ──

#[test]
fn classifier_uses_the_custom_catalog() {
    let text = "Background.submit { }\nscoped { submit { } }\nother.submit { }\n";
    let unit = BlockParser.parse(text, "a.blk").expect("toy source parses");
    let catalog = pool_catalog();
    let classifier = ScopeClassifier::new(&unit, &catalog);

    let contexts: Vec<ScopeContext> = calls(&unit)
        .into_iter()
        .map(|c| classifier.classify(c))
        .collect();
    assert_eq!(
        contexts,
        [
            ScopeContext::Unscoped,
            ScopeContext::Unknown,
            ScopeContext::StructuredScope {
                owner: OwnerKind::NestedCoroutineScope
            },
            ScopeContext::Unknown,
        ]
    );
}

#[test]
fn rule_reports_direct_launcher_calls_at_any_depth() {
    let text = "scoped {\n  Background.submit { }\n  submit { }\n}\n";
    let unit = BlockParser.parse(text, "a.blk").expect("toy source parses");
    let rule = SubmitOnBackground {
        catalog: pool_catalog(),
    };

    let found = rule.check(&unit, &RuleConfig::default());
    assert_eq!(found.len(), 1);
    assert_eq!((found[0].line(), found[0].column()), (2, 3));
    assert_eq!(found[0].severity(), Severity::Warning);
}

#[test]
fn allow_directive_applies_to_any_front_end() {
    let text = "// scope-lint: allow(SubmitOnBackground)\nBackground.submit { }\nBackground.submit { }\n";
    let unit = BlockParser.parse(text, "a.blk").expect("toy source parses");
    let rule = SubmitOnBackground {
        catalog: pool_catalog(),
    };

    let lines: Vec<usize> = rule
        .check(&unit, &RuleConfig::default())
        .iter()
        .map(Finding::line)
        .collect();
    assert_eq!(lines, [3]);
}

#[test]
fn analyzer_runs_custom_rule_over_many_units() {
    let config = Config::parse(
        "fail_on = \"warning\"\n\n[rules.SubmitOnBackground]\nseverity = \"error\"\n",
    )
    .expect("config");
    let analyzer = Analyzer::builder()
        .rule(SubmitOnBackground {
            catalog: pool_catalog(),
        })
        .config(config)
        .parallelism(2)
        .build()
        .expect("analyzer");

    let inputs: Vec<SourceInput> = (0..8)
        .map(|i| SourceInput::new(format!("u{i}.blk"), "scoped { submit { } }\nBackground.submit { }\n"))
        .chain([SourceInput::new("broken.blk", "scoped { submit { }\n")])
        .collect();
    let result = analyzer.analyze(&inputs, &BlockParser);

    assert_eq!(result.files_checked, 8);
    assert_eq!(result.findings.len(), 8);
    assert!(result.findings.iter().all(|f| f.line() == 2));
    assert!(result
        .findings
        .windows(2)
        .all(|w| w[0].file() < w[1].file()));
    assert!(result.has_errors());

    assert_eq!(result.parse_errors.len(), 1);
    assert_eq!(result.parse_errors[0].file_id, "broken.blk");
    assert_eq!(result.parse_errors[0].reason, "unclosed block");
}
