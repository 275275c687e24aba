//! # scope-lint-core
//!
//! Language-neutral engine for structured-concurrency linting.
//!
//! This crate provides the foundational types for checking where
//! concurrent work is launched. It includes:
//!
//! - [`SourceUnit`], an arena syntax tree built through [`TreeBuilder`]
//! - [`walk`] and the [`Visitor`] trait for pre-order traversal
//! - [`ScopeClassifier`] for finding the structured owner of a call site
//! - [`Rule`] trait and [`FindingCollector`] for per-unit rules
//! - [`Analyzer`] for running rules over many units in parallel
//!
//! ## Example
//!
//! ```ignore
//! use scope_lint_core::{Analyzer, SourceInput};
//!
//! let analyzer = Analyzer::builder()
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let result = analyzer.analyze(&[SourceInput::new("Main.kt", text)], &parser);
//! for finding in &result.findings {
//!     println!("{finding}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod collector;
mod config;
mod error;
mod frontend;
mod rule;
mod scope;
mod suppress;
mod symbols;
mod tree;
mod types;
mod walker;

pub use analyzer::{Analyzer, AnalyzerBuilder, SourceInput};
pub use collector::FindingCollector;
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig, RuleOverride};
pub use error::{AnalyzerError, ParseDiagnostic, ParseError};
pub use frontend::SourceParser;
pub use rule::{Rule, RuleBox};
pub use scope::{OwnerKind, ScopeCatalog, ScopeClassifier, ScopeContext};
pub use suppress::{parse_allow_directive, AllowCheck, AllowDirective, Suppressions};
pub use symbols::{Symbol, SymbolTable};
pub use tree::{Ancestors, Binding, Node, NodeId, NodeKind, SourceUnit, TreeBuilder};
pub use types::{Finding, LintResult, Severity, Span};
pub use walker::{walk, walk_unit, VisitFlow, Visitor};
