//! # scope-lint-rules
//!
//! Built-in lint rules for scope-lint.
//!
//! ## Available Rules
//!
//! | Id | Description |
//! |----|-------------|
//! | `GlobalScopeUsage` | Forbids launching coroutines on `GlobalScope` |
//!
//! ## Usage
//!
//! ```ignore
//! use scope_lint_core::RuleConfig;
//! use scope_lint_rules::evaluate;
//!
//! let unit = scope_lint_kotlin::parse(text, "Main.kt")?;
//! for finding in evaluate(&unit, &RuleConfig::default()) {
//!     println!("{finding}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod global_scope;
mod presets;

pub use global_scope::{evaluate, GlobalScopeUsage, ID as GLOBAL_SCOPE_USAGE};
pub use presets::{all_rules, rule_by_id};

/// Re-export core types for convenience.
pub use scope_lint_core::{Finding, Rule, RuleConfig, Severity};
