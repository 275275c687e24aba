//! # scope-lint-kotlin
//!
//! Tree-sitter based Kotlin front end for scope-lint.
//!
//! Turns Kotlin source text into the language-neutral
//! [`scope_lint_core::SourceUnit`] that rules analyse:
//!
//! - [`KotlinParser`] implements [`scope_lint_core::SourceParser`]
//! - [`parse`] is the one-shot convenience entry point

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod kotlin;

pub use kotlin::{parse, KotlinParser};
