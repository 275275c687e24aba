//! Language front-end seam.
//!
//! `SourceParser` is the extension point for analysing a new language.
//! An implementation turns raw text into a [`SourceUnit`] whose nodes use
//! the shared [`crate::NodeKind`] set.

use std::path::Path;

use crate::error::ParseError;
use crate::tree::SourceUnit;

/// Trait for language-specific parsers.
pub trait SourceParser: Send + Sync {
    /// Language identifier (e.g., `"kotlin"`).
    fn language_id(&self) -> &'static str;

    /// File extensions this parser handles (e.g., `&[".kt", ".kts"]`).
    fn extensions(&self) -> &'static [&'static str];

    /// Parses one source text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the text is not valid for the grammar.
    fn parse(&self, text: &str, file_id: &str) -> Result<SourceUnit, ParseError>;

    /// Returns true if the file's extension is one of [`Self::extensions`].
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.strip_prefix('.') == Some(ext))
            })
    }
}
