//! Comment-based allow directives.
//!
//! Supports directives like:
//! ```text
//! // scope-lint: allow(GlobalScopeUsage) reason="process-wide telemetry flush"
//! ```
//!
//! A directive applies to findings on its own line and on the line below.
//! `allow(all)` covers every rule. Only real line comments count: a `//`
//! inside a string, char literal or block comment is not a directive.
//! Strings are tracked lexically, so a quote inside a `${...}` template
//! expression is taken as closing the string.

use std::collections::{HashMap, HashSet};

const DIRECTIVE_PREFIX: &str = "scope-lint:";

/// Result of checking for an allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowDirective {
    /// Rule ids that are allowed.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

impl AllowDirective {
    fn covers(&self, rule_id: &str) -> bool {
        self.rules.contains(rule_id) || self.rules.contains("all")
    }
}

/// All directives of one source text, indexed by 1-based line.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    by_line: HashMap<usize, AllowDirective>,
}

impl Suppressions {
    /// Scans a source text for directives.
    #[must_use]
    pub fn scan(text: &str) -> Self {
        let mut state = Lexical::Code;
        let by_line = text
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let start = comment_start(line, &mut state)?;
                parse_comment(&line[start..]).map(|d| (i + 1, d))
            })
            .collect();
        Self { by_line }
    }

    /// Returns true if no directive was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }

    /// Checks whether `rule_id` is allowed at `line`.
    #[must_use]
    pub fn check(&self, line: usize, rule_id: &str) -> AllowCheck {
        for check_line in [line.saturating_sub(1), line] {
            if let Some(directive) = self.by_line.get(&check_line) {
                if directive.covers(rule_id) {
                    return AllowCheck::Allowed {
                        reason: directive.reason.clone(),
                    };
                }
            }
        }
        AllowCheck::Denied
    }
}

/// Where the scanner stands at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexical {
    Code,
    Str,
    RawStr,
    Block,
}

/// Byte offset of the `//` that opens a line comment on `line`.
///
/// `state` carries raw strings and block comments over to the next line.
fn comment_start(line: &str, state: &mut Lexical) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &bytes[i..];
        match *state {
            Lexical::Code => match bytes[i] {
                b'/' if rest.starts_with(b"//") => return Some(i),
                b'/' if rest.starts_with(b"/*") => {
                    *state = Lexical::Block;
                    i += 1;
                }
                b'"' if rest.starts_with(b"\"\"\"") => {
                    *state = Lexical::RawStr;
                    i += 2;
                }
                b'"' => *state = Lexical::Str,
                b'\'' => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != b'\'' {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                _ => {}
            },
            Lexical::Str => match bytes[i] {
                b'\\' => i += 1,
                b'"' => *state = Lexical::Code,
                _ => {}
            },
            Lexical::RawStr => {
                if rest.starts_with(b"\"\"\"") {
                    *state = Lexical::Code;
                    i += 2;
                }
            }
            Lexical::Block => {
                if rest.starts_with(b"*/") {
                    *state = Lexical::Code;
                    i += 1;
                }
            }
        }
        i += 1;
    }
    // Plain strings cannot span lines.
    if *state == Lexical::Str {
        *state = Lexical::Code;
    }
    None
}

/// Parses a directive from a source line.
///
/// The directive may follow code on the same line.
#[must_use]
pub fn parse_allow_directive(line: &str) -> Option<AllowDirective> {
    let start = comment_start(line, &mut Lexical::Code)?;
    parse_comment(&line[start..])
}

fn parse_comment(comment: &str) -> Option<AllowDirective> {
    let comment = comment.trim_start_matches('/').trim();

    let directive = comment.strip_prefix(DIRECTIVE_PREFIX)?.trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest
        .strip_prefix("reason=")
        .map(str::trim)
        .and_then(|r| r.strip_prefix('"'))
        .and_then(|r| r.find('"').map(|end| r[..end].to_string()));

    Some(AllowDirective { rules, reason })
}
