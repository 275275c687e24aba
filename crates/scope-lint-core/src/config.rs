//! Configuration types for scope-lint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::Severity;

/// Top-level configuration for scope-lint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Severity threshold for a failing run (default: "error").
    /// Findings at or above this severity make `check` exit non-zero.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,

    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-rule overrides keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fail_on: default_fail_on(),
            analyzer: AnalyzerConfig::default(),
            rules: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Effective configuration of a rule: its defaults with any override
    /// from this config applied.
    #[must_use]
    pub fn rule_config(&self, rule_id: &str, defaults: RuleConfig) -> RuleConfig {
        self.rules
            .get(rule_id)
            .map_or(defaults, |o| o.apply(defaults))
    }
}

fn default_fail_on() -> Severity {
    Severity::Error
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Glob patterns to exclude from file discovery.
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Maximum number of units analysed in parallel.
    #[serde(default)]
    pub parallelism: Option<usize>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            exclude: default_excludes(),
            respect_gitignore: true,
            parallelism: None,
        }
    }
}

fn default_excludes() -> Vec<String> {
    vec!["**/build/**".to_string(), "**/.gradle/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// Immutable configuration of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Whether the rule runs at all.
    #[serde(default = "default_true", alias = "active", alias = "activeByDefault")]
    pub active_by_default: bool,

    /// Severity of reported findings.
    #[serde(default)]
    pub severity: Severity,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            active_by_default: true,
            severity: Severity::Warning,
        }
    }
}

impl RuleConfig {
    /// An active rule reporting warnings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule that reports nothing.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active_by_default: false,
            ..Self::default()
        }
    }

    /// Same config with another severity.
    #[must_use]
    pub fn with_severity(self, severity: Severity) -> Self {
        Self { severity, ..self }
    }
}

/// Partial rule configuration from a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleOverride {
    /// Overrides [`RuleConfig::active_by_default`].
    #[serde(
        default,
        alias = "active",
        alias = "activeByDefault",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_by_default: Option<bool>,

    /// Overrides [`RuleConfig::severity`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl RuleOverride {
    /// Applies the set fields on top of `base`.
    #[must_use]
    pub fn apply(&self, base: RuleConfig) -> RuleConfig {
        RuleConfig {
            active_by_default: self.active_by_default.unwrap_or(base.active_by_default),
            severity: self.severity.unwrap_or(base.severity),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}
