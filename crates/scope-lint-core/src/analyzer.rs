//! Core analyzer for orchestrating lint execution.

use std::collections::HashSet;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use crate::collector::FindingCollector;
use crate::config::{Config, RuleConfig};
use crate::error::{AnalyzerError, ParseError};
use crate::frontend::SourceParser;
use crate::rule::{Rule, RuleBox};
use crate::tree::SourceUnit;
use crate::types::{Finding, LintResult};

/// One input handed to [`Analyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    /// Identifier reported in findings, usually a relative path.
    pub file_id: String,
    /// Source text.
    pub text: String,
}

impl SourceInput {
    /// Creates a new input.
    #[must_use]
    pub fn new(file_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            text: text.into(),
        }
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    rules: Vec<RuleBox>,
    config: Option<Config>,
    parallelism: Option<usize>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Caps the number of worker threads. Overrides the config value.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if two rules share an id or the worker pool cannot
    /// be created.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id()) {
                return Err(AnalyzerError::DuplicateRule(rule.id().to_string()));
            }
        }

        let config = self.config.unwrap_or_default();
        let pool = match self.parallelism.or(config.analyzer.parallelism) {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?,
            ),
            None => None,
        };

        Ok(Analyzer {
            rules: self.rules,
            config,
            pool,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Units are analysed in parallel; each analysis owns its own state and
/// only shares the rules and configuration read-only.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    rules: Vec<RuleBox>,
    config: Config,
    pool: Option<ThreadPool>,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Ids of the registered rules, in registration order.
    pub fn rule_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.id())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Effective configuration of a registered rule.
    #[must_use]
    pub fn rule_config(&self, rule: &dyn Rule) -> RuleConfig {
        self.config.rule_config(rule.id(), rule.default_config())
    }

    /// Runs every rule over one parsed unit.
    ///
    /// Findings come back in source order.
    #[must_use]
    pub fn analyze_unit(&self, unit: &SourceUnit) -> Vec<Finding> {
        debug!("Analyzing: {}", unit.file_id());
        let mut collector = FindingCollector::new();
        for rule in &self.rules {
            let config = self.rule_config(rule.as_ref());
            if !config.active_by_default {
                debug!("Skipping inactive rule: {}", rule.id());
                continue;
            }
            collector.extend(rule.check(unit, &config));
        }
        collector.finish()
    }

    /// Parses and analyses every input.
    ///
    /// A unit that fails to parse is recorded in
    /// [`LintResult::parse_errors`] and does not affect the others.
    #[must_use]
    pub fn analyze(&self, inputs: &[SourceInput], parser: &dyn SourceParser) -> LintResult {
        info!(
            "Analyzing {} {} units with {} rules",
            inputs.len(),
            parser.language_id(),
            self.rules.len()
        );

        let run = || -> Vec<Result<Vec<Finding>, ParseError>> {
            inputs
                .par_iter()
                .map(|input| -> Result<Vec<Finding>, ParseError> {
                    let unit = parser.parse(&input.text, &input.file_id)?;
                    Ok(self.analyze_unit(&unit))
                })
                .collect()
        };
        let outcomes = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut result = LintResult::new();
        for outcome in outcomes {
            match outcome {
                Ok(findings) => {
                    result.findings.extend(findings);
                    result.files_checked += 1;
                }
                Err(e) => {
                    warn!("Failed to parse {}", e);
                    result.parse_errors.push(e);
                }
            }
        }
        result.sort();

        info!(
            "Analysis complete: {} findings in {} units ({} parse errors)",
            result.findings.len(),
            result.files_checked,
            result.parse_errors.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleOverride;
    use crate::tree::TreeBuilder;
    use crate::types::{Severity, Span};

    /// Reports one finding per line containing `BAD`.
    struct LineRule(&'static str);

    impl Rule for LineRule {
        fn id(&self) -> &'static str {
            self.0
        }

        fn check(&self, unit: &SourceUnit, config: &RuleConfig) -> Vec<Finding> {
            unit.text()
                .lines()
                .enumerate()
                .filter(|(_, l)| l.contains("BAD"))
                .map(|(i, _)| {
                    Finding::new(
                        self.0,
                        config.severity,
                        unit.file_id(),
                        Span::new(0, 3, (i + 1, 1), (i + 1, 4)),
                        "bad line",
                    )
                })
                .collect()
        }
    }

    /// Rejects any text containing `!`.
    struct Strict;

    impl SourceParser for Strict {
        fn language_id(&self) -> &'static str {
            "strict"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &[".st"]
        }

        fn parse(&self, text: &str, file_id: &str) -> Result<SourceUnit, ParseError> {
            match text.find('!') {
                Some(at) => Err(ParseError::new(
                    file_id,
                    "unexpected `!`",
                    Span::new(at, at + 1, (1, at + 1), (1, at + 2)),
                )),
                None => Ok(TreeBuilder::new(file_id, text).finish()),
            }
        }
    }

    #[test]
    fn test_builder_rejects_duplicate_ids() {
        let err = Analyzer::builder()
            .rule(LineRule("Same"))
            .rule(LineRule("Same"))
            .build()
            .err()
            .expect("duplicate");
        assert!(matches!(err, AnalyzerError::DuplicateRule(id) if id == "Same"));
    }

    #[test]
    fn parse_error_does_not_abort_other_units() {
        let analyzer = Analyzer::builder()
            .rule(LineRule("Line"))
            .parallelism(2)
            .build()
            .expect("Failed to build analyzer");

        let inputs = [
            SourceInput::new("b.st", "ok\nBAD\n"),
            SourceInput::new("broken.st", "oops!"),
            SourceInput::new("a.st", "BAD\nok\nBAD\n"),
        ];
        let result = analyzer.analyze(&inputs, &Strict);

        assert_eq!(result.files_checked, 2);
        assert_eq!(result.parse_errors.len(), 1);
        assert_eq!(result.parse_errors[0].file_id, "broken.st");
        let order: Vec<(&str, usize)> = result
            .findings
            .iter()
            .map(|f| (f.file(), f.line()))
            .collect();
        assert_eq!(order, [("a.st", 1), ("a.st", 3), ("b.st", 2)]);
    }

    #[test]
    fn config_overrides_apply_per_rule() {
        let mut config = Config::default();
        config.rules.insert(
            "Quiet".to_string(),
            RuleOverride {
                active_by_default: Some(false),
                severity: None,
            },
        );
        config.rules.insert(
            "Loud".to_string(),
            RuleOverride {
                active_by_default: None,
                severity: Some(Severity::Error),
            },
        );
        let analyzer = Analyzer::builder()
            .rule(LineRule("Quiet"))
            .rule(LineRule("Loud"))
            .config(config)
            .build()
            .expect("build");

        let unit = TreeBuilder::new("a.st", "BAD").finish();
        let findings = analyzer.analyze_unit(&unit);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id(), "Loud");
        assert_eq!(findings[0].severity(), Severity::Error);
    }
}
