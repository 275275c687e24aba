//! Check command implementation.

use anyhow::{bail, Context, Result};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use scope_lint_core::{
    Analyzer, ParseDiagnostic, ParseError, RuleBox, SourceInput, SourceParser, Span,
};
use scope_lint_kotlin::KotlinParser;
use scope_lint_rules::all_rules;
use std::path::{Path, PathBuf};

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Command-line options for `scope-lint check`.
#[derive(Debug, Default)]
pub struct CheckOptions {
    /// How findings are printed.
    pub format: OutputFormat,
    /// Comma-separated rule ids to run instead of all rules.
    pub rules: Option<String>,
    /// Extra exclude globs on top of the configured ones.
    pub exclude: Vec<String>,
}

/// Runs the check command.
///
/// Returns `true` when the run should fail, that is when some finding is at
/// or above the configured `fail_on` severity.
pub fn run(path: &Path, source: &ConfigSource, options: &CheckOptions) -> Result<bool> {
    let config = source.load().with_context(|| match source.path() {
        Some(p) => format!("Failed to load config from {}", p.display()),
        None => "Failed to load default config".to_string(),
    })?;
    let fail_on = config.fail_on;

    let rules = select_rules(options.rules.as_deref())?;

    let mut exclude = config.analyzer.exclude.clone();
    exclude.extend(options.exclude.iter().cloned());

    let parser = KotlinParser::new();
    let files = discover_files(path, &exclude, config.analyzer.respect_gitignore, &parser)?;
    tracing::info!("Analyzing {} files", files.len());

    let (inputs, unreadable) = read_inputs(path, &files);

    let analyzer = Analyzer::builder()
        .rules(rules)
        .config(config)
        .build()
        .context("Failed to set up analyzer")?;
    let mut result = analyzer.analyze(&inputs, &parser);
    result.parse_errors.extend(unreadable);
    result.sort();

    for error in &result.parse_errors {
        let report = miette::Report::new(ParseDiagnostic::from(error));
        let report = match inputs.iter().find(|input| input.file_id == error.file_id) {
            Some(input) => report.with_source_code(input.text.clone()),
            None => report,
        };
        eprintln!("{report:?}");
    }

    super::output::print(&result, options.format)?;

    Ok(result.has_findings_at(fail_on))
}

/// Picks the rules named in a comma-separated filter, or all rules.
fn select_rules(filter: Option<&str>) -> Result<Vec<RuleBox>> {
    let Some(filter) = filter else {
        return Ok(all_rules());
    };

    let wanted: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();

    if let Some(unknown) = wanted
        .iter()
        .find(|id| scope_lint_rules::rule_by_id(id).is_none())
    {
        let known: Vec<&str> = all_rules().iter().map(|r| r.id()).collect();
        bail!("Unknown rule `{unknown}`. Available: {}", known.join(", "));
    }

    Ok(all_rules()
        .into_iter()
        .filter(|rule| wanted.contains(&rule.id()))
        .collect())
}

/// Collects the source files under `root` the parser handles.
///
/// `exclude` globs are matched relative to `root`. A `root` that names a
/// file is returned as-is when the parser handles it.
fn discover_files(
    root: &Path,
    exclude: &[String],
    respect_gitignore: bool,
    parser: &dyn SourceParser,
) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(if parser.handles(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut overrides = OverrideBuilder::new(root);
    for pattern in exclude {
        overrides
            .add(&format!("!{pattern}"))
            .with_context(|| format!("Invalid exclude pattern `{pattern}`"))?;
    }
    let overrides = overrides
        .build()
        .context("Failed to build exclude patterns")?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(respect_gitignore)
        .overrides(overrides);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.context("Failed to walk directory")?;
        let path = entry.path();
        if path.is_file() && parser.handles(path) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();

    Ok(files)
}

/// Reads every file, setting aside the ones that cannot be read as text.
///
/// An unreadable or non-UTF-8 file becomes a [`ParseError`] for that file
/// alone, so the rest of the run goes on.
fn read_inputs(root: &Path, files: &[PathBuf]) -> (Vec<SourceInput>, Vec<ParseError>) {
    let mut inputs = Vec::with_capacity(files.len());
    let mut unreadable = Vec::new();
    for file in files {
        match read_input(root, file) {
            Ok(input) => inputs.push(input),
            Err(e) => {
                tracing::warn!("Skipping {}", e);
                unreadable.push(e);
            }
        }
    }
    (inputs, unreadable)
}

fn read_input(root: &Path, file: &Path) -> Result<SourceInput, ParseError> {
    let file_id = file_id(root, file);
    let bytes = std::fs::read(file).map_err(|e| {
        ParseError::new(&file_id, format!("cannot read file: {e}"), Span::default())
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(SourceInput::new(file_id, text)),
        Err(e) => {
            let valid = e.utf8_error().valid_up_to();
            let prefix = String::from_utf8_lossy(&e.as_bytes()[..valid]);
            let line = prefix.matches('\n').count() + 1;
            let column = valid - prefix.rfind('\n').map_or(0, |nl| nl + 1) + 1;
            Err(ParseError::new(
                &file_id,
                "file is not valid UTF-8",
                Span::new(valid, valid, (line, column), (line, column)),
            ))
        }
    }
}

fn file_id(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    if rel.as_os_str().is_empty() {
        file.display().to_string()
    } else {
        rel.display().to_string()
    }
}
