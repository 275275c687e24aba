//! Shared output formatting for lint results.

use anyhow::Result;
use scope_lint_core::{LintResult, Severity};

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    let (errors, warnings) = result.count_by_severity();

    for finding in &result.findings {
        let severity_indicator = match finding.severity() {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
        };

        println!(
            "{} at {}:{}:{}",
            finding.rule_id(),
            finding.file(),
            finding.line(),
            finding.column(),
        );
        println!("  {}: {}", severity_indicator, finding.message());
        println!();
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let skipped = if result.parse_errors.is_empty() {
        String::new()
    } else {
        format!(", {} file(s) skipped", result.parse_errors.len())
    };

    println!(
        "{}Found {} error(s), {} warning(s) in {} file(s){}\x1b[0m",
        summary_color, errors, warnings, result.files_checked, skipped
    );
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for finding in &result.findings {
        println!("{finding}");
    }
}
