//! List rules command implementation.

use scope_lint_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<20} {:<9} Description", "Id", "Severity");
    println!("{}", "-".repeat(80));

    for rule in all_rules() {
        println!(
            "{:<20} {:<9} {}",
            rule.id(),
            rule.default_config().severity.to_string(),
            rule.description()
        );
    }

    println!("\nUse --rules to run a subset, e.g.:");
    println!("  scope-lint check --rules GlobalScopeUsage");
}
