//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# scope-lint configuration

# Findings at or above this severity make `scope-lint check` exit non-zero.
fail_on = "error"

[analyzer]
# Glob patterns to exclude from analysis, relative to the checked path
exclude = [
    "**/build/**",
    "**/.gradle/**",
]

# Respect .gitignore files
respect_gitignore = true

# Worker threads (default: one per CPU)
# parallelism = 4

# Rule configurations

[rules.GlobalScopeUsage]
active = true
# severity = "error"
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new("scope-lint.toml"), force)?;

    println!("Created scope-lint.toml");
    println!("\nNext steps:");
    println!("  1. Edit scope-lint.toml to configure rules");
    println!("  2. Run: scope-lint check");

    Ok(())
}

fn write_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scope_lint_core::{Config, RuleConfig, Severity};
    use tempfile::TempDir;

    #[test]
    fn template_is_a_valid_config() {
        let config = Config::parse(DEFAULT_CONFIG).expect("template parses");
        assert_eq!(config.fail_on, Severity::Error);
        assert_eq!(config.analyzer, Config::default().analyzer);
        assert_eq!(
            config.rule_config("GlobalScopeUsage", RuleConfig::default()),
            RuleConfig::default()
        );
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("scope-lint.toml");
        std::fs::write(&path, "# mine\n").expect("write");

        assert!(write_config(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "# mine\n");

        write_config(&path, true).expect("forced write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), DEFAULT_CONFIG);
    }
}
