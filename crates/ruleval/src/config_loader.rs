//! Configuration loading with include resolution.
//!
//! This module handles loading configuration files with support for:
//! - `includes` directive to compose configs from multiple files
//! - Circular include detection
//! - Merge semantics (later definitions override earlier ones by rule name)

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use ruleval_types::{ConfigFile, Defaults};

/// Maximum depth for include resolution to prevent excessive nesting.
const MAX_INCLUDE_DEPTH: usize = 10;

/// Load a configuration file with include resolution.
pub fn load_config_with_includes(path: &Path) -> Result<ConfigFile> {
    let mut visited = HashSet::new();
    load_config_recursive(path, &mut visited, 0)
}

fn load_config_recursive(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
    depth: usize,
) -> Result<ConfigFile> {
    if depth > MAX_INCLUDE_DEPTH {
        bail!(
            "Include depth exceeded maximum of {} levels at '{}'",
            MAX_INCLUDE_DEPTH,
            path.display()
        );
    }

    // Canonicalize path for consistent comparison
    let canonical = path
        .canonicalize()
        .with_context(|| format!("canonicalize path '{}'", path.display()))?;

    if !visited.insert(canonical.clone()) {
        bail!("Circular include detected: '{}'", path.display());
    }

    debug!("Loading config from '{}' (depth {})", path.display(), depth);

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;

    let config: ConfigFile =
        toml::from_str(&text).with_context(|| format!("parse config '{}'", path.display()))?;

    if config.includes.is_empty() {
        return Ok(config);
    }

    // Directory of the current config, for relative path resolution.
    let base_dir = path.parent().unwrap_or(Path::new("."));

    let mut merged = ConfigFile {
        includes: vec![],
        defaults: Defaults::default(),
        rule: vec![],
    };

    for include_path in &config.includes {
        let full_path = base_dir.join(include_path);
        debug!(
            "Resolving include '{}' relative to '{}'",
            include_path,
            base_dir.display()
        );

        if !full_path.exists() {
            bail!(
                "Included config file not found: '{}' (resolved from '{}')",
                full_path.display(),
                include_path
            );
        }

        let included = load_config_recursive(&full_path, visited, depth + 1)?;
        merged = merge_configs(merged, included);
    }

    // Merge the main config on top of includes (main config wins).
    let main_without_includes = ConfigFile {
        includes: vec![],
        defaults: config.defaults,
        rule: config.rule,
    };
    merged = merge_configs(merged, main_without_includes);

    Ok(merged)
}

/// Merge two configs. Rules from `other` override rules from `base` by name;
/// defaults from `other` win field-wise where set.
fn merge_configs(base: ConfigFile, other: ConfigFile) -> ConfigFile {
    let mut rules = base.rule;

    for rule in other.rule {
        if let Some(existing) = rules.iter_mut().find(|r| r.name == rule.name) {
            *existing = rule;
        } else {
            rules.push(rule);
        }
    }

    ConfigFile {
        includes: vec![],
        defaults: Defaults {
            case_insensitive: other.defaults.case_insensitive.or(base.defaults.case_insensitive),
            window: other.defaults.window.or(base.defaults.window),
            export_dir: other.defaults.export_dir.or(base.defaults.export_dir),
        },
        rule: rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).expect("write config");
        path
    }

    #[test]
    fn loads_a_plain_config() {
        let td = tempfile::TempDir::new().expect("temp");
        let path = write(
            td.path(),
            "ruleval.toml",
            r#"
[defaults]
window = 12

[[rule]]
name = "cat"
pattern = "c.t"
"#,
        );

        let cfg = load_config_with_includes(&path).expect("load");
        assert_eq!(cfg.defaults.window, Some(12));
        assert_eq!(cfg.rule.len(), 1);
        assert_eq!(cfg.rule[0].name, "cat");
    }

    #[test]
    fn includes_merge_with_main_config_winning() {
        let td = tempfile::TempDir::new().expect("temp");
        write(
            td.path(),
            "base.toml",
            r#"
[defaults]
window = 10
case_insensitive = false

[[rule]]
name = "cat"
pattern = "from_base"

[[rule]]
name = "dog"
pattern = "d.g"
"#,
        );
        let main = write(
            td.path(),
            "ruleval.toml",
            r#"
includes = ["base.toml"]

[defaults]
window = 25

[[rule]]
name = "cat"
pattern = "from_main"
"#,
        );

        let cfg = load_config_with_includes(&main).expect("load");

        // Main overrides by rule name; untouched rules survive.
        let cat = cfg.rule.iter().find(|r| r.name == "cat").unwrap();
        assert_eq!(cat.pattern, "from_main");
        assert!(cfg.rule.iter().any(|r| r.name == "dog"));

        // Field-wise defaults: main's window wins, base's flag survives.
        assert_eq!(cfg.defaults.window, Some(25));
        assert_eq!(cfg.defaults.case_insensitive, Some(false));
    }

    #[test]
    fn circular_includes_are_detected() {
        let td = tempfile::TempDir::new().expect("temp");
        write(td.path(), "a.toml", r#"includes = ["b.toml"]"#);
        let a = td.path().join("a.toml");
        write(td.path(), "b.toml", r#"includes = ["a.toml"]"#);

        let err = load_config_with_includes(&a).unwrap_err();
        assert!(err.to_string().contains("Circular include"));
    }

    #[test]
    fn missing_include_is_an_error() {
        let td = tempfile::TempDir::new().expect("temp");
        let main = write(td.path(), "ruleval.toml", r#"includes = ["gone.toml"]"#);

        let err = load_config_with_includes(&main).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
