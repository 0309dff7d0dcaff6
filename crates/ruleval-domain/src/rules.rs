use std::collections::BTreeMap;

use regex::Regex;

use ruleval_types::RuleConfig;

#[derive(Debug, thiserror::Error)]
pub enum RuleCompileError {
    #[error("rule set is empty: register at least one rule")]
    EmptyRuleSet,

    #[error("duplicate rule name '{name}'")]
    DuplicateName { name: String },

    #[error("rule with empty name in rule set")]
    EmptyName,

    #[error("rule '{name}' has invalid regex '{pattern}': {source}")]
    InvalidRegex {
        name: String,
        pattern: String,
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    /// The pattern as written in the config, kept for reporting.
    pub pattern: String,
    pub regex: Regex,
}

/// The registered rule set: name -> compiled pattern, immutable after
/// construction. Iteration order is name order, so downstream output is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, CompiledRule>,
}

impl RuleSet {
    pub fn get(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.values()
    }
}

pub fn compile_rules(configs: &[RuleConfig]) -> Result<RuleSet, RuleCompileError> {
    if configs.is_empty() {
        return Err(RuleCompileError::EmptyRuleSet);
    }

    let mut rules = BTreeMap::new();

    for cfg in configs {
        if cfg.name.is_empty() {
            return Err(RuleCompileError::EmptyName);
        }

        let regex = Regex::new(&cfg.pattern).map_err(|e| RuleCompileError::InvalidRegex {
            name: cfg.name.clone(),
            pattern: cfg.pattern.clone(),
            source: e,
        })?;

        let prev = rules.insert(
            cfg.name.clone(),
            CompiledRule {
                name: cfg.name.clone(),
                pattern: cfg.pattern.clone(),
                regex,
            },
        );
        if prev.is_some() {
            return Err(RuleCompileError::DuplicateName {
                name: cfg.name.clone(),
            });
        }
    }

    Ok(RuleSet { rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(name: &str, pattern: &str) -> RuleConfig {
        RuleConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }

    #[test]
    fn compile_basic_rule_set() {
        let rules = compile_rules(&[cfg("cat", "c.t"), cfg("dog", "d.g")]).unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules.contains("cat"));
        assert!(rules.get("dog").unwrap().regex.is_match("dig"));
        assert_eq!(rules.get("cat").unwrap().pattern, "c.t");
    }

    #[test]
    fn names_iterate_in_name_order() {
        let rules = compile_rules(&[cfg("zebra", "z"), cfg("ant", "a"), cfg("mole", "m")]).unwrap();
        let names: Vec<&str> = rules.names().collect();
        assert_eq!(names, vec!["ant", "mole", "zebra"]);
    }

    #[test]
    fn empty_rule_set_is_rejected() {
        let err = compile_rules(&[]).unwrap_err();
        assert!(matches!(err, RuleCompileError::EmptyRuleSet));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = compile_rules(&[cfg("cat", "c.t"), cfg("cat", "k.t")]).unwrap_err();
        match err {
            RuleCompileError::DuplicateName { name } => assert_eq!(name, "cat"),
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn invalid_regex_error_carries_name_and_pattern() {
        let err = compile_rules(&[cfg("bad", "(unclosed")]).unwrap_err();
        match &err {
            RuleCompileError::InvalidRegex { name, pattern, .. } => {
                assert_eq!(name, "bad");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("expected InvalidRegex, got {other:?}"),
        }

        let msg = err.to_string();
        assert!(msg.contains("bad"));
        assert!(msg.contains("(unclosed"));
    }
}
