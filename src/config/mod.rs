//! Configuration loading (SPEC_FULL.md §6.3): discovers and parses a
//! `.java-styler.toml`/`.java-styler.yml` file and turns its `[rules.*]`
//! tables into the `RuleConfiguration` list the rule engine consumes,
//! rejecting unknown rule ids and schema-invalid options up front so a
//! bad config fails before any file is touched.

pub mod file;

pub use file::{find_config_file, load_config_file, ConfigFileContent, ParsedConfigFile};

use crate::errors::ConfigError;
use crate::rule::{BuiltinRule, Rule, RuleConfiguration};

/// Converts a parsed config file's rule table into `RuleConfiguration`
/// entries, validating each rule id is one of `rules` and that any
/// supplied options pass that rule's own `validate_configuration`.
pub fn resolve_rule_configurations(
    content: &ConfigFileContent,
    rules: &[BuiltinRule],
) -> Result<Vec<RuleConfiguration>, ConfigError> {
    let mut out = Vec::with_capacity(content.rules.len());
    for (rule_id, value) in &content.rules {
        let rule = rules
            .iter()
            .find(|r| r.meta().id == rule_id)
            .ok_or_else(|| ConfigError::UnknownRule(rule_id.clone()))?;

        if let Some(options) = &value.options {
            let errors = rule.validate_configuration(options);
            if !errors.is_empty() {
                return Err(ConfigError::InvalidRuleConfig {
                    rule_id: rule_id.clone(),
                    messages: errors,
                });
            }
        }

        out.push(value.to_rule_configuration(rule_id.clone()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ErrorLevel, RuleConfigurationValue};
    use std::collections::HashMap;

    #[test]
    fn rejects_unknown_rule_id() {
        let mut rules_table = HashMap::new();
        rules_table.insert(
            "does-not-exist".to_string(),
            RuleConfigurationValue { level: ErrorLevel::Error, options: None },
        );
        let content = ConfigFileContent { rules: rules_table };
        let err = resolve_rule_configurations(&content, &BuiltinRule::all_default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule(id) if id == "does-not-exist"));
    }

    #[test]
    fn accepts_known_rule_with_no_options() {
        let mut rules_table = HashMap::new();
        rules_table.insert(
            "indentation".to_string(),
            RuleConfigurationValue { level: ErrorLevel::Warn, options: None },
        );
        let content = ConfigFileContent { rules: rules_table };
        let resolved = resolve_rule_configurations(&content, &BuiltinRule::all_default()).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].rule_id, "indentation");
    }
}
