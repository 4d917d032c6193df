//! Rule configuration records (SPEC_FULL.md §3.4), shaped after the
//! corpus's `config/config_file.rs::RuleConfigurationValue` /
//! `config/mod.rs::RuleConfiguration` pair, but carrying an opaque
//! `serde_json::Value` for options instead of a typed `RuleOptions` enum
//! since each rule here owns its own options schema.

use serde::Deserialize;

/// Per-rule options, left opaque at this layer; each rule's
/// `validate_configuration` converts it into its own typed struct.
pub type RuleOptions = serde_json::Value;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Error,
    Warn,
    Off,
}

impl Default for ErrorLevel {
    fn default() -> Self {
        ErrorLevel::Error
    }
}

/// The as-parsed form of one `[rule.<id>]` table, straight off the config
/// document (§6.3), before being matched up against a rule by id.
#[derive(Clone, Debug, Deserialize)]
pub struct RuleConfigurationValue {
    #[serde(default)]
    pub level: ErrorLevel,
    #[serde(default)]
    pub options: Option<RuleOptions>,
}

impl RuleConfigurationValue {
    pub fn to_rule_configuration(&self, rule_id: impl Into<String>) -> RuleConfiguration {
        RuleConfiguration {
            rule_id: rule_id.into(),
            level: self.level,
            options: self.options.clone(),
        }
    }
}

/// A rule configuration matched up with its owning rule id, as handed to
/// the engine by the config layer. Multiple entries for the same `rule_id`
/// may appear (e.g. merged from several config files up the directory
/// tree); the engine applies them last-wins before calling `analyze`.
#[derive(Clone, Debug)]
pub struct RuleConfiguration {
    pub rule_id: String,
    pub level: ErrorLevel,
    pub options: Option<RuleOptions>,
}

impl RuleConfiguration {
    pub fn is_active(&self) -> bool {
        self.level != ErrorLevel::Off
    }
}

/// Selects the configuration entries for `rule_id`, merging last-wins, and
/// returns `None` when the rule was never mentioned (callers fall back to
/// the rule's own default).
pub fn merged_for_rule<'a>(
    configs: &'a [RuleConfiguration],
    rule_id: &str,
) -> Option<&'a RuleConfiguration> {
    configs.iter().rev().find(|c| c.rule_id == rule_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_wins_on_duplicate_rule_id() {
        let configs = vec![
            RuleConfiguration {
                rule_id: "indentation".into(),
                level: ErrorLevel::Off,
                options: None,
            },
            RuleConfiguration {
                rule_id: "indentation".into(),
                level: ErrorLevel::Error,
                options: None,
            },
        ];
        let merged = merged_for_rule(&configs, "indentation").unwrap();
        assert_eq!(merged.level, ErrorLevel::Error);
    }

    #[test]
    fn missing_rule_id_yields_none() {
        assert!(merged_for_rule(&[], "line-length").is_none());
    }
}
