//! Config file discovery and parsing (SPEC_FULL.md §6.3), grounded on the
//! corpus's `config/config_file.rs::find_filename_in_ancestor_directory`:
//! walk upward from a starting directory looking for the first match
//! among a fixed list of filenames, rather than merging every ancestor's
//! config into one.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::rule::RuleConfigurationValue;

const CONFIG_FILENAMES: &[&str] = &[".java-styler.toml", ".java-styler.yml"];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileContent {
    #[serde(default)]
    pub rules: HashMap<String, RuleConfigurationValue>,
}

#[derive(Clone, Debug)]
pub struct ParsedConfigFile {
    pub path: PathBuf,
    pub content: ConfigFileContent,
}

/// Walks upward from `starting_directory`, at each level trying every name
/// in `CONFIG_FILENAMES` in order, stopping at the first one that exists.
///
/// <https://codereview.stackexchange.com/a/236771>
pub fn find_config_file(starting_directory: &Path) -> Option<PathBuf> {
    let mut current = starting_directory.to_path_buf();
    loop {
        for name in CONFIG_FILENAMES {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config_file(path: &Path) -> Result<ParsedConfigFile, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        _ => serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
    };

    Ok(ParsedConfigFile { path: path.to_path_buf(), content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_nearest_ancestor_config() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(".java-styler.toml"), "").unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join(".java-styler.toml"));
    }

    #[test]
    fn returns_none_when_no_ancestor_has_one() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn parses_toml_rule_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".java-styler.toml");
        fs::write(&path, "[rules.indentation]\nlevel = \"warn\"\n").unwrap();

        let parsed = load_config_file(&path).unwrap();
        assert!(parsed.content.rules.contains_key("indentation"));
    }

    #[test]
    fn parses_yaml_rule_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".java-styler.yml");
        fs::write(&path, "rules:\n  line-length:\n    level: error\n").unwrap();

        let parsed = load_config_file(&path).unwrap();
        assert!(parsed.content.rules.contains_key("line-length"));
    }
}
