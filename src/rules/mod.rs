//! The five built-in style rules (SPEC_FULL.md §4.F).

pub mod brace_style;
pub mod import_organizer;
pub mod indentation;
pub mod line_length;
pub mod whitespace;

use serde::de::DeserializeOwned;

use crate::rule::RuleConfiguration;

/// Parses a rule's options into its typed config, falling back to
/// `Default` when no options were supplied or the options fail to parse
/// (schema mismatches are surfaced up front by `validate_configuration`,
/// so a rule body never needs to re-report them).
pub(crate) fn resolve_options<T: DeserializeOwned + Default>(
    config: Option<&RuleConfiguration>,
) -> T {
    config
        .and_then(|c| c.options.as_ref())
        .and_then(|opts| serde_json::from_value(opts.clone()).ok())
        .unwrap_or_default()
}
