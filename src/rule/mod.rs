//! The rule engine: a `Rule` trait for polymorphic dispatch, a closed
//! tagged-variant `BuiltinRule` enumeration for the five shipped rules
//! (SPEC_FULL.md §4.E/§9), and the `RuleEngine` that runs them over a
//! `TransformationContext`.
//!
//! The corpus constructs rules via a `name`/`create` closure pair
//! (`rule.rs::RuleBuilder`) resolved against a `Context` at startup; the
//! closed set here plays the same role without needing `Rc<dyn Fn>`
//! indirection, since the five built-ins are known at compile time. An
//! `Arc<dyn Rule>` trait object is kept for rules loaded dynamically from
//! configuration, which this core doesn't yet support but shouldn't
//! foreclose on.

pub mod config;
pub mod context;
pub mod fixer;

use std::path::Path;
use std::sync::Arc;

pub use config::{ErrorLevel, RuleConfiguration, RuleConfigurationValue, RuleOptions};
pub use context::{TransformationContext, TypeResolutionConfig};
pub use fixer::{Fixer, PendingFix};

use crate::parser::{self, ParseOutcome};
use crate::position_index::PositionIndex;
use crate::rules::{
    brace_style::BraceStyleRule, import_organizer::ImportOrganizerRule,
    indentation::IndentationRule, line_length::LineLengthRule, whitespace::WhitespaceRule,
};
use crate::security::{Deadline, SecurityConfig};
use crate::violation::{Severity, Violation};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleMeta {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub default_severity: Severity,
}

/// A style rule: can analyze an AST for violations and/or rewrite the
/// file's source text. Implementors must be safe to call concurrently from
/// different threads on *different* files (the pipeline serializes calls
/// against the same file).
pub trait Rule: Send + Sync {
    fn meta(&self) -> RuleMeta;

    fn analyze(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>);

    fn format(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>);

    /// Schema-level checks on an opaque options value; empty means valid.
    fn validate_configuration(&self, options: &RuleOptions) -> Vec<String>;
}

/// The closed set of built-in rules, dispatched by `match` rather than
/// vtable indirection. Each variant owns its configured instance.
pub enum BuiltinRule {
    Indentation(IndentationRule),
    LineLength(LineLengthRule),
    Whitespace(WhitespaceRule),
    BraceStyle(BraceStyleRule),
    ImportOrganizer(ImportOrganizerRule),
}

impl BuiltinRule {
    pub fn all_default() -> Vec<BuiltinRule> {
        vec![
            BuiltinRule::Indentation(IndentationRule::default()),
            BuiltinRule::LineLength(LineLengthRule::default()),
            BuiltinRule::Whitespace(WhitespaceRule::default()),
            BuiltinRule::BraceStyle(BraceStyleRule::default()),
            BuiltinRule::ImportOrganizer(ImportOrganizerRule::default()),
        ]
    }

    fn as_rule(&self) -> &dyn Rule {
        match self {
            BuiltinRule::Indentation(r) => r,
            BuiltinRule::LineLength(r) => r,
            BuiltinRule::Whitespace(r) => r,
            BuiltinRule::BraceStyle(r) => r,
            BuiltinRule::ImportOrganizer(r) => r,
        }
    }
}

impl Rule for BuiltinRule {
    fn meta(&self) -> RuleMeta {
        self.as_rule().meta()
    }

    fn analyze(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        self.as_rule().analyze(ctx, config)
    }

    fn format(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        self.as_rule().format(ctx, config)
    }

    fn validate_configuration(&self, options: &RuleOptions) -> Vec<String> {
        self.as_rule().validate_configuration(options)
    }
}

pub type SharedRule = Arc<dyn Rule>;

/// The whole-file output of the Format stage (SPEC_FULL.md §4.G).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub new_source: String,
    pub changed: bool,
    /// Rule ids whose `format` pass was skipped because re-parsing the
    /// text produced by the prior rule failed; the source is left as the
    /// prior rule left it and formatting continues with the next rule.
    pub skipped_rules: Vec<&'static str>,
}

/// Runs a fixed set of rules over one file. Built-ins are matched by id
/// against `configurations`; a rule mentioned with `ErrorLevel::Off` is
/// skipped entirely for both analysis and formatting.
pub struct RuleEngine {
    rules: Vec<BuiltinRule>,
}

impl RuleEngine {
    pub fn new(rules: Vec<BuiltinRule>) -> Self {
        Self { rules }
    }

    pub fn with_defaults() -> Self {
        Self::new(BuiltinRule::all_default())
    }

    /// Runs every active rule's `analyze` against the same immutable
    /// `ctx`, since analysis never mutates the arena or source. Violations
    /// are returned sorted by source position, then by rule id, so a
    /// single file's report preserves source-position order regardless of
    /// rule execution order (SPEC_FULL.md §5).
    pub fn analyze(
        &self,
        ctx: &TransformationContext,
        configurations: &[RuleConfiguration],
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for rule in &self.rules {
            if ctx.check_deadline() {
                break;
            }
            let meta = rule.meta();
            let cfg = config::merged_for_rule(configurations, meta.id);
            if cfg.is_some_and(|c| !c.is_active()) {
                continue;
            }
            rule.analyze(ctx, cfg);
            violations.extend(ctx.take_violations());
        }
        violations.sort_by(|a, b| {
            (a.start, a.end, a.rule_id.as_str()).cmp(&(b.start, b.end, b.rule_id.as_str()))
        });
        violations
    }

    /// Runs every active rule's `format` in the engine's fixed order. Each
    /// rule sees a freshly re-parsed `TransformationContext` over the
    /// previous rule's output, since node offsets are only valid for the
    /// text they were parsed from; a rule's accumulated `Fixer` is then
    /// rendered into the next stage's input text.
    pub fn format(
        &self,
        source: &str,
        file_path: &Path,
        security: &SecurityConfig,
        type_resolution: &TypeResolutionConfig,
        configurations: &[RuleConfiguration],
    ) -> FormatOutcome {
        let mut current = source.to_string();
        let mut skipped_rules = Vec::new();

        for rule in &self.rules {
            let meta = rule.meta();
            let cfg = config::merged_for_rule(configurations, meta.id);
            if cfg.is_some_and(|c| !c.is_active()) {
                continue;
            }

            let deadline = Deadline::starting_now(security.wall_clock_budget);
            let (arena, outcome) = parser::parse(&current, security, &deadline);
            let root = match outcome {
                ParseOutcome::Success { root } => root,
                ParseOutcome::Failure { root: Some(root), .. } => root,
                ParseOutcome::Failure { root: None, .. } => {
                    skipped_rules.push(meta.id);
                    continue;
                }
            };
            let position_index = PositionIndex::build(&arena, root, &current);
            let ctx = TransformationContext::new(
                &arena,
                root,
                &current,
                file_path,
                &position_index,
                security,
                &deadline,
                type_resolution,
            );
            rule.format(&ctx, cfg);
            let fixer = ctx.into_fixer();
            if !fixer.is_empty() {
                current = fixer.render(&current);
            }
        }

        FormatOutcome {
            changed: current != source,
            new_source: current,
            skipped_rules,
        }
    }
}
