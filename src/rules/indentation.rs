//! Indentation rule (SPEC_FULL.md §4.F "Indentation"): target depth comes
//! from AST brace nesting, never from counting `{`/`}` bytes in raw text,
//! so braces inside strings/chars/comments can never shift a line's target
//! depth (they never produce a brace-scope AST node in the first place).

use std::collections::HashMap;
use std::ops::Range;

use serde::Deserialize;

use crate::arena::NodeKind;
use crate::rule::{Rule, RuleConfiguration, RuleMeta, RuleOptions};
use crate::rule::context::TransformationContext;
use crate::rules::resolve_options;
use crate::violation::{Severity, Violation};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentType {
    Spaces,
    Tabs,
}

impl Default for IndentType {
    fn default() -> Self {
        IndentType::Spaces
    }
}

/// Whether `case`/`default` labels sit one level deeper than their
/// `switch`'s own line (the brace-depth-derived default) or flush with it.
/// §9's open question: the observed behavior is `OneLevel`; kept toggleable
/// rather than hard-coded so it can be revisited without a breaking change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaseIndent {
    OneLevel,
    SameAsSwitch,
}

impl Default for CaseIndent {
    fn default() -> Self {
        CaseIndent::OneLevel
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IndentationConfig {
    pub indent_type: IndentType,
    pub width: u32,
    pub continuation_width: u32,
    pub case_indent: CaseIndent,
}

impl Default for IndentationConfig {
    fn default() -> Self {
        Self {
            indent_type: IndentType::Spaces,
            width: 4,
            continuation_width: 8,
            case_indent: CaseIndent::OneLevel,
        }
    }
}

impl IndentationConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(1..=16).contains(&self.width) {
            errors.push(format!("width must be in 1..=16, got {}", self.width));
        }
        if !(1..=16).contains(&self.continuation_width) {
            errors.push(format!(
                "continuation_width must be in 1..=16, got {}",
                self.continuation_width
            ));
        }
        errors
    }

    fn unit(&self) -> &'static str {
        match self.indent_type {
            IndentType::Spaces => " ",
            IndentType::Tabs => "\t",
        }
    }

    fn prefix_for(&self, depth: u32, continuation: bool) -> String {
        let unit = self.unit();
        let mut out = unit.repeat((self.width * depth) as usize);
        if continuation {
            out.push_str(&unit.repeat(self.continuation_width as usize));
        }
        out
    }
}

fn is_brace_scope(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ClassDeclaration
            | NodeKind::InterfaceDeclaration
            | NodeKind::EnumDeclaration
            | NodeKind::RecordDeclaration
            | NodeKind::AnnotationDeclaration
            | NodeKind::Block
            | NodeKind::SwitchStatement
            | NodeKind::Initializer
            | NodeKind::ArrayInitializer
    )
}

/// One physical line's byte span, excluding the terminating `\n` (a
/// trailing `\r` is kept so CRLF sources round-trip byte-for-byte when
/// nothing about the line changes).
fn line_spans(source: &str) -> Vec<Range<u32>> {
    let bytes = source.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            spans.push(start as u32..i as u32);
            start = i + 1;
        }
    }
    spans.push(start as u32..bytes.len() as u32);
    spans
}

/// Per-line target brace depth, via a sweep over brace-scope node
/// intervals rather than a per-line ancestor walk: O(nodes + lines).
fn target_depths(ctx: &TransformationContext, total_lines: usize) -> Vec<i32> {
    let arena = ctx.arena();
    let mut diff = vec![0i32; total_lines + 2];

    arena.walk_preorder(ctx.root_node(), |id| {
        let kind = arena.kind(id);
        if !is_brace_scope(kind) {
            return;
        }
        let start = arena.start(id);
        let end = arena.end(id);
        if end == 0 {
            return;
        }
        let open_line = ctx.line_of(start) as usize;
        let close_line = ctx.line_of(end - 1) as usize;
        if close_line > open_line + 1 {
            diff[open_line + 1] += 1;
            diff[close_line] -= 1;
        }
    });

    let mut depths = vec![0i32; total_lines + 2];
    let mut running = 0i32;
    for line in 1..=total_lines {
        running += diff[line];
        depths[line] = running;
    }
    depths
}

/// Applies the `case_indent: SameAsSwitch` override: a case label's own
/// line is pulled back to its `switch` statement's own depth instead of
/// the switch block's interior depth.
fn apply_case_indent_override(ctx: &TransformationContext, depths: &mut [i32], config: &IndentationConfig) {
    if config.case_indent != CaseIndent::SameAsSwitch {
        return;
    }
    let arena = ctx.arena();
    for &switch_id in ctx.position_index().find_nodes_by_type(NodeKind::SwitchStatement) {
        let switch_line = ctx.line_of(arena.start(switch_id)) as usize;
        let parent_depth = depths.get(switch_line).copied().unwrap_or(0);
        for &child in arena.children(switch_id) {
            if matches!(arena.kind(child), NodeKind::SwitchRule) {
                collect_label_lines(ctx, child, parent_depth, depths);
            }
        }
    }
}

fn collect_label_lines(
    ctx: &TransformationContext,
    switch_rule: crate::arena::NodeId,
    parent_depth: i32,
    depths: &mut [i32],
) {
    let arena = ctx.arena();
    for &child in arena.children(switch_rule) {
        if matches!(arena.kind(child), NodeKind::SwitchLabel) {
            let line = ctx.line_of(arena.start(child)) as usize;
            if let Some(slot) = depths.get_mut(line) {
                *slot = parent_depth;
            }
        }
    }
}

/// Lines whose leading whitespace must never be touched: the interior of a
/// text block, where incidental whitespace is semantically significant.
fn text_block_lines(ctx: &TransformationContext) -> std::collections::HashSet<u32> {
    let mut skip = std::collections::HashSet::new();
    for &lit in ctx.position_index().find_nodes_by_type(NodeKind::Literal) {
        let text = ctx.source_text_of(lit);
        if text.starts_with("\"\"\"") {
            let start_line = ctx.line_of(ctx.arena().start(lit));
            let end = ctx.arena().end(lit);
            let end_line = ctx.line_of(end.saturating_sub(1));
            for line in start_line..=end_line {
                skip.insert(line);
            }
        }
    }
    skip
}

/// Whether `line` continues the previous statement rather than starting a
/// new one: the previous non-blank physical line doesn't end with a token
/// that would normally terminate or open a construct.
fn is_continuation(prev_trimmed: &str) -> bool {
    !prev_trimmed.is_empty()
        && !prev_trimmed.ends_with(';')
        && !prev_trimmed.ends_with('{')
        && !prev_trimmed.ends_with('}')
        && !prev_trimmed.ends_with(':')
}

#[derive(Default)]
pub struct IndentationRule;

impl Rule for IndentationRule {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id: "indentation",
            name: "indentation",
            description: "Enforces leading-whitespace depth derived from AST brace nesting",
            default_severity: Severity::Warning,
        }
    }

    fn analyze(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: IndentationConfig = resolve_options(config);
        let source = ctx.source_code();
        let spans = line_spans(source);
        let total_lines = spans.len();
        let mut depths = target_depths(ctx, total_lines);
        apply_case_indent_override(ctx, &mut depths, &config);
        let skip = text_block_lines(ctx);

        let mut prev_trimmed = String::new();
        for (idx, span) in spans.iter().enumerate() {
            let line = (idx + 1) as u32;
            let text = &source[span.start as usize..span.end as usize];
            let trimmed_start = text.len() - text.trim_start_matches([' ', '\t']).len();
            let content = &text[trimmed_start..];
            if content.is_empty() {
                continue; // blank line, preserved verbatim
            }
            if skip.contains(&line) {
                prev_trimmed = content.trim_end().to_string();
                continue;
            }
            let continuation = is_continuation(&prev_trimmed);
            let depth = depths.get(line as usize).copied().unwrap_or(0).max(0) as u32;
            let expected = config.prefix_for(depth, continuation);
            let actual = &text[..trimmed_start];
            if actual != expected {
                let start = span.start;
                let end = span.start + trimmed_start as u32;
                ctx.report(
                    Violation::builder()
                        .rule_id("indentation")
                        .severity(Severity::Warning)
                        .message(format!(
                            "expected {} leading byte(s) of indentation, found {}",
                            expected.len(),
                            actual.len()
                        ))
                        .file_path(ctx.file_path().to_path_buf())
                        .start(start)
                        .end(end)
                        .line(line)
                        .column(1u32)
                        .build()
                        .expect("well-formed violation"),
                );
            }
            prev_trimmed = content.trim_end().to_string();
        }
    }

    fn format(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: IndentationConfig = resolve_options(config);
        let source = ctx.source_code();
        let spans = line_spans(source);
        let total_lines = spans.len();
        let mut depths = target_depths(ctx, total_lines);
        apply_case_indent_override(ctx, &mut depths, &config);
        let skip = text_block_lines(ctx);

        let mut edits: HashMap<u32, (Range<u32>, String)> = HashMap::new();
        let mut prev_trimmed = String::new();
        for (idx, span) in spans.iter().enumerate() {
            let line = (idx + 1) as u32;
            let text = &source[span.start as usize..span.end as usize];
            let trimmed_start = text.len() - text.trim_start_matches([' ', '\t']).len();
            let content = &text[trimmed_start..];
            if content.is_empty() || skip.contains(&line) {
                prev_trimmed = content.trim_end().to_string();
                continue;
            }
            let continuation = is_continuation(&prev_trimmed);
            let depth = depths.get(line as usize).copied().unwrap_or(0).max(0) as u32;
            let expected = config.prefix_for(depth, continuation);
            let actual = &text[..trimmed_start];
            if actual != expected {
                edits.insert(line, (span.start..span.start + trimmed_start as u32, expected));
            }
            prev_trimmed = content.trim_end().to_string();
        }

        ctx.with_fixer(|fixer| {
            for (range, replacement) in edits.into_values() {
                fixer.replace_range(range, replacement);
            }
        });
    }

    fn validate_configuration(&self, options: &RuleOptions) -> Vec<String> {
        match serde_json::from_value::<IndentationConfig>(options.clone()) {
            Ok(cfg) => cfg.validate(),
            Err(e) => vec![format!("invalid indentation config: {e}")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position_index::PositionIndex;
    use crate::rule::TypeResolutionConfig;
    use crate::security::{Deadline, SecurityConfig};
    use std::path::Path;
    use std::time::Duration;

    fn analyze(source: &str) -> Vec<Violation> {
        let security = SecurityConfig::default();
        let deadline = Deadline::starting_now(Duration::from_secs(30));
        let (arena, outcome) = crate::parser::parse(source, &security, &deadline);
        let root = match outcome {
            crate::parser::ParseOutcome::Success { root } => root,
            crate::parser::ParseOutcome::Failure { root: Some(root), .. } => root,
            _ => panic!("parse failed"),
        };
        let index = PositionIndex::build(&arena, root, source);
        let type_resolution = TypeResolutionConfig::default();
        let ctx = TransformationContext::new(
            &arena,
            root,
            source,
            Path::new("T.java"),
            &index,
            &security,
            &deadline,
            &type_resolution,
        );
        IndentationRule.analyze(&ctx, None);
        ctx.into_violations()
    }

    #[test]
    fn well_indented_source_has_no_violations() {
        let source = "class T {\n    int x = 1;\n}";
        assert!(analyze(source).is_empty());
    }

    #[test]
    fn tab_indented_body_is_flagged() {
        let source = "class T {\n\tint x = 1;\n}";
        let violations = analyze(source);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);
    }

    #[test]
    fn braces_inside_string_do_not_affect_depth() {
        let source = "class T {\n    String s = \"{ not a scope }\";\n    int x = 1;\n}";
        assert!(analyze(source).is_empty());
    }
}
