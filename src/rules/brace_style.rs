//! Brace style rule (SPEC_FULL.md §4.F "Brace Style"): `{ style: NEXT_LINE
//! (Allman) | SAME_LINE (K&R) }`. Flags and rewrites the placement of the
//! opening brace of class/interface/enum/record/annotation bodies,
//! initializers, and method/constructor bodies.
//!
//! Brace offsets are found by a paren-depth scan over each declaration
//! node's own source span rather than a dedicated child node, since the
//! parser does not allocate a node boundary at a class/method body's own
//! `{` (only `Block` does, for nested statement blocks). The scan skips
//! string/char contents and anything inside `(...)`, so an annotation's
//! own array-valued argument (`@Foo({1, 2})`) never gets mistaken for the
//! body brace that follows it.

use std::ops::Range;

use serde::Deserialize;

use crate::arena::{Arena, NodeId, NodeKind};
use crate::rule::{Rule, RuleConfiguration, RuleMeta, RuleOptions};
use crate::rule::context::TransformationContext;
use crate::rules::resolve_options;
use crate::violation::{Severity, Violation};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BraceStyle {
    NextLine,
    SameLine,
}

impl Default for BraceStyle {
    fn default() -> Self {
        BraceStyle::SameLine
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BraceStyleConfig {
    pub style: BraceStyle,
}

impl Default for BraceStyleConfig {
    fn default() -> Self {
        Self { style: BraceStyle::default() }
    }
}

const BODY_OWNING_KINDS: &[NodeKind] = &[
    NodeKind::ClassDeclaration,
    NodeKind::InterfaceDeclaration,
    NodeKind::EnumDeclaration,
    NodeKind::RecordDeclaration,
    NodeKind::AnnotationDeclaration,
    NodeKind::MethodDeclaration,
    NodeKind::ConstructorDeclaration,
    NodeKind::Initializer,
];

/// Finds the node's own opening brace: the first `{` encountered while
/// scanning its source span at paren-depth 0, skipping string/char
/// contents. Returns `None` for e.g. an abstract method with no body.
fn find_body_brace(source: &str, range: Range<u32>) -> Option<u32> {
    let bytes = source.as_bytes();
    let mut i = range.start as usize;
    let end = (range.end as usize).min(bytes.len());
    let mut paren_depth = 0i32;
    while i < end {
        match bytes[i] {
            b'"' | b'\'' => {
                let quote = bytes[i];
                i += 1;
                while i < end && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'(' => paren_depth += 1,
            b')' => paren_depth -= 1,
            b'{' if paren_depth == 0 => return Some(i as u32),
            _ => {}
        }
        i += 1;
    }
    None
}

fn brace_placement(source: &str, brace_offset: u32) -> BraceStyle {
    let before = &source[..brace_offset as usize];
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &before[line_start..];
    if prefix.trim().is_empty() {
        BraceStyle::NextLine
    } else {
        BraceStyle::SameLine
    }
}

fn line_indent(source: &str, offset: u32) -> String {
    let line_start = source[..offset as usize].rfind('\n').map(|i| i + 1).unwrap_or(0);
    source[line_start..offset as usize]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

fn rewrite_brace(source: &str, node_start: u32, brace_offset: u32, desired: BraceStyle) -> Option<(Range<u32>, String)> {
    let current = brace_placement(source, brace_offset);
    if current == desired {
        return None;
    }
    match desired {
        BraceStyle::SameLine => {
            let before = &source[..brace_offset as usize];
            let trim_end = before.trim_end_matches([' ', '\t', '\n', '\r']).len();
            Some((trim_end as u32..brace_offset, " ".to_string()))
        }
        BraceStyle::NextLine => {
            let before = &source[..brace_offset as usize];
            let trim_end = before.trim_end_matches([' ', '\t']).len();
            let indent = line_indent(source, node_start);
            Some((trim_end as u32..brace_offset, format!("\n{indent}")))
        }
    }
}

fn body_braces(arena: &Arena, root: NodeId) -> Vec<(NodeId, u32, Range<u32>)> {
    let mut out = Vec::new();
    arena.walk_preorder(root, |id| {
        let kind = arena.kind(id);
        if BODY_OWNING_KINDS.contains(&kind) {
            out.push((id, arena.start(id), arena.start(id)..arena.end(id)));
        }
    });
    out
}

#[derive(Default)]
pub struct BraceStyleRule;

impl Rule for BraceStyleRule {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id: "brace-style",
            name: "brace-style",
            description: "Enforces Allman or K&R placement of body-opening braces",
            default_severity: Severity::Warning,
        }
    }

    fn analyze(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: BraceStyleConfig = resolve_options(config);
        let source = ctx.source_code();
        for (node_id, node_start, range) in body_braces(ctx.arena(), ctx.root_node()) {
            let Some(brace_offset) = find_body_brace(source, range) else { continue };
            let actual = brace_placement(source, brace_offset);
            if actual != config.style {
                ctx.report(
                    Violation::builder()
                        .rule_id("brace-style")
                        .severity(Severity::Warning)
                        .message(format!("brace placement is {actual:?}, expected {:?}", config.style))
                        .file_path(ctx.file_path().to_path_buf())
                        .start(node_start)
                        .end(brace_offset + 1)
                        .line(ctx.line_of(node_start))
                        .column(ctx.column_of(node_start))
                        .node_id(Some(node_id))
                        .build()
                        .expect("well-formed violation"),
                );
            }
        }
    }

    fn format(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: BraceStyleConfig = resolve_options(config);
        let source = ctx.source_code();
        let mut edits = Vec::new();
        for (_node_id, node_start, range) in body_braces(ctx.arena(), ctx.root_node()) {
            let Some(brace_offset) = find_body_brace(source, range) else { continue };
            if let Some(edit) = rewrite_brace(source, node_start, brace_offset, config.style) {
                edits.push(edit);
            }
        }
        ctx.with_fixer(|fixer| {
            for (range, replacement) in edits {
                fixer.replace_range(range, replacement);
            }
        });
    }

    fn validate_configuration(&self, options: &RuleOptions) -> Vec<String> {
        match serde_json::from_value::<BraceStyleConfig>(options.clone()) {
            Ok(_) => Vec::new(),
            Err(e) => vec![format!("invalid brace-style config: {e}")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_same_line_brace() {
        let source = "class Foo {\n}\n";
        let brace = find_body_brace(source, 0..source.len() as u32).unwrap();
        assert_eq!(brace_placement(source, brace), BraceStyle::SameLine);
    }

    #[test]
    fn finds_next_line_brace() {
        let source = "class Foo\n{\n}\n";
        let brace = find_body_brace(source, 0..source.len() as u32).unwrap();
        assert_eq!(brace_placement(source, brace), BraceStyle::NextLine);
    }

    #[test]
    fn skips_annotation_argument_braces() {
        let source = "@Foo({1, 2}) class Bar {\n}\n";
        let brace = find_body_brace(source, 0..source.len() as u32).unwrap();
        assert_eq!(source.as_bytes()[brace as usize], b'{');
        assert_eq!(brace_placement(source, brace), BraceStyle::SameLine);
        assert!(source[..brace as usize].ends_with("Bar "));
    }

    #[test]
    fn rewrite_to_next_line_uses_header_indent() {
        let source = "    class Foo {\n    }\n";
        let brace = find_body_brace(source, 4..source.len() as u32).unwrap();
        let (range, replacement) = rewrite_brace(source, 4, brace, BraceStyle::NextLine).unwrap();
        let mut rewritten = source.to_string();
        rewritten.replace_range(range.start as usize..range.end as usize, &replacement);
        assert!(rewritten.contains("Foo\n    {"));
    }
}
