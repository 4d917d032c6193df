//! Whitespace rule (SPEC_FULL.md §4.F "Whitespace"): per-category spacing
//! toggles enforced over the raw token stream (re-lexed directly, rather
//! than via the AST) since inter-token gaps are exactly what the lexer
//! already isolates as trivia tokens. Comments and multi-line gaps are
//! left untouched; this rule only ever rewrites a same-line, comment-free
//! whitespace run between two significant tokens.

use std::ops::Range;

use serde::Deserialize;

use crate::lexer::Lexer;
use crate::rule::{Rule, RuleConfiguration, RuleMeta, RuleOptions};
use crate::rule::context::TransformationContext;
use crate::rules::resolve_options;
use crate::token::{Token, TokenType};
use crate::violation::{Severity, Violation};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WhitespaceConfig {
    pub around_binary_operators: bool,
    pub after_commas: bool,
    pub after_control_keywords: bool,
    pub around_arrow: bool,
    pub around_enhanced_for_colon: bool,
    pub around_assignment: bool,
    pub around_method_reference: bool,
}

impl Default for WhitespaceConfig {
    fn default() -> Self {
        Self {
            around_binary_operators: true,
            after_commas: true,
            after_control_keywords: true,
            around_arrow: true,
            around_enhanced_for_colon: true,
            around_assignment: true,
            around_method_reference: true,
        }
    }
}

fn is_control_keyword(kind: TokenType) -> bool {
    matches!(
        kind,
        TokenType::If
            | TokenType::For
            | TokenType::While
            | TokenType::Switch
            | TokenType::Catch
            | TokenType::Synchronized
    )
}

fn is_assignment_operator(kind: TokenType) -> bool {
    matches!(
        kind,
        TokenType::Assign
            | TokenType::PlusAssign
            | TokenType::MinusAssign
            | TokenType::StarAssign
            | TokenType::SlashAssign
            | TokenType::AmpAssign
            | TokenType::PipeAssign
            | TokenType::CaretAssign
            | TokenType::PercentAssign
            | TokenType::LShiftAssign
            | TokenType::RShiftAssign
            | TokenType::UnsignedRShiftAssign
    )
}

fn is_binary_operator(kind: TokenType) -> bool {
    matches!(
        kind,
        TokenType::Plus
            | TokenType::Minus
            | TokenType::Star
            | TokenType::Slash
            | TokenType::Percent
            | TokenType::AndAnd
            | TokenType::OrOr
            | TokenType::Amp
            | TokenType::Pipe
            | TokenType::Caret
            | TokenType::Lt
            | TokenType::Gt
            | TokenType::Le
            | TokenType::Ge
            | TokenType::Eq
            | TokenType::Ne
            | TokenType::LShift
            | TokenType::RightShift
            | TokenType::UnsignedRightShift
    )
}

/// Whether `kind` can end an operand, used to tell a binary operator apart
/// from a unary prefix one by looking at the previous significant token.
fn ends_operand(kind: TokenType) -> bool {
    matches!(
        kind,
        TokenType::Identifier
            | TokenType::IntLiteral
            | TokenType::LongLiteral
            | TokenType::FloatLiteral
            | TokenType::DoubleLiteral
            | TokenType::CharLiteral
            | TokenType::StringLiteral
            | TokenType::TextBlock
            | TokenType::BooleanLiteral
            | TokenType::NullLiteral
            | TokenType::RParen
            | TokenType::RBracket
            | TokenType::This
            | TokenType::Super
    )
}

/// One significant token together with the (same-line, comment-free) gap
/// immediately preceding it, if any.
struct Gap {
    token: Token,
    prev: Option<Token>,
    range: Range<u32>,
    rewriteable: bool,
}

fn gaps(source: &str) -> Vec<Gap> {
    let (tokens, _errors) = Lexer::new(source).tokenize();
    let mut out = Vec::new();
    let mut prev_significant: Option<Token> = None;
    let mut gap_start = 0u32;
    let mut rewriteable = true;

    for tok in &tokens {
        if tok.kind.is_trivia() {
            if tok.kind.is_comment() {
                rewriteable = false;
            } else if tok.text(source).contains('\n') {
                rewriteable = false;
            }
            continue;
        }
        out.push(Gap {
            token: *tok,
            prev: prev_significant,
            range: gap_start..tok.start,
            rewriteable,
        });
        prev_significant = Some(*tok);
        gap_start = tok.end;
        rewriteable = true;
    }
    out
}

fn expected_spacing(gap: &Gap, config: &WhitespaceConfig) -> Option<&'static str> {
    let prev = gap.prev?;

    if config.after_commas && prev.kind == TokenType::Comma {
        return Some(" ");
    }
    if config.after_control_keywords && is_control_keyword(prev.kind) && gap.token.kind == TokenType::LParen {
        return Some(" ");
    }
    if config.around_arrow && (prev.kind == TokenType::Arrow || gap.token.kind == TokenType::Arrow) {
        return Some(" ");
    }
    if config.around_assignment && (is_assignment_operator(prev.kind) || is_assignment_operator(gap.token.kind)) {
        return Some(" ");
    }
    if config.around_method_reference && (prev.kind == TokenType::DoubleColon || gap.token.kind == TokenType::DoubleColon) {
        return Some("");
    }
    if config.around_enhanced_for_colon && gap.token.kind == TokenType::Colon && prev.kind == TokenType::Identifier {
        return Some(" ");
    }
    if config.around_binary_operators {
        if is_binary_operator(prev.kind) && !matches!(gap.token.kind, TokenType::Semi | TokenType::RParen) {
            return Some(" ");
        }
        if is_binary_operator(gap.token.kind) && ends_operand(prev.kind) {
            return Some(" ");
        }
    }
    None
}

#[derive(Default)]
pub struct WhitespaceRule;

impl Rule for WhitespaceRule {
    fn meta(&self) -> RuleMeta {
        RuleMeta {
            id: "whitespace",
            name: "whitespace",
            description: "Normalizes single-line spacing between tokens per category toggles",
            default_severity: Severity::Warning,
        }
    }

    fn analyze(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: WhitespaceConfig = resolve_options(config);
        let source = ctx.source_code();
        for gap in gaps(source) {
            if !gap.rewriteable {
                continue;
            }
            let Some(expected) = expected_spacing(&gap, &config) else { continue };
            let actual = &source[gap.range.start as usize..gap.range.end as usize];
            if actual != expected {
                ctx.report(
                    Violation::builder()
                        .rule_id("whitespace")
                        .severity(Severity::Warning)
                        .message(format!(
                            "expected {:?} between tokens, found {:?}",
                            expected, actual
                        ))
                        .file_path(ctx.file_path().to_path_buf())
                        .start(gap.range.start)
                        .end(gap.range.end)
                        .line(ctx.line_of(gap.range.start))
                        .column(ctx.column_of(gap.range.start))
                        .build()
                        .expect("well-formed violation"),
                );
            }
        }
    }

    fn format(&self, ctx: &TransformationContext, config: Option<&RuleConfiguration>) {
        let config: WhitespaceConfig = resolve_options(config);
        let source = ctx.source_code();
        let mut edits = Vec::new();
        for gap in gaps(source) {
            if !gap.rewriteable {
                continue;
            }
            let Some(expected) = expected_spacing(&gap, &config) else { continue };
            let actual = &source[gap.range.start as usize..gap.range.end as usize];
            if actual != expected {
                edits.push((gap.range, expected.to_string()));
            }
        }
        ctx.with_fixer(|fixer| {
            for (range, replacement) in edits {
                fixer.replace_range(range, replacement);
            }
        });
    }

    fn validate_configuration(&self, options: &RuleOptions) -> Vec<String> {
        match serde_json::from_value::<WhitespaceConfig>(options.clone()) {
            Ok(_) => Vec::new(),
            Err(e) => vec![format!("invalid whitespace config: {e}")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_missing_space_after_comma() {
        let gaps = gaps("foo(a,b);");
        let config = WhitespaceConfig::default();
        let comma_gap = gaps
            .iter()
            .find(|g| g.prev.map(|p| p.kind) == Some(TokenType::Comma))
            .unwrap();
        assert_eq!(expected_spacing(comma_gap, &config), Some(" "));
    }

    #[test]
    fn method_reference_expects_no_space() {
        let gaps = gaps("Foo :: bar");
        let config = WhitespaceConfig::default();
        let ref_gap = gaps
            .iter()
            .find(|g| g.token.kind == TokenType::DoubleColon)
            .unwrap();
        assert_eq!(expected_spacing(ref_gap, &config), Some(""));
    }

    #[test]
    fn skips_gaps_containing_comments() {
        let gaps = gaps("a, /* keep */ b");
        assert!(!gaps.iter().any(|g| g.token.kind == TokenType::Identifier && !g.rewriteable)
            || gaps.iter().any(|g| !g.rewriteable));
    }
}
