//! Pattern productions shared by `instanceof` and `case` labels: type
//! patterns, record (deconstruction) patterns, the unnamed pattern `_`, and
//! guarded patterns (`when`).

use crate::arena::{NodeId, NodeKind};
use crate::token::TokenType;

use super::Parser;

impl<'a> Parser<'a> {
    /// Case-label element per SPEC_FULL.md §4.C: try a pattern first (type
    /// pattern, record pattern, or unnamed `_`), else fall back to a
    /// case-label expression that stops at logical-or precedence so it never
    /// swallows the arm's `:`/`->`.
    pub(super) fn parse_case_label_element(&mut self) -> NodeId {
        if self.check(TokenType::NullLiteral) || self.check(TokenType::Default) {
            return self.parse_case_label_expression();
        }
        if self.looks_like_pattern() {
            return self.parse_pattern();
        }
        self.parse_case_label_expression()
    }

    /// Lookahead: a primitive type, or `Identifier(.Identifier)*[<...>]`
    /// followed by `(` (record pattern), an identifier/`_` (type pattern
    /// binding), or standalone `_` already consumed as the identifier case.
    fn looks_like_pattern(&self) -> bool {
        if self.is_primitive_type_start() {
            return true;
        }
        if !self.check(TokenType::Identifier) {
            return false;
        }
        if self.text_of(self.peek()) == "_" {
            return true;
        }
        let mut i = self.pos + 1;
        while self.tokens.get(i).map(|t| t.kind) == Some(TokenType::Dot)
            && self.tokens.get(i + 1).map(|t| t.kind) == Some(TokenType::Identifier)
        {
            i += 2;
        }
        if self.tokens.get(i).map(|t| t.kind) == Some(TokenType::Lt) {
            let mut depth = 0i32;
            loop {
                match self.tokens.get(i).map(|t| t.kind) {
                    Some(TokenType::Lt) => depth += 1,
                    Some(TokenType::Gt) => depth -= 1,
                    Some(TokenType::RightShift) => depth -= 2,
                    Some(TokenType::UnsignedRightShift) => depth -= 3,
                    None => return false,
                    _ => {}
                }
                i += 1;
                if depth <= 0 {
                    break;
                }
            }
        }
        matches!(
            self.tokens.get(i).map(|t| t.kind),
            Some(TokenType::LParen | TokenType::Identifier)
        )
    }

    /// A type pattern, record pattern, or unnamed pattern, optionally
    /// followed by a `when` guard (a `GuardedPattern` wrapper).
    pub(super) fn parse_pattern(&mut self) -> NodeId {
        let start = self.peek().start;

        if self.check(TokenType::Identifier) && self.text_of(self.peek()) == "_" {
            let tok = self.bump();
            return self.alloc(NodeKind::UnnamedPattern, tok.start, tok.end);
        }

        let ty = self.parse_type();
        let base = if self.check(TokenType::LParen) {
            self.parse_record_pattern_rest(start, ty)
        } else {
            let mut end = self.arena.end(ty);
            let node = self.alloc(NodeKind::TypePattern, start, end);
            self.append(node, ty);
            if self.check(TokenType::Identifier) {
                let name = self.bump();
                end = name.end;
            }
            self.arena.set_end(node, end);
            node
        };

        if self.check(TokenType::Identifier) && self.text_of(self.peek()) == "when" {
            self.bump();
            let guard = self.parse_or_expression();
            let end = self.arena.end(guard);
            let node = self.alloc(NodeKind::GuardedPattern, start, end);
            self.append(node, base);
            self.append(node, guard);
            return node;
        }
        base
    }

    fn parse_record_pattern_rest(&mut self, start: u32, ty: NodeId) -> NodeId {
        let node = self.alloc(NodeKind::RecordPattern, start, start);
        self.append(node, ty);
        self.expect(TokenType::LParen, "'('");
        if !self.check(TokenType::RParen) {
            loop {
                let component = self.parse_pattern();
                self.append(node, component);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(TokenType::RParen, "')'").end;
        self.arena.set_end(node, end);
        node
    }

    /// A case-label expression: logical-or precedence ceiling, so it never
    /// consumes a ternary `?`/`:` that would collide with the arm's own
    /// colon.
    fn parse_case_label_expression(&mut self) -> NodeId {
        self.parse_or_expression()
    }
}
