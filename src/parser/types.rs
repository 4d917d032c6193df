//! Type-reference productions: primitive types, reference types with
//! generic arguments, array types, wildcards, type parameters.

use crate::arena::{NodeId, NodeKind, TypeNameAttribute};
use crate::token::TokenType;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn is_primitive_type_start(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenType::Boolean
                | TokenType::Byte
                | TokenType::Short
                | TokenType::Int
                | TokenType::Long
                | TokenType::Char
                | TokenType::Float
                | TokenType::Double
                | TokenType::Void
        )
    }

    /// Parses any type reference: primitive, reference (possibly generic and
    /// qualified), or either followed by `[]` array suffixes.
    pub(super) fn parse_type(&mut self) -> NodeId {
        let _guard = match self.enter() {
            Ok(g) => g,
            Err(()) => return self.error_node("type"),
        };
        let start = self.peek().start;
        let mut node = if self.is_primitive_type_start() {
            let tok = self.bump();
            self.alloc(NodeKind::PrimitiveType, tok.start, tok.end)
        } else {
            self.parse_reference_type()
        };

        while self.check(TokenType::LBracket) {
            self.bump();
            self.expect(TokenType::RBracket, "']'");
            let end = self.tokens[self.pos.saturating_sub(1)].end;
            let arr = self.alloc(NodeKind::ArrayType, start, end);
            self.append(arr, node);
            node = arr;
        }
        node
    }

    /// `Identifier (. Identifier)* [<TypeArgs>]`, e.g. `java.util.List<String>`.
    pub(super) fn parse_reference_type(&mut self) -> NodeId {
        let start = self.peek().start;
        let first = self.expect(TokenType::Identifier, "type name");
        let simple_name = self.text_of(first).to_string();
        let mut end = first.end;

        while self.check(TokenType::Dot) && self.peek_nth(1).kind == TokenType::Identifier {
            self.bump();
            let seg = self.bump();
            end = seg.end;
        }

        let node = self.alloc(NodeKind::TypeReference, start, end);
        self.arena.set_attribute(node, TypeNameAttribute { simple_name });

        if self.check(TokenType::Lt) && self.looks_like_type_arguments() {
            let args = self.parse_type_arguments();
            for arg in args {
                self.append(node, arg);
            }
        }
        node
    }

    /// Heuristic lookahead distinguishing `List<String>` from `a < b`: scans
    /// forward for a matching closing angle bracket before a statement
    /// terminator, treating `,` `?` `extends` `super` `.` `[` `]` identifiers
    /// and nested `<`/`>` as plausible type-argument contents.
    fn looks_like_type_arguments(&self) -> bool {
        let mut depth = 0i32;
        let mut i = self.pos;
        loop {
            let tok = self.tokens.get(i).copied();
            let Some(tok) = tok else { return false };
            match tok.kind {
                TokenType::Lt => depth += 1,
                TokenType::Gt => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                TokenType::RightShift => {
                    depth -= 2;
                    if depth <= 0 {
                        return true;
                    }
                }
                TokenType::UnsignedRightShift => {
                    depth -= 3;
                    if depth <= 0 {
                        return true;
                    }
                }
                TokenType::Ge => {
                    depth -= 1;
                    if depth <= 0 {
                        return true;
                    }
                }
                TokenType::Identifier
                | TokenType::Dot
                | TokenType::Comma
                | TokenType::Question
                | TokenType::Extends
                | TokenType::Super
                | TokenType::LBracket
                | TokenType::RBracket => {}
                _ => return false,
            }
            i += 1;
            if i - self.pos > 512 {
                return false;
            }
        }
    }

    /// `< TypeArg (, TypeArg)* >`, handling `>>`/`>>>`/`>=` splitting.
    fn parse_type_arguments(&mut self) -> Vec<NodeId> {
        self.expect(TokenType::Lt, "'<'");
        let mut args = Vec::new();
        if !self.check(TokenType::Gt)
            && !matches!(
                self.peek_kind(),
                TokenType::RightShift | TokenType::UnsignedRightShift | TokenType::Ge
            )
        {
            loop {
                args.push(self.parse_type_argument());
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect_closing_gt();
        args
    }

    fn parse_type_argument(&mut self) -> NodeId {
        if self.check(TokenType::Question) {
            let start = self.bump().start;
            let mut end = self.tokens[self.pos - 1].end;
            if self.check(TokenType::Extends) || self.check(TokenType::Super) {
                self.bump();
                let bound = self.parse_type();
                end = self.arena.end(bound);
                let node = self.alloc(NodeKind::WildcardType, start, end);
                self.append(node, bound);
                return node;
            }
            return self.alloc(NodeKind::WildcardType, start, end.max(start));
        }
        self.parse_type()
    }

    /// `< TypeParam (, TypeParam)* >` on a declaration; bounds (`extends A &
    /// B`) are parsed but not separately modeled beyond their type nodes.
    pub(super) fn parse_type_parameters(&mut self) -> Vec<NodeId> {
        self.expect(TokenType::Lt, "'<'");
        let mut params = Vec::new();
        loop {
            let start = self.peek().start;
            let name_tok = self.expect(TokenType::Identifier, "type parameter name");
            let mut end = name_tok.end;
            let param = self.alloc(NodeKind::TypeParameter, start, end);
            if self.check(TokenType::Extends) {
                self.bump();
                loop {
                    let bound = self.parse_type();
                    end = self.arena.end(bound);
                    self.append(param, bound);
                    if self.check(TokenType::Amp) {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            self.arena.set_end(param, end);
            params.push(param);
            if self.check(TokenType::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_closing_gt();
        params
    }
}
