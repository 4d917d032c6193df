//! Expression productions: a standard precedence-climbing parser from
//! assignment down to primaries, plus lambdas, method references, object/
//! array creation, instanceof-with-pattern, and switch expressions.

use crate::arena::{NodeId, NodeKind, TypeNameAttribute};
use crate::token::TokenType;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> NodeId {
        let _guard = match self.enter() {
            Ok(g) => g,
            Err(()) => return self.error_node("expression"),
        };
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> NodeId {
        if self.is_lambda_ahead() {
            return self.parse_lambda_expression();
        }
        let lhs = self.parse_ternary_expression();
        if self.peek_kind().is_assignment_operator() {
            let start = self.arena.start(lhs);
            self.bump();
            let rhs = self.parse_assignment_expression();
            let end = self.arena.end(rhs);
            let node = self.alloc(NodeKind::AssignmentExpression, start, end);
            self.append(node, lhs);
            self.append(node, rhs);
            return node;
        }
        lhs
    }

    fn parse_ternary_expression(&mut self) -> NodeId {
        let cond = self.parse_or_expression();
        if self.check(TokenType::Question) {
            let start = self.arena.start(cond);
            self.bump();
            let then_branch = self.parse_assignment_expression();
            self.expect(TokenType::Colon, "':'");
            let else_branch = self.parse_assignment_expression();
            let end = self.arena.end(else_branch);
            let node = self.alloc(NodeKind::ConditionalExpression, start, end);
            self.append(node, cond);
            self.append(node, then_branch);
            self.append(node, else_branch);
            return node;
        }
        cond
    }

    pub(super) fn parse_or_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(&[TokenType::OrOr], Self::parse_and_expression)
    }

    fn parse_and_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(&[TokenType::AndAnd], Self::parse_bitor_expression)
    }

    fn parse_bitor_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(&[TokenType::Pipe], Self::parse_bitxor_expression)
    }

    fn parse_bitxor_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(&[TokenType::Caret], Self::parse_bitand_expression)
    }

    fn parse_bitand_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(&[TokenType::Amp], Self::parse_equality_expression)
    }

    fn parse_equality_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(&[TokenType::Eq, TokenType::Ne], Self::parse_relational_expression)
    }

    /// Relational operators and `instanceof`, which (per Java 16+) may carry
    /// a pattern rather than a bare type.
    fn parse_relational_expression(&mut self) -> NodeId {
        let mut lhs = self.parse_shift_expression();
        loop {
            if self.check(TokenType::Instanceof) {
                let start = self.arena.start(lhs);
                self.bump();
                let pattern_or_type = if self.looks_like_instanceof_pattern() {
                    self.parse_pattern()
                } else {
                    self.parse_type()
                };
                let end = self.arena.end(pattern_or_type);
                let node = self.alloc(NodeKind::InstanceofExpression, start, end);
                self.append(node, lhs);
                self.append(node, pattern_or_type);
                lhs = node;
                continue;
            }
            if matches!(self.peek_kind(), TokenType::Lt | TokenType::Gt | TokenType::Le | TokenType::Ge) {
                let start = self.arena.start(lhs);
                self.bump();
                let rhs = self.parse_shift_expression();
                let end = self.arena.end(rhs);
                let node = self.alloc(NodeKind::BinaryExpression, start, end);
                self.append(node, lhs);
                self.append(node, rhs);
                lhs = node;
                continue;
            }
            break;
        }
        lhs
    }

    fn looks_like_instanceof_pattern(&self) -> bool {
        if self.is_primitive_type_start() {
            return true;
        }
        if !self.check(TokenType::Identifier) {
            return false;
        }
        // A bare `instanceof Type` has nothing following the type's last
        // token but the end of the expression context; a pattern binds an
        // identifier (or record-deconstructs), so look for an identifier or
        // `(` after the qualified name / generic args.
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
            Some(TokenType::Identifier | TokenType::LParen)
        )
    }

    fn parse_shift_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(
            &[TokenType::LShift, TokenType::RightShift, TokenType::UnsignedRightShift],
            Self::parse_additive_expression,
        )
    }

    fn parse_additive_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(&[TokenType::Plus, TokenType::Minus], Self::parse_multiplicative_expression)
    }

    fn parse_multiplicative_expression(&mut self) -> NodeId {
        self.parse_binary_left_assoc(
            &[TokenType::Star, TokenType::Slash, TokenType::Percent],
            Self::parse_unary_expression,
        )
    }

    fn parse_binary_left_assoc(
        &mut self,
        ops: &[TokenType],
        mut next: impl FnMut(&mut Self) -> NodeId,
    ) -> NodeId {
        let mut lhs = next(self);
        while ops.contains(&self.peek_kind()) {
            let start = self.arena.start(lhs);
            self.bump();
            let rhs = next(self);
            let end = self.arena.end(rhs);
            let node = self.alloc(NodeKind::BinaryExpression, start, end);
            self.append(node, lhs);
            self.append(node, rhs);
            lhs = node;
        }
        lhs
    }

    fn parse_unary_expression(&mut self) -> NodeId {
        let start = self.peek().start;
        if matches!(
            self.peek_kind(),
            TokenType::Plus
                | TokenType::Minus
                | TokenType::Bang
                | TokenType::Tilde
                | TokenType::PlusPlus
                | TokenType::MinusMinus
        ) {
            self.bump();
            let operand = self.parse_unary_expression();
            let end = self.arena.end(operand);
            let node = self.alloc(NodeKind::UnaryExpression, start, end);
            self.append(node, operand);
            return node;
        }
        if self.check(TokenType::LParen) && self.looks_like_cast() {
            return self.parse_cast_expression();
        }
        self.parse_postfix_expression()
    }

    /// Cast disambiguation: `( Type )` immediately followed by a token that
    /// can start a unary expression (not an operator that would make this an
    /// ordinary parenthesized expression, e.g. `(a) + b`). Pure token-level
    /// lookahead; never touches the arena, since speculative arena
    /// allocations can't be rolled back.
    fn looks_like_cast(&self) -> bool {
        let Some(after_type) = self.scan_type_tokens(self.pos + 1) else {
            return false;
        };
        if self.tokens.get(after_type).map(|t| t.kind) != Some(TokenType::RParen) {
            return false;
        }
        let next = after_type + 1;
        matches!(
            self.tokens.get(next).map(|t| t.kind),
            Some(
                TokenType::Identifier
                    | TokenType::IntLiteral
                    | TokenType::LongLiteral
                    | TokenType::FloatLiteral
                    | TokenType::DoubleLiteral
                    | TokenType::StringLiteral
                    | TokenType::CharLiteral
                    | TokenType::BooleanLiteral
                    | TokenType::NullLiteral
                    | TokenType::LParen
                    | TokenType::This
                    | TokenType::Super
                    | TokenType::New
                    | TokenType::Bang
                    | TokenType::Tilde
            )
        )
    }

    /// Scans a type starting at token index `i`, returning the index just
    /// past it, or `None` if `i` doesn't start one. Used only for lookahead.
    fn scan_type_tokens(&self, mut i: usize) -> Option<usize> {
        if self.is_primitive_type_start_at(i) {
            i += 1;
        } else if self.tokens.get(i).map(|t| t.kind) == Some(TokenType::Identifier) {
            i += 1;
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
                        Some(TokenType::Ge) => depth -= 1,
                        None => return None,
                        _ => {}
                    }
                    i += 1;
                    if depth <= 0 {
                        break;
                    }
                }
            }
        } else {
            return None;
        }
        while self.tokens.get(i).map(|t| t.kind) == Some(TokenType::LBracket)
            && self.tokens.get(i + 1).map(|t| t.kind) == Some(TokenType::RBracket)
        {
            i += 2;
        }
        Some(i)
    }

    fn is_primitive_type_start_at(&self, i: usize) -> bool {
        matches!(
            self.tokens.get(i).map(|t| t.kind),
            Some(
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
        )
    }

    fn parse_cast_expression(&mut self) -> NodeId {
        let start = self.bump().start; // '('
        let ty = self.parse_type();
        self.expect(TokenType::RParen, "')'");
        let operand = self.parse_unary_expression();
        let end = self.arena.end(operand);
        let node = self.alloc(NodeKind::CastExpression, start, end);
        self.append(node, ty);
        self.append(node, operand);
        node
    }

    fn parse_postfix_expression(&mut self) -> NodeId {
        let mut expr = self.parse_primary_expression();
        loop {
            match self.peek_kind() {
                TokenType::Dot => {
                    if self.peek_nth(1).kind == TokenType::Identifier
                        && self.peek_nth(2).kind == TokenType::LParen
                    {
                        expr = self.parse_method_invocation_suffix(expr);
                    } else {
                        expr = self.parse_field_access_suffix(expr);
                    }
                }
                TokenType::LBracket => {
                    let start = self.arena.start(expr);
                    self.bump();
                    let index = self.parse_expression();
                    let end = self.expect(TokenType::RBracket, "']'").end;
                    let node = self.alloc(NodeKind::ArrayAccess, start, end);
                    self.append(node, expr);
                    self.append(node, index);
                    expr = node;
                }
                TokenType::DoubleColon => {
                    expr = self.parse_method_reference_suffix(expr);
                }
                TokenType::PlusPlus | TokenType::MinusMinus => {
                    let start = self.arena.start(expr);
                    let end = self.bump().end;
                    let node = self.alloc(NodeKind::UnaryExpression, start, end);
                    self.append(node, expr);
                    expr = node;
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_field_access_suffix(&mut self, receiver: NodeId) -> NodeId {
        let start = self.arena.start(receiver);
        self.bump(); // '.'
        let name = self.expect(TokenType::Identifier, "member name");
        let node = self.alloc(NodeKind::FieldAccess, start, name.end);
        self.append(node, receiver);
        node
    }

    fn parse_method_invocation_suffix(&mut self, receiver: NodeId) -> NodeId {
        let start = self.arena.start(receiver);
        self.bump(); // '.'
        self.bump(); // name
        let node = self.alloc(NodeKind::MethodInvocation, start, start);
        self.append(node, receiver);
        self.parse_argument_list(node);
        let end = self.tokens[self.pos - 1].end;
        self.arena.set_end(node, end);
        node
    }

    fn parse_method_reference_suffix(&mut self, receiver: NodeId) -> NodeId {
        let start = self.arena.start(receiver);
        self.bump(); // '::'
        let end = if self.check(TokenType::New) {
            self.bump().end
        } else {
            self.expect(TokenType::Identifier, "method reference name").end
        };
        let node = self.alloc(NodeKind::MethodReference, start, end);
        self.append(node, receiver);
        node
    }

    pub(super) fn parse_argument_list(&mut self, node: NodeId) {
        self.expect(TokenType::LParen, "'('");
        if !self.check(TokenType::RParen) {
            loop {
                let arg = self.parse_expression();
                self.append(node, arg);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "')'");
    }

    fn parse_primary_expression(&mut self) -> NodeId {
        let start = self.peek().start;
        match self.peek_kind() {
            TokenType::IntLiteral
            | TokenType::LongLiteral
            | TokenType::FloatLiteral
            | TokenType::DoubleLiteral
            | TokenType::CharLiteral
            | TokenType::StringLiteral
            | TokenType::TextBlock
            | TokenType::BooleanLiteral
            | TokenType::NullLiteral => {
                let tok = self.bump();
                let node = self.alloc(NodeKind::Literal, tok.start, tok.end);
                self.attach_literal_value(node, tok.kind);
                node
            }
            TokenType::This => {
                let end = self.bump().end;
                self.alloc(NodeKind::ThisExpression, start, end)
            }
            TokenType::Super => {
                let end = self.bump().end;
                self.alloc(NodeKind::SuperExpression, start, end)
            }
            TokenType::LParen => {
                self.bump();
                let inner = self.parse_expression();
                let end = self.expect(TokenType::RParen, "')'").end;
                let node = self.alloc(NodeKind::ParenthesizedExpression, start, end);
                self.append(node, inner);
                node
            }
            TokenType::New => self.parse_object_or_array_creation(),
            TokenType::Switch => self.parse_switch_expression(),
            TokenType::Identifier => {
                let name_tok = self.bump();
                if self.check(TokenType::LParen) {
                    let node = self.alloc(NodeKind::MethodInvocation, start, start);
                    self.parse_argument_list(node);
                    let end = self.tokens[self.pos - 1].end;
                    self.arena.set_end(node, end);
                    self.arena.set_attribute(
                        node,
                        TypeNameAttribute {
                            simple_name: self.text_of(name_tok).to_string(),
                        },
                    );
                    node
                } else {
                    self.alloc(NodeKind::NameExpression, name_tok.start, name_tok.end)
                }
            }
            _ if self.is_primitive_type_start() => {
                // `int.class`-style literal references: treat the primitive
                // type token as a name expression placeholder.
                let tok = self.bump();
                self.alloc(NodeKind::NameExpression, tok.start, tok.end)
            }
            _ => self.error_node("expression"),
        }
    }

    fn attach_literal_value(&mut self, node: NodeId, kind: TokenType) {
        use crate::arena::LiteralAttribute;
        let value = match kind {
            TokenType::BooleanLiteral => {
                let text = self.source[self.arena.start(node) as usize..self.arena.end(node) as usize].to_string();
                Some(LiteralAttribute::Boolean(text == "true"))
            }
            TokenType::NullLiteral => Some(LiteralAttribute::Null),
            _ => None,
        };
        if let Some(v) = value {
            self.arena.set_attribute(node, v);
        }
    }

    fn parse_object_or_array_creation(&mut self) -> NodeId {
        let start = self.bump().start; // 'new'
        if self.check(TokenType::Lt) {
            // explicit type arguments on the constructor call; parsed and
            // discarded positionally (not separately modeled).
            let _ = self.parse_type_parameters_as_args();
        }
        let ty = if self.is_primitive_type_start() {
            let tok = self.bump();
            self.alloc(NodeKind::PrimitiveType, tok.start, tok.end)
        } else {
            self.parse_reference_type()
        };

        if self.check(TokenType::LBracket) {
            return self.parse_array_creation_rest(start, ty);
        }

        let node = self.alloc(NodeKind::ObjectCreationExpression, start, start);
        self.append(node, ty);
        self.parse_argument_list(node);
        let mut end = self.tokens[self.pos - 1].end;
        if self.check(TokenType::LBrace) {
            // Anonymous class body.
            end = self.parse_class_body(node);
        }
        self.arena.set_end(node, end);
        node
    }

    fn parse_type_parameters_as_args(&mut self) -> Vec<NodeId> {
        self.expect(TokenType::Lt, "'<'");
        let mut args = Vec::new();
        if !self.check(TokenType::Gt) {
            loop {
                args.push(self.parse_type());
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

    fn parse_array_creation_rest(&mut self, start: u32, element_type: NodeId) -> NodeId {
        let node = self.alloc(NodeKind::ArrayCreationExpression, start, start);
        self.append(node, element_type);
        let mut end = self.arena.end(element_type);
        let mut has_dims_expr = false;
        while self.check(TokenType::LBracket) {
            self.bump();
            if !self.check(TokenType::RBracket) {
                let dim = self.parse_expression();
                self.append(node, dim);
                has_dims_expr = true;
            }
            end = self.expect(TokenType::RBracket, "']'").end;
        }
        if !has_dims_expr && self.check(TokenType::LBrace) {
            let init = self.parse_array_initializer();
            end = self.arena.end(init);
            self.append(node, init);
        }
        self.arena.set_end(node, end);
        node
    }

    pub(super) fn parse_array_initializer(&mut self) -> NodeId {
        let start = self.expect(TokenType::LBrace, "'{'").start;
        let node = self.alloc(NodeKind::ArrayInitializer, start, start);
        if !self.check(TokenType::RBrace) {
            loop {
                if self.check(TokenType::RBrace) {
                    break;
                }
                let elem = if self.check(TokenType::LBrace) {
                    self.parse_array_initializer()
                } else {
                    self.parse_expression()
                };
                self.append(node, elem);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let end = self.expect(TokenType::RBrace, "'}'").end;
        self.arena.set_end(node, end);
        node
    }

    /// Lookahead for `(params) ->` or `identifier ->`, since both are valid
    /// lambda heads and otherwise indistinguishable from a parenthesized
    /// expression / bare name at this point in the grammar.
    fn is_lambda_ahead(&self) -> bool {
        if self.check(TokenType::Identifier) && self.peek_nth(1).kind == TokenType::Arrow {
            return true;
        }
        if !self.check(TokenType::LParen) {
            return false;
        }
        let mut i = self.pos;
        let mut depth = 0i32;
        loop {
            match self.tokens.get(i).map(|t| t.kind) {
                Some(TokenType::LParen) => depth += 1,
                Some(TokenType::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return self.tokens.get(i + 1).map(|t| t.kind) == Some(TokenType::Arrow);
                    }
                }
                None => return false,
                _ => {}
            }
            i += 1;
            if i - self.pos > 2048 {
                return false;
            }
        }
    }

    fn parse_lambda_expression(&mut self) -> NodeId {
        let start = self.peek().start;
        let node = self.alloc(NodeKind::LambdaExpression, start, start);
        if self.check(TokenType::Identifier) {
            let name = self.bump();
            let param = self.alloc(NodeKind::Parameter, name.start, name.end);
            self.append(node, param);
        } else {
            self.bump(); // '('
            if !self.check(TokenType::RParen) {
                loop {
                    let pstart = self.peek().start;
                    // Typed or untyped lambda parameter; both reduce to a
                    // `Parameter` node with an optional type child.
                    if self.looks_like_lambda_typed_param() {
                        let ty = self.parse_type();
                        let name = self.expect(TokenType::Identifier, "parameter name");
                        let param = self.alloc(NodeKind::Parameter, pstart, name.end);
                        self.append(param, ty);
                        self.append(node, param);
                    } else {
                        let name = self.expect(TokenType::Identifier, "parameter name");
                        let param = self.alloc(NodeKind::Parameter, pstart, name.end);
                        self.append(node, param);
                    }
                    if self.check(TokenType::Comma) {
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
            self.expect(TokenType::RParen, "')'");
        }
        self.expect(TokenType::Arrow, "'->'");
        let body = if self.check(TokenType::LBrace) {
            self.parse_block()
        } else {
            self.parse_expression()
        };
        let end = self.arena.end(body);
        self.append(node, body);
        self.arena.set_end(node, end);
        node
    }

    fn looks_like_lambda_typed_param(&self) -> bool {
        if self.is_primitive_type_start() {
            return true;
        }
        if !self.check(TokenType::Identifier) {
            return false;
        }
        self.peek_nth(1).kind == TokenType::Identifier
    }

    /// `switch (e) { case P -> expr; ... }` in expression position, sharing
    /// the statement form's block parsing.
    fn parse_switch_expression(&mut self) -> NodeId {
        let start = self.bump().start; // 'switch'
        self.expect(TokenType::LParen, "'('");
        let selector = self.parse_expression();
        self.expect(TokenType::RParen, "')'");
        let node = self.alloc(NodeKind::SwitchExpression, start, start);
        self.append(node, selector);
        let end = self.parse_switch_block(node);
        self.arena.set_end(node, end);
        node
    }
}

impl TokenType {
    fn is_assignment_operator(self) -> bool {
        matches!(
            self,
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
}
