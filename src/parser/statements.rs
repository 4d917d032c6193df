//! Statement productions: blocks, control flow, try-with-resources, switch
//! statements, and local variable declarations.

use crate::arena::{NodeId, NodeKind};
use crate::token::TokenType;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_block(&mut self) -> NodeId {
        let _guard = match self.enter() {
            Ok(g) => g,
            Err(()) => return self.error_node("block"),
        };
        let start = self.expect(TokenType::LBrace, "'{'").start;
        let node = self.alloc(NodeKind::Block, start, start);
        while !self.check(TokenType::RBrace) && !self.at_eof() {
            self.emit_leading_trivia(node);
            if self.check(TokenType::RBrace) {
                break;
            }
            let before = self.pos;
            let stmt = self.parse_statement();
            self.append(node, stmt);
            if self.pos == before {
                // Guard against a statement production that consumed
                // nothing (malformed input); force progress.
                self.bump();
            }
        }
        let end = self.expect(TokenType::RBrace, "'}'").end;
        self.arena.set_end(node, end);
        node
    }

    pub(super) fn parse_statement(&mut self) -> NodeId {
        let _guard = match self.enter() {
            Ok(g) => g,
            Err(()) => return self.error_node("statement"),
        };
        match self.peek_kind() {
            TokenType::LBrace => self.parse_block(),
            TokenType::If => self.parse_if_statement(),
            TokenType::While => self.parse_while_statement(),
            TokenType::Do => self.parse_do_while_statement(),
            TokenType::For => self.parse_for_statement(),
            TokenType::Return => self.parse_return_statement(),
            TokenType::Throw => self.parse_throw_statement(),
            TokenType::Try => self.parse_try_statement(),
            TokenType::Switch => self.parse_switch_statement(),
            TokenType::Break => self.parse_break_statement(),
            TokenType::Continue => self.parse_continue_statement(),
            TokenType::Assert => self.parse_assert_statement(),
            TokenType::Synchronized => self.parse_synchronized_statement(),
            TokenType::Semi => {
                let tok = self.bump();
                self.alloc(NodeKind::EmptyStatement, tok.start, tok.end)
            }
            TokenType::Identifier
                if self.text_of(self.peek()) == "yield"
                    && !matches!(
                        self.peek_nth(1).kind,
                        TokenType::Semi | TokenType::Dot | TokenType::LParen | TokenType::Assign
                    ) =>
            {
                self.parse_yield_statement()
            }
            TokenType::Identifier if self.peek_nth(1).kind == TokenType::Colon => {
                self.parse_labeled_statement()
            }
            _ if self.looks_like_local_variable_declaration() => {
                self.parse_local_variable_declaration_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_if_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'if'
        self.expect(TokenType::LParen, "'('");
        let cond = self.parse_expression();
        self.expect(TokenType::RParen, "')'");
        let then_branch = self.parse_statement();
        let mut end = self.arena.end(then_branch);
        let node = self.alloc(NodeKind::IfStatement, start, end);
        self.append(node, cond);
        self.append(node, then_branch);
        if self.check(TokenType::Else) {
            self.bump();
            let else_branch = self.parse_statement();
            end = self.arena.end(else_branch);
            self.append(node, else_branch);
        }
        self.arena.set_end(node, end);
        node
    }

    fn parse_while_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'while'
        self.expect(TokenType::LParen, "'('");
        let cond = self.parse_expression();
        self.expect(TokenType::RParen, "')'");
        let body = self.parse_statement();
        let end = self.arena.end(body);
        let node = self.alloc(NodeKind::WhileStatement, start, end);
        self.append(node, cond);
        self.append(node, body);
        node
    }

    fn parse_do_while_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'do'
        let body = self.parse_statement();
        self.expect(TokenType::While, "'while'");
        self.expect(TokenType::LParen, "'('");
        let cond = self.parse_expression();
        self.expect(TokenType::RParen, "')'");
        let end = self.expect(TokenType::Semi, "';'").end;
        let node = self.alloc(NodeKind::DoWhileStatement, start, end);
        self.append(node, body);
        self.append(node, cond);
        node
    }

    /// Speculatively tries the enhanced-for shape `[modifiers] Type
    /// Identifier :` before committing to a C-style `for`, per SPEC_FULL.md
    /// §4.C's disambiguation rule.
    fn parse_for_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'for'
        self.expect(TokenType::LParen, "'('");

        if let Some(node) = self.try_parse_enhanced_for(start) {
            return node;
        }

        let node = self.alloc(NodeKind::ForStatement, start, start);
        if self.looks_like_local_variable_declaration() {
            let init = self.parse_local_variable_declaration(TokenType::Semi);
            self.expect(TokenType::Semi, "';'");
            self.append(node, init);
        } else if !self.check(TokenType::Semi) {
            loop {
                let e = self.parse_expression();
                self.append(node, e);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect(TokenType::Semi, "';'");
        } else {
            self.bump();
        }

        if !self.check(TokenType::Semi) {
            let cond = self.parse_expression();
            self.append(node, cond);
        }
        self.expect(TokenType::Semi, "';'");

        if !self.check(TokenType::RParen) {
            loop {
                let e = self.parse_expression();
                self.append(node, e);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "')'");
        let body = self.parse_statement();
        let end = self.arena.end(body);
        self.append(node, body);
        self.arena.set_end(node, end);
        node
    }

    fn try_parse_enhanced_for(&mut self, start: u32) -> Option<NodeId> {
        let checkpoint = self.checkpoint();
        let modifiers = self.parse_modifiers();
        if !self.looks_like_type_start() {
            self.restore(checkpoint);
            return None;
        }
        let ty = self.parse_type();
        if !self.check(TokenType::Identifier) {
            self.restore(checkpoint);
            return None;
        }
        let name_tok = self.bump();
        if !self.check(TokenType::Colon) {
            self.restore(checkpoint);
            return None;
        }
        self.bump(); // ':'

        let iterable = self.parse_expression();
        self.expect(TokenType::RParen, "')'");
        let body = self.parse_statement();
        let end = self.arena.end(body);

        let node = self.alloc(NodeKind::EnhancedForStatement, start, end);
        self.append(node, modifiers);
        self.append(node, ty);
        let var = self.parse_variable_declarator_rest(name_tok);
        self.append(node, var);
        self.append(node, iterable);
        self.append(node, body);
        Some(node)
    }

    fn parse_return_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'return'
        let node = self.alloc(NodeKind::ReturnStatement, start, start);
        if !self.check(TokenType::Semi) {
            let value = self.parse_expression();
            self.append(node, value);
        }
        let end = self.expect(TokenType::Semi, "';'").end;
        self.arena.set_end(node, end);
        node
    }

    fn parse_throw_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'throw'
        let value = self.parse_expression();
        let end = self.expect(TokenType::Semi, "';'").end;
        let node = self.alloc(NodeKind::ThrowStatement, start, end);
        self.append(node, value);
        node
    }

    /// `try [(Resource;...)] Block [catch (...) Block]* [finally Block]`.
    fn parse_try_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'try'
        let node = self.alloc(NodeKind::TryStatement, start, start);

        if self.check(TokenType::LParen) {
            self.bump();
            loop {
                let res = self.parse_resource();
                self.append(node, res);
                if self.check(TokenType::Semi) {
                    self.bump();
                    if self.check(TokenType::RParen) {
                        break;
                    }
                } else {
                    break;
                }
            }
            self.expect(TokenType::RParen, "')'");
        }

        let body = self.parse_block();
        let mut end = self.arena.end(body);
        self.append(node, body);

        while self.check(TokenType::Catch) {
            let catch_start = self.bump().start;
            self.expect(TokenType::LParen, "'('");
            let modifiers = self.parse_modifiers();
            let catch_node = self.alloc(NodeKind::CatchClause, catch_start, catch_start);
            self.append(catch_node, modifiers);
            loop {
                let t = self.parse_type();
                self.append(catch_node, t);
                if self.check(TokenType::Pipe) {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect(TokenType::Identifier, "catch parameter name");
            self.expect(TokenType::RParen, "')'");
            let catch_body = self.parse_block();
            end = self.arena.end(catch_body);
            self.append(catch_node, catch_body);
            self.arena.set_end(catch_node, end);
            self.append(node, catch_node);
        }

        if self.check(TokenType::Finally) {
            self.bump();
            let finally_body = self.parse_block();
            end = self.arena.end(finally_body);
            self.append(node, finally_body);
        }

        self.arena.set_end(node, end);
        node
    }

    /// `[final] Type name = expr` (declared resource) or a bare variable
    /// reference (try-with-resources variable-reference form).
    fn parse_resource(&mut self) -> NodeId {
        let start = self.peek().start;
        if self.looks_like_local_variable_declaration() {
            let modifiers = self.parse_modifiers();
            let ty = self.parse_type();
            let name_tok = self.expect(TokenType::Identifier, "resource name");
            self.expect(TokenType::Assign, "'='");
            let init = self.parse_expression();
            let end = self.arena.end(init);
            let node = self.alloc(NodeKind::Resource, start, end);
            self.append(node, modifiers);
            self.append(node, ty);
            let decl = self.alloc(NodeKind::VariableDeclarator, name_tok.start, end);
            self.append(decl, init);
            self.append(node, decl);
            node
        } else {
            let expr = self.parse_expression();
            let end = self.arena.end(expr);
            let node = self.alloc(NodeKind::Resource, start, end);
            self.append(node, expr);
            node
        }
    }

    /// Statement form: `switch (e) { case ...: stmts }` or the arrow form
    /// `switch (e) { case ... -> stmt; }`. Both share `SwitchStatement`.
    fn parse_switch_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'switch'
        self.expect(TokenType::LParen, "'('");
        let selector = self.parse_expression();
        self.expect(TokenType::RParen, "')'");
        let node = self.alloc(NodeKind::SwitchStatement, start, start);
        self.append(node, selector);
        let end = self.parse_switch_block(node);
        self.arena.set_end(node, end);
        node
    }

    /// Shared by switch statements and switch expressions: `{ rule* }`.
    pub(super) fn parse_switch_block(&mut self, node: NodeId) -> u32 {
        self.expect(TokenType::LBrace, "'{'");
        while !self.check(TokenType::RBrace) && !self.at_eof() {
            self.emit_leading_trivia(node);
            if self.check(TokenType::RBrace) {
                break;
            }
            let rule = self.parse_switch_rule_or_labeled_group();
            self.append(node, rule);
        }
        self.expect(TokenType::RBrace, "'}'").end
    }

    fn parse_switch_rule_or_labeled_group(&mut self) -> NodeId {
        let start = self.peek().start;
        let label = self.parse_switch_label();

        if self.check(TokenType::Arrow) {
            self.bump();
            let body = if self.check(TokenType::LBrace) {
                self.parse_block()
            } else if self.check(TokenType::Throw) {
                self.parse_throw_statement()
            } else {
                let e = self.parse_expression();
                self.expect(TokenType::Semi, "';'");
                e
            };
            let end = self.arena.end(body);
            let node = self.alloc(NodeKind::SwitchRule, start, end);
            self.append(node, label);
            self.append(node, body);
            node
        } else {
            // Colon form: group all statements up to the next label/`}`
            // under one `SwitchRule` node.
            let node = self.alloc(NodeKind::SwitchRule, start, start);
            self.append(node, label);
            let mut end = self.arena.end(label);
            while !matches!(self.peek_kind(), TokenType::Case | TokenType::Default | TokenType::RBrace)
                && !self.at_eof()
            {
                let stmt = self.parse_statement();
                end = self.arena.end(stmt);
                self.append(node, stmt);
            }
            self.arena.set_end(node, end);
            node
        }
    }

    fn parse_switch_label(&mut self) -> NodeId {
        let start = self.peek().start;
        if self.check(TokenType::Default) {
            let end = self.bump().end;
            let node = self.alloc(NodeKind::SwitchLabel, start, end);
            self.expect(TokenType::Colon, "':'");
            return node;
        }
        self.expect(TokenType::Case, "'case'");
        let node = self.alloc(NodeKind::SwitchLabel, start, start);
        loop {
            let elem = self.parse_case_label_element();
            self.append(node, elem);
            if self.check(TokenType::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        let end = if self.check(TokenType::Arrow) {
            self.peek().start
        } else {
            self.expect(TokenType::Colon, "':'").end
        };
        self.arena.set_end(node, end);
        node
    }

    fn parse_break_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'break'
        let node = self.alloc(NodeKind::BreakStatement, start, start);
        if self.check(TokenType::Identifier) {
            self.bump();
        }
        let end = self.expect(TokenType::Semi, "';'").end;
        self.arena.set_end(node, end);
        node
    }

    fn parse_continue_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'continue'
        let node = self.alloc(NodeKind::ContinueStatement, start, start);
        if self.check(TokenType::Identifier) {
            self.bump();
        }
        let end = self.expect(TokenType::Semi, "';'").end;
        self.arena.set_end(node, end);
        node
    }

    fn parse_yield_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'yield'
        let value = self.parse_expression();
        let end = self.expect(TokenType::Semi, "';'").end;
        let node = self.alloc(NodeKind::YieldStatement, start, end);
        self.append(node, value);
        node
    }

    fn parse_assert_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'assert'
        let cond = self.parse_expression();
        let node = self.alloc(NodeKind::AssertStatement, start, start);
        self.append(node, cond);
        if self.check(TokenType::Colon) {
            self.bump();
            let message = self.parse_expression();
            self.append(node, message);
        }
        let end = self.expect(TokenType::Semi, "';'").end;
        self.arena.set_end(node, end);
        node
    }

    fn parse_synchronized_statement(&mut self) -> NodeId {
        let start = self.bump().start; // 'synchronized'
        self.expect(TokenType::LParen, "'('");
        let lock = self.parse_expression();
        self.expect(TokenType::RParen, "')'");
        let body = self.parse_block();
        let end = self.arena.end(body);
        let node = self.alloc(NodeKind::SynchronizedStatement, start, end);
        self.append(node, lock);
        self.append(node, body);
        node
    }

    fn parse_labeled_statement(&mut self) -> NodeId {
        let start = self.peek().start;
        self.bump(); // label identifier
        self.bump(); // ':'
        let inner = self.parse_statement();
        let end = self.arena.end(inner);
        let node = self.alloc(NodeKind::LabeledStatement, start, end);
        self.append(node, inner);
        node
    }

    fn parse_expression_statement(&mut self) -> NodeId {
        let start = self.peek().start;
        let expr = self.parse_expression();
        let end = self.expect(TokenType::Semi, "';'").end;
        let node = self.alloc(NodeKind::ExpressionStatement, start, end);
        self.append(node, expr);
        node
    }

    pub(super) fn parse_local_variable_declaration_statement(&mut self) -> NodeId {
        let node = self.parse_local_variable_declaration(TokenType::Semi);
        self.expect(TokenType::Semi, "';'");
        node
    }

    /// Parses `[modifiers] Type name [= init] (, name [= init])*` without
    /// consuming the terminator, so both `for`-init and normal local
    /// declarations can share this.
    pub(super) fn parse_local_variable_declaration(&mut self, _terminator: TokenType) -> NodeId {
        let start = self.peek().start;
        let modifiers = self.parse_modifiers();
        let ty = if self.check(TokenType::Identifier) && self.text_of(self.peek()) == "var" {
            let tok = self.bump();
            self.alloc(NodeKind::TypeReference, tok.start, tok.end)
        } else {
            self.parse_type()
        };
        let node = self.alloc(NodeKind::LocalVariableDeclaration, start, start);
        self.append(node, modifiers);
        self.append(node, ty);

        let name_tok = self.expect(TokenType::Identifier, "variable name");
        let first = self.parse_variable_declarator_rest(name_tok);
        let mut end = self.arena.end(first);
        self.append(node, first);
        while self.check(TokenType::Comma) {
            self.bump();
            let name_tok = self.expect(TokenType::Identifier, "variable name");
            let decl = self.parse_variable_declarator_rest(name_tok);
            end = self.arena.end(decl);
            self.append(node, decl);
        }
        self.arena.set_end(node, end);
        node
    }

    /// Lookahead used by `for`/block-statement dispatch: a local variable
    /// declaration starts with `var`, a primitive type, or `[modifiers]
    /// Identifier(.Identifier)*[<...>] Identifier` (the last identifier is
    /// what distinguishes it from a bare expression statement).
    pub(super) fn looks_like_local_variable_declaration(&self) -> bool {
        let mut i = self.pos;
        while matches!(
            self.tokens.get(i).map(|t| t.kind),
            Some(
                TokenType::Final
                    | TokenType::Public
                    | TokenType::Private
                    | TokenType::Protected
                    | TokenType::Static
            )
        ) || matches!(self.tokens.get(i).map(|t| t.kind), Some(TokenType::At))
        {
            if self.tokens.get(i).map(|t| t.kind) == Some(TokenType::At) {
                i += 1; // '@'
                i += 1; // annotation name, approximate (no args lookahead)
                continue;
            }
            i += 1;
        }

        let Some(first) = self.tokens.get(i) else { return false };
        if matches!(
            first.kind,
            TokenType::Boolean
                | TokenType::Byte
                | TokenType::Short
                | TokenType::Int
                | TokenType::Long
                | TokenType::Char
                | TokenType::Float
                | TokenType::Double
        ) {
            return true;
        }
        if first.kind == TokenType::Identifier && self.text_of(*first) == "var" {
            return true;
        }
        if first.kind != TokenType::Identifier {
            return false;
        }

        // Scan a qualified name, optional generic args, optional array
        // brackets, then require another identifier before `=`, `;`, `:`,
        // or `,` to count as a declaration.
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
                    None => return false,
                    _ => {}
                }
                i += 1;
                if depth <= 0 {
                    break;
                }
                if i - self.pos > 512 {
                    return false;
                }
            }
        }
        while self.tokens.get(i).map(|t| t.kind) == Some(TokenType::LBracket)
            && self.tokens.get(i + 1).map(|t| t.kind) == Some(TokenType::RBracket)
        {
            i += 2;
        }
        self.tokens.get(i).map(|t| t.kind) == Some(TokenType::Identifier)
    }

    fn looks_like_type_start(&self) -> bool {
        matches!(self.peek_kind(), TokenType::Identifier) || self.is_primitive_type_start()
    }
}
