//! Top-level and member declarations: compilation unit, package/import
//! (including module imports), class/interface/enum/record/annotation
//! declarations, fields, methods, constructors, initializers.

use crate::arena::{ImportAttribute, ModuleImportAttribute, NodeId, NodeKind};
use crate::token::TokenType;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_compilation_unit(&mut self) -> Result<NodeId, ()> {
        let root = self.alloc(NodeKind::CompilationUnit, 0, 0);

        self.emit_leading_trivia(root);
        if self.check(TokenType::Package) {
            let pkg = self.parse_package_declaration();
            self.append(root, pkg);
        }

        loop {
            self.emit_leading_trivia(root);
            if self.at_eof() {
                break;
            }
            if self.check(TokenType::Import) {
                let imp = self.parse_import_declaration();
                self.append(root, imp);
                continue;
            }
            if self.check(TokenType::Semi) {
                self.bump();
                continue;
            }
            let decl = self.parse_type_declaration();
            self.append(root, decl);
        }

        let end = self.peek().start;
        self.arena.set_end(root, end);
        Ok(root)
    }

    fn parse_package_declaration(&mut self) -> NodeId {
        let start = self.bump().start; // 'package'
        let (_, end_name) = self.parse_qualified_name();
        let end = self.expect(TokenType::Semi, "';'").end;
        self.alloc(NodeKind::PackageDeclaration, start, end.max(end_name))
    }

    /// `import [static] a.b.C[.*] ;` or `import module a.b ;`.
    fn parse_import_declaration(&mut self) -> NodeId {
        let start = self.bump().start; // 'import'

        if self.check(TokenType::Identifier) && self.text_of(self.peek()) == "module" {
            self.bump();
            let (name, _) = self.parse_qualified_name();
            let end = self.expect(TokenType::Semi, "';'").end;
            let node = self.alloc(NodeKind::ModuleImportDeclaration, start, end);
            self.arena
                .set_attribute(node, ModuleImportAttribute { module_name: name });
            return node;
        }

        let is_static = if self.check(TokenType::Static) {
            self.bump();
            true
        } else {
            false
        };

        let (mut name, _) = self.parse_qualified_name();
        let mut is_wildcard = false;
        if self.check(TokenType::Dot) && self.peek_nth(1).kind == TokenType::Star {
            self.bump();
            self.bump();
            name.push_str(".*");
            is_wildcard = true;
        }
        let end = self.expect(TokenType::Semi, "';'").end;
        let node = self.alloc(NodeKind::ImportDeclaration, start, end);
        self.arena.set_attribute(
            node,
            ImportAttribute {
                qualified_name: name,
                is_static,
                is_wildcard,
            },
        );
        node
    }

    pub(super) fn parse_qualified_name(&mut self) -> (String, u32) {
        let first = self.expect(TokenType::Identifier, "identifier");
        let mut name = self.text_of(first).to_string();
        let mut end = first.end;
        while self.check(TokenType::Dot) && self.peek_nth(1).kind == TokenType::Identifier {
            self.bump();
            let seg = self.bump();
            name.push('.');
            name.push_str(self.text_of(seg));
            end = seg.end;
        }
        (name, end)
    }

    /// A modifier/annotation run followed by exactly one of
    /// class/interface/enum/record/`@interface`.
    pub(super) fn parse_type_declaration(&mut self) -> NodeId {
        let start = self.peek().start;
        let modifiers = self.parse_modifiers();

        let node = match self.peek_kind() {
            TokenType::Class => self.parse_class_declaration(start, modifiers),
            TokenType::Interface => self.parse_interface_declaration(start, modifiers),
            TokenType::Enum => self.parse_enum_declaration(start, modifiers),
            TokenType::At if self.peek_nth(1).kind == TokenType::Interface => {
                self.parse_annotation_declaration(start, modifiers)
            }
            TokenType::Identifier if self.text_of(self.peek()) == "record" => {
                self.parse_record_declaration(start, modifiers)
            }
            _ => {
                self.append_modifiers(modifiers);
                return self.error_node("type declaration");
            }
        };
        node
    }

    fn append_modifiers(&mut self, modifiers: NodeId) {
        // modifiers node is discarded when no owner exists (error recovery);
        // nothing else references it so it simply becomes unreachable from
        // the root and is dropped with the arena.
        let _ = modifiers;
    }

    /// Parses the modifier/annotation run preceding a declaration and
    /// returns a `Modifiers` node (always allocated, even if empty) so
    /// callers can attach it uniformly.
    pub(super) fn parse_modifiers(&mut self) -> NodeId {
        let start = self.peek().start;
        let mut end = start;
        let node = self.alloc(NodeKind::Modifiers, start, end);
        loop {
            match self.peek_kind() {
                TokenType::Public
                | TokenType::Private
                | TokenType::Protected
                | TokenType::Static
                | TokenType::Final
                | TokenType::Abstract
                | TokenType::Native
                | TokenType::Synchronized
                | TokenType::Transient
                | TokenType::Volatile
                | TokenType::Strictfp => {
                    end = self.bump().end;
                }
                TokenType::At if self.peek_nth(1).kind != TokenType::Interface => {
                    let ann = self.parse_annotation();
                    end = self.arena.end(ann);
                    self.append(node, ann);
                }
                TokenType::Identifier
                    if matches!(self.text_of(self.peek()), "sealed" | "non-sealed")
                        && self.peek_nth(1).kind != TokenType::Dot
                        && self.peek_nth(1).kind != TokenType::LParen =>
                {
                    end = self.bump().end;
                }
                _ => break,
            }
        }
        self.arena.set_end(node, end);
        node
    }

    fn parse_annotation(&mut self) -> NodeId {
        let start = self.bump().start; // '@'
        let (_, mut end) = self.parse_qualified_name();
        let node = self.alloc(NodeKind::Annotation, start, end);
        if self.check(TokenType::LParen) {
            self.bump();
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
            end = self.expect(TokenType::RParen, "')'").end;
        }
        self.arena.set_end(node, end);
        node
    }

    fn parse_class_declaration(&mut self, start: u32, modifiers: NodeId) -> NodeId {
        self.bump(); // 'class'
        let name_tok = self.expect(TokenType::Identifier, "class name");
        let simple_name = self.text_of(name_tok).to_string();
        let node = self.alloc(NodeKind::ClassDeclaration, start, name_tok.end);
        self.append(node, modifiers);
        self.arena
            .set_attribute(node, crate::arena::TypeNameAttribute { simple_name });

        if self.check(TokenType::Lt) {
            for tp in self.parse_type_parameters() {
                self.append(node, tp);
            }
        }
        if self.check(TokenType::Extends) {
            self.bump();
            let sup = self.parse_type();
            self.append(node, sup);
        }
        if self.check(TokenType::Implements) {
            self.bump();
            loop {
                let t = self.parse_type();
                self.append(node, t);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if self.check(TokenType::Identifier) && self.text_of(self.peek()) == "permits" {
            self.bump();
            loop {
                let t = self.parse_type();
                self.append(node, t);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let end = self.parse_class_body(node);
        self.arena.set_end(node, end);
        node
    }

    fn parse_interface_declaration(&mut self, start: u32, modifiers: NodeId) -> NodeId {
        self.bump(); // 'interface'
        let name_tok = self.expect(TokenType::Identifier, "interface name");
        let simple_name = self.text_of(name_tok).to_string();
        let node = self.alloc(NodeKind::InterfaceDeclaration, start, name_tok.end);
        self.append(node, modifiers);
        self.arena
            .set_attribute(node, crate::arena::TypeNameAttribute { simple_name });

        if self.check(TokenType::Lt) {
            for tp in self.parse_type_parameters() {
                self.append(node, tp);
            }
        }
        if self.check(TokenType::Extends) {
            self.bump();
            loop {
                let t = self.parse_type();
                self.append(node, t);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let end = self.parse_class_body(node);
        self.arena.set_end(node, end);
        node
    }

    fn parse_annotation_declaration(&mut self, start: u32, modifiers: NodeId) -> NodeId {
        self.bump(); // '@'
        self.bump(); // 'interface'
        let name_tok = self.expect(TokenType::Identifier, "annotation name");
        let simple_name = self.text_of(name_tok).to_string();
        let node = self.alloc(NodeKind::AnnotationDeclaration, start, name_tok.end);
        self.append(node, modifiers);
        self.arena
            .set_attribute(node, crate::arena::TypeNameAttribute { simple_name });
        let end = self.parse_class_body(node);
        self.arena.set_end(node, end);
        node
    }

    fn parse_enum_declaration(&mut self, start: u32, modifiers: NodeId) -> NodeId {
        self.bump(); // 'enum'
        let name_tok = self.expect(TokenType::Identifier, "enum name");
        let simple_name = self.text_of(name_tok).to_string();
        let node = self.alloc(NodeKind::EnumDeclaration, start, name_tok.end);
        self.append(node, modifiers);
        self.arena
            .set_attribute(node, crate::arena::TypeNameAttribute { simple_name });

        if self.check(TokenType::Implements) {
            self.bump();
            loop {
                let t = self.parse_type();
                self.append(node, t);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        self.expect(TokenType::LBrace, "'{'");
        if !self.check(TokenType::RBrace) && !self.check(TokenType::Semi) {
            loop {
                let const_start = self.peek().start;
                let const_name = self.expect(TokenType::Identifier, "enum constant").end;
                let constant = self.alloc(NodeKind::EnumConstant, const_start, const_name);
                if self.check(TokenType::LParen) {
                    self.bump();
                    if !self.check(TokenType::RParen) {
                        loop {
                            let arg = self.parse_expression();
                            self.append(constant, arg);
                            if self.check(TokenType::Comma) {
                                self.bump();
                            } else {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenType::RParen, "')'").end;
                    self.arena.set_end(constant, end);
                }
                if self.check(TokenType::LBrace) {
                    let end = self.parse_class_body(constant);
                    self.arena.set_end(constant, end);
                }
                self.append(node, constant);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if self.check(TokenType::Semi) {
            self.bump();
            while !self.check(TokenType::RBrace) && !self.at_eof() {
                let member = self.parse_class_member();
                self.append(node, member);
            }
        }
        let end = self.expect(TokenType::RBrace, "'}'").end;
        self.arena.set_end(node, end);
        node
    }

    /// `record Name(Component, ...) [implements T, ...] { body }`.
    fn parse_record_declaration(&mut self, start: u32, modifiers: NodeId) -> NodeId {
        self.bump(); // 'record'
        let name_tok = self.expect(TokenType::Identifier, "record name");
        let simple_name = self.text_of(name_tok).to_string();
        let node = self.alloc(NodeKind::RecordDeclaration, start, name_tok.end);
        self.append(node, modifiers);
        self.arena
            .set_attribute(node, crate::arena::TypeNameAttribute { simple_name });

        if self.check(TokenType::Lt) {
            for tp in self.parse_type_parameters() {
                self.append(node, tp);
            }
        }

        self.expect(TokenType::LParen, "'('");
        if !self.check(TokenType::RParen) {
            loop {
                let comp_start = self.peek().start;
                let comp_type = self.parse_type();
                let comp_name = self.expect(TokenType::Identifier, "component name").end;
                let component = self.alloc(NodeKind::RecordComponent, comp_start, comp_name);
                self.append(component, comp_type);
                self.append(node, component);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "')'");

        if self.check(TokenType::Implements) {
            self.bump();
            loop {
                let t = self.parse_type();
                self.append(node, t);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        let end = self.parse_class_body(node);
        self.arena.set_end(node, end);
        node
    }

    /// `{ member* }`, returning the end offset of the closing brace.
    pub(super) fn parse_class_body(&mut self, owner: NodeId) -> u32 {
        self.expect(TokenType::LBrace, "'{'");
        while !self.check(TokenType::RBrace) && !self.at_eof() {
            self.emit_leading_trivia(owner);
            if self.check(TokenType::RBrace) {
                break;
            }
            if self.check(TokenType::Semi) {
                self.bump();
                continue;
            }
            let member = self.parse_class_member();
            self.append(owner, member);
        }
        self.expect(TokenType::RBrace, "'}'").end
    }

    fn parse_class_member(&mut self) -> NodeId {
        let start = self.peek().start;
        let modifiers = self.parse_modifiers();
        if self.check(TokenType::LBrace) {
            let end = self.parse_block_into_new_node();
            let init = self.alloc(NodeKind::Initializer, start, end);
            self.append(init, modifiers);
            return init;
        }

        match self.peek_kind() {
            TokenType::Class => return self.parse_class_declaration(start, modifiers),
            TokenType::Interface => return self.parse_interface_declaration(start, modifiers),
            TokenType::Enum => return self.parse_enum_declaration(start, modifiers),
            TokenType::At if self.peek_nth(1).kind == TokenType::Interface => {
                return self.parse_annotation_declaration(start, modifiers)
            }
            TokenType::Identifier if self.text_of(self.peek()) == "record" && self.peek_nth(1).kind == TokenType::Identifier => {
                return self.parse_record_declaration(start, modifiers)
            }
            _ => {}
        }

        // Constructor: Identifier followed directly by '('.
        if self.check(TokenType::Identifier) && self.peek_nth(1).kind == TokenType::LParen {
            return self.parse_constructor_declaration(start, modifiers);
        }

        // Generic method: <T> ReturnType name(...)
        let type_params = if self.check(TokenType::Lt) {
            Some(self.parse_type_parameters())
        } else {
            None
        };

        let return_type = self.parse_type();
        let name_tok = self.expect(TokenType::Identifier, "member name");
        let name_end = name_tok.end;

        if self.check(TokenType::LParen) {
            let node = self.parse_method_rest(start, modifiers, return_type, name_end);
            if let Some(tps) = type_params {
                for tp in tps {
                    self.append(node, tp);
                }
            }
            return node;
        }

        self.parse_field_rest(start, modifiers, return_type, name_tok)
    }

    fn parse_block_into_new_node(&mut self) -> u32 {
        let block = self.parse_block();
        self.arena.end(block)
    }

    fn parse_constructor_declaration(&mut self, start: u32, modifiers: NodeId) -> NodeId {
        let name_tok = self.bump();
        let node = self.alloc(NodeKind::ConstructorDeclaration, start, name_tok.end);
        self.append(node, modifiers);
        self.parse_parameter_list(node);
        if self.check(TokenType::Throws) {
            self.bump();
            loop {
                let t = self.parse_type();
                self.append(node, t);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        let body = self.parse_block();
        let end = self.arena.end(body);
        self.append(node, body);
        self.arena.set_end(node, end);
        node
    }

    fn parse_method_rest(
        &mut self,
        start: u32,
        modifiers: NodeId,
        return_type: NodeId,
        name_end: u32,
    ) -> NodeId {
        let node = self.alloc(NodeKind::MethodDeclaration, start, name_end);
        self.append(node, modifiers);
        self.append(node, return_type);
        self.parse_parameter_list(node);

        while self.check(TokenType::LBracket) {
            self.bump();
            self.expect(TokenType::RBracket, "']'");
        }

        if self.check(TokenType::Throws) {
            self.bump();
            loop {
                let t = self.parse_type();
                self.append(node, t);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        let end = if self.check(TokenType::LBrace) {
            let body = self.parse_block();
            let end = self.arena.end(body);
            self.append(node, body);
            end
        } else {
            self.expect(TokenType::Semi, "';'").end
        };
        self.arena.set_end(node, end);
        node
    }

    fn parse_field_rest(
        &mut self,
        start: u32,
        modifiers: NodeId,
        field_type: NodeId,
        first_name: crate::token::Token,
    ) -> NodeId {
        let node = self.alloc(NodeKind::FieldDeclaration, start, first_name.end);
        self.append(node, modifiers);
        self.append(node, field_type);

        let first_declarator = self.parse_variable_declarator_rest(first_name);
        self.append(node, first_declarator);
        while self.check(TokenType::Comma) {
            self.bump();
            let name_tok = self.expect(TokenType::Identifier, "variable name");
            let declarator = self.parse_variable_declarator_rest(name_tok);
            self.append(node, declarator);
        }
        let end = self.expect(TokenType::Semi, "';'").end;
        self.arena.set_end(node, end);
        node
    }

    /// Parses `[] [= initializer]` following an already-consumed declarator
    /// name token, returning a `VariableDeclarator` node.
    pub(super) fn parse_variable_declarator_rest(&mut self, name_tok: crate::token::Token) -> NodeId {
        let start = name_tok.start;
        let mut end = name_tok.end;
        let node = self.alloc(NodeKind::VariableDeclarator, start, end);
        while self.check(TokenType::LBracket) {
            self.bump();
            end = self.expect(TokenType::RBracket, "']'").end;
        }
        if self.check(TokenType::Assign) {
            self.bump();
            let init = if self.check(TokenType::LBrace) {
                self.parse_array_initializer()
            } else {
                self.parse_expression()
            };
            end = self.arena.end(init);
            self.append(node, init);
        }
        self.arena.set_end(node, end);
        node
    }

    pub(super) fn parse_parameter_list(&mut self, owner: NodeId) {
        self.expect(TokenType::LParen, "'('");
        if !self.check(TokenType::RParen) {
            loop {
                let param = self.parse_parameter();
                self.append(owner, param);
                if self.check(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "')'");
    }

    fn parse_parameter(&mut self) -> NodeId {
        let start = self.peek().start;
        let modifiers = self.parse_modifiers();
        let ty = self.parse_type();
        let mut end = self.arena.end(ty);
        if self.check(TokenType::Ellipsis) {
            end = self.bump().end;
        }
        let name_tok = self.expect(TokenType::Identifier, "parameter name");
        end = name_tok.end;
        let node = self.alloc(NodeKind::Parameter, start, end);
        self.append(node, modifiers);
        self.append(node, ty);
        node
    }
}
