//! Hand-written recursive-descent parser (SPEC_FULL.md §4.C).
//!
//! The parser is a state machine over `(tokens, position, arena)`. Every
//! production allocates exactly one AST node, parses/attaches its children,
//! and returns the new `NodeId`. Byte offsets are never rewound; only the
//! token cursor is, via `checkpoint`/`restore`.

mod declarations;
mod expressions;
mod patterns;
mod statements;
mod types;

use std::collections::HashMap;

use crate::arena::{Arena, NodeId, NodeKind};
use crate::lexer::Lexer;
use crate::security::{Deadline, DepthGuard, SecurityConfig};
use crate::token::{Token, TokenType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub expected: String,
    pub found: TokenType,
    pub offset: u32,
}

pub enum ParseOutcome {
    Success { root: NodeId },
    Failure { errors: Vec<ParseError>, root: Option<NodeId> },
}

/// Opaque token-cursor snapshot for speculative parsing.
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint(usize);

pub struct Parser<'a> {
    pub(super) arena: &'a mut Arena,
    pub(super) source: &'a str,
    pub(super) tokens: Vec<Token>,
    pub(super) pos: usize,
    pub(super) depth: u32,
    pub(super) security: &'a SecurityConfig,
    pub(super) deadline: &'a Deadline,
    pub(super) errors: Vec<ParseError>,
    pub(super) leading_trivia: HashMap<usize, Vec<Token>>,
    pub(super) trailing_trivia: HashMap<usize, Vec<Token>>,
    pub(super) fatal: bool,
}

/// Parses a full compilation unit. Returns the arena (possibly partially
/// populated on failure) together with the parse outcome.
pub fn parse(source: &str, security: &SecurityConfig, deadline: &Deadline) -> (Arena, ParseOutcome) {
    let mut arena = Arena::with_capacity(source.len() / 8 + 16);
    let (raw_tokens, _lex_errors) = Lexer::new(source).tokenize();
    let (tokens, leading_trivia, trailing_trivia) = split_trivia(&raw_tokens, source);

    let mut parser = Parser {
        arena: &mut arena,
        source,
        tokens,
        pos: 0,
        depth: 0,
        security,
        deadline,
        errors: Vec::new(),
        leading_trivia,
        trailing_trivia,
        fatal: false,
    };

    let outcome = match parser.parse_compilation_unit() {
        Ok(root) => {
            parser.arena.finish(root);
            if parser.errors.is_empty() {
                ParseOutcome::Success { root }
            } else {
                ParseOutcome::Failure {
                    errors: std::mem::take(&mut parser.errors),
                    root: Some(root),
                }
            }
        }
        Err(_) => ParseOutcome::Failure {
            errors: std::mem::take(&mut parser.errors),
            root: None,
        },
    };
    (arena, outcome)
}

/// Splits the raw token stream (still containing trivia) into a significant
/// token list plus leading/trailing comment maps keyed by significant-token
/// index. A comment with no intervening newline since the previous
/// significant token is "trailing" for that token; otherwise it is "leading"
/// for the next one, per SPEC_FULL.md §4.C's attachment rule.
fn split_trivia(
    raw: &[Token],
    source: &str,
) -> (Vec<Token>, HashMap<usize, Vec<Token>>, HashMap<usize, Vec<Token>>) {
    let mut significant = Vec::with_capacity(raw.len());
    let mut leading: HashMap<usize, Vec<Token>> = HashMap::new();
    let mut trailing: HashMap<usize, Vec<Token>> = HashMap::new();
    let mut pending: Vec<Token> = Vec::new();
    let mut saw_newline_since_last_significant = true;

    for &tok in raw {
        match tok.kind {
            TokenType::Whitespace => {
                if tok.text(source).contains('\n') {
                    saw_newline_since_last_significant = true;
                }
            }
            k if k.is_comment() => {
                if tok.text(source).contains('\n') {
                    saw_newline_since_last_significant = true;
                }
                pending.push(tok);
            }
            _ => {
                if !pending.is_empty() {
                    if saw_newline_since_last_significant || significant.is_empty() {
                        leading.entry(significant.len()).or_default().extend(pending.drain(..));
                    } else {
                        let prev_idx = significant.len() - 1;
                        trailing.entry(prev_idx).or_default().extend(pending.drain(..));
                    }
                }
                significant.push(tok);
                saw_newline_since_last_significant = false;
            }
        }
    }
    if !pending.is_empty() {
        leading.entry(significant.len()).or_default().extend(pending.drain(..));
    }
    (significant, leading, trailing)
}

impl<'a> Parser<'a> {
    pub(super) fn peek(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(super) fn peek_kind(&self) -> TokenType {
        self.peek().kind
    }

    pub(super) fn peek_nth(&self, n: usize) -> Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    pub(super) fn text_of(&self, tok: Token) -> &'a str {
        tok.text(self.source)
    }

    pub(super) fn at_eof(&self) -> bool {
        self.peek_kind() == TokenType::EndOfFile
    }

    pub(super) fn check(&self, kind: TokenType) -> bool {
        self.peek_kind() == kind
    }

    pub(super) fn bump(&mut self) -> Token {
        let tok = self.peek();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    /// Consumes a token of `kind`, or records a recoverable `ParseError` and
    /// returns the token actually found (without consuming it) so callers can
    /// decide how to proceed.
    pub(super) fn expect(&mut self, kind: TokenType, expected_desc: &str) -> Token {
        if self.check(kind) {
            self.bump()
        } else {
            let found = self.peek();
            self.errors.push(ParseError {
                expected: expected_desc.to_string(),
                found: found.kind,
                offset: found.start,
            });
            found
        }
    }

    pub(super) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub(super) fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.0;
    }

    /// Requires a single `>` closing a generic argument/parameter list. If
    /// the lexer greedily produced a longer operator (`>>`, `>>>`, `>=`), it
    /// is split in place and the residual token is pushed back onto the
    /// stream at the current position.
    pub(super) fn expect_closing_gt(&mut self) {
        if self.check(TokenType::Gt) {
            self.bump();
            return;
        }
        let tok = self.peek();
        if let Some((gt, rest)) = crate::token::split_leading_gt(tok) {
            self.tokens[self.pos] = rest;
            let _ = gt;
        } else {
            self.expect(TokenType::Gt, "'>'");
        }
    }

    /// Enters one level of recursion, checking the depth budget and the
    /// wall-clock deadline. Returns `Err(())` (already recorded as a fatal
    /// parse error) when either is exceeded; callers must propagate.
    pub(super) fn enter(&mut self) -> Result<DepthGuard<'_>, ()> {
        if self.deadline.has_expired() {
            self.fatal = true;
            return Err(());
        }
        match DepthGuard::enter(&mut self.depth, self.security.max_depth) {
            Ok(guard) => Ok(guard),
            Err(_) => {
                self.fatal = true;
                Err(())
            }
        }
    }

    /// Allocates `kind` spanning `[start, end)`. `end` is often provisional
    /// (caller fixes it up with `arena.set_end` once children are known).
    pub(super) fn alloc(&mut self, kind: NodeKind, start: u32, end: u32) -> NodeId {
        self.arena
            .allocate(kind, start, end)
            .expect("arena capacity policy exceeded")
    }

    pub(super) fn append(&mut self, parent: NodeId, child: NodeId) {
        self.arena.append_child(parent, child);
    }

    /// Emits any comments attached to significant-token index `idx` as
    /// leading trivia, appended as children of `parent` before the node that
    /// follows them is parsed.
    pub(super) fn emit_leading_trivia(&mut self, parent: NodeId) {
        let idx = self.pos;
        if let Some(comments) = self.leading_trivia.remove(&idx) {
            for c in comments {
                let kind = trivia_kind(c.kind);
                let node = self.alloc(kind, c.start, c.end);
                self.append(parent, node);
            }
        }
    }

    /// Emits comments trailing the token at significant-token index
    /// `prev_idx` (typically `self.pos - 1` right after consuming a
    /// statement's terminating token) as children of `parent`.
    pub(super) fn emit_trailing_trivia(&mut self, parent: NodeId, prev_idx: usize) {
        if let Some(comments) = self.trailing_trivia.remove(&prev_idx) {
            for c in comments {
                let kind = trivia_kind(c.kind);
                let node = self.alloc(kind, c.start, c.end);
                self.append(parent, node);
            }
        }
    }

    /// Records a recoverable parse error without synchronizing.
    pub(super) fn error(&mut self, expected: &str) {
        let found = self.peek();
        self.errors.push(ParseError {
            expected: expected.to_string(),
            found: found.kind,
            offset: found.start,
        });
    }

    /// Discards tokens until a statement-level anchor (`;`, `}`, or a
    /// modifier/declaration-starting keyword) is reached, per SPEC_FULL.md
    /// §4.C's error-recovery rule.
    pub(super) fn synchronize(&mut self) {
        while !self.at_eof() {
            match self.peek_kind() {
                TokenType::Semi => {
                    self.bump();
                    return;
                }
                TokenType::RBrace => return,
                TokenType::Public
                | TokenType::Private
                | TokenType::Protected
                | TokenType::Static
                | TokenType::Final
                | TokenType::Abstract
                | TokenType::Class
                | TokenType::Interface
                | TokenType::Enum => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Parses an `Error` recovery node covering the current token and
    /// synchronizes past it. Used when no production matches at all.
    pub(super) fn error_node(&mut self, expected: &str) -> NodeId {
        self.error(expected);
        let start = self.peek().start;
        let tok = if self.at_eof() { self.peek() } else { self.bump() };
        let node = self.alloc(NodeKind::Error, start, tok.end);
        self.synchronize();
        node
    }
}

fn trivia_kind(kind: TokenType) -> NodeKind {
    match kind {
        TokenType::LineComment => NodeKind::LineComment,
        TokenType::JavadocComment => NodeKind::JavadocComment,
        _ => NodeKind::BlockComment,
    }
}
