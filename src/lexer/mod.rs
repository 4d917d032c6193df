//! Stateful byte-offset scanner (SPEC_FULL.md §4.B).
//!
//! The lexer never discards trivia: whitespace and comments are emitted as
//! tokens so the parser can attach Javadoc/line comments to the nearest
//! declaration. Token offsets are a strictly non-decreasing total order over
//! the source bytes.

pub mod keywords;

use crate::token::{Token, TokenType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub offset: u32,
    pub message: String,
}

pub struct Lexer<'s> {
    source: &'s str,
    bytes: &'s [u8],
    pos: usize,
    errors: Vec<LexError>,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Scans the whole source eagerly and returns the token stream plus any
    /// recoverable lex errors encountered along the way. Always terminates
    /// with a single `TokenType::EndOfFile` zero-width token.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::with_capacity(self.bytes.len() / 4 + 16);
        while let Some(tok) = self.next_token() {
            tokens.push(tok);
        }
        let eof = self.pos as u32;
        tokens.push(Token::new(TokenType::EndOfFile, eof, eof));
        (tokens, self.errors)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.source[self.pos..].starts_with(s)
    }

    fn next_token(&mut self) -> Option<Token> {
        let c = self.peek_char()?;
        let start = self.pos as u32;

        if c.is_whitespace() {
            while matches!(self.peek_char(), Some(ch) if ch.is_whitespace()) {
                self.advance_char();
            }
            return Some(Token::new(TokenType::Whitespace, start, self.pos as u32));
        }

        if self.starts_with("/**") && !self.starts_with("/**/") {
            return Some(self.lex_block_comment(start, TokenType::JavadocComment));
        }
        if self.starts_with("/*") {
            return Some(self.lex_block_comment(start, TokenType::BlockComment));
        }
        if self.starts_with("//") {
            while matches!(self.peek_char(), Some(ch) if ch != '\n') {
                self.advance_char();
            }
            return Some(Token::new(TokenType::LineComment, start, self.pos as u32));
        }

        if self.starts_with("\"\"\"") {
            return Some(self.lex_text_block(start));
        }
        if c == '"' {
            return Some(self.lex_string_literal(start));
        }
        if c == '\'' {
            return Some(self.lex_char_literal(start));
        }

        if c.is_ascii_digit() {
            return Some(self.lex_number(start));
        }

        if is_identifier_start(c) {
            return Some(self.lex_identifier(start));
        }

        Some(self.lex_operator(start))
    }

    fn lex_identifier(&mut self, start: u32) -> Token {
        while matches!(self.peek_char(), Some(ch) if is_identifier_continue(ch)) {
            self.advance_char();
        }
        let text = &self.source[start as usize..self.pos];
        let kind = keywords::lookup(text).unwrap_or(TokenType::Identifier);
        Token::new(kind, start, self.pos as u32)
    }

    fn lex_number(&mut self, start: u32) -> Token {
        let mut is_float = false;
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.pos += 2;
            while matches!(self.peek(), Some(b) if b.is_ascii_hexdigit() || b == b'_') {
                self.pos += 1;
            }
        } else if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'b') | Some(b'B')) {
            self.pos += 2;
            while matches!(self.peek(), Some(b'0') | Some(b'1') | Some(b'_')) {
                self.pos += 1;
            }
        } else {
            while matches!(self.peek(), Some(b) if b.is_ascii_digit() || b == b'_') {
                self.pos += 1;
            }
            if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit())
            {
                is_float = true;
                self.pos += 1;
                while matches!(self.peek(), Some(b) if b.is_ascii_digit() || b == b'_') {
                    self.pos += 1;
                }
            }
            if matches!(self.peek(), Some(b'e') | Some(b'E')) {
                is_float = true;
                self.pos += 1;
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.pos += 1;
                }
                while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }

        let kind = match self.peek() {
            Some(b'L') | Some(b'l') => {
                self.pos += 1;
                TokenType::LongLiteral
            }
            Some(b'f') | Some(b'F') => {
                self.pos += 1;
                TokenType::FloatLiteral
            }
            Some(b'd') | Some(b'D') => {
                self.pos += 1;
                TokenType::DoubleLiteral
            }
            _ if is_float => TokenType::DoubleLiteral,
            _ => TokenType::IntLiteral,
        };
        Token::new(kind, start, self.pos as u32)
    }

    fn lex_string_literal(&mut self, start: u32) -> Token {
        self.advance_char(); // opening quote
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.errors.push(LexError {
                        offset: start,
                        message: "unterminated string literal".into(),
                    });
                    break;
                }
                Some('\\') => {
                    self.advance_char();
                    self.advance_char();
                }
                Some('"') => {
                    self.advance_char();
                    break;
                }
                Some(_) => {
                    self.advance_char();
                }
            }
        }
        Token::new(TokenType::StringLiteral, start, self.pos as u32)
    }

    fn lex_char_literal(&mut self, start: u32) -> Token {
        self.advance_char(); // opening quote
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.errors.push(LexError {
                        offset: start,
                        message: "unterminated char literal".into(),
                    });
                    break;
                }
                Some('\\') => {
                    self.advance_char();
                    self.advance_char();
                }
                Some('\'') => {
                    self.advance_char();
                    break;
                }
                Some(_) => {
                    self.advance_char();
                }
            }
        }
        Token::new(TokenType::CharLiteral, start, self.pos as u32)
    }

    /// `"""`-delimited text block. Incidental indentation/trailing whitespace
    /// is preserved verbatim inside the token; stripping it is a later-stage
    /// (formatter/rule) concern, not the lexer's.
    fn lex_text_block(&mut self, start: u32) -> Token {
        self.pos += 3; // opening delimiter
        while matches!(self.peek_char(), Some(c) if c != '\n') {
            self.advance_char();
        }
        loop {
            if self.starts_with("\"\"\"") {
                self.pos += 3;
                break;
            }
            match self.advance_char() {
                None => {
                    self.errors.push(LexError {
                        offset: start,
                        message: "unterminated text block".into(),
                    });
                    break;
                }
                Some('\\') => {
                    self.advance_char();
                }
                Some(_) => {}
            }
        }
        Token::new(TokenType::TextBlock, start, self.pos as u32)
    }

    fn lex_block_comment(&mut self, start: u32, kind: TokenType) -> Token {
        self.pos += 2; // "/*"
        loop {
            if self.starts_with("*/") {
                self.pos += 2;
                break;
            }
            if self.advance_char().is_none() {
                self.errors.push(LexError {
                    offset: start,
                    message: "unterminated block comment".into(),
                });
                break;
            }
        }
        Token::new(kind, start, self.pos as u32)
    }

    fn lex_operator(&mut self, start: u32) -> Token {
        // Longest-match-first over the fixed operator/separator set.
        if self.starts_with(">>>=") {
            self.pos += 4;
            return Token::new(TokenType::UnsignedRShiftAssign, start, self.pos as u32);
        }
        const THREE: &[(&str, TokenType)] = &[
            (">>>", TokenType::UnsignedRightShift),
            ("<<=", TokenType::LShiftAssign),
            (">>=", TokenType::RShiftAssign),
            ("...", TokenType::Ellipsis),
        ];
        for (text, kind) in THREE {
            if self.starts_with(text) {
                self.pos += text.len();
                return Token::new(*kind, start, self.pos as u32);
            }
        }

        const TWO: &[(&str, TokenType)] = &[
            ("->", TokenType::Arrow),
            ("::", TokenType::DoubleColon),
            ("==", TokenType::Eq),
            (">=", TokenType::Ge),
            ("<=", TokenType::Le),
            ("!=", TokenType::Ne),
            ("&&", TokenType::AndAnd),
            ("||", TokenType::OrOr),
            ("++", TokenType::PlusPlus),
            ("--", TokenType::MinusMinus),
            ("+=", TokenType::PlusAssign),
            ("-=", TokenType::MinusAssign),
            ("*=", TokenType::StarAssign),
            ("/=", TokenType::SlashAssign),
            ("&=", TokenType::AmpAssign),
            ("|=", TokenType::PipeAssign),
            ("^=", TokenType::CaretAssign),
            ("%=", TokenType::PercentAssign),
            ("<<", TokenType::LShift),
            (">>", TokenType::RightShift),
        ];
        for (text, kind) in TWO {
            if self.starts_with(text) {
                self.pos += text.len();
                return Token::new(*kind, start, self.pos as u32);
            }
        }

        let c = self.peek_char().expect("checked by caller");
        let kind = match c {
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '{' => TokenType::LBrace,
            '}' => TokenType::RBrace,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            ';' => TokenType::Semi,
            ',' => TokenType::Comma,
            '.' => TokenType::Dot,
            '@' => TokenType::At,
            '=' => TokenType::Assign,
            '>' => TokenType::Gt,
            '<' => TokenType::Lt,
            '!' => TokenType::Bang,
            '~' => TokenType::Tilde,
            '?' => TokenType::Question,
            ':' => TokenType::Colon,
            '+' => TokenType::Plus,
            '-' => TokenType::Minus,
            '*' => TokenType::Star,
            '/' => TokenType::Slash,
            '&' => TokenType::Amp,
            '|' => TokenType::Pipe,
            '^' => TokenType::Caret,
            '%' => TokenType::Percent,
            _ => {
                self.errors.push(LexError {
                    offset: start,
                    message: format!("unexpected character {c:?}"),
                });
                self.advance_char();
                return Token::new(TokenType::Unknown, start, self.pos as u32);
            }
        };
        self.advance_char();
        Token::new(kind, start, self.pos as u32)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        Lexer::new(source)
            .tokenize()
            .0
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn lexes_class_skeleton() {
        let kinds = kinds("class Foo { }");
        assert_eq!(
            kinds,
            vec![
                TokenType::Class,
                TokenType::Identifier,
                TokenType::LBrace,
                TokenType::RBrace,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn lexes_numeric_literal_suffixes() {
        let kinds = kinds("1_000L 3.14f 0x1Ap2 0b1010");
        assert_eq!(
            kinds,
            vec![
                TokenType::LongLiteral,
                TokenType::FloatLiteral,
                TokenType::IntLiteral,
                TokenType::IntLiteral,
                TokenType::EndOfFile,
            ]
        );
    }

    #[test]
    fn generic_nested_right_shift_stays_one_token() {
        let kinds = kinds("List<List<String>> x;");
        assert!(kinds.contains(&TokenType::RightShift));
    }

    #[test]
    fn javadoc_distinguished_from_block_comment() {
        let (tokens, _) = Lexer::new("/** doc */ /* plain */").tokenize();
        let without_ws: Vec<_> = tokens.iter().filter(|t| t.kind != TokenType::Whitespace).collect();
        assert_eq!(without_ws[0].kind, TokenType::JavadocComment);
        assert_eq!(without_ws[1].kind, TokenType::BlockComment);
    }

    #[test]
    fn text_block_preserves_interior_whitespace() {
        let src = "\"\"\"\n  line one\n  line two\n  \"\"\"";
        let (tokens, errors) = Lexer::new(src).tokenize();
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenType::TextBlock);
        assert_eq!(tokens[0].text(src), src);
    }

    #[test]
    fn unterminated_string_reports_lex_error() {
        let (_, errors) = Lexer::new("\"abc").tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].offset, 0);
    }

    #[test]
    fn unterminated_block_comment_recovers_to_eof() {
        let (tokens, errors) = Lexer::new("/* never closed").tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.last().unwrap().kind, TokenType::EndOfFile);
    }

    #[test]
    fn offsets_are_strictly_non_decreasing() {
        let (tokens, _) = Lexer::new("int x = 42; // comment\nreturn x;").tokenize();
        let mut last_end = 0u32;
        for tok in &tokens {
            assert!(tok.start >= last_end);
            last_end = tok.end;
        }
    }
}
