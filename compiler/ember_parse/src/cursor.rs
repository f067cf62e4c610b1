//! Token cursor over the flat token vector.
//!
//! Tokens are compared by text: keywords, operators and punctuation are
//! unique spellings, and literals keep their quotes, so `check("(")` can
//! never match a string literal.

use ember_diagnostic::{CompileError, CompileErrorKind};
use ember_ir::{Token, TokenKind};

pub struct Cursor<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        Cursor {
            source,
            tokens,
            pos: 0,
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rewind (or skip) to a position obtained from [`Cursor::pos`].
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    #[inline]
    pub fn current(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    #[inline]
    pub fn peek(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).copied()
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.current().map(|token| token.kind)
    }

    pub fn peek_kind(&self, n: usize) -> Option<TokenKind> {
        self.peek(n).map(|token| token.kind)
    }

    /// Text of the current token; empty at the end.
    pub fn text(&self) -> &'a str {
        self.peek_text(0)
    }

    pub fn peek_text(&self, n: usize) -> &'a str {
        self.peek(n).map_or("", |token| token.text(self.source))
    }

    /// Line of the current token, or of the last one at the end.
    pub fn line(&self) -> u32 {
        self.current()
            .or_else(|| self.tokens.last().copied())
            .map_or(1, |token| token.line)
    }

    pub fn advance(&mut self) -> Option<Token> {
        let token = self.current();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    #[inline]
    pub fn check(&self, text: &str) -> bool {
        self.text() == text
    }

    #[inline]
    pub fn check_at(&self, n: usize, text: &str) -> bool {
        self.peek_text(n) == text
    }

    pub fn check_kind(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn eat(&mut self, text: &str) -> bool {
        if self.check(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, text: &str) -> Result<(), CompileError> {
        if self.eat(text) {
            Ok(())
        } else {
            Err(self.expected(text))
        }
    }

    /// An `Expected` error at the current token.
    pub fn expected(&self, text: &str) -> CompileError {
        CompileError::new(
            CompileErrorKind::Expected {
                expected: text.to_string(),
            },
            self.line(),
        )
    }

    pub fn expect_identifier(&mut self) -> Result<&'a str, CompileError> {
        if self.check_kind(TokenKind::Identifier) {
            let text = self.text();
            self.pos += 1;
            Ok(text)
        } else {
            Err(self.expected("identifier"))
        }
    }

    /// Index of the bracket closing the one at `open`, skipping nested
    /// pairs of any kind.
    pub fn closing(&self, open: usize) -> Option<usize> {
        let first = self.tokens.get(open)?;
        if first.kind != TokenKind::Punctuation
            || !matches!(first.text(self.source), "(" | "[" | "{")
        {
            return None;
        }
        let mut depth = 0usize;
        for index in open..self.tokens.len() {
            let token = self.tokens[index];
            if token.kind != TokenKind::Punctuation {
                continue;
            }
            match token.text(self.source) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Split a `>>` at the cursor into two `>` tokens, so nested template
    /// argument lists close one at a time.
    pub fn split_shift(&mut self) {
        let Some(token) = self.current() else {
            return;
        };
        if token.kind != TokenKind::Operator || token.text(self.source) != ">>" {
            return;
        }
        let first = Token { len: 1, ..token };
        let second = Token {
            start: token.start + 1,
            len: 1,
            ..token
        };
        self.tokens[self.pos] = first;
        self.tokens.insert(self.pos + 1, second);
    }
}
