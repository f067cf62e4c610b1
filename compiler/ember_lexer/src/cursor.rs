//! Byte cursor shared by the preprocessor and the tokenizer.
//!
//! Scripts are ASCII at the syntax level: every delimiter, operator and
//! identifier byte is below `0x80`. Non-ASCII bytes can only appear inside
//! literals and comments, which are skipped by length, so walking bytes
//! never splits a character that matters.

pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Cursor {
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Current byte, `0` at end of input.
    #[inline]
    pub(crate) fn current(&self) -> u8 {
        self.peek(0)
    }

    #[inline]
    pub(crate) fn peek(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    /// Byte `back` positions before the current one.
    #[inline]
    pub(crate) fn previous(&self, back: usize) -> Option<u8> {
        self.pos
            .checked_sub(back)
            .and_then(|index| self.bytes.get(index).copied())
    }

    #[inline]
    pub(crate) fn rest(&self) -> &'a [u8] {
        self.bytes.get(self.pos..).unwrap_or(&[])
    }

    pub(crate) fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix.as_bytes())
    }

    /// Advance one byte, counting newlines.
    #[inline]
    pub(crate) fn advance(&mut self) {
        if self.current() == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
    }

    pub(crate) fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    pub(crate) fn eat_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while !self.is_eof() && predicate(self.current()) {
            self.advance();
        }
    }
}

#[inline]
pub(crate) fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

#[inline]
pub(crate) fn is_identifier_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
