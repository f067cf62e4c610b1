//! Tokens produced by the tokenizer.
//!
//! A token never owns text: `start` and `len` index into the preprocessed
//! buffer, which the parsing context keeps alive alongside the token vector.

/// Token classification.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    /// `( ) [ ] { } , ; : ::` and `.`.
    Punctuation,
    Number,
    Character,
    WideCharacter,
    String,
    WideString,
    Keyword,
    Identifier,
    Operator,
}

/// One token: a classified slice of the preprocessed source.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub len: u32,
    pub line: u32,
}

impl Token {
    /// Text of the token in `source`.
    #[inline]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        let start = self.start as usize;
        source.get(start..start + self.len as usize).unwrap_or("")
    }
}
