//! Pinned grammar tables.
//!
//! The keyword set and the operator precedence table define which scripts
//! parse and how; changing either changes the meaning of existing scripts.
//! They are declared here as data, versioned by [`GRAMMAR_VERSION`], and
//! tested exhaustively.

/// Version of the keyword and precedence tables below.
pub const GRAMMAR_VERSION: u32 = 1;

/// Reserved words, sorted for binary search.
pub const KEYWORDS: &[&str] = &[
    "bool",
    "break",
    "case",
    "char",
    "class",
    "const",
    "const_cast",
    "continue",
    "default",
    "delete",
    "do",
    "double",
    "dynamic_cast",
    "else",
    "enum",
    "false",
    "float",
    "for",
    "if",
    "int",
    "long",
    "namespace",
    "nullptr",
    "operator",
    "private",
    "protected",
    "public",
    "reinterpret_cast",
    "return",
    "short",
    "signed",
    "sizeof",
    "static",
    "static_cast",
    "struct",
    "switch",
    "this",
    "true",
    "typedef",
    "unsigned",
    "using",
    "void",
    "while",
];

/// Operator spellings, longest first so the tokenizer can take the first
/// prefix match.
pub const OPERATORS: &[&str] = &[
    "<<=", ">>=", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "=", "<", ">", "!", "~", "&",
    "|", "^", "?",
];

/// Punctuation spellings, longest first.
pub const PUNCTUATION: &[&str] = &["::", "(", ")", "[", "]", "{", "}", ",", ";", ":", "."];

/// Binding direction of an operator level.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Associativity {
    Left,
    Right,
}

/// One row of the binary operator table.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct OperatorInfo {
    pub symbol: &'static str,
    /// Higher binds tighter.
    pub level: u8,
    pub associativity: Associativity,
}

pub const ASSIGNMENT_LEVEL: u8 = 1;
pub const CONDITIONAL_LEVEL: u8 = 2;
pub const PREFIX_LEVEL: u8 = 13;
pub const POSTFIX_LEVEL: u8 = 14;

const fn op(symbol: &'static str, level: u8, associativity: Associativity) -> OperatorInfo {
    OperatorInfo {
        symbol,
        level,
        associativity,
    }
}

/// Binary operator table. `?` stands for the conditional operator.
pub const BINARY_OPERATORS: &[OperatorInfo] = &[
    op("=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("+=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("-=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("*=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("/=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("%=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("<<=", ASSIGNMENT_LEVEL, Associativity::Right),
    op(">>=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("&=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("^=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("|=", ASSIGNMENT_LEVEL, Associativity::Right),
    op("?", CONDITIONAL_LEVEL, Associativity::Right),
    op("||", 3, Associativity::Left),
    op("&&", 4, Associativity::Left),
    op("|", 5, Associativity::Left),
    op("^", 6, Associativity::Left),
    op("&", 7, Associativity::Left),
    op("==", 8, Associativity::Left),
    op("!=", 8, Associativity::Left),
    op("<", 9, Associativity::Left),
    op("<=", 9, Associativity::Left),
    op(">", 9, Associativity::Left),
    op(">=", 9, Associativity::Left),
    op("<<", 10, Associativity::Left),
    op(">>", 10, Associativity::Left),
    op("+", 11, Associativity::Left),
    op("-", 11, Associativity::Left),
    op("*", 12, Associativity::Left),
    op("/", 12, Associativity::Left),
    op("%", 12, Associativity::Left),
];

/// Prefix operators (level [`PREFIX_LEVEL`]).
pub const PREFIX_OPERATORS: &[&str] = &["+", "-", "!", "~", "++", "--", "*", "&"];

/// Postfix operators besides calls, indexing and member access.
pub const POSTFIX_OPERATORS: &[&str] = &["++", "--"];

#[inline]
pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.binary_search(&text).is_ok()
}

/// Table row for a binary operator spelling.
pub fn binary_operator(symbol: &str) -> Option<&'static OperatorInfo> {
    BINARY_OPERATORS.iter().find(|info| info.symbol == symbol)
}

#[cfg(test)]
mod tests;
