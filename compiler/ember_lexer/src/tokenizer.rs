//! Tokenizer: preprocessed text to a flat token vector.

use ember_diagnostic::{CompileError, CompileErrorKind};
use ember_ir::grammar::{is_keyword, OPERATORS, PUNCTUATION};
use ember_ir::{Token, TokenKind};
use tracing::debug;

use crate::cursor::{is_identifier_continue, is_identifier_start, Cursor};
use crate::escape::unescape;

/// Split preprocessed source into tokens.
///
/// String and character literals have their escapes validated here, so the
/// parser can decode them without failing.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::with_capacity(source.len() / 4);

    loop {
        cursor.eat_while(|b| b.is_ascii_whitespace());
        if cursor.is_eof() {
            break;
        }
        let start = cursor.pos();
        let line = cursor.line();
        let kind = scan_token(&mut cursor, source).map_err(|kind| CompileError::new(kind, line))?;
        tokens.push(Token {
            kind,
            start: start as u32,
            len: (cursor.pos() - start) as u32,
            line,
        });
    }

    debug!(count = tokens.len(), "tokenized");
    Ok(tokens)
}

fn scan_token(cursor: &mut Cursor<'_>, source: &str) -> Result<TokenKind, CompileErrorKind> {
    let byte = cursor.current();

    if byte == b'L' && matches!(cursor.peek(1), b'"' | b'\'') {
        cursor.advance();
        let quote = cursor.current();
        scan_quoted(cursor, source, quote, true)?;
        return Ok(if quote == b'"' {
            TokenKind::WideString
        } else {
            TokenKind::WideCharacter
        });
    }
    if byte == b'"' || byte == b'\'' {
        scan_quoted(cursor, source, byte, false)?;
        return Ok(if byte == b'"' {
            TokenKind::String
        } else {
            TokenKind::Character
        });
    }
    if byte.is_ascii_digit() || (byte == b'.' && cursor.peek(1).is_ascii_digit()) {
        scan_number(cursor);
        return Ok(TokenKind::Number);
    }
    if is_identifier_start(byte) {
        let start = cursor.pos();
        cursor.eat_while(is_identifier_continue);
        return Ok(if is_keyword(&source[start..cursor.pos()]) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        });
    }
    if let Some(punctuation) = PUNCTUATION.iter().find(|p| cursor.starts_with(p)) {
        cursor.advance_by(punctuation.len());
        return Ok(TokenKind::Punctuation);
    }
    if let Some(operator) = OPERATORS.iter().find(|o| cursor.starts_with(o)) {
        cursor.advance_by(operator.len());
        return Ok(TokenKind::Operator);
    }

    let symbol = source[cursor.pos()..].chars().next().unwrap_or('\0');
    Err(CompileErrorKind::UnexpectedSymbol {
        symbol: symbol.to_string(),
    })
}

/// Consume digits, hex digits, a fraction, an exponent and suffixes. The
/// value is validated when the parser decodes it.
fn scan_number(cursor: &mut Cursor<'_>) {
    let hex = cursor.current() == b'0' && matches!(cursor.peek(1), b'x' | b'X');
    loop {
        let byte = cursor.current();
        let exponent_sign = !hex
            && matches!(byte, b'+' | b'-')
            && cursor.pos() > 0
            && matches!(cursor.previous(1), Some(b'e' | b'E'));
        if is_identifier_continue(byte) || byte == b'.' || exponent_sign {
            cursor.advance();
        } else {
            break;
        }
    }
}

/// Consume a quoted literal and validate its escapes.
fn scan_quoted(
    cursor: &mut Cursor<'_>,
    source: &str,
    quote: u8,
    wide: bool,
) -> Result<(), CompileErrorKind> {
    cursor.advance();
    let content_start = cursor.pos();
    loop {
        match cursor.current() {
            b'\n' => return Err(CompileErrorKind::UnterminatedLiteral),
            _ if cursor.is_eof() => return Err(CompileErrorKind::UnterminatedLiteral),
            b'\\' => cursor.advance_by(2),
            byte if byte == quote => break,
            _ => cursor.advance(),
        }
    }
    let content = &source[content_start..cursor.pos()];
    cursor.advance();

    let units = unescape(content, wide)?;
    if quote == b'\'' && units.is_empty() {
        return Err(CompileErrorKind::InvalidLiteral {
            literal: "''".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
