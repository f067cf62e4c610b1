//! Literal decoding: numbers, characters and pooled strings.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{Expr, ExprKind, Literal, TokenKind, TypeId, TypeUsage, TypeUsageFlags};
use ember_lexer::escape::unescape;
use ember_lexer::number::{parse_number, NumberValue};

use crate::{ParseResult, Parser};

/// Type of an integer literal from its value, radix and suffixes.
fn integer_type(value: u64, decimal: bool, unsigned: bool, long: u8) -> TypeId {
    match (unsigned, long) {
        (true, 0) if u32::try_from(value).is_ok() => TypeId::UINT32,
        (true, _) => TypeId::UINT64,
        (false, 2) => TypeId::INT64,
        (false, 1) if i64::try_from(value).is_ok() => TypeId::LONG,
        (false, 1) => TypeId::UINT64,
        _ if i32::try_from(value).is_ok() => TypeId::INT,
        // hex and octal literals take unsigned int before long
        _ if !decimal && u32::try_from(value).is_ok() => TypeId::UINT32,
        _ if i64::try_from(value).is_ok() => TypeId::LONG,
        _ => TypeId::UINT64,
    }
}

/// Text between the quotes of a (possibly `L`-prefixed) literal.
fn literal_content(text: &str) -> &str {
    let text = text.strip_prefix('L').unwrap_or(text);
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    }
}

impl Parser<'_> {
    pub(crate) fn parse_literal(&mut self) -> ParseResult<Expr> {
        let line = self.cursor.line();
        let text = self.cursor.text();
        let invalid = || CompileErrorKind::InvalidLiteral {
            literal: text.to_string(),
        };
        match self.cursor.kind() {
            Some(TokenKind::Number) => {
                let number = parse_number(text).map_err(|kind| self.error(kind))?;
                self.cursor.advance();
                Ok(match number.value {
                    NumberValue::Integer(value) => {
                        let decimal = !text.starts_with('0') || text == "0" || text.contains('.');
                        let type_id = integer_type(value, decimal, number.unsigned, number.long);
                        Expr::new(
                            ExprKind::Literal(Literal::Integer(value)),
                            TypeUsage::of(type_id),
                            line,
                        )
                    }
                    NumberValue::Float(value) => {
                        let type_id = if number.single_precision {
                            TypeId::FLOAT
                        } else {
                            TypeId::DOUBLE
                        };
                        Expr::new(
                            ExprKind::Literal(Literal::Float(value)),
                            TypeUsage::of(type_id),
                            line,
                        )
                    }
                })
            }
            Some(kind @ (TokenKind::Character | TokenKind::WideCharacter)) => {
                let wide = kind == TokenKind::WideCharacter;
                let units = unescape(literal_content(text), wide).map_err(|kind| self.error(kind))?;
                let unit = *units.first().ok_or_else(|| self.error(invalid()))?;
                self.cursor.advance();
                let (type_id, bits) = if wide {
                    (TypeId::WCHAR, u64::from(unit))
                } else {
                    // char is signed
                    (TypeId::CHAR, i64::from(unit as u8 as i8) as u64)
                };
                Ok(Expr::new(
                    ExprKind::Literal(Literal::Integer(bits)),
                    TypeUsage::of(type_id),
                    line,
                ))
            }
            Some(kind @ (TokenKind::String | TokenKind::WideString)) => {
                let wide = kind == TokenKind::WideString;
                let mut units = Vec::new();
                // adjacent literals concatenate
                while self.cursor.kind() == Some(kind) {
                    let content = literal_content(self.cursor.text());
                    units.extend(unescape(content, wide).map_err(|kind| self.error(kind))?);
                    self.cursor.advance();
                }
                let (type_id, bytes) = if wide {
                    let mut bytes: Vec<u8> = units.iter().flat_map(|unit| unit.to_le_bytes()).collect();
                    bytes.extend_from_slice(&[0; 4]);
                    (TypeId::WCHAR, bytes)
                } else {
                    let mut bytes: Vec<u8> = units.iter().map(|&unit| unit as u8).collect();
                    bytes.push(0);
                    (TypeId::CHAR, bytes)
                };
                let literal = self.registry.register_literal(self.memory, bytes);
                Ok(Expr::new(
                    ExprKind::Literal(Literal::String(literal)),
                    TypeUsage::of(type_id)
                        .with_flags(TypeUsageFlags::CONST)
                        .pointer_to(),
                    line,
                ))
            }
            _ => Err(self.cursor.expected("literal")),
        }
    }

    /// Bytes of a narrow string literal without its terminator.
    pub(crate) fn string_literal_bytes(&self, expr: &Expr) -> Option<Vec<u8>> {
        let ExprKind::Literal(Literal::String(id)) = expr.kind else {
            return None;
        };
        if expr.type_usage.type_id != TypeId::CHAR {
            return None;
        }
        let address = self.registry.literal_address(id);
        let mut bytes = Vec::new();
        loop {
            let byte = self
                .memory
                .read(address.offset_by(bytes.len() as i64), 1)
                .ok()?[0];
            if byte == 0 {
                return Some(bytes);
            }
            bytes.push(byte);
        }
    }
}

#[cfg(test)]
mod tests;
