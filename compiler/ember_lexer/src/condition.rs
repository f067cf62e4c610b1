//! Constant expression evaluation for `#if` and `#elif`.
//!
//! The caller has already replaced `defined NAME` and expanded macros, so
//! any identifier left over evaluates to `0` (`true` is `1`). Arithmetic is
//! done on `i64`; the block is taken when the result is non-zero.

use crate::cursor::{is_identifier_continue, is_identifier_start, Cursor};
use crate::number::{parse_number, NumberValue};

#[derive(Clone, Debug, PartialEq)]
enum Atom {
    Number(i64),
    Operator(&'static str),
    Open,
    Close,
}

const OPERATORS: &[&str] = &[
    "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "!", "~",
    "&", "|", "^", "?", ":",
];

fn lex(expression: &str) -> Option<Vec<Atom>> {
    let mut cursor = Cursor::new(expression);
    let mut atoms = Vec::new();
    while !cursor.is_eof() {
        let byte = cursor.current();
        let start = cursor.pos();
        if byte.is_ascii_whitespace() {
            cursor.advance();
        } else if byte.is_ascii_digit() {
            cursor.eat_while(is_identifier_continue);
            let literal = parse_number(&expression[start..cursor.pos()]).ok()?;
            match literal.value {
                NumberValue::Integer(value) => atoms.push(Atom::Number(value as i64)),
                NumberValue::Float(_) => return None,
            }
        } else if is_identifier_start(byte) {
            cursor.eat_while(is_identifier_continue);
            let value = i64::from(&expression[start..cursor.pos()] == "true");
            atoms.push(Atom::Number(value));
        } else if byte == b'(' {
            cursor.advance();
            atoms.push(Atom::Open);
        } else if byte == b')' {
            cursor.advance();
            atoms.push(Atom::Close);
        } else {
            let op = OPERATORS.iter().copied().find(|op| cursor.starts_with(op))?;
            cursor.advance_by(op.len());
            atoms.push(Atom::Operator(op));
        }
    }
    Some(atoms)
}

fn binary_level(op: &str) -> Option<u8> {
    Some(match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | "<=" | ">" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    })
}

struct Evaluator {
    atoms: Vec<Atom>,
    pos: usize,
}

impl Evaluator {
    fn peek(&self) -> Option<&Atom> {
        self.atoms.get(self.pos)
    }

    fn next(&mut self) -> Option<Atom> {
        let atom = self.atoms.get(self.pos).cloned();
        self.pos += 1;
        atom
    }

    fn conditional(&mut self) -> Option<i64> {
        let condition = self.binary(1)?;
        if self.peek() != Some(&Atom::Operator("?")) {
            return Some(condition);
        }
        self.next();
        let if_true = self.conditional()?;
        if self.next()? != Atom::Operator(":") {
            return None;
        }
        let if_false = self.conditional()?;
        Some(if condition != 0 { if_true } else { if_false })
    }

    fn binary(&mut self, min_level: u8) -> Option<i64> {
        let mut left = self.unary()?;
        loop {
            let Some(Atom::Operator(op)) = self.peek() else {
                return Some(left);
            };
            let op = *op;
            let Some(level) = binary_level(op).filter(|&level| level >= min_level) else {
                return Some(left);
            };
            self.next();
            let right = self.binary(level + 1)?;
            left = apply(op, left, right)?;
        }
    }

    fn unary(&mut self) -> Option<i64> {
        match self.next()? {
            Atom::Number(value) => Some(value),
            Atom::Open => {
                let value = self.conditional()?;
                (self.next()? == Atom::Close).then_some(value)
            }
            Atom::Operator("!") => Some(i64::from(self.unary()? == 0)),
            Atom::Operator("~") => Some(!self.unary()?),
            Atom::Operator("-") => Some(self.unary()?.wrapping_neg()),
            Atom::Operator("+") => self.unary(),
            _ => None,
        }
    }
}

fn apply(op: &str, left: i64, right: i64) -> Option<i64> {
    Some(match op {
        "||" => i64::from(left != 0 || right != 0),
        "&&" => i64::from(left != 0 && right != 0),
        "|" => left | right,
        "^" => left ^ right,
        "&" => left & right,
        "==" => i64::from(left == right),
        "!=" => i64::from(left != right),
        "<" => i64::from(left < right),
        "<=" => i64::from(left <= right),
        ">" => i64::from(left > right),
        ">=" => i64::from(left >= right),
        "<<" => left.wrapping_shl(right as u32),
        ">>" => left.wrapping_shr(right as u32),
        "+" => left.wrapping_add(right),
        "-" => left.wrapping_sub(right),
        "*" => left.wrapping_mul(right),
        "/" => left.checked_div(right)?,
        "%" => left.checked_rem(right)?,
        _ => return None,
    })
}

/// Evaluate a fully expanded `#if` condition; `None` when malformed.
pub(crate) fn evaluate(expression: &str) -> Option<bool> {
    let atoms = lex(expression)?;
    if atoms.is_empty() {
        return None;
    }
    let mut evaluator = Evaluator { atoms, pos: 0 };
    let value = evaluator.conditional()?;
    (evaluator.pos == evaluator.atoms.len()).then_some(value != 0)
}
