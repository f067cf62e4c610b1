//! Numeric literal decoding.
//!
//! The tokenizer only delimits numbers; the parser calls [`parse_number`] to
//! obtain the value and the suffix flags that select the literal's type.

use ember_diagnostic::CompileErrorKind;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberValue {
    Integer(u64),
    Float(f64),
}

/// A decoded number with its suffix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumberLiteral {
    pub value: NumberValue,
    /// `u` suffix.
    pub unsigned: bool,
    /// Number of `l` suffix letters (0, 1 or 2).
    pub long: u8,
    /// `f` suffix on a floating literal.
    pub single_precision: bool,
}

pub fn parse_number(text: &str) -> Result<NumberLiteral, CompileErrorKind> {
    let invalid = || CompileErrorKind::InvalidLiteral {
        literal: text.to_string(),
    };

    let lower = text.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(binary) = lower.strip_prefix("0b") {
        (2, binary)
    } else {
        (10, lower.as_str())
    };

    let is_float = radix == 10 && body.contains(['.', 'e']);
    let suffix_letters: &[char] = if is_float { &['f', 'l'] } else { &['u', 'l'] };
    let digits = body.trim_end_matches(suffix_letters);
    let suffix = &body[digits.len()..];
    if digits.is_empty() {
        return Err(invalid());
    }

    let mut literal = NumberLiteral {
        value: NumberValue::Integer(0),
        unsigned: false,
        long: 0,
        single_precision: false,
    };
    for letter in suffix.chars() {
        match letter {
            'u' if !literal.unsigned => literal.unsigned = true,
            'l' if literal.long < 2 => literal.long += 1,
            'f' if !literal.single_precision && literal.long == 0 => {
                literal.single_precision = true;
            }
            _ => return Err(invalid()),
        }
    }

    if is_float {
        let value = digits.parse::<f64>().map_err(|_| invalid())?;
        literal.value = NumberValue::Float(value);
        return Ok(literal);
    }

    let (radix, digits) = if radix == 10 && digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (radix, digits)
    };
    let value = u64::from_str_radix(digits, radix).map_err(|_| invalid())?;
    literal.value = NumberValue::Integer(value);
    Ok(literal)
}

#[cfg(test)]
mod tests;
