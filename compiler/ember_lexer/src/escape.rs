//! Escape sequence decoding for character and string literals.
//!
//! Valid escapes: `\n` `\t` `\r` `\a` `\b` `\f` `\v` `\\` `\'` `\"` `\?`,
//! octal `\ooo` (one to three digits, so `\0` is octal zero) and hex `\xhh`.
//!
//! Decoded literals are sequences of code units. Narrow literals get one
//! unit per UTF-8 byte of plain text; wide literals get one unit per
//! character. An escape always yields exactly one unit.

use ember_diagnostic::CompileErrorKind;

/// Decode the content of a literal (the text between its quotes).
pub fn unescape(content: &str, wide: bool) -> Result<Vec<u32>, CompileErrorKind> {
    let mut units = Vec::with_capacity(content.len());
    let mut chars = content.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '\\' {
            if wide {
                units.push(u32::from(c));
            } else {
                let mut buffer = [0u8; 4];
                units.extend(c.encode_utf8(&mut buffer).bytes().map(u32::from));
            }
            continue;
        }

        let Some((_, escape)) = chars.next() else {
            return Err(invalid(&content[start..]));
        };
        let unit = match escape {
            'n' => u32::from('\n'),
            't' => u32::from('\t'),
            'r' => u32::from('\r'),
            'a' => 0x07,
            'b' => 0x08,
            'f' => 0x0C,
            'v' => 0x0B,
            '\\' | '\'' | '"' | '?' => u32::from(escape),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|&(_, d)| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                value
            }
            'x' => {
                let mut value: u32 = 0;
                let mut digits = 0;
                while let Some(digit) = chars.peek().and_then(|&(_, d)| d.to_digit(16)) {
                    value = value.wrapping_mul(16).wrapping_add(digit);
                    digits += 1;
                    chars.next();
                }
                if digits == 0 {
                    return Err(invalid(&content[start..start + 2]));
                }
                value
            }
            other => {
                let end = start + 1 + other.len_utf8();
                return Err(invalid(&content[start..end]));
            }
        };
        units.push(if wide { unit } else { unit & 0xFF });
    }

    Ok(units)
}

fn invalid(sequence: &str) -> CompileErrorKind {
    CompileErrorKind::InvalidEscapeSequence {
        sequence: sequence.to_string(),
    }
}

#[cfg(test)]
mod tests;
