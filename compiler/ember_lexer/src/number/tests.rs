use super::*;
use pretty_assertions::assert_eq;

fn integer(text: &str) -> u64 {
    match parse_number(text).map(|literal| literal.value) {
        Ok(NumberValue::Integer(value)) => value,
        other => panic!("expected integer from {text}, got {other:?}"),
    }
}

#[test]
fn decimal_hex_octal_binary() {
    assert_eq!(integer("42"), 42);
    assert_eq!(integer("0x1F"), 31);
    assert_eq!(integer("017"), 15);
    assert_eq!(integer("0b101"), 5);
    assert_eq!(integer("0"), 0);
}

#[test]
fn integer_suffixes() {
    let literal = parse_number("10ull").unwrap_or_else(|e| panic!("{e}"));
    assert!(literal.unsigned);
    assert_eq!(literal.long, 2);

    let literal = parse_number("7L").unwrap_or_else(|e| panic!("{e}"));
    assert!(!literal.unsigned);
    assert_eq!(literal.long, 1);
}

#[test]
fn hex_digits_are_not_suffixes() {
    assert_eq!(integer("0xff"), 255);
}

#[test]
fn floats() {
    let literal = parse_number("1.5f").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(literal.value, NumberValue::Float(1.5));
    assert!(literal.single_precision);

    let literal = parse_number("2e3").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(literal.value, NumberValue::Float(2000.0));
    assert!(!literal.single_precision);

    assert_eq!(
        parse_number(".25").map(|l| l.value),
        Ok(NumberValue::Float(0.25))
    );
}

#[test]
fn malformed_numbers_are_rejected() {
    assert!(parse_number("12uu").is_err());
    assert!(parse_number("09").is_err());
    assert!(parse_number("1lf").is_err());
    assert!(parse_number("0x").is_err());
}
