use ember_diagnostic::RuntimeErrorKind;
use ember_ir::{BinaryOp, UnaryOp};
use ember_value::{Number, ScalarKind};
use pretty_assertions::assert_eq;

use super::{arithmetic, compare, unary};

const INT: ScalarKind = ScalarKind::Signed(4);
const UINT: ScalarKind = ScalarKind::Unsigned(4);
const DOUBLE: ScalarKind = ScalarKind::Float(8);

fn int_result(op: BinaryOp, l: i64, r: i64) -> i64 {
    let result = arithmetic(op, INT, Number::Signed(l), Number::Signed(r))
        .unwrap_or_else(|e| panic!("{e}"));
    result.convert(INT).as_i64()
}

#[test]
fn integer_arithmetic_wraps_at_the_kind_width() {
    assert_eq!(int_result(BinaryOp::Add, 2, 3), 5);
    assert_eq!(int_result(BinaryOp::Add, i64::from(i32::MAX), 1), i64::from(i32::MIN));
    assert_eq!(int_result(BinaryOp::Div, -7, 2), -3);
    assert_eq!(int_result(BinaryOp::Mod, -7, 2), -1);
    assert_eq!(int_result(BinaryOp::Shr, -8, 1), -4);
    assert_eq!(int_result(BinaryOp::Shl, 1, 4), 16);
}

#[test]
fn unsigned_subtraction_wraps() {
    let result = arithmetic(BinaryOp::Sub, UINT, Number::Unsigned(1), Number::Unsigned(2))
        .map(|n| n.convert(UINT));
    assert_eq!(result, Ok(Number::Unsigned(u64::from(u32::MAX))));
}

#[test]
fn integer_division_by_zero_is_an_error() {
    for op in [BinaryOp::Div, BinaryOp::Mod] {
        assert_eq!(
            arithmetic(op, INT, Number::Signed(1), Number::Signed(0)),
            Err(RuntimeErrorKind::DivisionByZero)
        );
    }
    let float = arithmetic(BinaryOp::Div, DOUBLE, Number::Float(1.0), Number::Float(0.0));
    assert_eq!(float, Ok(Number::Float(f64::INFINITY)));
}

#[test]
fn mixed_operands_convert_first() {
    let result = arithmetic(BinaryOp::Mul, DOUBLE, Number::Signed(3), Number::Float(0.5));
    assert_eq!(result, Ok(Number::Float(1.5)));
}

#[test]
fn comparisons_follow_the_kind() {
    assert!(compare(BinaryOp::Lt, INT, Number::Signed(-1), Number::Signed(0)));
    // -1 converted to unsigned is the largest value
    assert!(compare(BinaryOp::Gt, UINT, Number::Signed(-1), Number::Unsigned(0)));
    assert!(compare(BinaryOp::NotEq, DOUBLE, Number::Float(f64::NAN), Number::Float(f64::NAN)));
    assert!(!compare(BinaryOp::Eq, DOUBLE, Number::Float(f64::NAN), Number::Float(f64::NAN)));
    assert!(compare(BinaryOp::GtEq, DOUBLE, Number::Float(2.0), Number::Signed(2)));
}

#[test]
fn unary_operators() {
    assert_eq!(unary(UnaryOp::Negate, INT, Number::Signed(5)), Ok(Number::Signed(-5)));
    assert_eq!(unary(UnaryOp::BitNot, INT, Number::Signed(0)), Ok(Number::Signed(-1)));
    assert_eq!(unary(UnaryOp::Negate, DOUBLE, Number::Float(1.5)), Ok(Number::Float(-1.5)));
    assert!(unary(UnaryOp::BitNot, DOUBLE, Number::Float(1.0)).is_err());
}
