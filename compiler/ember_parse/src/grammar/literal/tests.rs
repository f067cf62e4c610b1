use ember_diagnostic::CompileErrorKind;
use ember_ir::{ExprKind, Literal};
use pretty_assertions::assert_eq;

use crate::tests::Fixture;

#[test]
fn integer_literal_types() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.expr_type("42"), "int");
    assert_eq!(fixture.expr_type("3000000000"), "long");
    assert_eq!(fixture.expr_type("0xFFFFFFFF"), "uint32_t");
    assert_eq!(fixture.expr_type("10u"), "uint32_t");
    assert_eq!(fixture.expr_type("10l"), "long");
    assert_eq!(fixture.expr_type("10ll"), "int64_t");
    assert_eq!(fixture.expr_type("10ull"), "uint64_t");
}

#[test]
fn floating_literal_types() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.expr_type("1.5"), "double");
    assert_eq!(fixture.expr_type("1.5f"), "float");
    assert_eq!(fixture.expr_type("2e3"), "double");
}

#[test]
fn character_literals_are_integers() {
    let mut fixture = Fixture::new();
    let expr = fixture.expr("'A'").map(|e| e.kind).ok();
    assert_eq!(expr, Some(ExprKind::Literal(Literal::Integer(65))));
    assert_eq!(fixture.expr_type("'\\n'"), "char");
    assert_eq!(fixture.expr_type("L'x'"), "wchar_t");
}

#[test]
fn adjacent_strings_concatenate() {
    let mut fixture = Fixture::new();
    let expr = fixture.expr("\"con\" \"cat\"").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(fixture.registry.type_usage_name(expr.type_usage), "const char*");
    let ExprKind::Literal(Literal::String(id)) = expr.kind else {
        panic!("string literal expected");
    };
    let address = fixture.registry.literal_address(id);
    assert_eq!(fixture.memory.read_c_string(address).ok().as_deref(), Some("concat"));
}

#[test]
fn wide_strings() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.expr_type("L\"wide\""), "const wchar_t*");
}

#[test]
fn boolean_and_null_literals() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.expr_type("true"), "bool");
    assert_eq!(fixture.expr_type("false || true"), "bool");
    assert!(fixture.expr("nullptr").is_ok());
}

#[test]
fn bad_escape_is_reported() {
    let mut fixture = Fixture::new();
    let error = fixture.expr("'\\q'").map_err(|e| e.kind).err();
    assert!(matches!(
        error,
        Some(CompileErrorKind::InvalidEscapeSequence { .. })
    ));
}
