use ember_diagnostic::CompileErrorKind;
use ember_ir::{ExprKind, NamespaceId, TypeUsage};
use pretty_assertions::assert_eq;

use crate::tests::Fixture;

fn error_of(fixture: &mut Fixture, source: &str) -> Option<CompileErrorKind> {
    fixture.expr(source).map_err(|e| e.kind).err()
}

#[test]
fn arithmetic_promotes_to_the_wider_operand() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.expr_type("1 + 2.5"), "double");
    assert_eq!(fixture.expr_type("1 + 2l"), "long");
    assert_eq!(fixture.expr_type("1.5f * 2.0f"), "float");
    assert_eq!(fixture.expr_type("7 % 2"), "int");
    assert_eq!(fixture.expr_type("1 < 2.0"), "bool");
    assert_eq!(fixture.expr_type("1 && 0"), "bool");
}

#[test]
fn integral_only_operators_reject_floats() {
    let mut fixture = Fixture::new();
    assert_eq!(
        error_of(&mut fixture, "1.5 % 2"),
        Some(CompileErrorKind::InvalidOperator {
            operator: "%".to_string(),
            type_name: "double".to_string()
        })
    );
    assert!(error_of(&mut fixture, "1 << 2.0").is_some());
}

#[test]
fn assignment_targets() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.error("const int limit = 1;\nvoid f() { limit = 2; }"),
        CompileErrorKind::CannotModifyConstExpression
    );
    assert_eq!(
        fixture.error("void g() { 1 = 2; }"),
        CompileErrorKind::InvalidAssignment
    );
    fixture.statements("int counter = 0;\nvoid h() { counter += 2.5; counter <<= 1; }");
}

#[test]
fn overloads_pick_the_best_match() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "int pick(int v) { return 1; }\nint pick(double v) { return 2; }\nint pick(const char* s) { return 3; }",
    );
    let picked = |fixture: &mut Fixture, source: &str| {
        let expr = fixture.expr(source).unwrap_or_else(|e| panic!("{e}"));
        let ExprKind::Call { function, .. } = expr.kind else {
            panic!("call expected for {source}");
        };
        fixture.registry.function(function).parameters.clone()
    };
    assert_eq!(picked(&mut fixture, "pick(1)"), vec![TypeUsage::INT]);
    assert_eq!(picked(&mut fixture, "pick(1.5)"), vec![TypeUsage::DOUBLE]);
    assert_eq!(picked(&mut fixture, "pick(\"x\")").len(), 1);
}

#[test]
fn call_errors() {
    let mut fixture = Fixture::new();
    fixture.statements("void take(int* p) {}");
    assert_eq!(
        error_of(&mut fixture, "take(1.5)"),
        Some(CompileErrorKind::NoMatchingOverload {
            name: "take".to_string(),
            arguments: "double".to_string()
        })
    );
    assert_eq!(
        error_of(&mut fixture, "missing(1)"),
        Some(CompileErrorKind::UndefinedFunction {
            name: "missing".to_string()
        })
    );
}

#[test]
fn member_access_operators_must_match_pointerness() {
    let mut fixture = Fixture::new();
    fixture.statements("struct S { int a; int* p; };\nS s;\nS* ps = &s;");
    assert_eq!(fixture.expr_type("s.a"), "int");
    assert_eq!(fixture.expr_type("ps->p"), "int*");
    assert_eq!(
        error_of(&mut fixture, "s->a"),
        Some(CompileErrorKind::InvalidMemberAccessOperatorNonPtr {
            member: "a".to_string()
        })
    );
    assert_eq!(
        error_of(&mut fixture, "ps.a"),
        Some(CompileErrorKind::InvalidMemberAccessOperatorPtr {
            member: "a".to_string()
        })
    );
    assert_eq!(
        error_of(&mut fixture, "s.missing"),
        Some(CompileErrorKind::MissingMember {
            member: "missing".to_string(),
            type_name: "S".to_string()
        })
    );
}

#[test]
fn visibility_is_enforced() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "class Base { int secret; protected: int shared; public: int open; };\n\
         struct Derived : Base { int get() { return shared + open; } };\n\
         Base base;",
    );
    assert_eq!(fixture.expr_type("base.open"), "int");
    assert_eq!(
        error_of(&mut fixture, "base.secret"),
        Some(CompileErrorKind::InaccessibleMember {
            member: "secret".to_string(),
            type_name: "Base".to_string()
        })
    );
    assert!(matches!(
        error_of(&mut fixture, "base.shared"),
        Some(CompileErrorKind::InaccessibleMember { .. })
    ));
}

#[test]
fn const_objects_only_call_const_methods() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct Gauge { int level; int read() const { return level; } void bump() { level++; } };\n\
         const Gauge fixed;\nGauge loose;",
    );
    assert_eq!(fixture.expr_type("fixed.read()"), "int");
    assert_eq!(fixture.expr_type("loose.read()"), "int");
    assert_eq!(
        error_of(&mut fixture, "fixed.bump()"),
        Some(CompileErrorKind::NonConstMethod {
            method: "Gauge::bump".to_string()
        })
    );
    assert_eq!(
        fixture.error("struct Bad { int v; int get() const { v = 1; return v; } };"),
        CompileErrorKind::CannotModifyConstExpression
    );
}

#[test]
fn operator_overloads() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct V { int x; V operator+(const V& o) const { V r; r.x = x + o.x; return r; } };\n\
         bool operator==(const V& a, const V& b) { return a.x == b.x; }\n\
         V a;\nV b;",
    );
    let sum = fixture.expr("a + b").unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(sum.kind, ExprKind::MethodCall { .. }));
    assert_eq!(fixture.registry.type_usage_name(sum.type_usage), "V");
    let equal = fixture.expr("a == b").unwrap_or_else(|e| panic!("{e}"));
    assert!(matches!(equal.kind, ExprKind::Call { .. }));
    assert_eq!(
        error_of(&mut fixture, "a - b"),
        Some(CompileErrorKind::InvalidOperator {
            operator: "-".to_string(),
            type_name: "V".to_string()
        })
    );
}

#[test]
fn conditional_expression_types() {
    let mut fixture = Fixture::new();
    fixture.statements("struct P { int v; };\nP p;");
    assert_eq!(fixture.expr_type("true ? 1 : 2.5"), "double");
    assert!(matches!(
        error_of(&mut fixture, "true ? p : 1"),
        Some(CompileErrorKind::IncompatibleTypes { .. })
    ));
    assert_eq!(
        error_of(&mut fixture, "p ? 1 : 2"),
        Some(CompileErrorKind::InvalidConditionalExpression)
    );
}

#[test]
fn pointer_arithmetic() {
    let mut fixture = Fixture::new();
    fixture.statements("int values[4];");
    assert_eq!(fixture.expr_type("values + 1"), "int*");
    assert_eq!(fixture.expr_type("&values[2] - &values[0]"), "long");
    assert_eq!(fixture.expr_type("values[1]"), "int");
    assert!(matches!(
        error_of(&mut fixture, "values * 2"),
        Some(CompileErrorKind::InvalidOperator { .. })
    ));
    assert_eq!(
        error_of(&mut fixture, "values[1.5]"),
        Some(CompileErrorKind::NonIntegerValue {
            context: "array index".to_string()
        })
    );
}

#[test]
fn this_needs_a_method() {
    let mut fixture = Fixture::new();
    assert_eq!(error_of(&mut fixture, "this"), Some(CompileErrorKind::InvalidThis));
    assert_eq!(
        fixture.error("struct Counter { static int make() { return this == nullptr; } };"),
        CompileErrorKind::InvalidThis
    );
}

#[test]
fn scoped_enums_do_not_mix_with_integers() {
    let mut fixture = Fixture::new();
    fixture.statements("enum class Color { Red, Green };\nenum Plain { One = 1, Two };");
    assert_eq!(fixture.expr_type("Color::Red == Color::Green"), "bool");
    assert_eq!(
        error_of(&mut fixture, "Color::Red + 1"),
        Some(CompileErrorKind::InvalidOperator {
            operator: "+".to_string(),
            type_name: "Color".to_string()
        })
    );
    assert_eq!(fixture.expr_type("Two + 1"), "int");
    assert!(fixture
        .registry
        .get_instance(NamespaceId::GLOBAL, "Red")
        .is_none());
}

#[test]
fn sizeof_yields_size_t() {
    let mut fixture = Fixture::new();
    fixture.statements("struct Pair { int a; double b; };");
    assert_eq!(fixture.expr_type("sizeof(int)"), "size_t");
    assert_eq!(fixture.expr_type("sizeof(Pair)"), "size_t");
}
