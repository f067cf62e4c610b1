//! Behavior an embedder can rely on, checked through the public API.

use std::cell::Cell;

use ember::{
    CompileErrorKind, Diagnostic, Environment, Error, NativeCall, RuntimeErrorKind, TypeUsage,
    Value,
};
use pretty_assertions::assert_eq;

thread_local! {
    static CONSTRUCTED: Cell<u32> = const { Cell::new(0) };
    static DESTROYED: Cell<u32> = const { Cell::new(0) };
}

fn failure(result: Result<(), Diagnostic>) -> Error {
    match result {
        Ok(()) => panic!("expected the load to fail"),
        Err(diagnostic) => diagnostic.error,
    }
}

fn runtime_kind(result: Result<(), Diagnostic>) -> RuntimeErrorKind {
    match failure(result) {
        Error::Runtime(error) => error.kind,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

fn int_expression(env: &mut Environment, expr: &str) -> i32 {
    let value = env
        .try_evaluate(expr)
        .unwrap_or_else(|d| panic!("{d}"));
    env.read::<i32>(&value).unwrap_or_else(|e| panic!("{e}"))
}

#[test]
fn type_lookup_is_stable() {
    let mut env = Environment::new();
    let global = env.global();
    let point = env.register_struct(global, "Point", 8, 4);
    assert_eq!(env.get_type("Point"), Some(point));
    assert_eq!(env.get_type("Point"), Some(point));
    assert_eq!(env.get_type("int"), Some(TypeUsage::INT.type_id));
    assert_eq!(env.get_type("Missing"), None);
}

#[test]
#[should_panic(expected = "already registered")]
fn registering_a_type_twice_panics() {
    let mut env = Environment::new();
    let global = env.global();
    env.register_struct(global, "Point", 8, 4);
    env.register_struct(global, "Point", 8, 4);
}

fn pick_int(call: &mut NativeCall<'_>) -> Result<(), RuntimeErrorKind> {
    call.set_result(1i32)
}

fn pick_float(call: &mut NativeCall<'_>) -> Result<(), RuntimeErrorKind> {
    call.set_result(2i32)
}

fn pick_double(call: &mut NativeCall<'_>) -> Result<(), RuntimeErrorKind> {
    call.set_result(3i32)
}

#[test]
fn exact_overloads_win() {
    let mut env = Environment::new();
    let global = env.global();
    let float = env.type_usage("float").unwrap_or_else(|d| panic!("{d}"));
    let overloads = [
        (TypeUsage::INT, pick_int as ember::NativeFn),
        (float, pick_float),
        (TypeUsage::DOUBLE, pick_double),
    ];
    for (parameter, native) in overloads {
        let f = env.native_function("f", TypeUsage::INT, vec![parameter], native);
        env.register_function(global, f);
    }
    assert_eq!(env.get_functions("f").len(), 3);
    assert!(env.load("overloads", "int a = f(5);\nint b = f(2.5);\nint c = f(2.5f);"), "{}", env.error_message());
    assert_eq!(env.get_instance_value::<i32>("a"), Some(1));
    assert_eq!(env.get_instance_value::<i32>("b"), Some(3));
    assert_eq!(env.get_instance_value::<i32>("c"), Some(2));
}

fn tracked_new(call: &mut NativeCall<'_>) -> Result<(), RuntimeErrorKind> {
    CONSTRUCTED.with(|count| count.set(count.get() + 1));
    call.set_member(0, 7i32)
}

fn tracked_drop(call: &mut NativeCall<'_>) -> Result<(), RuntimeErrorKind> {
    call.this()?;
    DESTROYED.with(|count| count.set(count.get() + 1));
    Ok(())
}

fn counts() -> (u32, u32) {
    (CONSTRUCTED.with(Cell::get), DESTROYED.with(Cell::get))
}

#[test]
fn host_objects_are_destroyed_on_every_exit() {
    let mut env = Environment::new();
    let global = env.global();
    let tracked = env.register_struct(global, "Tracked", 4, 4);
    env.add_member(tracked, "value", TypeUsage::INT, 0);
    env.register_constructor(tracked, Vec::new(), tracked_new);
    env.register_destructor(tracked, tracked_drop);

    assert!(env.load("block", "void scope() { Tracked t; }\nscope();"), "{}", env.error_message());
    assert_eq!(counts(), (1, 1));

    let early = "int early(int n)\n{\n  Tracked t;\n  for (int i = 0; i < 10; i++)\n  {\n    if (i == n) return t.value;\n  }\n  return -1;\n}\nint r = early(1);";
    assert!(env.load("early", early), "{}", env.error_message());
    assert_eq!(counts(), (2, 2));
    assert_eq!(env.get_instance_value::<i32>("r"), Some(7));

    let failing = "int broken() { Tracked t; int zero = 0; return t.value / zero; }\nint x = broken();";
    assert_eq!(runtime_kind(env.try_load("failing", failing)), RuntimeErrorKind::DivisionByZero);
    assert_eq!(counts(), (3, 3));
}

#[test]
fn precedence_and_grouping() {
    let mut env = Environment::new();
    assert_eq!(int_expression(&mut env, "2 + 3 * 4"), 14);
    assert_eq!(int_expression(&mut env, "(2 + 3) * 4"), 20);
    assert_eq!(int_expression(&mut env, "1 << 2 + 1"), 8);
    assert_eq!(int_expression(&mut env, "7 - 2 - 1"), 4);
    assert_eq!(int_expression(&mut env, "1 | 2 & 3 ^ 4"), 7);
}

#[test]
fn pointers_survive_a_round_trip_through_a_base() {
    let mut env = Environment::new();
    let source = "\
struct A { int a; };
struct B { int b; };
struct C : A, B { int c; };
C object;
B* base = &object;
C* back = static_cast<C*>(base);
int sum = 0;
void check()
{
  base->b = 5;
  back->c = 6;
  sum = object.b * 10 + object.c;
}
check();";
    assert!(env.load("casts", source), "{}", env.error_message());
    assert_eq!(env.get_instance_value::<i32>("sum"), Some(56));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let mut env = Environment::new();
    let mut value = Value::void();
    assert!(!env.evaluate_expression("1 / 0", &mut value));
    assert_eq!(
        env.error_message(),
        "[Runtime Error] 'expression' -- Line 1: division by zero\n  at <global> ('expression', line 1)"
    );
    assert_eq!(runtime_kind(env.try_load("zero", "int z = 0;\nint q = 5 % z;")), RuntimeErrorKind::DivisionByZero);
}

#[test]
fn undefined_names_fail_to_compile() {
    let mut env = Environment::new();
    assert!(!env.load("undefined", "int x = y;"));
    assert!(!env.error_message().is_empty());
    let kind = match failure(env.try_load("undefined", "int x = y;")) {
        Error::Compile(error) => error.kind,
        other => panic!("expected a compile error, got {other:?}"),
    };
    assert_eq!(
        kind,
        CompileErrorKind::UndefinedVariable {
            name: "y".to_string()
        }
    );
}

#[test]
fn registered_array_members_are_bounds_checked() {
    let mut env = Environment::new();
    let global = env.global();
    let buffer = env.register_struct(global, "Buffer", 20, 4);
    env.add_member(buffer, "data", TypeUsage::INT.array_of(4), 0);
    env.add_member(buffer, "count", TypeUsage::INT, 16);
    let storage = env.allocate(20);
    env.register_instance(global, "buffer", TypeUsage::of(buffer), storage);

    assert!(env.load("fill", "for (int i = 0; i < 4; i++) buffer.data[i] = i * i;\nbuffer.count = 4;"), "{}", env.error_message());
    assert_eq!(env.memory().read_scalar::<i32>(storage.offset_by(12)), Ok(9));
    assert_eq!(env.memory().read_scalar::<i32>(storage.offset_by(16)), Ok(4));

    assert_eq!(
        runtime_kind(env.try_load("overrun", "int last = buffer.count;\nbuffer.data[last] = 1;")),
        RuntimeErrorKind::InvalidArrayIndex { index: 4, size: 4 }
    );
}
