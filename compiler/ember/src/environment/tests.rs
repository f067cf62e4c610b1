use std::cell::Cell;
use std::rc::Rc;

use ember_diagnostic::{Error, RuntimeErrorKind};
use ember_ir::{Settings, TypeUsage};
use ember_lexer::Macro;
use ember_value::Value;
use pretty_assertions::assert_eq;

use crate::{Environment, EnvironmentBuilder};

#[test]
fn error_message_tracks_the_last_call() {
    let mut env = Environment::new();
    assert!(!env.load("broken", "int x = y;"));
    assert_eq!(
        env.error_message(),
        "[Compile Error] 'broken' -- Line 1: undefined variable ('y')"
    );
    assert!(env.load("fixed", "int x = 2;"));
    assert_eq!(env.error_message(), "");
    assert_eq!(env.get_instance_value::<i32>("x"), Some(2));
}

#[test]
fn failed_loads_keep_earlier_declarations() {
    let mut env = Environment::new();
    assert!(!env.load("partial", "int kept = 5;\nint lost = missing;"));
    // Parsing failed, so nothing ran: `kept` exists but holds zero.
    assert_eq!(env.get_instance_value::<i32>("kept"), Some(0));
    assert!(env.get_variable("lost").is_none());
    assert!(env.load("next", "kept = 7;\nint doubled = kept * 2;"));
    assert_eq!(env.get_instance_value::<i32>("doubled"), Some(14));
}

#[test]
fn runtime_errors_render_the_call_stack() {
    let mut env = Environment::new();
    let source = "int ratio(int a, int b)\n{\n  return a / b;\n}\nint r = ratio(1, 0);";
    assert!(!env.load("main", source));
    assert_eq!(
        env.error_message(),
        "[Runtime Error] 'main' -- Line 3: division by zero\n  at ratio ('main', line 3)\n  at <global> ('main', line 5)"
    );
}

#[test]
fn preprocessor_errors_stop_the_load() {
    let mut env = Environment::new();
    assert!(!env.load("macros", "#if 1\nint a = 1;"));
    assert_eq!(
        env.error_message(),
        "[Preprocessor Error] 'macros' -- Line 1: unterminated conditional block"
    );
}

#[test]
fn expressions_see_globals_and_macros() {
    let mut env = Environment::new();
    env.define_macro("SCALE", Macro::object("10"));
    env.define_macro("TWICE", Macro::function(&["v"], "((v) * 2)"));
    assert!(env.load("globals", "int base = 4;"));

    let mut value = Value::void();
    assert!(env.evaluate_expression("TWICE(base) + SCALE", &mut value));
    assert_eq!(value.type_usage, TypeUsage::INT);
    assert_eq!(env.read::<i32>(&value), Ok(18));

    assert!(env.undefine_macro("SCALE"));
    assert!(!env.evaluate_expression("SCALE", &mut value));
    assert_eq!(
        env.error_message(),
        "[Compile Error] 'expression' -- Line 1: undefined variable ('SCALE')"
    );
}

#[test]
fn host_calls_check_arity_and_result_size() {
    let mut env = Environment::new();
    assert!(env.load("lib", "int add(int a, int b) { return a + b; }\nint hits = 0;\nvoid hit() { hits++; }"));

    let add = env.get_function("add");
    let add = add.unwrap_or_else(|| panic!("add not registered"));
    let args = [Value::of(TypeUsage::INT, 2i32), Value::of(TypeUsage::INT, 40i32)];
    assert_eq!(env.return_function_call::<i32>(add, &args), Some(42));

    // A double argument converts to the int parameter.
    let mixed = [Value::of(TypeUsage::DOUBLE, 1.9f64), Value::of(TypeUsage::INT, 1i32)];
    assert_eq!(env.return_function_call::<i32>(add, &mixed), Some(2));

    assert_eq!(env.return_function_call::<i64>(add, &args), None);
    assert!(env.error_message().contains("returns 4 byte(s), requested 8"));

    assert_eq!(env.return_function_call::<i32>(add, &args[..1]), None);
    assert!(env.error_message().contains("'add' takes 2 argument(s), 1 given"));

    let hit = env.get_function("hit").unwrap_or_else(|| panic!("hit not registered"));
    assert!(env.void_function_call(hit, &[]));
    assert!(env.void_function_call(hit, &[]));
    assert_eq!(env.error_message(), "");
    assert_eq!(env.get_instance_value::<i32>("hits"), Some(2));
}

#[test]
fn hook_sees_each_statement_and_can_abort() {
    let mut env = Environment::new();
    let lines = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&lines);
    env.set_execution_hook(move |context| {
        seen.set(seen.get() + 1);
        if context.line() == 3 {
            return Err(RuntimeErrorKind::custom("stopped by host"));
        }
        Ok(())
    });
    assert!(!env.load("hooked", "int a = 1;\nint b = 2;\nint c = 3;"));
    assert_eq!(lines.get(), 3);
    assert_eq!(
        env.error_message(),
        "[Runtime Error] 'hooked' -- Line 3: stopped by host\n  at <global> ('hooked', line 3)"
    );
    assert_eq!(env.get_instance_value::<i32>("b"), Some(2));

    env.clear_execution_hook();
    assert!(env.load("free", "int d = 4;\nint e = 5;\nint f = 6;"));
    assert_eq!(lines.get(), 3);
}

#[test]
fn builder_settings_reach_the_parser() {
    let mut env = EnvironmentBuilder::new()
        .settings(Settings::DISALLOW_DYNAMIC_CAST | Settings::DISALLOW_STATIC_POINTERS)
        .build();
    assert_eq!(
        env.settings(),
        Settings::DISALLOW_DYNAMIC_CAST | Settings::DISALLOW_STATIC_POINTERS
    );
    assert!(!env.load("pointers", "int value = 1;\nint* global = &value;"));
    assert_eq!(
        env.error_message(),
        "[Compile Error] 'pointers' -- Line 2: static pointers are not allowed ('global')"
    );
    assert!(!env.load(
        "casts",
        "struct C { int c; };\nstruct D : C { int d; };\nvoid f(C* c) { D* d = dynamic_cast<D*>(c); }"
    ));
    assert_eq!(
        env.error_message(),
        "[Compile Error] 'casts' -- Line 3: dynamic_cast is not allowed"
    );
}

#[test]
fn limits_come_from_the_builder() {
    let mut env = Environment::builder().max_call_depth(8).build();
    assert!(!env.load("deep", "int down(int n) { return n == 0 ? 0 : down(n - 1); }\nint r = down(20);"));
    let error = env.try_load("deep2", "int r2 = down(20);").err();
    let kind = match error.map(|d| d.error) {
        Some(Error::Runtime(runtime)) => Some(runtime.kind),
        _ => None,
    };
    assert_eq!(kind, Some(RuntimeErrorKind::CallDepthExceeded { depth: 8 }));

    let mut small = Environment::builder().stack_capacity(64).build();
    assert!(!small.load("big", "void f() { int big[64]; big[0] = 1; }\nf();"));
    assert!(small.error_message().contains("execution stack overflow"));
}

#[test]
fn overload_lookup_by_exact_signature() {
    let mut env = Environment::new();
    assert!(env.load(
        "overloads",
        "double scale(double v) { return v * 2.0; }\n\
         int scale(int v) { return v * 3; }\n\
         float narrow(float v) { return v; }",
    ));
    let scales = env.get_functions("scale");
    assert_eq!(env.get_function_overload("scale", &[TypeUsage::DOUBLE]), Some(scales[0]));
    assert_eq!(env.get_function_overload("scale", &[TypeUsage::INT]), Some(scales[1]));
    let int32 = env.type_usage("int32_t").unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(env.get_function_overload("scale", &[int32]), Some(scales[1]));

    // a call would convert, an exact lookup does not
    assert!(env.get_function("narrow").is_some());
    assert_eq!(env.get_function_overload("narrow", &[TypeUsage::INT]), None);
    assert_eq!(env.get_function_overload("missing", &[]), None);
}
