use ember_diagnostic::RuntimeErrorKind;
use ember_ir::TypeUsage;
use ember_types::{Function, Registry};
use pretty_assertions::assert_eq;

use super::{CallFrame, CallStack};

#[test]
fn push_respects_the_depth_limit() {
    let mut registry = Registry::new();
    let program = registry.intern("main");
    let mut stack = CallStack::new(2);
    let frame = CallFrame {
        program,
        function: None,
        line: 1,
    };
    assert_eq!(stack.push(frame), Ok(()));
    assert_eq!(stack.push(frame), Ok(()));
    assert_eq!(
        stack.push(frame),
        Err(RuntimeErrorKind::CallDepthExceeded { depth: 2 })
    );
    assert_eq!(stack.depth(), 2);
    stack.pop();
    assert_eq!(stack.depth(), 1);
}

#[test]
fn capture_names_programs_and_functions() {
    let mut registry = Registry::new();
    let program = registry.intern("main");
    let name = registry.intern("helper");
    let helper = registry.register_function(
        ember_ir::InstanceOwner::Namespace(ember_ir::NamespaceId::GLOBAL),
        Function::new(name, TypeUsage::VOID, Vec::new()),
    );
    let mut stack = CallStack::new(8);
    let push = |stack: &mut CallStack, function| {
        stack.push(CallFrame {
            program,
            function,
            line: 0,
        })
    };
    assert_eq!(push(&mut stack, None), Ok(()));
    stack.set_line(4);
    assert_eq!(push(&mut stack, Some(helper)), Ok(()));
    stack.set_line(9);

    let entries: Vec<(String, u32)> = stack
        .capture(&registry)
        .into_iter()
        .map(|entry| (entry.function, entry.line))
        .collect();
    assert_eq!(
        entries,
        vec![("<global>".to_string(), 4), ("helper".to_string(), 9)]
    );
    assert_eq!(stack.line(), 9);
}
