use ember_diagnostic::RuntimeErrorKind;
use ember_ir::StaticSlot;
use ember_types::Registry;
use pretty_assertions::assert_eq;

use super::{Runtime, DEFAULT_MAX_CALL_DEPTH};
use crate::{CallFrame, CallStack};

#[test]
fn statics_initialize_once() {
    let mut runtime = Runtime::default();
    let slot = StaticSlot::new(3);
    assert!(!runtime.is_static_initialized(slot));
    runtime.mark_static_initialized(slot);
    runtime.mark_static_initialized(slot);
    assert!(runtime.is_static_initialized(slot));
    assert!(!runtime.is_static_initialized(StaticSlot::new(4)));
    assert_eq!(runtime.max_call_depth(), DEFAULT_MAX_CALL_DEPTH);
}

#[test]
fn hook_sees_the_current_line_and_can_abort() {
    let mut registry = Registry::new();
    let program = registry.intern("hooked");
    let mut stack = CallStack::new(4);
    assert_eq!(
        stack.push(CallFrame {
            program,
            function: None,
            line: 7,
        }),
        Ok(())
    );

    let mut runtime = Runtime::default();
    assert_eq!(runtime.run_hook(&registry, &stack), Ok(()));
    runtime.set_hook(Some(Box::new(|context| {
        if context.line() >= 7 {
            Err(RuntimeErrorKind::custom(format!("stopped at {}", context.line())))
        } else {
            Ok(())
        }
    })));
    assert!(runtime.has_hook());
    assert_eq!(
        runtime.run_hook(&registry, &stack),
        Err(RuntimeErrorKind::custom("stopped at 7"))
    );
}
