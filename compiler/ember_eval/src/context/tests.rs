use ember_ir::{Name, TypeUsage};
use ember_value::Address;
use pretty_assertions::assert_eq;

use super::{ExecutionContext, Frame, LocalSlot};

fn slot(name: u32, offset: u32) -> LocalSlot {
    LocalSlot {
        name: Name::from_raw(name),
        type_usage: TypeUsage::INT,
        address: Address::new(1, offset),
        owned: false,
    }
}

fn frame(locals_base: usize) -> Frame {
    Frame {
        function: None,
        this: Address::NULL,
        locals_base,
        return_slot: None,
        return_value: None,
    }
}

#[test]
fn latest_declaration_shadows() {
    let mut context = ExecutionContext::new(8);
    context.frames.push(frame(0));
    context.declare(slot(1, 0));
    context.declare(slot(2, 4));
    context.declare(slot(1, 8));
    assert_eq!(
        context.local(Name::from_raw(1)).map(|l| l.address),
        Some(Address::new(1, 8))
    );
    assert_eq!(context.local_index(Name::from_raw(2)), Some(1));
    assert_eq!(context.local(Name::from_raw(3)), None);
}

#[test]
fn locals_of_callers_are_not_visible() {
    let mut context = ExecutionContext::new(8);
    context.frames.push(frame(0));
    context.declare(slot(1, 0));
    context.frames.push(frame(1));
    context.declare(slot(2, 4));
    assert_eq!(context.local(Name::from_raw(1)), None);
    assert!(context.local(Name::from_raw(2)).is_some());
    assert_eq!(context.this(), Address::NULL);
}
