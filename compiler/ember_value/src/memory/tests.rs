use super::*;
use pretty_assertions::assert_eq;

#[test]
fn stack_push_aligns_and_zeroes() {
    let mut memory = Memory::new(64);
    let a = memory.push_stack(1, 1).unwrap_or_default();
    let b = memory.push_stack(4, 4).unwrap_or_default();
    assert_eq!(a, Address::new(STACK_BLOCK, 0));
    assert_eq!(b, Address::new(STACK_BLOCK, 4));
    assert_eq!(memory.read_scalar::<i32>(b), Ok(0));
}

#[test]
fn stack_release_is_lifo() {
    let mut memory = Memory::new(64);
    let mark = memory.stack_mark();
    let slot = memory.push_stack(8, 8).unwrap_or_default();
    assert_eq!(memory.write_scalar(slot, 7i64), Ok(()));
    memory.release_stack(mark);
    assert_eq!(memory.stack().used(), 0);
    assert_eq!(
        memory.read_scalar::<i64>(slot),
        Err(RuntimeErrorKind::InvalidMemoryAccess)
    );
}

#[test]
fn stack_overflow() {
    let mut memory = Memory::new(16);
    assert!(memory.push_stack(16, 1).is_ok());
    assert_eq!(memory.push_stack(1, 1), Err(RuntimeErrorKind::StackOverflow));
}

#[test]
fn null_and_dangling_access() {
    let mut memory = Memory::new(16);
    assert_eq!(
        memory.read(Address::NULL, 4),
        Err(RuntimeErrorKind::NullPointerAccess)
    );
    let block = memory.allocate(4);
    assert_eq!(memory.free(block), Ok(()));
    assert_eq!(
        memory.read(block, 4),
        Err(RuntimeErrorKind::InvalidMemoryAccess)
    );
    assert_eq!(memory.free(block), Err(RuntimeErrorKind::InvalidMemoryAccess));
}

#[test]
fn heap_blocks_are_reused() {
    let mut memory = Memory::new(16);
    let first = memory.allocate(8);
    let _second = memory.allocate(8);
    assert_eq!(memory.free(first), Ok(()));
    let third = memory.allocate(2);
    assert_eq!(third.block(), first.block());
    assert_eq!(memory.heap_blocks(), 2);
}

#[test]
fn out_of_bounds_access_is_rejected() {
    let mut memory = Memory::new(16);
    let block = memory.allocate(4);
    assert!(memory.read(block.offset_by(2), 2).is_ok());
    assert_eq!(
        memory.read(block.offset_by(2), 4),
        Err(RuntimeErrorKind::InvalidMemoryAccess)
    );
    assert_eq!(
        memory.read(block.offset_by(-1), 1),
        Err(RuntimeErrorKind::InvalidMemoryAccess)
    );
}

#[test]
fn object_records_follow_storage() {
    let mut memory = Memory::new(32);
    let mark = memory.stack_mark();
    let object = memory.push_stack(8, 8).unwrap_or_default();
    memory.record_object(object, TypeId::new(40));
    assert_eq!(memory.object_type(object), Some(TypeId::new(40)));
    memory.release_stack(mark);
    assert_eq!(memory.object_type(object), None);

    let global = memory.allocate(8);
    memory.record_object(global, TypeId::new(41));
    assert_eq!(memory.free(global), Ok(()));
    assert_eq!(memory.object_type(global), None);
}

#[test]
fn c_strings() {
    let mut memory = Memory::new(16);
    let block = memory.allocate(4);
    assert_eq!(memory.write(block, b"hi\0"), Ok(()));
    assert_eq!(memory.read_c_string(block), Ok("hi".to_string()));
}
