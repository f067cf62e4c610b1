use super::*;

#[test]
fn pointer_round_trip() {
    let int = TypeUsage::INT;
    let ptr = int.pointer_to();
    assert_eq!(ptr.pointer_level, 1);
    assert!(ptr.is_pointer());
    assert_eq!(ptr.pointee(), int);
}

#[test]
fn array_decays_to_pointer() {
    let array = TypeUsage::INT.array_of(4);
    assert!(array.is_array());
    assert_eq!(array.array_size, 4);
    let decayed = array.pointer_to();
    assert!(!decayed.is_array());
    assert_eq!(decayed.pointer_level, 1);
    assert_eq!(array.element(), TypeUsage::INT);
}

#[test]
fn writability_tracks_the_right_const() {
    let const_int = TypeUsage::INT.with_flags(TypeUsageFlags::CONST);
    assert!(!const_int.is_writable());

    // `const int*` can be reseated, `int* const` cannot.
    let ptr_to_const = const_int.pointer_to();
    assert!(ptr_to_const.is_writable());
    let const_ptr = TypeUsage::INT
        .pointer_to()
        .with_flags(TypeUsageFlags::CONST_POINTER);
    assert!(!const_ptr.is_writable());
}

#[test]
fn same_value_type_ignores_references() {
    let reference = TypeUsage::INT.with_flags(TypeUsageFlags::REFERENCE);
    assert!(reference.same_value_type(&TypeUsage::INT));
    assert!(!TypeUsage::INT.same_value_type(&TypeUsage::DOUBLE));
    assert!(!TypeUsage::INT.same_value_type(&TypeUsage::INT.pointer_to()));
}
