use super::*;
use pretty_assertions::assert_eq;

#[test]
fn scalars_round_trip_through_bytes() {
    let mut bytes = [0u8; 8];
    (-2i32).write_bytes(&mut bytes);
    assert_eq!(i32::from_bytes(&bytes), -2);
    assert_eq!(&bytes[..4], &[0xFE, 0xFF, 0xFF, 0xFF]);

    Address::new(3, 16).write_bytes(&mut bytes);
    assert_eq!(Address::from_bytes(&bytes), Address::new(3, 16));
}

#[test]
fn short_input_reads_as_zero_extended() {
    assert_eq!(u32::from_bytes(&[1]), 1);
    assert!(!bool::from_bytes(&[]));
}

#[test]
fn built_in_kinds() {
    assert_eq!(ScalarKind::of(TypeId::INT), Some(ScalarKind::Signed(4)));
    assert_eq!(ScalarKind::of(TypeId::SIZE), Some(ScalarKind::Unsigned(8)));
    assert_eq!(ScalarKind::of(TypeId::FLOAT), Some(ScalarKind::Float(4)));
    assert_eq!(ScalarKind::of(TypeId::VOID), None);
}

#[test]
fn usual_arithmetic_conversions() {
    use ScalarKind::*;
    assert_eq!(Signed(1).common(Signed(2)), Signed(4));
    assert_eq!(Signed(4).common(Unsigned(4)), Unsigned(4));
    assert_eq!(Signed(8).common(Unsigned(4)), Signed(8));
    assert_eq!(Signed(4).common(Float(4)), Float(4));
    assert_eq!(Float(4).common(Float(8)), Float(8));
    assert_eq!(Bool.common(Bool), Signed(4));
}

#[test]
fn numbers_convert_like_casts() {
    assert_eq!(Number::Signed(300).convert(ScalarKind::Unsigned(1)), Number::Unsigned(44));
    assert_eq!(Number::Signed(-1).convert(ScalarKind::Unsigned(4)), Number::Unsigned(u64::from(u32::MAX)));
    assert_eq!(Number::Float(3.9).convert(ScalarKind::Signed(4)), Number::Signed(3));
    assert_eq!(Number::Float(-3.9).convert(ScalarKind::Signed(4)), Number::Signed(-3));
    assert_eq!(Number::Signed(2).convert(ScalarKind::Float(8)), Number::Float(2.0));
    assert_eq!(Number::Float(0.5).convert(ScalarKind::Bool), Number::Unsigned(1));
}
