use ember_ir::{Compatibility, InstanceOwner, NamespaceId, TypeId, TypeUsage, TypeUsageFlags};
use pretty_assertions::assert_eq;

use crate::{Function, FunctionFlags, Registry};

const GLOBAL: InstanceOwner = InstanceOwner::Namespace(NamespaceId::GLOBAL);

fn function(registry: &mut Registry, name: &str, params: Vec<TypeUsage>) -> ember_ir::FunctionId {
    let name = registry.intern(name);
    registry.register_function(GLOBAL, Function::new(name, TypeUsage::VOID, params))
}

#[test]
fn arithmetic_ladder() {
    let registry = Registry::new();
    let int = TypeUsage::INT;
    let float = TypeUsage::of(TypeId::FLOAT);
    assert_eq!(registry.compatibility(int, int), Compatibility::PerfectMatch);
    assert_eq!(
        registry.compatibility(TypeUsage::of(TypeId::INT32), int),
        Compatibility::PerfectMatch
    );
    assert_eq!(
        registry.compatibility(TypeUsage::of(TypeId::LONG), int),
        Compatibility::ImplicitCastableInteger
    );
    assert_eq!(registry.compatibility(float, int), Compatibility::ImplicitCastableIntegerFloat);
    assert_eq!(registry.compatibility(int, TypeUsage::DOUBLE), Compatibility::ImplicitCastableIntegerFloat);
    assert_eq!(registry.compatibility(float, TypeUsage::DOUBLE), Compatibility::ImplicitCastableFloat);
    assert_eq!(registry.compatibility(int, int.pointer_to()), Compatibility::Incompatible);
}

#[test]
fn int_overload_beats_float_and_double() {
    let mut registry = Registry::new();
    let f_float = function(&mut registry, "f", vec![TypeUsage::of(TypeId::FLOAT)]);
    let f_int = function(&mut registry, "f", vec![TypeUsage::INT]);
    let f_double = function(&mut registry, "f", vec![TypeUsage::DOUBLE]);
    let candidates = registry.get_functions(NamespaceId::GLOBAL, "f");
    assert_eq!(candidates, vec![f_float, f_int, f_double]);

    assert_eq!(registry.select_overload(&candidates, &[TypeUsage::INT], &[]), Some(f_int));
    assert_eq!(registry.select_overload(&candidates, &[TypeUsage::DOUBLE], &[]), Some(f_double));
}

#[test]
fn ties_go_to_the_first_registered() {
    let mut registry = Registry::new();
    let first = function(&mut registry, "g", vec![TypeUsage::of(TypeId::LONG)]);
    let _second = function(&mut registry, "g", vec![TypeUsage::of(TypeId::SHORT)]);
    let candidates = registry.get_functions(NamespaceId::GLOBAL, "g");
    assert_eq!(registry.select_overload(&candidates, &[TypeUsage::INT], &[]), Some(first));
}

#[test]
fn perfect_overload_ignores_converting_candidates() {
    let mut registry = Registry::new();
    let f_double = function(&mut registry, "p", vec![TypeUsage::DOUBLE]);
    let f_int = function(&mut registry, "p", vec![TypeUsage::INT]);
    let candidates = [f_double, f_int];
    assert_eq!(registry.select_perfect_overload(&candidates, &[TypeUsage::INT], &[]), Some(f_int));
    assert_eq!(
        registry.select_perfect_overload(&candidates, &[TypeUsage::of(TypeId::INT32)], &[]),
        Some(f_int)
    );
    // the ranked query would settle for a conversion here
    let only_double = [f_double];
    assert_eq!(registry.select_overload(&only_double, &[TypeUsage::INT], &[]), Some(f_double));
    assert_eq!(registry.select_perfect_overload(&only_double, &[TypeUsage::INT], &[]), None);
}

#[test]
fn arity_and_variadic_filters() {
    let mut registry = Registry::new();
    let name = registry.intern("printf");
    let text = TypeUsage::of(TypeId::CHAR)
        .with_flags(TypeUsageFlags::CONST)
        .pointer_to();
    let printf = registry.register_function(
        GLOBAL,
        Function::new(name, TypeUsage::VOID, vec![text]).with_flags(FunctionFlags::VARIADIC),
    );
    let two = function(&mut registry, "two", vec![TypeUsage::INT, TypeUsage::INT]);

    assert_eq!(registry.call_compatibility(printf, &[text, TypeUsage::INT], &[]), Some(Compatibility::PerfectMatch));
    assert_eq!(registry.call_compatibility(printf, &[], &[]), None);
    assert_eq!(registry.call_compatibility(two, &[TypeUsage::INT], &[]), None);
}

#[test]
fn template_arguments_filter_candidates() {
    let mut registry = Registry::new();
    let name = registry.intern("make");
    let make_int = registry.register_function(
        GLOBAL,
        Function::new(name, TypeUsage::VOID, Vec::new()).with_template_types(vec![TypeUsage::INT]),
    );
    let make_double = registry.register_function(
        GLOBAL,
        Function::new(name, TypeUsage::VOID, Vec::new())
            .with_template_types(vec![TypeUsage::DOUBLE]),
    );
    let candidates = vec![make_int, make_double];
    assert_eq!(
        registry.select_overload(&candidates, &[], &[TypeUsage::DOUBLE]),
        Some(make_double)
    );
    assert_eq!(registry.select_overload(&candidates, &[], &[]), None);
}

#[test]
fn pointers_and_inheritance() {
    let mut registry = Registry::new();
    let base = registry.register_struct(GLOBAL, "Base", 0, 1);
    registry.finish_layout(base);
    let derived = registry.register_struct(GLOBAL, "Derived", 0, 1);
    registry.append_base(derived, base);
    registry.finish_layout(derived);

    let base_ptr = TypeUsage::of(base).pointer_to();
    let derived_ptr = TypeUsage::of(derived).pointer_to();
    let void_ptr = TypeUsage::VOID.pointer_to();

    assert_eq!(registry.compatibility(base_ptr, derived_ptr), Compatibility::ImplicitCastableInheritance);
    assert_eq!(registry.compatibility(derived_ptr, base_ptr), Compatibility::Incompatible);
    assert_eq!(registry.compatibility(void_ptr, derived_ptr), Compatibility::ImplicitCastableInheritance);
    assert_eq!(registry.compatibility(derived_ptr, void_ptr), Compatibility::PerfectMatch);
    assert_eq!(
        registry.compatibility(TypeUsage::of(base), TypeUsage::of(derived)),
        Compatibility::ImplicitCastableInheritance
    );
}

#[test]
fn constness_is_not_dropped() {
    let registry = Registry::new();
    let const_char_ptr = TypeUsage::of(TypeId::CHAR)
        .with_flags(TypeUsageFlags::CONST)
        .pointer_to();
    let char_ptr = TypeUsage::of(TypeId::CHAR).pointer_to();
    assert_eq!(registry.compatibility(char_ptr, const_char_ptr), Compatibility::Incompatible);
    assert_eq!(registry.compatibility(const_char_ptr, char_ptr), Compatibility::PerfectMatch);

    let int_ref = TypeUsage::INT.with_flags(TypeUsageFlags::REFERENCE);
    let const_int = TypeUsage::INT.with_flags(TypeUsageFlags::CONST);
    assert_eq!(registry.compatibility(int_ref, const_int), Compatibility::Incompatible);
}

#[test]
fn arrays_decay_to_pointers() {
    let registry = Registry::new();
    assert_eq!(
        registry.compatibility(TypeUsage::INT.pointer_to(), TypeUsage::INT.array_of(4)),
        Compatibility::PerfectMatch
    );
}

#[test]
fn enums_convert_to_integers_only_when_plain() {
    let mut registry = Registry::new();
    let plain = registry.register_enum(GLOBAL, "Plain");
    let scoped = registry.register_enum_class(GLOBAL, "Scoped");
    assert_eq!(
        registry.compatibility(TypeUsage::INT, TypeUsage::of(plain)),
        Compatibility::ImplicitCastableInteger
    );
    assert_eq!(registry.compatibility(TypeUsage::INT, TypeUsage::of(scoped)), Compatibility::Incompatible);
    assert_eq!(registry.compatibility(TypeUsage::of(plain), TypeUsage::INT), Compatibility::Incompatible);
}

#[test]
fn implicit_construction_skips_explicit_constructors() {
    let mut registry = Registry::new();
    let wrapper = registry.register_struct(GLOBAL, "Wrapper", 4, 4);
    let ctor_name = registry.intern("Wrapper");
    let from_int = registry.register_method(
        wrapper,
        Function::new(ctor_name, TypeUsage::VOID, vec![TypeUsage::INT])
            .with_flags(FunctionFlags::CONSTRUCTOR),
    );
    registry.register_method(
        wrapper,
        Function::new(ctor_name, TypeUsage::VOID, vec![TypeUsage::DOUBLE])
            .with_flags(FunctionFlags::CONSTRUCTOR | FunctionFlags::EXPLICIT),
    );

    assert_eq!(registry.implicit_constructor(wrapper, TypeUsage::INT), Some(from_int));
    assert_eq!(registry.implicit_constructor(wrapper, TypeUsage::DOUBLE), Some(from_int));
    assert_eq!(
        registry.compatibility(TypeUsage::of(wrapper), TypeUsage::INT),
        Compatibility::ImplicitConstructable
    );
    assert_eq!(registry.find_constructor(wrapper, &[TypeUsage::DOUBLE]), registry.constructors(wrapper).get(1).copied());
}
