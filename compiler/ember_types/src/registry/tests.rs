use ember_ir::{InstanceOwner, NamespaceId, TypeId, TypeUsage};
use ember_value::{Address, Memory};
use pretty_assertions::assert_eq;

use crate::{Function, FunctionFlags, Instance, InstanceFlags, Registry};

const GLOBAL: InstanceOwner = InstanceOwner::Namespace(NamespaceId::GLOBAL);

#[test]
fn repeated_lookup_returns_the_same_id() {
    let mut registry = Registry::new();
    let point = registry.register_struct(GLOBAL, "Point", 8, 4);
    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "Point"), Some(point));
    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "Point"), Some(point));
    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "Missing"), None);
}

#[test]
#[should_panic(expected = "already registered")]
fn double_registration_panics() {
    let mut registry = Registry::new();
    registry.register_struct(GLOBAL, "Point", 8, 4);
    registry.register_struct(GLOBAL, "Point", 8, 4);
}

#[test]
fn template_instantiations_are_distinct() {
    let mut registry = Registry::new();
    let ints = registry.register_template_struct(GLOBAL, "Vec", vec![TypeUsage::INT], 16, 8);
    let doubles =
        registry.register_template_struct(GLOBAL, "Vec", vec![TypeUsage::DOUBLE], 16, 8);
    assert_ne!(ints, doubles);
    assert_eq!(
        registry.get_type_instantiation(NamespaceId::GLOBAL, "Vec", &[TypeUsage::DOUBLE]),
        Some(doubles)
    );
    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "Vec"), None);
    assert!(registry.is_template_name(NamespaceId::GLOBAL, "Vec"));
    assert!(!registry.is_template_name(NamespaceId::GLOBAL, "int"));
}

#[test]
fn qualified_lookup_through_namespaces_and_types() {
    let mut registry = Registry::new();
    let math = registry.request_namespace(NamespaceId::GLOBAL, "math");
    let inner = registry.request_namespace(math, "detail");
    assert_eq!(registry.request_namespace(NamespaceId::GLOBAL, "math::detail"), inner);

    let vector = registry.register_struct(InstanceOwner::Namespace(math), "Vector", 12, 4);
    let iterator = registry.register_struct(InstanceOwner::Type(vector), "Iterator", 8, 8);

    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "math::Vector"), Some(vector));
    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "::math::Vector"), Some(vector));
    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "math::Vector::Iterator"), Some(iterator));
    assert_eq!(registry.get_type(NamespaceId::GLOBAL, "Vector"), None);
    // inner namespaces see outer declarations
    assert_eq!(registry.get_type(inner, "Vector"), Some(vector));
    assert_eq!(registry.get_type(inner, "int"), Some(TypeId::INT));
    assert_eq!(registry.get_namespace(NamespaceId::GLOBAL, "math::detail"), Some(inner));
    assert_eq!(registry.type_info(iterator).parent, Some(vector));
}

#[test]
fn aliases_are_released_by_scope_level() {
    let mut registry = Registry::new();
    registry.register_type_alias(GLOBAL, "Real", TypeUsage::DOUBLE, 0);
    registry.register_type_alias(GLOBAL, "Real", TypeUsage::of(TypeId::FLOAT), 2);
    assert_eq!(
        registry.get_type_alias(NamespaceId::GLOBAL, "Real"),
        Some(TypeUsage::of(TypeId::FLOAT))
    );
    registry.holders_mut(GLOBAL).types.release_aliases(1);
    assert_eq!(registry.get_type_alias(NamespaceId::GLOBAL, "Real"), Some(TypeUsage::DOUBLE));
}

#[test]
fn functions_resolve_from_the_innermost_declaring_namespace() {
    let mut registry = Registry::new();
    let name = registry.intern("log");
    let outer = registry.register_function(GLOBAL, Function::new(name, TypeUsage::VOID, vec![]));
    let ns = registry.request_namespace(NamespaceId::GLOBAL, "io");
    let inner = registry.register_function(
        InstanceOwner::Namespace(ns),
        Function::new(name, TypeUsage::VOID, vec![]),
    );
    assert_eq!(registry.get_functions(NamespaceId::GLOBAL, "log"), vec![outer]);
    assert_eq!(registry.get_functions(ns, "log"), vec![inner]);
    assert_eq!(registry.get_functions(NamespaceId::GLOBAL, "io::log"), vec![inner]);
    assert_eq!(registry.function(inner).namespace, ns);
}

#[test]
fn methods_cache_special_members() {
    let mut registry = Registry::new();
    let s = registry.register_struct(GLOBAL, "S", 4, 4);
    let name = registry.intern("S");
    let default_ctor = registry.register_method(
        s,
        Function::new(name, TypeUsage::VOID, vec![]).with_flags(FunctionFlags::CONSTRUCTOR),
    );
    let copy = TypeUsage::of(s)
        .with_flags(ember_ir::TypeUsageFlags::CONST | ember_ir::TypeUsageFlags::REFERENCE);
    let copy_ctor = registry.register_method(
        s,
        Function::new(name, TypeUsage::VOID, vec![copy]).with_flags(FunctionFlags::CONSTRUCTOR),
    );
    let dtor = registry.register_method(
        s,
        Function::new(name, TypeUsage::VOID, vec![]).with_flags(FunctionFlags::DESTRUCTOR),
    );
    assert_eq!(registry.default_constructor(s), Some(default_ctor));
    assert_eq!(registry.copy_constructor(s), Some(copy_ctor));
    assert_eq!(registry.destructor(s), Some(dtor));
    assert_eq!(registry.constructors(s), vec![default_ctor, copy_ctor]);
    assert!(registry.function(dtor).is_method());
}

#[test]
fn inherited_methods_report_the_declaring_type() {
    let mut registry = Registry::new();
    let base = registry.register_struct(GLOBAL, "Base", 4, 4);
    let derived = registry.register_struct(GLOBAL, "Derived", 0, 1);
    registry.append_base(derived, base);
    let get = registry.intern("get");
    let method = registry.register_method(base, Function::new(get, TypeUsage::INT, vec![]));
    assert_eq!(registry.find_methods(derived, get), Some((base, vec![method])));
}

#[test]
fn instances_and_enum_values() {
    let mut registry = Registry::new();
    let color = registry.register_enum(GLOBAL, "Color");
    registry.add_enum_value(color, "Red", 0, Address::NULL);
    registry.add_enum_value(color, "Green", 1, Address::NULL);
    let scoped = registry.register_enum_class(GLOBAL, "Mode");
    registry.add_enum_value(scoped, "Fast", 7, Address::NULL);

    let green = registry.intern("Green");
    assert_eq!(registry.enum_value(color, green), Some(1));
    assert!(registry.get_instance(NamespaceId::GLOBAL, "Green").is_some());
    assert!(registry.get_instance(NamespaceId::GLOBAL, "Color::Green").is_some());
    assert!(registry.get_instance(NamespaceId::GLOBAL, "Fast").is_none());
    let (owner, fast) = registry
        .get_instance(NamespaceId::GLOBAL, "Mode::Fast")
        .expect("qualified enum class value");
    assert_eq!(owner, InstanceOwner::Type(scoped));
    assert!(fast.flags.contains(InstanceFlags::ENUM_VALUE));

    let name = registry.intern("counter");
    registry.register_instance(
        GLOBAL,
        Instance {
            name,
            type_usage: TypeUsage::INT,
            address: Address::new(2, 0),
            len: 4,
            scope_level: 0,
            flags: InstanceFlags::empty(),
        },
    );
    let (_, counter) = registry
        .get_instance(NamespaceId::GLOBAL, "counter")
        .expect("global");
    assert_eq!(counter.address, Address::new(2, 0));
}

#[test]
fn literals_are_pooled() {
    let mut registry = Registry::new();
    let mut memory = Memory::new(1024);
    let a = registry.register_literal(&mut memory, b"hi\0".to_vec());
    let b = registry.register_literal(&mut memory, b"hi\0".to_vec());
    let c = registry.register_literal(&mut memory, b"ho\0".to_vec());
    assert_eq!(a, b);
    assert_ne!(a, c);
    let address = registry.literal_address(a);
    assert_eq!(memory.read_c_string(address).expect("literal"), "hi");
}

#[test]
fn static_slots() {
    let mut registry = Registry::new();
    let slot = registry.register_static(Address::new(5, 0));
    assert_eq!(registry.static_address(slot), Address::new(5, 0));
}
