use super::*;
use ember_value::Address;
use pretty_assertions::assert_eq;

fn instance(name: u32, scope_level: u32) -> Instance {
    Instance {
        name: Name::from_raw(name),
        type_usage: TypeUsage::INT,
        address: Address::NULL,
        len: 4,
        scope_level,
        flags: crate::InstanceFlags::empty(),
    }
}

#[test]
fn aliases_shadow_and_release_by_scope_level() {
    let mut holder = TypesHolder::default();
    let name = Name::from_raw(1);
    holder.register_alias(name, TypeUsage::INT, 0);
    holder.register_alias(name, TypeUsage::DOUBLE, 2);
    assert_eq!(holder.alias(name), Some(TypeUsage::DOUBLE));

    holder.release_aliases(2);
    assert_eq!(holder.alias(name), Some(TypeUsage::INT));
    assert_eq!(holder.alias_count(), 1);
}

#[test]
fn functions_keep_registration_order() {
    let mut holder = FunctionsHolder::default();
    let name = Name::from_raw(3);
    holder.insert(name, FunctionId::new(7));
    holder.insert(name, FunctionId::new(2));
    assert_eq!(holder.get(name), &[FunctionId::new(7), FunctionId::new(2)]);
    assert!(holder.get(Name::from_raw(4)).is_empty());
}

#[test]
fn newest_instance_shadows_by_name() {
    let mut holder = InstancesHolder::default();
    holder.insert(instance(1, 0));
    holder.insert(instance(2, 0));
    holder.insert(instance(1, 1));
    assert_eq!(holder.len(), 3);
    assert_eq!(holder.get(Name::from_raw(1)).map(|i| i.scope_level), Some(1));
    assert!(holder.get(Name::from_raw(5)).is_none());
}
