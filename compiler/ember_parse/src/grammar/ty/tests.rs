use ember_diagnostic::CompileErrorKind;
use ember_ir::{InstanceOwner, NamespaceId, TypeId, TypeUsage, TypeUsageFlags};
use pretty_assertions::assert_eq;

use crate::tests::Fixture;

#[test]
fn multi_word_built_ins() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "unsigned int a;\nunsigned long long b;\nsigned char c;\nshort int d;\nlong double_width;",
    );
    assert_eq!(fixture.global_type("a"), Some(TypeUsage::of(TypeId::UINT32)));
    assert_eq!(fixture.global_type("b"), Some(TypeUsage::of(TypeId::UINT64)));
    assert_eq!(fixture.global_type("c"), Some(TypeUsage::of(TypeId::INT8)));
    assert_eq!(fixture.global_type("d"), Some(TypeUsage::of(TypeId::SHORT)));
    assert_eq!(fixture.global_type("double_width"), Some(TypeUsage::of(TypeId::LONG)));
}

#[test]
fn invalid_built_in_spelling() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.error("unsigned double x;"),
        CompileErrorKind::InvalidTypeUsage {
            name: "unsigned double".to_string()
        }
    );
}

#[test]
fn const_and_pointer_suffixes() {
    let mut fixture = Fixture::new();
    fixture.statements("int target = 0;\nconst int* p = &target;\nint* const q = &target;\nint const r = 1;");
    let p = fixture.global_type("p").map(|u| fixture.registry.type_usage_name(u));
    let q = fixture.global_type("q").map(|u| fixture.registry.type_usage_name(u));
    let r = fixture.global_type("r").map(|u| fixture.registry.type_usage_name(u));
    assert_eq!(p.as_deref(), Some("const int*"));
    assert_eq!(q.as_deref(), Some("int* const"));
    assert_eq!(r.as_deref(), Some("const int"));
}

#[test]
fn aliases_resolve_to_their_target() {
    let mut fixture = Fixture::new();
    fixture.statements("typedef unsigned int Count;\nusing Real = double;\nCount c = 2;\nReal x = 1.5;");
    assert_eq!(fixture.global_type("c"), Some(TypeUsage::of(TypeId::UINT32)));
    assert_eq!(fixture.global_type("x"), Some(TypeUsage::DOUBLE));
}

#[test]
fn local_aliases_go_out_of_scope() {
    let mut fixture = Fixture::new();
    fixture.statements("void f() { typedef int Local; Local x = 1; }");
    assert_eq!(
        fixture.error("Local y = 2;"),
        CompileErrorKind::UndefinedType {
            name: "Local".to_string()
        }
    );
}

#[test]
fn qualified_and_nested_types() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "namespace geo { struct Point { struct Tag { int id; }; int x; }; }\n\
         geo::Point origin;\n\
         geo::Point::Tag tag;\n\
         ::geo::Point* cursor = &origin;",
    );
    let point = fixture.registry.get_type(NamespaceId::GLOBAL, "geo::Point");
    assert!(point.is_some());
    assert_eq!(fixture.global_type("origin").map(|u| u.type_id), point);
    let tag = fixture.global_type("tag").map(|u| fixture.registry.type_usage_name(u));
    assert_eq!(tag.as_deref(), Some("geo::Point::Tag"));
    assert_eq!(fixture.global_type("cursor").map(|u| u.pointer_level), Some(1));
}

#[test]
fn template_instantiations_of_host_types() {
    let mut fixture = Fixture::new();
    let global = InstanceOwner::Namespace(NamespaceId::GLOBAL);
    let ints = fixture
        .registry
        .register_template_struct(global, "Box", vec![TypeUsage::INT], 8, 4);
    let nested = fixture.registry.register_template_struct(
        global,
        "Box",
        vec![TypeUsage::of(ints)],
        8,
        4,
    );
    fixture.statements("Box<int>* a = nullptr;\nBox<Box<int>>* b = nullptr;");
    assert_eq!(fixture.global_type("a"), Some(TypeUsage::of(ints).pointer_to()));
    assert_eq!(fixture.global_type("b"), Some(TypeUsage::of(nested).pointer_to()));
}

#[test]
fn less_than_after_a_variable_is_a_comparison() {
    let mut fixture = Fixture::new();
    fixture.statements("int a = 1;\nint b = 2;\nbool less = a < b;");
    assert_eq!(fixture.global_type("less"), Some(TypeUsage::BOOL));
}

#[test]
fn reference_parameters_keep_the_flag() {
    let mut fixture = Fixture::new();
    fixture.statements("void bump(int& value) { value++; }");
    let functions = fixture.registry.get_functions(NamespaceId::GLOBAL, "bump");
    let parameters = functions
        .first()
        .map(|&id| fixture.registry.function(id).parameters.clone());
    assert_eq!(
        parameters,
        Some(vec![TypeUsage::INT.with_flags(TypeUsageFlags::REFERENCE)])
    );
}
