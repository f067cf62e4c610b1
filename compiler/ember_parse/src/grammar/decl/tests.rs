use ember_diagnostic::CompileErrorKind;
use ember_ir::{NamespaceId, Settings, StmtKind, TypeId, VariableStorage};
use ember_types::{Callable, Visibility};
use pretty_assertions::assert_eq;

use crate::tests::Fixture;

fn struct_id(fixture: &Fixture, name: &str) -> TypeId {
    fixture
        .registry
        .get_type(NamespaceId::GLOBAL, name)
        .unwrap_or_else(|| panic!("no type {name}"))
}

fn member_offset(fixture: &Fixture, type_name: &str, member: &str) -> Option<u32> {
    let name = fixture.registry.find_name(member)?;
    fixture
        .registry
        .find_member(struct_id(fixture, type_name), name)
        .map(|member| member.offset)
}

fn is_bound(fixture: &Fixture, name: &str) -> bool {
    fixture
        .registry
        .get_functions(NamespaceId::GLOBAL, name)
        .iter()
        .any(|&id| fixture.registry.function(id).is_bound())
}

#[test]
fn forward_declared_functions_recurse() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "int fact(int n);\nint fact(int n) { return n <= 1 ? 1 : n * fact(n - 1); }",
    );
    assert_eq!(fixture.registry.get_functions(NamespaceId::GLOBAL, "fact").len(), 1);
    assert!(is_bound(&fixture, "fact"));
    assert_eq!(
        fixture.error("void once() {}\nvoid once() {}"),
        CompileErrorKind::FunctionRedefinition {
            name: "once".to_string()
        }
    );
}

#[test]
fn redeclarations_must_keep_the_return_type() {
    let conflict = |source: &str, name: &str| {
        let mut fixture = Fixture::new();
        assert_eq!(
            fixture.error(source),
            CompileErrorKind::ConflictingDeclaration {
                name: name.to_string()
            }
        );
    };
    conflict("void h();\nint h() { }\nint w = 2;", "h");
    conflict("int g(); void g() { }", "g");
    conflict("void k(); int k() { return 5; }", "k");
    conflict("struct S { int get(); };\nvoid S::get() {}", "get");

    let mut fixture = Fixture::new();
    let line = fixture
        .parse("void h();\nint h() { }")
        .err()
        .map(|error| error.line);
    assert_eq!(line, Some(2));
}

#[test]
fn unnamed_and_array_parameters() {
    let mut fixture = Fixture::new();
    fixture.statements("int first(int values[], int) { return values[0]; }\nvoid nothing(void) {}");
    let id = fixture.registry.get_functions(NamespaceId::GLOBAL, "first")[0];
    let names: Vec<String> = fixture
        .registry
        .function(id)
        .parameters
        .iter()
        .map(|&p| fixture.registry.type_usage_name(p))
        .collect();
    assert_eq!(names, vec!["int*".to_string(), "int".to_string()]);
    let nothing = fixture.registry.get_functions(NamespaceId::GLOBAL, "nothing")[0];
    assert!(fixture.registry.function(nothing).parameters.is_empty());
}

#[test]
fn namespaces_and_using_directives() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "namespace math { int twice(int v) { return v * 2; } namespace inner { int depth = 2; } }\n\
         namespace math::inner { int extra = 3; }\n\
         int four = math::twice(2);\n\
         using namespace math;\n\
         int eight = twice(four) + inner::depth - inner::extra + 1;",
    );
    assert!(fixture.global_type("eight").is_some());
    assert_eq!(
        fixture.error("using namespace nowhere;"),
        CompileErrorKind::UndefinedNamespace {
            name: "nowhere".to_string()
        }
    );
    assert_eq!(
        fixture.error("void f() { namespace local {} }"),
        CompileErrorKind::MisplacedStatement {
            statement: "namespace".to_string()
        }
    );
}

#[test]
fn using_directives_end_with_the_program() {
    let mut fixture = Fixture::new();
    fixture.statements("namespace tools { int level = 1; }\nusing namespace tools;\nint copy = level;");
    assert_eq!(
        fixture.error("int again = level;"),
        CompileErrorKind::UndefinedVariable {
            name: "level".to_string()
        }
    );
}

#[test]
fn variable_declaration_checks() {
    let mut fixture = Fixture::new();
    assert_eq!(
        fixture.error("void f() { int& r; }"),
        CompileErrorKind::UninitializedReference {
            name: "r".to_string()
        }
    );
    assert_eq!(
        fixture.error("void v;"),
        CompileErrorKind::InvalidTypeUsage {
            name: "v".to_string()
        }
    );
    assert_eq!(
        fixture.error("int g = 1;\nint g = 2;"),
        CompileErrorKind::VariableRedefinition {
            name: "g".to_string()
        }
    );
    assert_eq!(
        fixture.error("struct Later;\nLater value;"),
        CompileErrorKind::InvalidTypeUsage {
            name: "value".to_string()
        }
    );
}

#[test]
fn static_locals_get_a_slot() {
    let mut fixture = Fixture::new();
    let statements = fixture.statements("int calls() { static int count = 0; return ++count; }");
    let StmtKind::FunctionDeclaration(id) = statements[0].kind else {
        panic!("function expected");
    };
    let Callable::Script(script) = &fixture.registry.function(id).callable else {
        panic!("script expected");
    };
    let StmtKind::Block(body) = &script.body.kind else {
        panic!("block expected");
    };
    let StmtKind::VariableDeclaration(declaration) = &body[0].kind else {
        panic!("declaration expected");
    };
    assert!(matches!(declaration.storage, VariableStorage::Static(_)));
}

#[test]
fn static_pointers_can_be_disallowed() {
    let mut fixture = Fixture::new();
    fixture.settings = Settings::DISALLOW_STATIC_POINTERS;
    assert_eq!(
        fixture.error("int* global = nullptr;"),
        CompileErrorKind::StaticPointersNotAllowed {
            name: "global".to_string()
        }
    );
    assert_eq!(
        fixture.error("void f() { static int* cached = nullptr; }"),
        CompileErrorKind::StaticPointersNotAllowed {
            name: "cached".to_string()
        }
    );
    fixture.statements("void g() { int value = 1; int* local = &value; }");
}

#[test]
fn struct_layout_follows_alignment() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct Mixed { char c; int i; double d; };\n\
         struct Base { int a; };\n\
         struct Derived : Base { double b; };\n\
         struct Empty {};",
    );
    assert_eq!(fixture.registry.type_info(struct_id(&fixture, "Mixed")).size, 16);
    assert_eq!(member_offset(&fixture, "Mixed", "i"), Some(4));
    assert_eq!(member_offset(&fixture, "Mixed", "d"), Some(8));
    assert_eq!(member_offset(&fixture, "Derived", "a"), Some(0));
    assert_eq!(member_offset(&fixture, "Derived", "b"), Some(8));
    assert_eq!(fixture.registry.type_info(struct_id(&fixture, "Derived")).size, 16);
    assert_eq!(fixture.registry.type_info(struct_id(&fixture, "Empty")).size, 1);
}

#[test]
fn struct_declaration_rules() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct Node;\nstruct Node { int value; Node* next; };\nclass Hidden { int v; };",
    );
    let hidden = struct_id(&fixture, "Hidden");
    let visibility = fixture
        .registry
        .type_info(hidden)
        .as_struct()
        .map(|data| data.members[0].visibility);
    assert_eq!(visibility, Some(Visibility::Private));
    assert_eq!(
        fixture.error("struct Node { int other; };"),
        CompileErrorKind::TypeRedefinition {
            name: "Node".to_string()
        }
    );
    assert_eq!(
        fixture.error("void f() { struct Local { int v; }; }"),
        CompileErrorKind::MisplacedStatement {
            statement: "struct".to_string()
        }
    );
    assert_eq!(
        fixture.error("struct WithRef { int& r; };"),
        CompileErrorKind::InvalidTypeUsage {
            name: "r".to_string()
        }
    );
    assert_eq!(
        fixture.error("struct Twice { int v; double v; };"),
        CompileErrorKind::VariableRedefinition {
            name: "v".to_string()
        }
    );
}

#[test]
fn method_bodies_see_later_members() {
    let mut fixture = Fixture::new();
    fixture.statements("struct Late { int get() const { return value * scale(); } int scale() const { return 2; } int value; };");
    let late = struct_id(&fixture, "Late");
    let bound = fixture
        .registry
        .type_info(late)
        .as_struct()
        .map(|data| data.methods.iter().all(|&m| fixture.registry.function(m).is_bound()));
    assert_eq!(bound, Some(true));
}

#[test]
fn out_of_line_definitions() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct Acc { int total; Acc(int start); ~Acc(); void add(int v); static int made; };\n\
         Acc::Acc(int start) : total(start) {}\n\
         Acc::~Acc() {}\n\
         void Acc::add(int v) { total += v; }\n\
         int Acc::made = 0;",
    );
    let acc = struct_id(&fixture, "Acc");
    let methods = fixture
        .registry
        .type_info(acc)
        .as_struct()
        .map(|data| data.methods.clone())
        .unwrap_or_default();
    assert_eq!(methods.len(), 3);
    assert!(methods.iter().all(|&m| fixture.registry.function(m).is_bound()));
    let constructor = fixture.registry.constructors(acc)[0];
    let Callable::Script(script) = &fixture.registry.function(constructor).callable else {
        panic!("script constructor expected");
    };
    assert_eq!(script.member_initializers.len(), 1);
    assert_eq!(script.member_initializers[0].offset, 0);

    assert_eq!(
        fixture.error("void Acc::remove(int v) {}"),
        CompileErrorKind::MissingMethod {
            method: "remove".to_string(),
            type_name: "Acc".to_string()
        }
    );
    assert_eq!(
        fixture.error("int Acc::other = 1;"),
        CompileErrorKind::MissingStaticMember {
            member: "other".to_string(),
            type_name: "Acc".to_string()
        }
    );
    assert_eq!(
        fixture.error("struct Init { int a; Init() : b(1) {} };"),
        CompileErrorKind::MissingMember {
            member: "b".to_string(),
            type_name: "Init".to_string()
        }
    );
}

#[test]
fn base_initializers_and_explicit_constructors() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct Shape { int sides; Shape(int n) { sides = n; } };\n\
         struct Square : Shape { double edge; explicit Square(double e) : Shape(4), edge(e) {} };",
    );
    let square = struct_id(&fixture, "Square");
    let constructor = fixture.registry.constructors(square)[0];
    let function = fixture.registry.function(constructor);
    assert!(function.flags.contains(ember_types::FunctionFlags::EXPLICIT));
    let Callable::Script(script) = &function.callable else {
        panic!("script constructor expected");
    };
    let offsets: Vec<u32> = script.member_initializers.iter().map(|i| i.offset).collect();
    assert_eq!(offsets, vec![0, 8]);
}

#[test]
fn static_member_constants() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct Limits { static const int max = 8; static int count; };\nint slots[Limits::max];",
    );
    let usage = fixture.global_type("slots").map(|u| fixture.registry.type_usage_name(u));
    assert_eq!(usage.as_deref(), Some("int[8]"));
}

#[test]
fn enum_declarations() {
    let mut fixture = Fixture::new();
    fixture.statements("enum Level { Low, Mid = 5, High };\nenum class Mode : int { Off, On };");
    let level = struct_id(&fixture, "Level");
    let high = fixture.registry.find_name("High");
    assert_eq!(high.and_then(|h| fixture.registry.enum_value(level, h)), Some(6));
    assert!(fixture.registry.get_instance(NamespaceId::GLOBAL, "Mid").is_some());
    assert!(fixture.registry.get_instance(NamespaceId::GLOBAL, "On").is_none());
    assert!(fixture.registry.get_instance(NamespaceId::GLOBAL, "Mode::On").is_some());
    assert_eq!(
        fixture.error("enum Level { Again };"),
        CompileErrorKind::TypeRedefinition {
            name: "Level".to_string()
        }
    );
    assert_eq!(
        fixture.error("void f() { enum Local { A }; }"),
        CompileErrorKind::MisplacedStatement {
            statement: "enum".to_string()
        }
    );
    assert_eq!(
        fixture.error("int n = 1;\nenum Bad { X = n };"),
        CompileErrorKind::NonIntegerValue {
            context: "enum value".to_string()
        }
    );
}

#[test]
fn nested_types_and_aliases_in_structs() {
    let mut fixture = Fixture::new();
    fixture.statements(
        "struct Outer { typedef int Count; enum Kind { Small, Large }; struct Inner { Count n; }; Kind kind; Inner inner; };\n\
         Outer::Inner standalone;\nOuter::Kind picked = Outer::Large;",
    );
    assert!(fixture.global_type("standalone").is_some());
    assert!(fixture.global_type("picked").is_some());
}

#[test]
fn unknown_type_in_a_declaration() {
    let undefined_type = |name: &str| CompileErrorKind::UndefinedType {
        name: name.to_string(),
    };
    let mut fixture = Fixture::new();
    assert_eq!(fixture.error("Foo f;"), undefined_type("Foo"));
    assert_eq!(fixture.error("const Foo f = 1;"), undefined_type("Foo"));
    assert_eq!(fixture.error("void g() { geo::Point p; }"), undefined_type("geo::Point"));
    let line = fixture.parse("int a = 1;\nBar b;").err().map(|error| error.line);
    assert_eq!(line, Some(2));
    // a lone unknown name is still an expression
    assert_eq!(
        fixture.error("missing;"),
        CompileErrorKind::UndefinedVariable {
            name: "missing".to_string()
        }
    );
}
