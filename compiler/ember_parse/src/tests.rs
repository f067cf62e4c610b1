use ember_diagnostic::CompileErrorKind;
use ember_ir::{Expr, NamespaceId, Settings, Stmt, TypeUsage};
use ember_types::Registry;
use ember_value::Memory;
use pretty_assertions::assert_eq;

use crate::{parse_expression, parse_program, parse_type, ParseResult, Program};

/// Registry and memory shared by the programs of one test.
pub(crate) struct Fixture {
    pub registry: Registry,
    pub memory: Memory,
    pub settings: Settings,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Fixture {
            registry: Registry::new(),
            memory: Memory::new(4096),
            settings: Settings::empty(),
        }
    }

    pub(crate) fn parse(&mut self, source: &str) -> ParseResult<Program> {
        parse_program(
            &mut self.registry,
            &mut self.memory,
            self.settings,
            "test",
            source.to_string(),
        )
    }

    pub(crate) fn statements(&mut self, source: &str) -> Vec<Stmt> {
        match self.parse(source) {
            Ok(program) => program.statements,
            Err(error) => panic!("line {}: {error}\n{source}", error.line),
        }
    }

    pub(crate) fn error(&mut self, source: &str) -> CompileErrorKind {
        match self.parse(source) {
            Ok(_) => panic!("expected a compile error\n{source}"),
            Err(error) => error.kind,
        }
    }

    pub(crate) fn expr(&mut self, source: &str) -> ParseResult<Expr> {
        parse_expression(&mut self.registry, &mut self.memory, self.settings, source)
    }

    pub(crate) fn expr_type(&mut self, source: &str) -> String {
        match self.expr(source) {
            Ok(expr) => self.registry.type_usage_name(expr.type_usage),
            Err(error) => panic!("{error}\n{source}"),
        }
    }

    pub(crate) fn global_type(&self, name: &str) -> Option<TypeUsage> {
        self.registry
            .get_instance(NamespaceId::GLOBAL, name)
            .map(|(_, instance)| instance.type_usage)
    }
}

#[test]
fn program_counts_defined_functions() {
    let mut fixture = Fixture::new();
    let program = fixture
        .parse("int one() { return 1; }\nvoid later();\nvoid noop() {}")
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(program.function_count(), 2);
    assert_eq!(program.statements.len(), 3);
    assert_eq!(program.name, "test");
}

#[test]
fn errors_carry_the_line() {
    let mut fixture = Fixture::new();
    let error = fixture.parse("int x = 1;\n\nint y = z;").err();
    let error = error.map(|e| (e.kind, e.line));
    assert_eq!(
        error,
        Some((
            CompileErrorKind::UndefinedVariable {
                name: "z".to_string()
            },
            3
        ))
    );
}

#[test]
fn failed_parse_keeps_earlier_declarations() {
    let mut fixture = Fixture::new();
    assert!(fixture.parse("int kept = 1;\nint broken = nope;").is_err());
    assert_eq!(fixture.global_type("kept"), Some(TypeUsage::INT));
    assert_eq!(fixture.global_type("broken"), None);
}

#[test]
fn standalone_expression_consumes_every_token() {
    let mut fixture = Fixture::new();
    assert!(fixture.expr("1 + 2;").is_ok());
    let error = fixture.expr("1 2").map_err(|e| e.kind).err();
    assert_eq!(
        error,
        Some(CompileErrorKind::UnexpectedSymbol {
            symbol: "2".to_string()
        })
    );
}

#[test]
fn later_programs_see_earlier_globals() {
    let mut fixture = Fixture::new();
    fixture.statements("int shared = 4;\nint twice(int v) { return v * 2; }");
    fixture.statements("int result = twice(shared);");
    assert_eq!(fixture.global_type("result"), Some(TypeUsage::INT));
    assert_eq!(fixture.expr_type("twice(shared) + 0.5"), "double");
}

#[test]
fn type_spellings() {
    let mut fixture = Fixture::new();
    fixture.statements("namespace geo { struct Point { int x; int y; }; }");
    let mut spell = |source: &str| {
        parse_type(&mut fixture.registry, &mut fixture.memory, Settings::empty(), source)
            .map(|usage| fixture.registry.type_usage_name(usage))
            .map_err(|e| e.kind)
    };
    assert_eq!(spell("unsigned int"), Ok("uint32_t".to_string()));
    assert_eq!(spell("const char*"), Ok("const char*".to_string()));
    assert_eq!(spell("geo::Point&"), Ok("geo::Point&".to_string()));
    assert_eq!(
        spell("Missing"),
        Err(CompileErrorKind::UndefinedType {
            name: "Missing".to_string()
        })
    );
}
