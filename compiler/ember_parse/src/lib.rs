//! Parser for Ember scripts.
//!
//! Turns a token vector into typed AST statements, resolving every name,
//! overload and conversion against the [`Registry`] as it goes. Nothing is
//! left for the evaluator to look up by text: calls carry a `FunctionId`,
//! member accesses carry byte offsets and implicit conversions are explicit
//! `Cast` or `Construction` nodes.
//!
//! # Organization
//!
//! - [`cursor`]: token navigation and bracket matching
//! - [`context`]: scopes, locals and the function being parsed
//! - `grammar`: one module per production family (types, expressions,
//!   statements, declarations)
//!
//! Declarations have side effects on the registry as soon as they parse:
//! a struct is registered before its members are read, so methods can refer
//! to the struct and to members declared after them. A failed parse does not
//! roll those side effects back.

mod context;
mod cursor;
mod grammar;

use std::rc::Rc;

use ember_diagnostic::{CompileError, CompileErrorKind};
use ember_ir::{Expr, Name, Settings, Stmt, Token, TypeUsage};
use ember_types::Registry;
use ember_value::Memory;
use tracing::debug;

pub use context::{FunctionFrame, LocalVariable, ParsingContext};
pub use cursor::Cursor;

pub type ParseResult<T> = Result<T, CompileError>;

/// A parsed program: its name, preprocessed source and statements.
#[derive(Debug)]
pub struct Program {
    pub name: String,
    pub source: String,
    pub statements: Vec<Stmt>,
    /// Bodies of the script functions this program defined, shared with
    /// their registry entries.
    bodies: Vec<Rc<Stmt>>,
}

impl Program {
    pub fn function_count(&self) -> usize {
        self.bodies.len()
    }
}

/// Parse a whole program from preprocessed source.
#[tracing::instrument(level = "debug", skip_all, fields(program = name))]
pub fn parse_program(
    registry: &mut Registry,
    memory: &mut Memory,
    settings: Settings,
    name: &str,
    source: String,
) -> ParseResult<Program> {
    let tokens = ember_lexer::tokenize(&source)?;
    let (statements, bodies) = {
        let program = registry.intern(name);
        let mut parser = Parser::new(registry, memory, settings, program, &source, tokens);
        let statements = parser.parse_statements_to_end()?;
        (statements, parser.bodies)
    };
    debug!(statements = statements.len(), functions = bodies.len(), "program parsed");
    Ok(Program {
        name: name.to_string(),
        source,
        statements,
        bodies,
    })
}

/// Parse a standalone expression in the global context.
#[tracing::instrument(level = "debug", skip_all)]
pub fn parse_expression(
    registry: &mut Registry,
    memory: &mut Memory,
    settings: Settings,
    source: &str,
) -> ParseResult<Expr> {
    let tokens = ember_lexer::tokenize(source)?;
    let program = registry.intern("expression");
    let mut parser = Parser::new(registry, memory, settings, program, source, tokens);
    let expr = parser.parse_expression()?;
    parser.cursor.eat(";");
    if !parser.cursor.is_at_end() {
        return Err(parser.error(CompileErrorKind::UnexpectedSymbol {
            symbol: parser.cursor.text().to_string(),
        }));
    }
    Ok(expr)
}

/// Parse a type spelling such as `const unsigned int*` or `ns::Point&`.
pub fn parse_type(
    registry: &mut Registry,
    memory: &mut Memory,
    settings: Settings,
    source: &str,
) -> ParseResult<TypeUsage> {
    let tokens = ember_lexer::tokenize(source)?;
    let program = registry.intern("type");
    let mut parser = Parser::new(registry, memory, settings, program, source, tokens);
    let usage = parser.parse_type_usage()?;
    let (usage, _) = parser.parse_array_suffix(usage)?;
    if !parser.cursor.is_at_end() {
        return Err(parser.error(CompileErrorKind::UnexpectedSymbol {
            symbol: parser.cursor.text().to_string(),
        }));
    }
    Ok(usage)
}

/// Parser state for one program.
pub struct Parser<'a> {
    pub(crate) registry: &'a mut Registry,
    pub(crate) memory: &'a mut Memory,
    pub(crate) settings: Settings,
    pub(crate) cursor: Cursor<'a>,
    pub(crate) context: ParsingContext,
    pub(crate) program: Name,
    pub(crate) bodies: Vec<Rc<Stmt>>,
}

impl<'a> Parser<'a> {
    pub fn new(
        registry: &'a mut Registry,
        memory: &'a mut Memory,
        settings: Settings,
        program: Name,
        source: &'a str,
        tokens: Vec<Token>,
    ) -> Self {
        Parser {
            registry,
            memory,
            settings,
            cursor: Cursor::new(source, tokens),
            context: ParsingContext::new(),
            program,
            bodies: Vec::new(),
        }
    }

    /// An error at the current token.
    pub(crate) fn error(&self, kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, self.cursor.line())
    }

    pub(crate) fn error_at(&self, kind: CompileErrorKind, line: u32) -> CompileError {
        CompileError::new(kind, line)
    }

    pub(crate) fn type_name(&self, usage: TypeUsage) -> String {
        self.registry.type_usage_name(usage)
    }

    /// Run `f` one scope level deeper. Locals, usings and aliases declared
    /// inside are dropped afterwards whether or not `f` succeeded.
    pub(crate) fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.context.enter_scope();
        let result = f(self);
        self.leave_scope();
        result
    }

    fn leave_scope(&mut self) {
        let level = self.context.leave_scope();
        let owner = ember_ir::InstanceOwner::Namespace(self.context.namespace());
        self.registry.holders_mut(owner).types.release_aliases(level);
    }
}

#[cfg(test)]
mod tests;
