//! Declarations: variables, functions, namespaces and type aliases.
//!
//! Declarations take effect in the registry as they are parsed. Globals get
//! their storage here (initialized when the declaration executes), functions
//! are registered before their body is read so they can recurse, and a
//! definition binds the script body to a previously declared entry.

mod enums;
mod structs;

use std::rc::Rc;

use ember_diagnostic::CompileErrorKind;
use ember_ir::{
    Expr, FunctionId, InstanceOwner, MemberInitializer, Name, NamespaceId, ScriptFunction,
    Settings, Stmt, StmtKind, TokenKind, TypeId, TypeUsage, VariableDeclaration, VariableStorage,
};
use ember_types::{Callable, Function, Instance, InstanceFlags, POINTER_SIZE};
use tracing::trace;

use crate::context::FunctionFrame;
use crate::grammar::expr::Initializer;
use crate::{ParseResult, Parser};

/// Declared name, split into its qualifier (`S` in `int S::get()`) and the
/// last component.
#[derive(Clone, Debug)]
pub(crate) struct Declarator {
    pub qualifier: Option<String>,
    pub name: String,
    pub line: u32,
}

/// Parameter list of a function declaration.
#[derive(Clone, Debug, Default)]
pub(crate) struct Parameters {
    pub types: Vec<TypeUsage>,
    /// `Name::EMPTY` for unnamed parameters.
    pub names: Vec<Name>,
}

fn misplaced(statement: &str) -> CompileErrorKind {
    CompileErrorKind::MisplacedStatement {
        statement: statement.to_string(),
    }
}

impl Parser<'_> {
    /// A variable or function declaration at the cursor, or `None` (with the
    /// cursor unmoved) when the statement is an expression.
    pub(crate) fn try_parse_declaration(&mut self) -> ParseResult<Option<Vec<Stmt>>> {
        let start = self.cursor.pos();
        let line = self.cursor.line();
        if let Some(definition) = self.try_parse_special_member_definition()? {
            return Ok(Some(vec![definition]));
        }

        let is_static = self.cursor.eat("static");
        let base = match self.try_parse_base_type()? {
            Some(base) => base,
            None if is_static => {
                self.parse_type_usage()?;
                return Err(self.cursor.expected("type"));
            }
            None => {
                if let Some(name) = self.undeclared_type_name()? {
                    return Err(self.error_at(CompileErrorKind::UndefinedType { name }, line));
                }
                return Ok(None);
            }
        };
        let usage = self.parse_type_suffix(base);
        if !self.starts_declarator() {
            if is_static {
                return Err(self.cursor.expected("identifier"));
            }
            self.cursor.set_pos(start);
            return Ok(None);
        }

        let declarator = self.parse_declarator_name()?;
        if self.cursor.check("(") && self.is_function_declarator()? {
            let declaration = self.parse_function_declaration(usage, declarator, line)?;
            return Ok(Some(vec![declaration]));
        }

        let mut statements = Vec::new();
        let (mut usage, mut declarator) = (usage, declarator);
        loop {
            statements.push(self.parse_variable(usage, declarator, is_static)?);
            if !self.cursor.eat(",") {
                break;
            }
            usage = self.parse_type_suffix(base);
            declarator = self.parse_declarator_name()?;
        }
        self.cursor.expect(";")?;
        Ok(Some(statements))
    }

    /// `Name other` where `Name` names no type: the statement can only be a
    /// declaration, so report the type rather than an unknown variable.
    fn undeclared_type_name(&mut self) -> ParseResult<Option<String>> {
        let start = self.cursor.pos();
        self.cursor.eat("const");
        if !self.starts_declarator() || self.cursor.check("operator") {
            self.cursor.set_pos(start);
            return Ok(None);
        }
        let name = self.parse_qualified_name()?;
        let declares = self.cursor.check_kind(TokenKind::Identifier);
        self.cursor.set_pos(start);
        Ok(declares.then_some(name))
    }

    fn starts_declarator(&self) -> bool {
        self.cursor.check_kind(TokenKind::Identifier)
            || self.cursor.check("operator")
            || (self.cursor.check("::") && self.cursor.peek_kind(1) == Some(TokenKind::Identifier))
    }

    pub(crate) fn parse_declarator_name(&mut self) -> ParseResult<Declarator> {
        let line = self.cursor.line();
        if self.cursor.check("operator") {
            return Ok(Declarator {
                qualifier: None,
                name: self.parse_operator_name()?,
                line,
            });
        }
        let name = self.parse_qualified_name()?;
        if self.cursor.check("::") && self.cursor.check_at(1, "operator") {
            self.cursor.advance();
            return Ok(Declarator {
                qualifier: Some(name),
                name: self.parse_operator_name()?,
                line,
            });
        }
        Ok(match name.rsplit_once("::") {
            Some((qualifier, last)) => Declarator {
                qualifier: Some(qualifier.to_string()),
                name: last.to_string(),
                line,
            },
            None => Declarator {
                qualifier: None,
                name,
                line,
            },
        })
    }

    /// `operator+`, `operator==`, `operator[]`.
    pub(crate) fn parse_operator_name(&mut self) -> ParseResult<String> {
        self.cursor.expect("operator")?;
        if self.cursor.eat("[") {
            self.cursor.expect("]")?;
            return Ok("operator[]".to_string());
        }
        if self.cursor.check_kind(TokenKind::Operator) {
            let symbol = self.cursor.text();
            self.cursor.advance();
            return Ok(format!("operator{symbol}"));
        }
        Err(self.cursor.expected("operator"))
    }

    /// Whether `(` after a declarator opens a parameter list rather than
    /// constructor arguments. Inside a function body it never does.
    fn is_function_declarator(&mut self) -> ParseResult<bool> {
        if self.context.is_local_scope() {
            return Ok(false);
        }
        if self.cursor.check_at(1, ")") {
            return Ok(true);
        }
        let start = self.cursor.pos();
        self.cursor.advance();
        let type_ahead = self.is_type_ahead()?;
        self.cursor.set_pos(start);
        Ok(type_ahead)
    }

    pub(crate) fn parse_parameters(&mut self) -> ParseResult<Parameters> {
        self.cursor.expect("(")?;
        let mut parameters = Parameters::default();
        if self.cursor.check("void") && self.cursor.check_at(1, ")") {
            self.cursor.advance();
        }
        if self.cursor.eat(")") {
            return Ok(parameters);
        }
        loop {
            let mut usage = self.parse_type_usage()?;
            let name = if self.cursor.check_kind(TokenKind::Identifier) {
                let text = self.cursor.text();
                self.cursor.advance();
                self.registry.intern(text)
            } else {
                Name::EMPTY
            };
            if self.cursor.eat("[") {
                while !self.cursor.eat("]") {
                    if self.cursor.is_at_end() {
                        return Err(self.cursor.expected("]"));
                    }
                    self.cursor.advance();
                }
                usage = usage.pointer_to();
            }
            if usage.is_void() {
                return Err(self.error(CompileErrorKind::InvalidTypeUsage {
                    name: "void".to_string(),
                }));
            }
            parameters.types.push(usage);
            parameters.names.push(name);
            if self.cursor.eat(")") {
                return Ok(parameters);
            }
            self.cursor.expect(",")?;
        }
    }

    /// A free function, or the out-of-line definition of a method.
    fn parse_function_declaration(
        &mut self,
        return_type: TypeUsage,
        declarator: Declarator,
        line: u32,
    ) -> ParseResult<Stmt> {
        let parameters = self.parse_parameters()?;
        let is_const = self.cursor.eat("const");
        let name = self.registry.intern(&declarator.name);

        let owner = match &declarator.qualifier {
            None => InstanceOwner::Namespace(self.context.namespace()),
            Some(qualifier) => {
                if let Some(scope) = self
                    .lookup_type(qualifier, &[])
                    .filter(|usage| self.registry.is_struct_value(*usage))
                {
                    let id = self.declared_method(scope.type_id, name, &parameters.types, is_const);
                    let Some(id) = id else {
                        return Err(self.error_at(
                            CompileErrorKind::MissingMethod {
                                method: declarator.name.clone(),
                                type_name: self.type_name(scope),
                            },
                            line,
                        ));
                    };
                    self.check_return_type(id, return_type, line)?;
                    self.define_function(id, &parameters)?;
                    return Ok(Stmt::new(StmtKind::FunctionDeclaration(id), line));
                }
                match self.lookup_namespace(qualifier) {
                    Some(namespace) => InstanceOwner::Namespace(namespace),
                    None => {
                        return Err(self.error_at(
                            CompileErrorKind::UndefinedType {
                                name: qualifier.clone(),
                            },
                            line,
                        ))
                    }
                }
            }
        };
        if is_const {
            return Err(self.cursor.expected("{"));
        }

        let id = match self.declared_function(owner, name, &parameters.types) {
            Some(id) => {
                self.check_return_type(id, return_type, line)?;
                id
            }
            None => {
                let mut function = Function::new(name, return_type, parameters.types.clone());
                function.line = line;
                self.registry.register_function(owner, function)
            }
        };
        if !self.cursor.eat(";") {
            self.define_function(id, &parameters)?;
        }
        Ok(Stmt::new(StmtKind::FunctionDeclaration(id), line))
    }

    /// Function named `name` registered directly in `owner` with exactly
    /// these parameters.
    fn declared_function(&self, owner: InstanceOwner, name: Name, parameters: &[TypeUsage]) -> Option<FunctionId> {
        self.registry
            .holders(owner)
            .functions
            .get(name)
            .iter()
            .copied()
            .find(|&id| self.registry.function(id).parameters == parameters)
    }

    /// A redeclaration must repeat the return type of the first one.
    fn check_return_type(&self, id: FunctionId, return_type: TypeUsage, line: u32) -> ParseResult<()> {
        if self.registry.function(id).return_type == return_type {
            return Ok(());
        }
        Err(self.error_at(
            CompileErrorKind::ConflictingDeclaration {
                name: self.registry.function_name(id),
            },
            line,
        ))
    }

    /// Method or static method of `type_id` matching a definition.
    fn declared_method(
        &self,
        type_id: TypeId,
        name: Name,
        parameters: &[TypeUsage],
        is_const: bool,
    ) -> Option<FunctionId> {
        let methods = self
            .registry
            .type_info(type_id)
            .as_struct()
            .map(|data| data.methods.clone())
            .unwrap_or_default();
        methods
            .into_iter()
            .find(|&id| {
                let function = self.registry.function(id);
                function.name == name
                    && function.parameters == parameters
                    && function.is_const() == is_const
                    && !function.is_constructor()
                    && !function.is_destructor()
            })
            .or_else(|| self.declared_function(InstanceOwner::Type(type_id), name, parameters))
    }

    /// `S::S(...)` and `S::~S()` defined outside the struct.
    fn try_parse_special_member_definition(&mut self) -> ParseResult<Option<Stmt>> {
        let starts_name = self.cursor.check_kind(TokenKind::Identifier)
            || (self.cursor.check("::") && self.cursor.peek_kind(1) == Some(TokenKind::Identifier));
        if !starts_name {
            return Ok(None);
        }
        let start = self.cursor.pos();
        let line = self.cursor.line();
        let name = self.parse_qualified_name()?;
        let is_destructor = self.cursor.check("::") && self.cursor.check_at(1, "~");
        let (qualifier, last) = if is_destructor {
            (name.as_str(), None)
        } else {
            match name.rsplit_once("::") {
                Some((qualifier, last)) => (qualifier, Some(last)),
                None => {
                    self.cursor.set_pos(start);
                    return Ok(None);
                }
            }
        };
        let Some(scope) = self
            .lookup_type(qualifier, &[])
            .filter(|usage| self.registry.is_struct_value(*usage))
        else {
            self.cursor.set_pos(start);
            return Ok(None);
        };
        let struct_name = self
            .registry
            .name(self.registry.type_info(scope.type_id).name)
            .to_string();

        let id = if is_destructor {
            self.cursor.advance();
            self.cursor.advance();
            if self.cursor.expect_identifier()? != struct_name {
                return Err(self.cursor.expected(&struct_name));
            }
            let parameters = self.parse_parameters()?;
            let Some(id) = self.registry.destructor(scope.type_id) else {
                return Err(self.error_at(
                    CompileErrorKind::MissingMethod {
                        method: format!("~{struct_name}"),
                        type_name: self.type_name(scope),
                    },
                    line,
                ));
            };
            self.define_function(id, &parameters)?;
            id
        } else {
            if last != Some(struct_name.as_str()) || !self.cursor.check("(") {
                self.cursor.set_pos(start);
                return Ok(None);
            }
            let parameters = self.parse_parameters()?;
            let found = self
                .registry
                .constructors(scope.type_id)
                .into_iter()
                .find(|&id| self.registry.function(id).parameters == parameters.types);
            let Some(id) = found else {
                return Err(self.error_at(
                    CompileErrorKind::MissingConstructor {
                        type_name: self.type_name(scope),
                    },
                    line,
                ));
            };
            self.define_function(id, &parameters)?;
            id
        };
        Ok(Some(Stmt::new(StmtKind::FunctionDeclaration(id), line)))
    }

    /// Parse the body of a declared function at the cursor (member
    /// initializers included for constructors) and bind it.
    pub(crate) fn define_function(&mut self, id: FunctionId, parameters: &Parameters) -> ParseResult<()> {
        let function = self.registry.function(id);
        let line = self.cursor.line();
        if function.is_bound() {
            return Err(self.error(CompileErrorKind::FunctionRedefinition {
                name: self.registry.function_name(id),
            }));
        }
        let frame = FunctionFrame {
            name: self.registry.function_name(id),
            return_type: function.return_type,
            owner: function.owner,
            is_const: function.is_const(),
            is_static: function.is_static(),
            locals_base: self.context.locals_len(),
        };
        let constructed = function.owner.filter(|_| function.is_constructor());
        let namespace = function.namespace;
        let (function_name, return_type, locals_base) =
            (frame.name.clone(), frame.return_type, frame.locals_base);

        let saved_jumps = (self.context.loops, self.context.breakables);
        self.context.loops = 0;
        self.context.breakables = 0;
        let previous = self.context.function.replace(frame);
        self.context.push_namespace(namespace);
        let parsed = self.with_scope(|parser| {
            for (&name, &usage) in parameters.names.iter().zip(&parameters.types) {
                if name == Name::EMPTY {
                    continue;
                }
                if parser.context.is_declared_here(name) {
                    return Err(parser.error(CompileErrorKind::VariableRedefinition {
                        name: parser.registry.name(name).to_string(),
                    }));
                }
                parser.context.declare_local(name, usage);
            }
            let initializers = match constructed {
                Some(type_id) => parser.parse_member_initializers(type_id)?,
                None => Vec::new(),
            };
            let body_line = parser.cursor.line();
            parser.cursor.expect("{")?;
            let statements = parser.parse_block_statements()?;
            Ok((initializers, Stmt::new(StmtKind::Block(statements), body_line)))
        });
        self.context.pop_namespace();
        self.context.function = previous;
        self.context.truncate_locals(locals_base);
        (self.context.loops, self.context.breakables) = saved_jumps;
        let (member_initializers, body) = parsed?;

        if !return_type.is_void() && !body.contains_return() {
            return Err(self.error_at(
                CompileErrorKind::MissingReturnStatement {
                    function: function_name,
                },
                line,
            ));
        }
        let body = Rc::new(body);
        self.bodies.push(Rc::clone(&body));
        let script = ScriptFunction {
            program: self.program,
            parameters: parameters.names.clone(),
            member_initializers,
            body,
        };
        trace!(function = %function_name, "function defined");
        self.registry.function_mut(id).callable = Callable::Script(script);
        Ok(())
    }

    /// `: base(args), member(args), member{list}` before a constructor body.
    fn parse_member_initializers(&mut self, type_id: TypeId) -> ParseResult<Vec<MemberInitializer>> {
        let mut initializers = Vec::new();
        if !self.cursor.eat(":") {
            return Ok(initializers);
        }
        loop {
            let line = self.cursor.line();
            let name = self.parse_qualified_name()?;
            let braced = self.cursor.check("{");
            let base = self
                .lookup_type(&name, &[])
                .and_then(|usage| self.direct_base_offset(type_id, usage.type_id).map(|offset| (usage, offset)));

            if let Some((base, offset)) = base {
                let args = if braced {
                    self.parse_arguments("{", "}")?
                } else {
                    self.parse_arguments("(", ")")?
                };
                let initializer = self.make_construction(base.type_id, args, braced, line)?;
                initializers.push(MemberInitializer {
                    offset,
                    type_usage: TypeUsage::of(base.type_id),
                    initializer,
                });
            } else {
                let member = self.registry.find_name(&name).and_then(|id| {
                    self.registry
                        .type_info(type_id)
                        .as_struct()
                        .and_then(|data| data.members.iter().find(|m| m.name == id).cloned())
                });
                let Some(member) = member else {
                    return Err(self.error_at(
                        CompileErrorKind::MissingMember {
                            member: name,
                            type_name: self.type_name(TypeUsage::of(type_id)),
                        },
                        line,
                    ));
                };
                let initializer = if braced {
                    let list = self.parse_initializer()?;
                    self.typed_initializer(member.type_usage, list)?
                } else {
                    let args = self.parse_arguments("(", ")")?;
                    self.construct_from_arguments(member.type_usage, args, line)?
                };
                initializers.push(MemberInitializer {
                    offset: member.offset,
                    type_usage: member.type_usage,
                    initializer,
                });
            }
            if !self.cursor.eat(",") {
                return Ok(initializers);
            }
        }
    }

    fn direct_base_offset(&self, type_id: TypeId, base: TypeId) -> Option<u32> {
        self.registry
            .type_info(type_id)
            .as_struct()?
            .bases
            .iter()
            .find(|candidate| candidate.type_id == base)
            .map(|candidate| candidate.offset)
    }

    /// `T x(args)`: constructor call for structs, conversion for scalars.
    pub(crate) fn construct_from_arguments(
        &mut self,
        usage: TypeUsage,
        mut args: Vec<Expr>,
        line: u32,
    ) -> ParseResult<Expr> {
        if !usage.is_reference() && self.registry.is_struct_value(usage) {
            return self.make_construction(usage.type_id, args, false, line);
        }
        if usage.is_array() {
            return Err(self.error_at(
                CompileErrorKind::InvalidTypeUsage {
                    name: self.type_name(usage),
                },
                line,
            ));
        }
        match args.len() {
            0 => Ok(self.zero_literal(usage.value_usage(), line)),
            1 => self.coerce(args.remove(0), usage),
            found => Err(self.error_at(
                CompileErrorKind::TooManyInitializers { expected: 1, found },
                line,
            )),
        }
    }

    /// `[N]` or `[]` after a declarator. Returns the array usage and whether
    /// the size is left to the initializer.
    pub(crate) fn parse_array_suffix(&mut self, usage: TypeUsage) -> ParseResult<(TypeUsage, bool)> {
        if !self.cursor.eat("[") {
            return Ok((usage, false));
        }
        if self.cursor.eat("]") {
            return Ok((usage.array_of(0), true));
        }
        let size = self.parse_expression()?;
        let Some(count) = self.const_eval(&size).filter(|&count| count > 0) else {
            return Err(self.error_at(
                CompileErrorKind::NonIntegerValue {
                    context: "array size".to_string(),
                },
                size.line,
            ));
        };
        self.cursor.expect("]")?;
        let count = u32::try_from(count).map_err(|_| {
            self.error_at(
                CompileErrorKind::NonIntegerValue {
                    context: "array size".to_string(),
                },
                size.line,
            )
        })?;
        Ok((usage.array_of(count), false))
    }

    /// Initializer written after a declarator, if any: `= expr`,
    /// `= {list}`, `{list}` or `(args)`.
    pub(crate) fn parse_declared_initializer(
        &mut self,
        usage: &mut TypeUsage,
        name: &str,
        inferred_size: bool,
        line: u32,
    ) -> ParseResult<Option<Expr>> {
        let initializer = if self.cursor.eat("=") || self.cursor.check("{") {
            Some(self.parse_initializer()?)
        } else if self.cursor.check("(") {
            let args = self.parse_arguments("(", ")")?;
            Some(Initializer::Expr(self.construct_from_arguments(*usage, args, line)?))
        } else {
            None
        };
        if inferred_size {
            match initializer.as_ref().and_then(|init| self.inferred_array_size(init)) {
                Some(size) => *usage = usage.array_of(size),
                None => {
                    return Err(self.error_at(
                        CompileErrorKind::ArrayInitializationExpected {
                            name: name.to_string(),
                        },
                        line,
                    ))
                }
            }
        }
        match initializer {
            Some(initializer) => Ok(Some(self.typed_initializer(*usage, initializer)?)),
            None => Ok(None),
        }
    }

    /// What an uninitialized declaration of `usage` runs: the default
    /// constructor of a struct, nothing for scalars.
    pub(crate) fn default_initializer(&mut self, usage: TypeUsage, name: &str, line: u32) -> ParseResult<Option<Expr>> {
        if usage.is_reference() {
            return Err(self.error_at(
                CompileErrorKind::UninitializedReference {
                    name: name.to_string(),
                },
                line,
            ));
        }
        if usage.is_pointer() {
            return Ok(None);
        }
        if usage.is_array() {
            let element = usage.element();
            if self.registry.is_struct_value(element)
                && !self.registry.constructors(element.type_id).is_empty()
                && self.registry.default_constructor(element.type_id).is_none()
            {
                return Err(self.error_at(
                    CompileErrorKind::NoDefaultConstructor {
                        type_name: self.type_name(element),
                    },
                    line,
                ));
            }
            return Ok(None);
        }
        if self.registry.is_struct_value(usage) {
            return self
                .make_construction(usage.type_id, Vec::new(), false, line)
                .map(Some);
        }
        Ok(None)
    }

    /// Bytes a variable of `usage` occupies; references are stored as
    /// pointers.
    pub(crate) fn storage_size(&self, usage: TypeUsage) -> u32 {
        if usage.is_reference() {
            POINTER_SIZE
        } else {
            self.registry.size_of(usage)
        }
    }

    pub(crate) fn check_static_pointer(&self, usage: TypeUsage, name: &str, line: u32) -> ParseResult<()> {
        if usage.is_pointer() && self.settings.contains(Settings::DISALLOW_STATIC_POINTERS) {
            return Err(self.error_at(
                CompileErrorKind::StaticPointersNotAllowed {
                    name: name.to_string(),
                },
                line,
            ));
        }
        Ok(())
    }

    /// Allocate static storage and register it as an instance of `owner`.
    pub(crate) fn register_static_instance(&mut self, owner: InstanceOwner, name: Name, usage: TypeUsage) {
        let len = self.storage_size(usage);
        let address = self.memory.allocate(len as usize);
        let flags = if usage.is_writable() || usage.is_reference() {
            InstanceFlags::empty()
        } else {
            InstanceFlags::CONSTANT
        };
        self.registry.register_instance(
            owner,
            Instance {
                name,
                type_usage: usage,
                address,
                len,
                scope_level: 0,
                flags,
            },
        );
    }

    /// Remember the value of an integral constant so it can size arrays.
    pub(crate) fn record_constant(&mut self, owner: InstanceOwner, name: Name, usage: TypeUsage, initializer: Option<&Expr>) {
        if usage.is_writable() || !self.registry.is_integral(usage.value_usage()) {
            return;
        }
        if let Some(value) = initializer.and_then(|expr| self.const_eval(expr)) {
            self.context.define_constant(owner, name, value);
        }
    }

    fn parse_variable(&mut self, usage: TypeUsage, declarator: Declarator, is_static: bool) -> ParseResult<Stmt> {
        let line = declarator.line;
        let text = declarator.name.as_str();
        if usage.is_void() {
            return Err(self.error_at(
                CompileErrorKind::InvalidTypeUsage {
                    name: text.to_string(),
                },
                line,
            ));
        }
        let (mut usage, inferred_size) = self.parse_array_suffix(usage)?;
        let invalid = (usage.is_array() && usage.is_reference())
            || (!usage.is_reference() && self.is_incomplete(usage));
        if invalid {
            return Err(self.error_at(
                CompileErrorKind::InvalidTypeUsage {
                    name: text.to_string(),
                },
                line,
            ));
        }
        let explicit = self.parse_declared_initializer(&mut usage, text, inferred_size, line)?;
        let name = self.registry.intern(text);

        if let Some(qualifier) = &declarator.qualifier {
            return self.define_static_member(qualifier, text, name, usage, explicit, line);
        }
        let initializer = match explicit {
            Some(expr) => Some(expr),
            None => self.default_initializer(usage, text, line)?,
        };

        if self.context.is_local_scope() {
            if self.context.is_declared_here(name) {
                return Err(self.error_at(
                    CompileErrorKind::VariableRedefinition {
                        name: text.to_string(),
                    },
                    line,
                ));
            }
            let storage = if is_static {
                self.check_static_pointer(usage, text, line)?;
                let address = self.memory.allocate(self.storage_size(usage) as usize);
                VariableStorage::Static(self.registry.register_static(address))
            } else {
                VariableStorage::Local
            };
            self.context.declare_local(name, usage);
            return Ok(variable_statement(name, usage, initializer, storage, line));
        }

        let owner = InstanceOwner::Namespace(self.context.namespace());
        if self.registry.holders(owner).instances.get(name).is_some() {
            return Err(self.error_at(
                CompileErrorKind::VariableRedefinition {
                    name: text.to_string(),
                },
                line,
            ));
        }
        self.check_static_pointer(usage, text, line)?;
        self.register_static_instance(owner, name, usage);
        self.record_constant(owner, name, usage, initializer.as_ref());
        Ok(variable_statement(
            name,
            usage,
            initializer,
            VariableStorage::Global(owner),
            line,
        ))
    }

    /// `int S::count = 3;`: initializes a static member declared in `S`.
    fn define_static_member(
        &mut self,
        qualifier: &str,
        text: &str,
        name: Name,
        usage: TypeUsage,
        initializer: Option<Expr>,
        line: u32,
    ) -> ParseResult<Stmt> {
        let Some(scope) = self
            .lookup_type(qualifier, &[])
            .filter(|usage| self.registry.is_struct_value(*usage))
        else {
            return Err(self.error_at(
                CompileErrorKind::UndefinedType {
                    name: qualifier.to_string(),
                },
                line,
            ));
        };
        let owner = InstanceOwner::Type(scope.type_id);
        let Some(declared) = self.registry.holders(owner).instances.get(name).map(|i| i.type_usage) else {
            return Err(self.error_at(
                CompileErrorKind::MissingStaticMember {
                    member: text.to_string(),
                    type_name: self.type_name(scope),
                },
                line,
            ));
        };
        if !declared.same_value_type(&usage) {
            return Err(self.error_at(
                CompileErrorKind::IncompatibleTypes {
                    from: self.type_name(usage),
                    to: self.type_name(declared),
                },
                line,
            ));
        }
        if initializer.is_none() {
            return Ok(Stmt::new(StmtKind::Block(Vec::new()), line));
        }
        self.record_constant(owner, name, declared, initializer.as_ref());
        Ok(variable_statement(
            name,
            declared,
            initializer,
            VariableStorage::Global(owner),
            line,
        ))
    }

    /// Where aliases and nested types declared here belong.
    pub(crate) fn declaration_owner(&self) -> InstanceOwner {
        match self.context.structs.last() {
            Some(&type_id) if !self.context.is_local_scope() => InstanceOwner::Type(type_id),
            _ => InstanceOwner::Namespace(self.context.namespace()),
        }
    }

    fn lookup_namespace(&self, name: &str) -> Option<NamespaceId> {
        std::iter::once(self.context.namespace())
            .chain(self.context.usings())
            .find_map(|from| self.registry.get_namespace(from, name))
    }

    /// `namespace a { ... }` or `namespace a::b { ... }`, at namespace scope
    /// only.
    pub(crate) fn parse_namespace(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        if self.context.is_local_scope() || !self.context.structs.is_empty() {
            return Err(self.error(misplaced("namespace")));
        }
        self.cursor.advance();
        let name = self.parse_qualified_name()?;
        let namespace = self.registry.request_namespace(self.context.namespace(), &name);
        self.cursor.expect("{")?;
        self.context.push_namespace(namespace);
        let statements = self.parse_block_statements();
        self.context.pop_namespace();
        Ok(Stmt::new(
            StmtKind::NamespaceDeclaration {
                namespace,
                statements: statements?,
            },
            line,
        ))
    }

    /// `using namespace a::b;` or `using Alias = Type;`.
    pub(crate) fn parse_using(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        self.cursor.advance();
        if self.cursor.eat("namespace") {
            let name = self.parse_qualified_name()?;
            let Some(namespace) = self.lookup_namespace(&name) else {
                return Err(self.error_at(CompileErrorKind::UndefinedNamespace { name }, line));
            };
            self.cursor.expect(";")?;
            self.context.add_using(namespace);
            return Ok(Stmt::new(StmtKind::UsingDirective(namespace), line));
        }
        let alias = self.cursor.expect_identifier()?;
        self.cursor.expect("=")?;
        let usage = self.parse_type_usage()?;
        self.cursor.expect(";")?;
        Ok(self.register_alias(alias, usage, line))
    }

    /// `typedef Type Alias;`
    pub(crate) fn parse_typedef(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        self.cursor.advance();
        let usage = self.parse_type_usage()?;
        let alias = self.cursor.expect_identifier()?;
        let (usage, inferred) = self.parse_array_suffix(usage)?;
        if inferred {
            return Err(self.error_at(
                CompileErrorKind::ArrayInitializationExpected {
                    name: alias.to_string(),
                },
                line,
            ));
        }
        self.cursor.expect(";")?;
        Ok(self.register_alias(alias, usage, line))
    }

    fn register_alias(&mut self, alias: &str, usage: TypeUsage, line: u32) -> Stmt {
        let owner = self.declaration_owner();
        let level = self.context.scope_level();
        self.registry.register_type_alias(owner, alias, usage, level);
        let name = self.registry.intern(alias);
        Stmt::new(StmtKind::TypeDefinition(name), line)
    }
}

pub(crate) fn variable_statement(
    name: Name,
    type_usage: TypeUsage,
    initializer: Option<Expr>,
    storage: VariableStorage,
    line: u32,
) -> Stmt {
    Stmt::new(
        StmtKind::VariableDeclaration(VariableDeclaration {
            name,
            type_usage,
            initializer,
            storage,
        }),
        line,
    )
}

#[cfg(test)]
mod tests;
