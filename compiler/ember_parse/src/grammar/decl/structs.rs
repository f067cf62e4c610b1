//! Struct and class declarations.
//!
//! The struct is registered before its body is read, so members can point
//! to it. Method bodies are skipped on the first pass and parsed once the
//! layout is final, which lets them use members declared after them.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{
    FunctionId, InstanceOwner, Stmt, StmtKind, TokenKind, TypeId, TypeUsage, VariableDeclaration,
    VariableStorage,
};
use ember_types::{Function, FunctionFlags, Visibility};
use tracing::debug;

use super::{misplaced, Parameters};
use crate::{ParseResult, Parser};

/// A method body to parse after the struct closes.
struct DeferredBody {
    function: FunctionId,
    parameters: Parameters,
    /// Token index of the `:` or `{` opening the definition.
    position: usize,
}

#[derive(Default)]
struct StructBody {
    static_members: Vec<VariableDeclaration>,
    nested: Vec<Stmt>,
    deferred: Vec<DeferredBody>,
}

impl Parser<'_> {
    pub(crate) fn parse_struct_declaration(&mut self) -> ParseResult<Vec<Stmt>> {
        let line = self.cursor.line();
        if self.context.is_local_scope() {
            return Err(self.error(misplaced("struct")));
        }
        let is_class = self.cursor.check("class");
        self.cursor.advance();
        let name = self.cursor.expect_identifier()?;
        let owner = self.declaration_owner();
        let existing = self
            .registry
            .find_name(name)
            .and_then(|id| self.registry.type_in(owner, id, &[]));

        if self.cursor.eat(";") {
            if existing.is_none() {
                self.register_struct_type(owner, name, is_class);
            }
            let name = self.registry.intern(name);
            return Ok(vec![Stmt::new(StmtKind::TypeDefinition(name), line)]);
        }

        let type_id = match existing {
            Some(type_id) if self.is_incomplete(TypeUsage::of(type_id)) => {
                if let Some(data) = self.registry.type_info_mut(type_id).as_struct_mut() {
                    data.is_class = is_class;
                }
                type_id
            }
            Some(_) => {
                return Err(self.error_at(
                    CompileErrorKind::TypeRedefinition {
                        name: name.to_string(),
                    },
                    line,
                ))
            }
            None => self.register_struct_type(owner, name, is_class),
        };

        if self.cursor.eat(":") {
            self.parse_base_list(type_id)?;
        }
        self.cursor.expect("{")?;
        self.context.structs.push(type_id);
        let body = self.parse_struct_body(type_id, is_class);
        self.context.structs.pop();
        let body = body?;
        self.cursor.expect(";")?;
        self.registry.finish_layout(type_id);

        let resume = self.cursor.pos();
        for deferred in body.deferred {
            self.cursor.set_pos(deferred.position);
            self.define_function(deferred.function, &deferred.parameters)?;
        }
        self.cursor.set_pos(resume);
        debug!(name, size = self.registry.type_info(type_id).size, "struct declared");

        let mut statements = body.nested;
        statements.push(Stmt::new(
            StmtKind::StructDeclaration {
                type_id,
                static_members: body.static_members,
            },
            line,
        ));
        Ok(statements)
    }

    fn register_struct_type(&mut self, owner: InstanceOwner, name: &str, is_class: bool) -> TypeId {
        if is_class {
            self.registry.register_class(owner, name, 0, 1)
        } else {
            self.registry.register_struct(owner, name, 0, 1)
        }
    }

    /// Struct declared but not yet defined, used by value.
    pub(crate) fn is_incomplete(&self, usage: TypeUsage) -> bool {
        let ty = self.registry.type_info(usage.type_id);
        !usage.is_pointer() && ty.is_struct() && ty.size == 0
    }

    /// `: [access] Base, [access] Other`
    fn parse_base_list(&mut self, type_id: TypeId) -> ParseResult<()> {
        loop {
            for access in ["public", "protected", "private"] {
                if self.cursor.eat(access) {
                    break;
                }
            }
            let line = self.cursor.line();
            let name = self.parse_qualified_name()?;
            let base = self.lookup_type(&name, &[]).filter(|usage| {
                self.registry.is_struct_value(*usage) && !self.is_incomplete(*usage)
            });
            let Some(base) = base else {
                return Err(self.error_at(CompileErrorKind::UndefinedType { name }, line));
            };
            self.registry.append_base(type_id, base.type_id);
            if !self.cursor.eat(",") {
                return Ok(());
            }
        }
    }

    fn parse_struct_body(&mut self, type_id: TypeId, is_class: bool) -> ParseResult<StructBody> {
        let mut body = StructBody::default();
        let mut visibility = if is_class {
            Visibility::Private
        } else {
            Visibility::Public
        };
        while !self.cursor.eat("}") {
            if self.cursor.is_at_end() {
                return Err(self.cursor.expected("}"));
            }
            match self.cursor.text() {
                ";" => {
                    self.cursor.advance();
                }
                access @ ("public" | "protected" | "private") => {
                    visibility = match access {
                        "public" => Visibility::Public,
                        "protected" => Visibility::Protected,
                        _ => Visibility::Private,
                    };
                    self.cursor.advance();
                    self.cursor.expect(":")?;
                }
                "struct" | "class" => body.nested.extend(self.parse_struct_declaration()?),
                "enum" => body.nested.push(self.parse_enum_declaration()?),
                "typedef" => body.nested.push(self.parse_typedef()?),
                "using" => body.nested.push(self.parse_using()?),
                _ => self.parse_struct_member(type_id, visibility, &mut body)?,
            }
        }
        Ok(body)
    }

    fn parse_struct_member(
        &mut self,
        type_id: TypeId,
        visibility: Visibility,
        body: &mut StructBody,
    ) -> ParseResult<()> {
        let line = self.cursor.line();
        let struct_name = self
            .registry
            .name(self.registry.type_info(type_id).name)
            .to_string();

        if self.cursor.eat("~") {
            if self.cursor.expect_identifier()? != struct_name {
                return Err(self.cursor.expected(&struct_name));
            }
            let parameters = self.parse_parameters()?;
            if !parameters.types.is_empty() {
                return Err(self.error_at(
                    CompileErrorKind::Expected {
                        expected: ")".to_string(),
                    },
                    line,
                ));
            }
            let name = self.registry.intern(&format!("~{struct_name}"));
            let mut function =
                Function::new(name, TypeUsage::VOID, Vec::new()).with_flags(FunctionFlags::DESTRUCTOR);
            function.visibility = visibility;
            function.line = line;
            let id = self.registry.register_method(type_id, function);
            return self.finish_member_function(id, parameters, false, body);
        }

        let is_explicit = self.cursor.check("explicit")
            && self.cursor.check_at(1, &struct_name)
            && self.cursor.check_at(2, "(");
        if is_explicit {
            self.cursor.advance();
        }
        if self.cursor.check(&struct_name) && self.cursor.check_at(1, "(") {
            self.cursor.advance();
            let parameters = self.parse_parameters()?;
            let mut flags = FunctionFlags::CONSTRUCTOR;
            if is_explicit {
                flags |= FunctionFlags::EXPLICIT;
            }
            let name = self.registry.intern(&struct_name);
            let mut function = Function::new(name, TypeUsage::VOID, parameters.types.clone()).with_flags(flags);
            function.visibility = visibility;
            function.line = line;
            let id = self.registry.register_method(type_id, function);
            return self.finish_member_function(id, parameters, true, body);
        }

        let is_static = self.cursor.eat("static");
        let Some(base) = self.try_parse_base_type()? else {
            return Err(self.cursor.expected("type"));
        };
        let mut usage = self.parse_type_suffix(base);

        let is_method = self.cursor.check("operator")
            || (self.cursor.check_kind(TokenKind::Identifier) && self.cursor.check_at(1, "("));
        if is_method {
            let name = if self.cursor.check("operator") {
                self.parse_operator_name()?
            } else {
                let name = self.cursor.text().to_string();
                self.cursor.advance();
                name
            };
            let parameters = self.parse_parameters()?;
            let flags = if self.cursor.eat("const") {
                FunctionFlags::CONST
            } else {
                FunctionFlags::empty()
            };
            let name = self.registry.intern(&name);
            let mut function = Function::new(name, usage, parameters.types.clone()).with_flags(flags);
            function.visibility = visibility;
            function.line = line;
            let id = if is_static {
                self.registry
                    .register_function(InstanceOwner::Type(type_id), function)
            } else {
                self.registry.register_method(type_id, function)
            };
            return self.finish_member_function(id, parameters, false, body);
        }

        loop {
            let member_line = self.cursor.line();
            let text = self.cursor.expect_identifier()?;
            let (array_usage, inferred) = self.parse_array_suffix(usage)?;
            if is_static {
                self.declare_static_member(type_id, text, array_usage, inferred, member_line, body)?;
            } else {
                self.declare_data_member(type_id, text, array_usage, inferred, visibility, member_line)?;
            }
            if !self.cursor.eat(",") {
                break;
            }
            usage = self.parse_type_suffix(base);
        }
        self.cursor.expect(";")
    }

    fn declare_data_member(
        &mut self,
        type_id: TypeId,
        text: &str,
        usage: TypeUsage,
        inferred: bool,
        visibility: Visibility,
        line: u32,
    ) -> ParseResult<()> {
        let invalid = usage.is_void() || usage.is_reference() || self.is_incomplete(usage);
        if invalid {
            return Err(self.error_at(
                CompileErrorKind::InvalidTypeUsage {
                    name: text.to_string(),
                },
                line,
            ));
        }
        if inferred {
            return Err(self.error_at(
                CompileErrorKind::ArrayInitializationExpected {
                    name: text.to_string(),
                },
                line,
            ));
        }
        let name = self.registry.intern(text);
        let duplicate = self
            .registry
            .type_info(type_id)
            .as_struct()
            .is_some_and(|data| data.members.iter().any(|member| member.name == name))
            || self
                .registry
                .instance_in(InstanceOwner::Type(type_id), name)
                .is_some();
        if duplicate {
            return Err(self.error_at(
                CompileErrorKind::VariableRedefinition {
                    name: text.to_string(),
                },
                line,
            ));
        }
        self.registry.append_member(type_id, name, usage, visibility);
        Ok(())
    }

    /// `static T name [= value];` inside a struct: storage now, the
    /// initializer runs when the struct declaration executes.
    fn declare_static_member(
        &mut self,
        type_id: TypeId,
        text: &str,
        mut usage: TypeUsage,
        inferred: bool,
        line: u32,
        body: &mut StructBody,
    ) -> ParseResult<()> {
        if usage.is_void() || (!usage.is_reference() && self.is_incomplete(usage)) {
            return Err(self.error_at(
                CompileErrorKind::InvalidTypeUsage {
                    name: text.to_string(),
                },
                line,
            ));
        }
        self.check_static_pointer(usage, text, line)?;
        let owner = InstanceOwner::Type(type_id);
        let name = self.registry.intern(text);
        let duplicate = self.registry.holders(owner).instances.get(name).is_some()
            || self
                .registry
                .type_info(type_id)
                .as_struct()
                .is_some_and(|data| data.members.iter().any(|member| member.name == name));
        if duplicate {
            return Err(self.error_at(
                CompileErrorKind::VariableRedefinition {
                    name: text.to_string(),
                },
                line,
            ));
        }

        let explicit = self.parse_declared_initializer(&mut usage, text, inferred, line)?;
        let initializer = match explicit {
            Some(expr) => Some(expr),
            None => self.default_initializer(usage, text, line)?,
        };
        self.register_static_instance(owner, name, usage);
        self.record_constant(owner, name, usage, initializer.as_ref());
        body.static_members.push(VariableDeclaration {
            name,
            type_usage: usage,
            initializer,
            storage: VariableStorage::Global(owner),
        });
        Ok(())
    }

    /// After a member function's parameters: `;` for a declaration, or a
    /// body to skip now and parse once the struct is complete.
    fn finish_member_function(
        &mut self,
        function: FunctionId,
        parameters: Parameters,
        is_constructor: bool,
        body: &mut StructBody,
    ) -> ParseResult<()> {
        if self.cursor.eat(";") {
            return Ok(());
        }
        let position = self.cursor.pos();
        if is_constructor && self.cursor.eat(":") {
            loop {
                self.parse_qualified_name()?;
                let open = self.cursor.pos();
                let Some(close) = self.cursor.closing(open) else {
                    return Err(self.cursor.expected("("));
                };
                self.cursor.set_pos(close + 1);
                if !self.cursor.eat(",") {
                    break;
                }
            }
        }
        if !self.cursor.check("{") {
            return Err(self.cursor.expected("{"));
        }
        let Some(close) = self.cursor.closing(self.cursor.pos()) else {
            return Err(self.cursor.expected("}"));
        };
        self.cursor.set_pos(close + 1);
        body.deferred.push(DeferredBody {
            function,
            parameters,
            position,
        });
        Ok(())
    }
}
