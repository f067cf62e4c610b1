//! Primary expressions: literals, names, calls, construction and `this`.
//!
//! Names resolve in this order: locals of the current function, members
//! and static members of the structs in scope, then the enclosing namespace
//! chain, then namespaces brought in by `using namespace`.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{
    Expr, ExprKind, FunctionId, InstanceOwner, InstanceRef, Literal, TokenKind, TypeUsage,
    TypeUsageFlags,
};
use ember_types::{Instance, InstanceFlags};

use crate::grammar::ty::is_built_in_word;
use crate::{ParseResult, Parser};

impl Parser<'_> {
    pub(crate) fn parse_primary(&mut self) -> ParseResult<Expr> {
        let line = self.cursor.line();
        match self.cursor.kind() {
            Some(
                TokenKind::Number
                | TokenKind::Character
                | TokenKind::WideCharacter
                | TokenKind::String
                | TokenKind::WideString,
            ) => self.parse_literal(),
            Some(TokenKind::Keyword) => match self.cursor.text() {
                "true" | "false" => {
                    let value = self.cursor.check("true");
                    self.cursor.advance();
                    Ok(Expr::new(
                        ExprKind::Literal(Literal::Bool(value)),
                        TypeUsage::BOOL,
                        line,
                    ))
                }
                "nullptr" => {
                    self.cursor.advance();
                    Ok(Expr::new(
                        ExprKind::NullPointer,
                        TypeUsage::VOID.pointer_to(),
                        line,
                    ))
                }
                "this" => {
                    self.cursor.advance();
                    self.this_expr(line)
                }
                text if is_built_in_word(text) || text == "const" => {
                    let base = self.parse_type_usage()?;
                    self.parse_construction(base, line)
                }
                _ => Err(self.cursor.expected("expression")),
            },
            Some(TokenKind::Punctuation) if self.cursor.check("(") => {
                self.cursor.advance();
                let expr = self.parse_expression()?;
                self.cursor.expect(")")?;
                Ok(expr)
            }
            Some(TokenKind::Identifier) => self.parse_name_expression(),
            Some(TokenKind::Punctuation) if self.cursor.check("::") => self.parse_name_expression(),
            _ => Err(self.cursor.expected("expression")),
        }
    }

    /// `this`: a pointer to the object of the method being parsed, to a
    /// const object inside a const method.
    pub(crate) fn this_expr(&self, line: u32) -> ParseResult<Expr> {
        let frame = self.context.function.as_ref().filter(|frame| !frame.is_static);
        let Some((owner, is_const)) = frame.and_then(|frame| frame.owner.map(|o| (o, frame.is_const)))
        else {
            return Err(self.error_at(CompileErrorKind::InvalidThis, line));
        };
        let mut object = TypeUsage::of(owner);
        if is_const {
            object = object.with_flags(TypeUsageFlags::CONST);
        }
        Ok(Expr::new(ExprKind::This, object.pointer_to(), line))
    }

    fn parse_name_expression(&mut self) -> ParseResult<Expr> {
        let line = self.cursor.line();
        let start = self.cursor.pos();
        if let Some(base) = self.try_parse_base_type()? {
            if self.cursor.check("(") || self.cursor.check("{") {
                return self.parse_construction(base, line);
            }
            self.cursor.set_pos(start);
        }

        let name = self.parse_qualified_name()?;
        let mut template_types = Vec::new();
        if self.cursor.check("<") && self.names_template_function(&name) {
            if let Some(types) = self.try_parse_template_arguments()? {
                template_types = types;
            }
        }
        if self.cursor.check("(") {
            let args = self.parse_arguments("(", ")")?;
            return self.build_named_call(&name, &template_types, args, line);
        }
        self.resolve_variable(&name, line)
    }

    fn names_template_function(&self, name: &str) -> bool {
        self.lookup_functions(name)
            .iter()
            .any(|&function| !self.registry.function(function).template_types.is_empty())
    }

    /// `T(args)` or `T{args}` after a type.
    fn parse_construction(&mut self, base: TypeUsage, line: u32) -> ParseResult<Expr> {
        let braced = self.cursor.check("{");
        let args = if braced {
            self.parse_arguments("{", "}")?
        } else {
            self.parse_arguments("(", ")")?
        };
        if self.registry.is_struct_value(base) {
            return self.make_construction(base.type_id, args, braced, line);
        }
        let mut args = args;
        match args.len() {
            0 => Ok(self.zero_literal(base, line)),
            1 => self.build_cast(ember_ir::CastKind::CStyle, base, args.remove(0), line),
            found => Err(self.error_at(
                CompileErrorKind::TooManyInitializers { expected: 1, found },
                line,
            )),
        }
    }

    pub(crate) fn parse_arguments(&mut self, open: &str, close: &str) -> ParseResult<Vec<Expr>> {
        self.cursor.expect(open)?;
        let mut args = Vec::new();
        if self.cursor.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.cursor.eat(close) {
                return Ok(args);
            }
            self.cursor.expect(",")?;
        }
    }

    /// Functions named `name` visible from the current namespace, including
    /// those brought in by `using namespace`.
    pub(crate) fn lookup_functions(&self, name: &str) -> Vec<FunctionId> {
        let mut found = self.registry.get_functions(self.context.namespace(), name);
        for using in self.context.usings() {
            for function in self.registry.get_functions(using, name) {
                if !found.contains(&function) {
                    found.push(function);
                }
            }
        }
        found
    }

    /// Convert arguments to the parameter types of `function`. Extra
    /// arguments of a variadic function pass unchanged.
    pub(crate) fn coerce_arguments(
        &mut self,
        function: FunctionId,
        args: Vec<Expr>,
    ) -> ParseResult<Vec<Expr>> {
        let parameters = self.registry.function(function).parameters.clone();
        let mut converted = Vec::with_capacity(args.len());
        for (index, arg) in args.into_iter().enumerate() {
            converted.push(match parameters.get(index) {
                Some(&parameter) => self.coerce(arg, parameter)?,
                None => arg,
            });
        }
        Ok(converted)
    }

    pub(crate) fn make_call(&mut self, function: FunctionId, args: Vec<Expr>, line: u32) -> ParseResult<Expr> {
        let args = self.coerce_arguments(function, args)?;
        let return_type = self.registry.function(function).return_type;
        Ok(Expr::new(ExprKind::Call { function, args }, return_type, line))
    }

    fn no_matching_overload(&self, name: String, args: &[Expr], line: u32) -> ember_diagnostic::CompileError {
        let names: Vec<String> = args.iter().map(|arg| self.type_name(arg.type_usage)).collect();
        self.error_at(
            CompileErrorKind::NoMatchingOverload {
                name,
                arguments: names.join(", "),
            },
            line,
        )
    }

    fn build_named_call(
        &mut self,
        name: &str,
        template_types: &[TypeUsage],
        args: Vec<Expr>,
        line: u32,
    ) -> ParseResult<Expr> {
        let arg_types: Vec<TypeUsage> = args.iter().map(|arg| arg.type_usage).collect();

        if !name.contains("::") {
            if let Some(function_name) = self.registry.find_name(name) {
                for scope in self.context.struct_scopes() {
                    if let Some((_, methods)) = self.registry.find_methods(scope, function_name) {
                        return match self.registry.select_overload(&methods, &arg_types, template_types) {
                            Some(method) => {
                                let this = self.this_expr(line)?;
                                self.make_method_call(this, method, args, true, line)
                            }
                            None => Err(self.no_matching_overload(name.to_string(), &args, line)),
                        };
                    }
                    let statics = self.registry.find_static_methods(scope, function_name);
                    if !statics.is_empty() {
                        return match self.registry.select_overload(&statics, &arg_types, template_types) {
                            Some(function) => self.make_call(function, args, line),
                            None => Err(self.no_matching_overload(name.to_string(), &args, line)),
                        };
                    }
                }
            }
        }

        let candidates = self.lookup_functions(name);
        if candidates.is_empty() {
            return self.build_qualified_method_call(name, args, line);
        }
        match self.registry.select_overload(&candidates, &arg_types, template_types) {
            Some(function) => self.make_call(function, args, line),
            None => Err(self.no_matching_overload(name.to_string(), &args, line)),
        }
    }

    /// `Base::method(args)` from a method of a struct derived from `Base`.
    fn build_qualified_method_call(&mut self, name: &str, args: Vec<Expr>, line: u32) -> ParseResult<Expr> {
        let undefined = |parser: &Self| {
            parser.error_at(
                CompileErrorKind::UndefinedFunction {
                    name: name.to_string(),
                },
                line,
            )
        };
        let Some((qualifier, method)) = name.rsplit_once("::") else {
            return Err(undefined(self));
        };
        let Some(scope) = self
            .lookup_type(qualifier, &[])
            .filter(|usage| self.registry.is_struct_value(*usage))
        else {
            return Err(undefined(self));
        };
        let missing = |parser: &Self| {
            parser.error_at(
                CompileErrorKind::MissingStaticMethod {
                    method: method.to_string(),
                    type_name: parser.type_name(scope),
                },
                line,
            )
        };
        let Some(method_name) = self.registry.find_name(method) else {
            return Err(missing(self));
        };
        let Some((_, methods)) = self.registry.find_methods(scope.type_id, method_name) else {
            return Err(missing(self));
        };
        let inside_derived = self
            .context
            .function
            .as_ref()
            .and_then(|frame| frame.owner)
            .is_some_and(|owner| self.registry.is_derived_from(owner, scope.type_id));
        if !inside_derived {
            return Err(missing(self));
        }
        let arg_types: Vec<TypeUsage> = args.iter().map(|arg| arg.type_usage).collect();
        match self.registry.select_overload(&methods, &arg_types, &[]) {
            Some(method) => {
                let this = self.this_expr(line)?;
                self.make_method_call(this, method, args, true, line)
            }
            None => Err(self.no_matching_overload(name.to_string(), &args, line)),
        }
    }

    /// A variable reference by (possibly qualified) name.
    pub(crate) fn resolve_variable(&mut self, name: &str, line: u32) -> ParseResult<Expr> {
        let undefined = |parser: &Self| {
            parser.error_at(
                CompileErrorKind::UndefinedVariable {
                    name: name.to_string(),
                },
                line,
            )
        };

        if !name.contains("::") {
            let Some(id) = self.registry.find_name(name) else {
                return Err(undefined(self));
            };
            if let Some(local) = self.context.local(id) {
                return Ok(Expr::new(
                    ExprKind::Local(id),
                    local.type_usage.value_usage(),
                    line,
                ));
            }
            for scope in self.context.struct_scopes() {
                if let Some((member, declaring)) = self.find_member_declaration(scope, id) {
                    self.check_access(declaring, member.visibility, name, line)?;
                    let this = self.this_expr(line)?;
                    return Ok(self.member_expr(this, member, true, line));
                }
                let mut current = Some(scope);
                while let Some(type_id) = current {
                    let owner = InstanceOwner::Type(type_id);
                    if let Some(instance) = self.registry.instance_in(owner, id) {
                        return Ok(instance_expr(owner, instance, line));
                    }
                    current = self.registry.type_info(type_id).parent;
                }
            }
        }

        let namespace = self.context.namespace();
        let found = std::iter::once(namespace)
            .chain(self.context.usings())
            .find_map(|from| self.registry.get_instance(from, name));
        if let Some((owner, instance)) = found {
            return Ok(instance_expr(owner, instance, line));
        }

        if let Some((qualifier, member)) = name.rsplit_once("::") {
            if let Some(scope) = self
                .lookup_type(qualifier, &[])
                .filter(|usage| !usage.type_id.is_built_in())
            {
                if let Some(id) = self.registry.find_name(member) {
                    if let Some(instance) = self.registry.instance_in(InstanceOwner::Type(scope.type_id), id) {
                        return Ok(instance_expr(InstanceOwner::Type(scope.type_id), instance, line));
                    }
                }
                return Err(self.error_at(
                    CompileErrorKind::MissingStaticMember {
                        member: member.to_string(),
                        type_name: self.type_name(scope),
                    },
                    line,
                ));
            }
        }
        Err(undefined(self))
    }
}

/// Reference to a global, static member or enum value. Constants are
/// read-only.
pub(super) fn instance_expr(owner: InstanceOwner, instance: &Instance, line: u32) -> Expr {
    let mut usage = instance.type_usage.value_usage();
    if instance.flags.contains(InstanceFlags::CONSTANT) {
        usage = usage.with_flags(TypeUsageFlags::CONST);
    }
    Expr::new(
        ExprKind::Global(InstanceRef {
            owner,
            name: instance.name,
        }),
        usage,
        line,
    )
}
