//! Postfix operators: member access, method calls, indexing and postfix
//! increment.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{
    CastKind, Compatibility, Expr, ExprKind, FunctionId, InstanceOwner, Name, TokenKind, TypeId,
    TypeUsage, TypeUsageFlags, UnaryOp,
};
use ember_types::{Member, Visibility};

use super::primary::instance_expr;
use crate::{ParseResult, Parser};

impl Parser<'_> {
    pub(crate) fn parse_postfix(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        loop {
            let line = self.cursor.line();
            if self.cursor.check("[") {
                self.cursor.advance();
                let index = self.parse_expression()?;
                self.cursor.expect("]")?;
                expr = self.build_index(expr, index, line)?;
            } else if self.cursor.check(".") || self.cursor.check("->") {
                let through_pointer = self.cursor.check("->");
                self.cursor.advance();
                let name = self.cursor.expect_identifier()?;
                expr = if self.cursor.check("(") {
                    let args = self.parse_arguments("(", ")")?;
                    self.build_method_call_by_name(expr, name, args, through_pointer, line)?
                } else {
                    self.build_member_access(expr, name, through_pointer, line)?
                };
            } else if self.cursor.check_kind(TokenKind::Operator) && self.cursor.check("++") {
                self.cursor.advance();
                expr = self.build_unary(UnaryOp::PostIncrement, expr, line)?;
            } else if self.cursor.check_kind(TokenKind::Operator) && self.cursor.check("--") {
                self.cursor.advance();
                expr = self.build_unary(UnaryOp::PostDecrement, expr, line)?;
            } else {
                return Ok(expr);
            }
        }
    }

    /// Struct accessed by `.` or `->` on `object`, after checking the
    /// operator matches the object's pointer-ness.
    fn accessed_struct(
        &self,
        object: &Expr,
        member: &str,
        through_pointer: bool,
        line: u32,
    ) -> ParseResult<TypeId> {
        let usage = object.type_usage;
        if through_pointer && !usage.is_pointer() {
            return Err(self.error_at(
                CompileErrorKind::InvalidMemberAccessOperatorNonPtr {
                    member: member.to_string(),
                },
                line,
            ));
        }
        if !through_pointer && usage.is_pointer() {
            return Err(self.error_at(
                CompileErrorKind::InvalidMemberAccessOperatorPtr {
                    member: member.to_string(),
                },
                line,
            ));
        }
        let is_struct = usage.pointer_level <= 1
            && !usage.is_array()
            && self.registry.type_info(usage.type_id).is_struct();
        if !is_struct {
            return Err(self.error_at(
                CompileErrorKind::MissingMember {
                    member: member.to_string(),
                    type_name: self.type_name(usage),
                },
                line,
            ));
        }
        Ok(usage.type_id)
    }

    fn build_member_access(
        &mut self,
        object: Expr,
        name: &str,
        through_pointer: bool,
        line: u32,
    ) -> ParseResult<Expr> {
        let type_id = self.accessed_struct(&object, name, through_pointer, line)?;
        let missing = |parser: &Self| {
            parser.error_at(
                CompileErrorKind::MissingMember {
                    member: name.to_string(),
                    type_name: parser.type_name(TypeUsage::of(type_id)),
                },
                line,
            )
        };
        let Some(id) = self.registry.find_name(name) else {
            return Err(missing(self));
        };
        if let Some((member, declaring)) = self.find_member_declaration(type_id, id) {
            self.check_access(declaring, member.visibility, name, line)?;
            return Ok(self.member_expr(object, member, through_pointer, line));
        }
        let owner = InstanceOwner::Type(type_id);
        if let Some(instance) = self.registry.instance_in(owner, id) {
            return Ok(instance_expr(owner, instance, line));
        }
        Err(missing(self))
    }

    /// Field access node. Members of a const object are const.
    pub(crate) fn member_expr(&self, object: Expr, member: Member, through_pointer: bool, line: u32) -> Expr {
        let mut usage = member.type_usage;
        if object.type_usage.is_const() {
            usage = if usage.is_pointer() {
                usage.with_flags(TypeUsageFlags::CONST_POINTER)
            } else {
                usage.with_flags(TypeUsageFlags::CONST)
            };
        }
        Expr::new(
            ExprKind::Member {
                object: Box::new(object),
                name: member.name,
                offset: member.offset,
                through_pointer,
            },
            usage,
            line,
        )
    }

    /// Data member named `name` in `type_id` or its bases, with the offset
    /// relative to `type_id` and the struct that declares it.
    pub(crate) fn find_member_declaration(&self, type_id: TypeId, name: Name) -> Option<(Member, TypeId)> {
        let data = self.registry.type_info(type_id).as_struct()?;
        if let Some(member) = data.members.iter().find(|m| m.name == name) {
            return Some((member.clone(), type_id));
        }
        data.bases.iter().find_map(|base| {
            self.find_member_declaration(base.type_id, name)
                .map(|(mut member, declaring)| {
                    member.offset += base.offset;
                    (member, declaring)
                })
        })
    }

    /// Private members are accessible from their own struct, protected ones
    /// from derived structs too.
    pub(crate) fn check_access(
        &self,
        declaring: TypeId,
        visibility: Visibility,
        member: &str,
        line: u32,
    ) -> ParseResult<()> {
        let scopes = self.context.struct_scopes();
        let accessible = match visibility {
            Visibility::Public => true,
            Visibility::Private => scopes.contains(&declaring),
            Visibility::Protected => scopes
                .iter()
                .any(|&scope| self.registry.is_derived_from(scope, declaring)),
        };
        if accessible {
            Ok(())
        } else {
            Err(self.error_at(
                CompileErrorKind::InaccessibleMember {
                    member: member.to_string(),
                    type_name: self.type_name(TypeUsage::of(declaring)),
                },
                line,
            ))
        }
    }

    fn build_method_call_by_name(
        &mut self,
        object: Expr,
        name: &str,
        args: Vec<Expr>,
        through_pointer: bool,
        line: u32,
    ) -> ParseResult<Expr> {
        let type_id = self.accessed_struct(&object, name, through_pointer, line)?;
        let missing = |parser: &Self| {
            parser.error_at(
                CompileErrorKind::MissingMethod {
                    method: name.to_string(),
                    type_name: parser.type_name(TypeUsage::of(type_id)),
                },
                line,
            )
        };
        let Some(id) = self.registry.find_name(name) else {
            return Err(missing(self));
        };
        let arg_types: Vec<TypeUsage> = args.iter().map(|arg| arg.type_usage).collect();
        let no_match = |parser: &Self| {
            let names: Vec<String> = arg_types.iter().map(|&arg| parser.type_name(arg)).collect();
            parser.error_at(
                CompileErrorKind::NoMatchingOverload {
                    name: format!("{}::{name}", parser.registry.qualified_type_name(type_id)),
                    arguments: names.join(", "),
                },
                line,
            )
        };

        if let Some((declaring, methods)) = self.registry.find_methods(type_id, id) {
            let Some(method) = self.registry.select_overload(&methods, &arg_types, &[]) else {
                return Err(no_match(self));
            };
            let visibility = self.registry.function(method).visibility;
            self.check_access(declaring, visibility, name, line)?;
            return self.make_method_call(object, method, args, through_pointer, line);
        }
        let statics = self.registry.find_static_methods(type_id, id);
        if !statics.is_empty() {
            let Some(function) = self.registry.select_overload(&statics, &arg_types, &[]) else {
                return Err(no_match(self));
            };
            return self.make_call(function, args, line);
        }
        Err(missing(self))
    }

    /// Method call on `object` (a struct value, or a pointer to one when
    /// `through_pointer`). The object is upcast to the declaring struct.
    pub(crate) fn make_method_call(
        &mut self,
        object: Expr,
        method: FunctionId,
        args: Vec<Expr>,
        through_pointer: bool,
        line: u32,
    ) -> ParseResult<Expr> {
        let function = self.registry.function(method);
        let (declaring, is_const, return_type) = (function.owner, function.is_const(), function.return_type);
        if object.type_usage.is_const() && !is_const {
            return Err(self.error_at(
                CompileErrorKind::NonConstMethod {
                    method: self.registry.function_name(method),
                },
                line,
            ));
        }

        let mut object = object;
        if let Some(declaring) = declaring {
            if object.type_usage.type_id != declaring {
                let constness = object.type_usage.flags & TypeUsageFlags::CONST;
                let mut target = TypeUsage::of(declaring).with_flags(constness);
                if through_pointer {
                    target = target.pointer_to();
                }
                object = Expr::new(
                    ExprKind::Cast {
                        kind: CastKind::Static,
                        compatibility: Compatibility::ImplicitCastableInheritance,
                        operand: Box::new(object),
                    },
                    target,
                    line,
                );
            }
        }

        let args = self.coerce_arguments(method, args)?;
        Ok(Expr::new(
            ExprKind::MethodCall {
                object: Box::new(object),
                method,
                args,
                through_pointer,
            },
            return_type,
            line,
        ))
    }

    fn build_index(&mut self, array: Expr, index: Expr, line: u32) -> ParseResult<Expr> {
        let usage = array.type_usage;
        if self.registry.is_struct_value(usage) {
            return match self.find_operator("operator[]", usage.value_usage(), &[index.type_usage]) {
                Some(overload) => self.build_operator_call(overload, array, vec![index], line),
                None => Err(self.error_at(
                    CompileErrorKind::InvalidOperator {
                        operator: "[]".to_string(),
                        type_name: self.type_name(usage),
                    },
                    line,
                )),
            };
        }
        if !usage.is_array() && !usage.is_pointer() {
            return Err(self.error_at(
                CompileErrorKind::InvalidOperator {
                    operator: "[]".to_string(),
                    type_name: self.type_name(usage),
                },
                line,
            ));
        }
        if !self.registry.is_integral(index.type_usage) {
            return Err(self.error_at(
                CompileErrorKind::NonIntegerValue {
                    context: "array index".to_string(),
                },
                index.line,
            ));
        }
        let element = usage.element();
        Ok(Expr::new(
            ExprKind::ArrayElement {
                array: Box::new(array),
                index: Box::new(index),
            },
            element,
            line,
        ))
    }
}
