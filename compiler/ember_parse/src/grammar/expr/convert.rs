//! Conversions: implicit coercion, explicit casts, construction and
//! initializer lists, plus constant folding for array sizes and enum values.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{
    BinaryOp, CastKind, Compatibility, Expr, ExprKind, Literal, Settings, TypeId, TypeUsage,
    TypeUsageFlags, UnaryOp,
};

use crate::{ParseResult, Parser};

/// An initializer before its target type is applied: `{...}` lists nest.
#[derive(Clone, Debug)]
pub(crate) enum Initializer {
    Expr(Expr),
    List(Vec<Initializer>, u32),
}

impl Initializer {
    pub(crate) fn line(&self) -> u32 {
        match self {
            Initializer::Expr(expr) => expr.line,
            Initializer::List(_, line) => *line,
        }
    }
}

impl Parser<'_> {
    /// Convert `expr` for use where `to` is expected (an argument, an
    /// initializer, a returned value), making the conversion explicit.
    pub(crate) fn coerce(&mut self, expr: Expr, to: TypeUsage) -> ParseResult<Expr> {
        let pointer_target = to.is_pointer() && !to.is_reference() && !to.is_array();
        if pointer_target && self.is_null_pointer_constant(&expr) {
            return Ok(Expr::new(ExprKind::NullPointer, to, expr.line));
        }
        let from = expr.type_usage;
        let rank = self.registry.compatibility(to, from);
        let line = expr.line;
        match rank {
            Compatibility::Incompatible => Err(self.error_at(
                CompileErrorKind::IncompatibleTypes {
                    from: self.type_name(from),
                    to: self.type_name(to),
                },
                line,
            )),
            Compatibility::PerfectMatch if from.same_value_type(&to) => Ok(expr),
            Compatibility::ImplicitConstructable => {
                let constructor = self
                    .registry
                    .implicit_constructor(to.type_id, from)
                    .ok_or_else(|| {
                        self.error_at(
                            CompileErrorKind::MissingConstructor {
                                type_name: self.type_name(TypeUsage::of(to.type_id)),
                            },
                            line,
                        )
                    })?;
                let parameter = self.registry.function(constructor).parameters[0];
                let arg = self.coerce(expr, parameter)?;
                Ok(Expr::new(
                    ExprKind::Construction {
                        constructor: Some(constructor),
                        args: vec![arg],
                    },
                    TypeUsage::of(to.type_id),
                    line,
                ))
            }
            rank => Ok(cast(CastKind::Static, rank, expr, to.value_usage(), line)),
        }
    }

    /// An integer literal zero, which converts to any pointer type.
    fn is_null_pointer_constant(&self, expr: &Expr) -> bool {
        matches!(expr.kind, ExprKind::Literal(Literal::Integer(0)))
            && self.registry.is_integral(expr.type_usage)
    }

    pub(crate) fn build_cast(
        &mut self,
        kind: CastKind,
        target: TypeUsage,
        operand: Expr,
        line: u32,
    ) -> ParseResult<Expr> {
        let from = super::decayed(operand.type_usage);
        let target = target.value_usage();
        let invalid = |parser: &Self| {
            parser.error_at(
                CompileErrorKind::InvalidCast {
                    from: parser.type_name(from),
                    to: parser.type_name(target),
                },
                line,
            )
        };

        match kind {
            CastKind::Dynamic => {
                if self.settings.contains(Settings::DISALLOW_DYNAMIC_CAST) {
                    return Err(self.error_at(CompileErrorKind::DynamicCastNotAllowed, line));
                }
                let struct_pointer = |usage: TypeUsage| {
                    usage.pointer_level == 1 && self.registry.type_info(usage.type_id).is_struct()
                };
                if !struct_pointer(target) || !struct_pointer(from) {
                    return Err(invalid(self));
                }
                let rank = if self.registry.is_derived_from(from.type_id, target.type_id) {
                    Compatibility::ImplicitCastableInheritance
                } else {
                    Compatibility::Incompatible
                };
                Ok(cast(CastKind::Dynamic, rank, operand, target, line))
            }
            CastKind::Const => {
                if target.same_value_type(&from) {
                    Ok(cast(CastKind::Const, Compatibility::PerfectMatch, operand, target, line))
                } else {
                    Err(invalid(self))
                }
            }
            CastKind::Reinterpret => {
                if self.is_reinterpretable(from, target) {
                    Ok(cast(CastKind::Reinterpret, Compatibility::Incompatible, operand, target, line))
                } else {
                    Err(invalid(self))
                }
            }
            CastKind::Static | CastKind::CStyle => {
                if self.registry.is_struct_value(target)
                    && !(self.registry.is_struct_value(from)
                        && self.registry.is_derived_from(from.type_id, target.type_id))
                {
                    return self.make_construction(target.type_id, vec![operand], false, line);
                }
                match self.static_cast_rank(from, target) {
                    Some(rank) => Ok(cast(kind, rank, operand, target, line)),
                    None if kind == CastKind::CStyle && self.is_reinterpretable(from, target) => {
                        Ok(cast(CastKind::Reinterpret, Compatibility::Incompatible, operand, target, line))
                    }
                    None => Err(invalid(self)),
                }
            }
        }
    }

    /// Rank of a `static_cast`: every implicit conversion, plus the explicit
    /// numeric, enum and downcast conversions.
    fn static_cast_rank(&self, from: TypeUsage, to: TypeUsage) -> Option<Compatibility> {
        if to.is_void() {
            return Some(Compatibility::PerfectMatch);
        }
        let rank = self.registry.compatibility(to, from);
        if rank.is_compatible() && rank != Compatibility::ImplicitConstructable {
            return Some(rank);
        }
        let scalar = |usage: TypeUsage| {
            (!usage.is_pointer() && !usage.is_array())
                .then(|| self.registry.scalar_kind(usage))
                .flatten()
        };
        if let (Some(from_kind), Some(to_kind)) = (scalar(from), scalar(to)) {
            return Some(match (from_kind.is_float(), to_kind.is_float()) {
                (false, false) => Compatibility::ImplicitCastableInteger,
                (true, true) => Compatibility::ImplicitCastableFloat,
                _ => Compatibility::ImplicitCastableIntegerFloat,
            });
        }
        if from.pointer_level == 1 && to.pointer_level == 1 {
            if from.type_id == TypeId::VOID {
                return Some(Compatibility::ImplicitCastableInheritance);
            }
            if self.registry.type_info(to.type_id).is_struct()
                && self.registry.is_derived_from(to.type_id, from.type_id)
            {
                return Some(Compatibility::ImplicitCastableInheritance);
            }
        }
        None
    }

    fn is_reinterpretable(&self, from: TypeUsage, to: TypeUsage) -> bool {
        let from_ok = from.is_pointer() || self.registry.is_integral(from);
        let to_ok = to.is_pointer() || self.registry.is_integral(to);
        from_ok && to_ok && (from.is_pointer() || to.is_pointer())
    }

    /// `T(args)` or `T{args}` for a struct type: a constructor call, a copy,
    /// a default construction or an aggregate initialization.
    pub(crate) fn make_construction(
        &mut self,
        type_id: TypeId,
        args: Vec<Expr>,
        braced: bool,
        line: u32,
    ) -> ParseResult<Expr> {
        let usage = TypeUsage::of(type_id);
        let constructors = self.registry.constructors(type_id);
        let construction = |constructor, args| {
            Expr::new(ExprKind::Construction { constructor, args }, usage, line)
        };

        if args.is_empty() {
            let default = self.registry.default_constructor(type_id);
            if !constructors.is_empty() && default.is_none() {
                return Err(self.error_at(
                    CompileErrorKind::NoDefaultConstructor {
                        type_name: self.type_name(usage),
                    },
                    line,
                ));
            }
            return Ok(construction(default, Vec::new()));
        }

        let arg_types: Vec<TypeUsage> = args.iter().map(|arg| arg.type_usage).collect();
        if let Some(constructor) = self.registry.select_overload(&constructors, &arg_types, &[]) {
            let args = self.coerce_arguments(constructor, args)?;
            return Ok(construction(Some(constructor), args));
        }

        let is_copy = args.len() == 1
            && self.registry.is_struct_value(arg_types[0])
            && self.registry.is_derived_from(arg_types[0].type_id, type_id);
        if is_copy {
            self.check_copyable(type_id, line)?;
            let mut args = args;
            let source = self.coerce(args.remove(0), usage)?;
            return Ok(construction(None, vec![source]));
        }
        if braced && constructors.is_empty() {
            let items = args.into_iter().map(Initializer::Expr).collect();
            return self.aggregate(type_id, items, line);
        }
        Err(self.error_at(
            CompileErrorKind::MissingConstructor {
                type_name: self.type_name(usage),
            },
            line,
        ))
    }

    /// Host types constructed natively cannot be copied byte-wise without a
    /// copy constructor.
    pub(crate) fn check_copyable(&self, type_id: TypeId, line: u32) -> ParseResult<()> {
        let native_constructed = self.registry.constructors(type_id).iter().any(|&ctor| {
            matches!(
                self.registry.function(ctor).callable,
                ember_types::Callable::Native(_)
            )
        });
        if native_constructed && self.registry.copy_constructor(type_id).is_none() {
            return Err(self.error_at(
                CompileErrorKind::NoCopyConstructor {
                    type_name: self.type_name(TypeUsage::of(type_id)),
                },
                line,
            ));
        }
        Ok(())
    }

    /// Member-wise `{a, b, c}` initialization of a struct without
    /// constructors.
    fn aggregate(&mut self, type_id: TypeId, items: Vec<Initializer>, line: u32) -> ParseResult<Expr> {
        let members: Vec<TypeUsage> = self
            .registry
            .type_info(type_id)
            .as_struct()
            .map(|data| data.members.iter().map(|m| m.type_usage).collect())
            .unwrap_or_default();
        if items.len() > members.len() {
            return Err(self.error_at(
                CompileErrorKind::TooManyInitializers {
                    expected: members.len(),
                    found: items.len(),
                },
                line,
            ));
        }
        let mut values = Vec::with_capacity(items.len());
        for (member, item) in members.into_iter().zip(items) {
            values.push(self.typed_initializer(member, item)?);
        }
        Ok(Expr::new(
            ExprKind::InitializerList(values),
            TypeUsage::of(type_id),
            line,
        ))
    }

    /// `expr` or a braced, possibly nested, list.
    pub(crate) fn parse_initializer(&mut self) -> ParseResult<Initializer> {
        if !self.cursor.check("{") {
            return Ok(Initializer::Expr(self.parse_expression()?));
        }
        let line = self.cursor.line();
        self.cursor.advance();
        let mut items = Vec::new();
        while !self.cursor.check("}") {
            items.push(self.parse_initializer()?);
            if !self.cursor.eat(",") {
                break;
            }
        }
        self.cursor.expect("}")?;
        Ok(Initializer::List(items, line))
    }

    /// Element count an initializer gives an array declared with `[]`.
    pub(crate) fn inferred_array_size(&self, initializer: &Initializer) -> Option<u32> {
        match initializer {
            Initializer::List(items, _) => Some(items.len() as u32),
            Initializer::Expr(expr) => self
                .string_literal_bytes(expr)
                .map(|bytes| bytes.len() as u32 + 1),
        }
    }

    /// Apply an initializer to a target type.
    pub(crate) fn typed_initializer(
        &mut self,
        target: TypeUsage,
        initializer: Initializer,
    ) -> ParseResult<Expr> {
        let line = initializer.line();
        let too_many = |expected: u32, found: usize| CompileErrorKind::TooManyInitializers {
            expected: expected as usize,
            found,
        };

        if target.is_array() {
            let element = target.element();
            let items = match initializer {
                Initializer::List(items, _) => items,
                Initializer::Expr(expr) if element.type_id == TypeId::CHAR && !element.is_pointer() => {
                    match self.string_literal_bytes(&expr) {
                        Some(bytes) => bytes
                            .into_iter()
                            .chain(std::iter::once(0))
                            .map(|byte| {
                                Initializer::Expr(Expr::new(
                                    ExprKind::Literal(Literal::Integer(i64::from(byte as i8) as u64)),
                                    TypeUsage::of(TypeId::CHAR),
                                    line,
                                ))
                            })
                            .collect(),
                        None => return self.coerce(expr, target),
                    }
                }
                Initializer::Expr(expr) => return self.coerce(expr, target),
            };
            if items.len() > target.array_size as usize {
                return Err(self.error_at(too_many(target.array_size, items.len()), line));
            }
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = self.typed_initializer(element, item).map_err(|error| {
                    if matches!(error.kind, CompileErrorKind::IncompatibleTypes { .. }) {
                        self.error_at(CompileErrorKind::NonHomogeneousInitializerList, error.line)
                    } else {
                        error
                    }
                })?;
                values.push(value);
            }
            return Ok(Expr::new(
                ExprKind::InitializerList(values),
                target.value_usage(),
                line,
            ));
        }

        match initializer {
            Initializer::Expr(expr) => self.coerce(expr, target),
            Initializer::List(items, line) if self.registry.is_struct_value(target) => {
                if self.registry.constructors(target.type_id).is_empty() {
                    return self.aggregate(target.type_id, items, line);
                }
                let mut args = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Initializer::Expr(expr) => args.push(expr),
                        Initializer::List(_, line) => {
                            return Err(self.error_at(CompileErrorKind::NonHomogeneousInitializerList, line))
                        }
                    }
                }
                self.make_construction(target.type_id, args, true, line)
            }
            Initializer::List(mut items, line) => match items.len() {
                0 => Ok(self.zero_literal(target.value_usage(), line)),
                1 => {
                    let item = items.remove(0);
                    self.typed_initializer(target, item)
                }
                found => Err(self.error_at(too_many(1, found), line)),
            },
        }
    }

    /// Value of an integral constant expression, when it is one.
    pub(crate) fn const_eval(&self, expr: &Expr) -> Option<i64> {
        match &expr.kind {
            ExprKind::Literal(Literal::Integer(bits)) => {
                let kind = self.registry.scalar_kind(expr.type_usage)?;
                Some(ember_value::Number::Unsigned(*bits).convert(kind).as_i64())
            }
            ExprKind::Literal(Literal::Bool(value)) => Some(i64::from(*value)),
            ExprKind::Global(instance) => self.context.constant(instance.owner, instance.name),
            ExprKind::Cast { operand, .. } if self.registry.is_integral(expr.type_usage) => {
                self.const_eval(operand)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.const_eval(operand)?;
                match op {
                    UnaryOp::Plus => Some(value),
                    UnaryOp::Negate => Some(value.wrapping_neg()),
                    UnaryOp::BitNot => Some(!value),
                    UnaryOp::Not => Some(i64::from(value == 0)),
                    _ => None,
                }
            }
            ExprKind::Binary { op, left, right } => {
                let (l, r) = (self.const_eval(left)?, self.const_eval(right)?);
                Some(match op {
                    BinaryOp::Add => l.wrapping_add(r),
                    BinaryOp::Sub => l.wrapping_sub(r),
                    BinaryOp::Mul => l.wrapping_mul(r),
                    BinaryOp::Div => l.checked_div(r)?,
                    BinaryOp::Mod => l.checked_rem(r)?,
                    BinaryOp::Shl => l.wrapping_shl(u32::try_from(r).ok()?),
                    BinaryOp::Shr => l.wrapping_shr(u32::try_from(r).ok()?),
                    BinaryOp::BitAnd => l & r,
                    BinaryOp::BitOr => l | r,
                    BinaryOp::BitXor => l ^ r,
                    BinaryOp::Eq => i64::from(l == r),
                    BinaryOp::NotEq => i64::from(l != r),
                    BinaryOp::Lt => i64::from(l < r),
                    BinaryOp::LtEq => i64::from(l <= r),
                    BinaryOp::Gt => i64::from(l > r),
                    BinaryOp::GtEq => i64::from(l >= r),
                    BinaryOp::And => i64::from(l != 0 && r != 0),
                    BinaryOp::Or => i64::from(l != 0 || r != 0),
                })
            }
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                if self.const_eval(condition)? != 0 {
                    self.const_eval(if_true)
                } else {
                    self.const_eval(if_false)
                }
            }
            _ => None,
        }
    }
}

fn cast(kind: CastKind, compatibility: Compatibility, operand: Expr, to: TypeUsage, line: u32) -> Expr {
    Expr::new(
        ExprKind::Cast {
            kind,
            compatibility,
            operand: Box::new(operand),
        },
        to.without_flags(TypeUsageFlags::REFERENCE | TypeUsageFlags::RVALUE),
        line,
    )
}
