//! Expressions.
//!
//! Binary operators are parsed by precedence climbing over the pinned
//! operator table: each level parses its right operand one level tighter,
//! except the right-associative assignment and conditional levels which
//! recurse at their own level.
//!
//! Every node is type-checked as it is built. Operators on struct operands
//! resolve to `operator` overloads (methods first, then free functions);
//! built-in arithmetic follows the usual arithmetic conversions.

mod convert;
mod member;
mod primary;
mod unary;

pub(crate) use convert::Initializer;

use ember_diagnostic::CompileErrorKind;
use ember_ir::grammar::{binary_operator, ASSIGNMENT_LEVEL, CONDITIONAL_LEVEL};
use ember_ir::{BinaryOp, Expr, ExprKind, FunctionId, TokenKind, TypeId, TypeUsage, TypeUsageFlags};
use ember_stack::ensure_sufficient_stack;
use ember_value::ScalarKind;

use crate::{ParseResult, Parser};

/// An `operator` overload found for some operands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Overload {
    /// Method of the left operand's struct.
    Method(FunctionId),
    /// Free function taking every operand.
    Function(FunctionId),
}

/// Built-in type holding values of a promoted scalar kind.
pub(crate) fn kind_type(kind: ScalarKind) -> TypeId {
    match kind {
        ScalarKind::Bool => TypeId::BOOL,
        ScalarKind::Signed(1) => TypeId::CHAR,
        ScalarKind::Signed(2) => TypeId::SHORT,
        ScalarKind::Signed(4) => TypeId::INT,
        ScalarKind::Signed(_) => TypeId::LONG,
        ScalarKind::Unsigned(1) => TypeId::UINT8,
        ScalarKind::Unsigned(2) => TypeId::UINT16,
        ScalarKind::Unsigned(4) => TypeId::UINT32,
        ScalarKind::Unsigned(_) => TypeId::UINT64,
        ScalarKind::Float(4) => TypeId::FLOAT,
        ScalarKind::Float(_) => TypeId::DOUBLE,
    }
}

/// Arrays used as values decay to a pointer to their first element.
pub(crate) fn decayed(usage: TypeUsage) -> TypeUsage {
    if usage.is_array() {
        usage.element().pointer_to()
    } else {
        usage.value_usage()
    }
}

impl Parser<'_> {
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.parse_binary(ASSIGNMENT_LEVEL))
    }

    fn parse_binary(&mut self, min_level: u8) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        while self.cursor.check_kind(TokenKind::Operator) {
            let symbol = self.cursor.text();
            let Some(info) = binary_operator(symbol) else {
                break;
            };
            if info.level < min_level {
                break;
            }
            let line = self.cursor.line();
            self.cursor.advance();
            left = match info.level {
                ASSIGNMENT_LEVEL => {
                    let value = self.parse_binary(ASSIGNMENT_LEVEL)?;
                    self.build_assignment(symbol, left, value, line)?
                }
                CONDITIONAL_LEVEL => {
                    let if_true = self.parse_binary(ASSIGNMENT_LEVEL)?;
                    self.cursor.expect(":")?;
                    let if_false = self.parse_binary(ASSIGNMENT_LEVEL)?;
                    self.build_conditional(left, if_true, if_false, line)?
                }
                level => {
                    let right = ensure_sufficient_stack(|| self.parse_binary(level + 1))?;
                    let op = BinaryOp::from_symbol(symbol).ok_or_else(|| {
                        self.error_at(
                            CompileErrorKind::UnexpectedSymbol {
                                symbol: symbol.to_string(),
                            },
                            line,
                        )
                    })?;
                    self.build_binary(op, left, right, line)?
                }
            };
        }
        Ok(left)
    }

    /// A condition of `if`, loops and `?:`: scalar, pointer or array.
    pub(crate) fn check_condition(&self, condition: &Expr) -> ParseResult<()> {
        let usage = condition.type_usage;
        if usage.is_pointer() || usage.is_array() || self.registry.scalar_kind(usage).is_some() {
            Ok(())
        } else {
            Err(self.error_at(CompileErrorKind::InvalidConditionalExpression, condition.line))
        }
    }

    /// `(expr)` after `if`, `while` and `switch`.
    pub(crate) fn parse_parenthesized_condition(&mut self) -> ParseResult<Expr> {
        self.cursor.expect("(")?;
        let condition = self.parse_expression()?;
        self.cursor.expect(")")?;
        self.check_condition(&condition)?;
        Ok(condition)
    }

    fn invalid_operator(&self, symbol: &str, usage: TypeUsage, line: u32) -> ember_diagnostic::CompileError {
        self.error_at(
            CompileErrorKind::InvalidOperator {
                operator: symbol.to_string(),
                type_name: self.type_name(usage),
            },
            line,
        )
    }

    pub(crate) fn build_binary(
        &mut self,
        op: BinaryOp,
        left: Expr,
        right: Expr,
        line: u32,
    ) -> ParseResult<Expr> {
        let symbol = op.as_symbol();
        let (l, r) = (left.type_usage, right.type_usage);

        if self.registry.is_struct_value(l) || self.registry.is_struct_value(r) {
            let name = op.operator_name();
            return match self.find_operator(&name, l, &[r]) {
                Some(overload) => self.build_operator_call(overload, left, vec![right], line),
                None => {
                    let offending = if self.registry.is_struct_value(l) { l } else { r };
                    Err(self.invalid_operator(symbol, offending, line))
                }
            };
        }

        if op.is_logical() {
            for operand in [&left, &right] {
                if self.check_condition(operand).is_err() {
                    return Err(self.invalid_operator(symbol, operand.type_usage, line));
                }
            }
            return Ok(binary(op, left, right, TypeUsage::BOOL, line));
        }

        let (l, r) = (decayed(l), decayed(r));
        if l.is_pointer() || r.is_pointer() {
            return self.build_pointer_binary(op, left, right, line);
        }

        let (Some(lk), Some(rk)) = (self.registry.scalar_kind(l), self.registry.scalar_kind(r)) else {
            let offending = if self.registry.scalar_kind(l).is_none() { l } else { r };
            return Err(self.invalid_operator(symbol, offending, line));
        };
        let enum_class = |usage: TypeUsage| {
            matches!(
                self.registry.type_info(usage.type_id).kind,
                ember_types::TypeKind::EnumClass(_)
            )
        };
        if (enum_class(l) || enum_class(r)) && !(op.is_comparison() && l.type_id == r.type_id) {
            let offending = if enum_class(l) { l } else { r };
            return Err(self.invalid_operator(symbol, offending, line));
        }
        if op.is_integral_only() && (lk.is_float() || rk.is_float()) {
            let offending = if lk.is_float() { l } else { r };
            return Err(self.invalid_operator(symbol, offending, line));
        }

        let result = if op.is_comparison() {
            TypeUsage::BOOL
        } else if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            TypeUsage::of(kind_type(lk.common(lk)))
        } else {
            TypeUsage::of(kind_type(lk.common(rk)))
        };
        Ok(binary(op, left, right, result, line))
    }

    /// Pointer arithmetic and comparison. `ptr + n` and `ptr - n` keep the
    /// pointer type, `ptr - ptr` is a `long` element count.
    fn build_pointer_binary(
        &mut self,
        op: BinaryOp,
        left: Expr,
        right: Expr,
        line: u32,
    ) -> ParseResult<Expr> {
        let (l, r) = (decayed(left.type_usage), decayed(right.type_usage));
        let symbol = op.as_symbol();
        let pointer = if l.is_pointer() { l } else { r };
        let integral = |usage: TypeUsage| self.registry.is_integral(usage);

        let result = match op {
            BinaryOp::Add if l.is_pointer() && integral(r) => l,
            BinaryOp::Add if r.is_pointer() && integral(l) => r,
            BinaryOp::Sub if l.is_pointer() && integral(r) => l,
            BinaryOp::Sub if l.is_pointer() && r.is_pointer() && l.same_value_type(&r) => {
                TypeUsage::of(TypeId::LONG)
            }
            _ if op.is_comparison() => {
                let comparable = (l.is_pointer() && r.is_pointer())
                    || (l.is_pointer() && integral(r))
                    || (r.is_pointer() && integral(l));
                if !comparable {
                    return Err(self.invalid_operator(symbol, pointer, line));
                }
                TypeUsage::BOOL
            }
            _ => return Err(self.invalid_operator(symbol, pointer, line)),
        };
        if result.is_pointer() && result.pointee().is_void() && !op.is_comparison() {
            return Err(self.invalid_operator(symbol, pointer, line));
        }
        Ok(binary(op, left, right, result.without_flags(TypeUsageFlags::CONST_POINTER), line))
    }

    fn build_conditional(
        &mut self,
        condition: Expr,
        if_true: Expr,
        if_false: Expr,
        line: u32,
    ) -> ParseResult<Expr> {
        self.check_condition(&condition)?;
        let (t, f) = (decayed(if_true.type_usage), decayed(if_false.type_usage));

        let result = if t.same_value_type(&f) {
            t.with_flags(f.flags & TypeUsageFlags::CONST)
        } else if let (Some(tk), Some(fk), false, false) = (
            self.registry.scalar_kind(t),
            self.registry.scalar_kind(f),
            t.is_pointer(),
            f.is_pointer(),
        ) {
            TypeUsage::of(kind_type(tk.common(fk)))
        } else if t.is_pointer() && self.registry.compatibility(t, f).is_compatible() {
            t
        } else if f.is_pointer() && self.registry.compatibility(f, t).is_compatible() {
            f
        } else {
            return Err(self.error_at(
                CompileErrorKind::IncompatibleTypes {
                    from: self.type_name(f),
                    to: self.type_name(t),
                },
                line,
            ));
        };

        let if_true = self.coerce(if_true, result)?;
        let if_false = self.coerce(if_false, result)?;
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
            },
            result,
            line,
        ))
    }

    pub(crate) fn build_assignment(
        &mut self,
        symbol: &str,
        target: Expr,
        value: Expr,
        line: u32,
    ) -> ParseResult<Expr> {
        let op = if symbol == "=" {
            None
        } else {
            Some(BinaryOp::from_compound_assignment(symbol).ok_or_else(|| {
                self.error_at(
                    CompileErrorKind::UnexpectedSymbol {
                        symbol: symbol.to_string(),
                    },
                    line,
                )
            })?)
        };
        if !target.is_lvalue() || target.type_usage.is_array() {
            return Err(self.error_at(CompileErrorKind::InvalidAssignment, line));
        }
        if !target.type_usage.is_writable() {
            return Err(self.error_at(CompileErrorKind::CannotModifyConstExpression, line));
        }

        let target_usage = target.type_usage.value_usage();
        if self.registry.is_struct_value(target_usage) {
            let name = format!("operator{symbol}");
            if let Some(overload) = self.find_operator(&name, target_usage, &[value.type_usage]) {
                return self.build_operator_call(overload, target, vec![value], line);
            }
            if op.is_some() {
                return Err(self.invalid_operator(symbol, target_usage, line));
            }
        }

        let value = match op {
            None => self.coerce(value, target_usage)?,
            Some(op) => {
                // type-check `target op value`; the result is converted back
                // to the target's type when evaluated
                self.build_binary(op, target.clone(), value.clone(), line)?;
                value
            }
        };
        Ok(Expr::new(
            ExprKind::Assignment {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            target_usage,
            line,
        ))
    }

    /// Overload of operator `name` for an object of `object` usage and the
    /// remaining operand usages: a method of the object's struct first, then
    /// a free function taking every operand.
    pub(crate) fn find_operator(
        &self,
        name: &str,
        object: TypeUsage,
        args: &[TypeUsage],
    ) -> Option<Overload> {
        if self.registry.is_struct_value(object) {
            if let Some(name) = self.registry.find_name(name) {
                if let Some((_, methods)) = self.registry.find_methods(object.type_id, name) {
                    if let Some(method) = self.registry.select_overload(&methods, args, &[]) {
                        return Some(Overload::Method(method));
                    }
                }
            }
        }
        let mut operands = vec![object];
        operands.extend_from_slice(args);
        let candidates = self.lookup_functions(name);
        self.registry
            .select_overload(&candidates, &operands, &[])
            .map(Overload::Function)
    }

    pub(crate) fn build_operator_call(
        &mut self,
        overload: Overload,
        object: Expr,
        args: Vec<Expr>,
        line: u32,
    ) -> ParseResult<Expr> {
        match overload {
            Overload::Method(method) => self.make_method_call(object, method, args, false, line),
            Overload::Function(function) => {
                let mut operands = Vec::with_capacity(args.len() + 1);
                operands.push(object);
                operands.extend(args);
                self.make_call(function, operands, line)
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr, type_usage: TypeUsage, line: u32) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        type_usage,
        line,
    )
}

#[cfg(test)]
mod tests;
