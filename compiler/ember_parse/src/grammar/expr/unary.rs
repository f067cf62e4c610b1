//! Prefix operators, `sizeof` and the cast forms.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{
    CastKind, Expr, ExprKind, Literal, TokenKind, TypeId, TypeUsage, TypeUsageFlags, UnaryOp,
};
use ember_stack::ensure_sufficient_stack;

use super::kind_type;
use crate::{ParseResult, Parser};

impl Parser<'_> {
    pub(crate) fn parse_unary(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.parse_unary_inner())
    }

    fn parse_unary_inner(&mut self) -> ParseResult<Expr> {
        let line = self.cursor.line();
        if self.cursor.check_kind(TokenKind::Operator) {
            if let Some(op) = UnaryOp::from_prefix(self.cursor.text()) {
                self.cursor.advance();
                let operand = self.parse_unary()?;
                return self.build_unary(op, operand, line);
            }
        }
        if self.cursor.check_kind(TokenKind::Keyword) {
            if self.cursor.check("sizeof") {
                return self.parse_sizeof();
            }
            if let Some(kind) = CastKind::from_keyword(self.cursor.text()) {
                return self.parse_named_cast(kind);
            }
        }
        if self.cursor.check("(") {
            if let Some(target) = self.try_parse_cast_type()? {
                let operand = self.parse_unary()?;
                return self.build_cast(CastKind::CStyle, target, operand, line);
            }
        }
        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    /// `(T)` at the cursor, consumed only when the parentheses hold exactly
    /// a type.
    fn try_parse_cast_type(&mut self) -> ParseResult<Option<TypeUsage>> {
        let start = self.cursor.pos();
        self.cursor.advance();
        if let Some(target) = self.try_parse_type_usage()? {
            if self.cursor.eat(")") {
                return Ok(Some(target));
            }
        }
        self.cursor.set_pos(start);
        Ok(None)
    }

    /// `sizeof(T)`, `sizeof(expr)` or `sizeof expr`.
    fn parse_sizeof(&mut self) -> ParseResult<Expr> {
        let line = self.cursor.line();
        self.cursor.advance();
        let measured = match self.try_parse_cast_type()? {
            Some(usage) => usage,
            None => self.parse_unary()?.type_usage,
        };
        let size = self.registry.size_of(measured.value_usage());
        Ok(Expr::new(
            ExprKind::Literal(Literal::Integer(u64::from(size))),
            TypeUsage::SIZE,
            line,
        ))
    }

    /// `static_cast<T>(expr)` and its siblings.
    fn parse_named_cast(&mut self, kind: CastKind) -> ParseResult<Expr> {
        let line = self.cursor.line();
        self.cursor.advance();
        self.cursor.expect("<")?;
        let target = self.parse_type_usage()?;
        self.cursor.split_shift();
        self.cursor.expect(">")?;
        self.cursor.expect("(")?;
        let operand = self.parse_expression()?;
        self.cursor.expect(")")?;
        self.build_cast(kind, target, operand, line)
    }

    pub(crate) fn build_unary(&mut self, op: UnaryOp, operand: Expr, line: u32) -> ParseResult<Expr> {
        let usage = operand.type_usage;
        let symbol = op.as_symbol();
        let invalid = |parser: &Self| {
            parser.error_at(
                CompileErrorKind::InvalidOperator {
                    operator: symbol.to_string(),
                    type_name: parser.type_name(usage),
                },
                line,
            )
        };

        if op != UnaryOp::AddressOf && self.registry.is_struct_value(usage) {
            let name = format!("operator{symbol}");
            return match self.find_operator(&name, usage.value_usage(), &[]) {
                Some(overload) => self.build_operator_call(overload, operand, Vec::new(), line),
                None => Err(invalid(self)),
            };
        }

        let result = match op {
            UnaryOp::Plus | UnaryOp::Negate | UnaryOp::BitNot => {
                let numeric =
                    self.registry.is_arithmetic(usage.value_usage()) || self.is_plain_enum(usage);
                let kind = self
                    .registry
                    .scalar_kind(usage)
                    .filter(|_| numeric)
                    .ok_or_else(|| invalid(self))?;
                if op == UnaryOp::BitNot && kind.is_float() {
                    return Err(invalid(self));
                }
                TypeUsage::of(kind_type(kind.common(kind)))
            }
            UnaryOp::Not => {
                if self.check_condition(&operand).is_err() {
                    return Err(invalid(self));
                }
                TypeUsage::BOOL
            }
            UnaryOp::PreIncrement
            | UnaryOp::PreDecrement
            | UnaryOp::PostIncrement
            | UnaryOp::PostDecrement => {
                if !operand.is_lvalue() || usage.is_array() {
                    return Err(self.error_at(CompileErrorKind::InvalidAssignment, line));
                }
                if !usage.is_writable() {
                    return Err(self.error_at(CompileErrorKind::CannotModifyConstExpression, line));
                }
                let numeric = !usage.is_pointer() && self.registry.is_arithmetic(usage.value_usage());
                let pointer = usage.is_pointer() && !usage.pointee().is_void();
                if !numeric && !pointer {
                    return Err(invalid(self));
                }
                usage.value_usage()
            }
            UnaryOp::Dereference => {
                if !usage.is_pointer() && !usage.is_array() {
                    return Err(invalid(self));
                }
                let element = usage.element();
                if element.is_void() {
                    return Err(invalid(self));
                }
                element
            }
            UnaryOp::AddressOf => {
                if !operand.is_lvalue() {
                    return Err(invalid(self));
                }
                usage.value_usage().pointer_to()
            }
        };
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            result,
            line,
        ))
    }

    fn is_plain_enum(&self, usage: TypeUsage) -> bool {
        !usage.is_pointer()
            && !usage.is_array()
            && matches!(
                self.registry.type_info(usage.type_id).kind,
                ember_types::TypeKind::Enum(_)
            )
    }

    /// Zero of a built-in type: `int()`, `double{}`.
    pub(crate) fn zero_literal(&self, usage: TypeUsage, line: u32) -> Expr {
        let literal = if matches!(usage.type_id, TypeId::FLOAT | TypeId::DOUBLE) && !usage.is_pointer() {
            Literal::Float(0.0)
        } else if usage.type_id == TypeId::BOOL && !usage.is_pointer() {
            Literal::Bool(false)
        } else {
            Literal::Integer(0)
        };
        let usage = usage.without_flags(TypeUsageFlags::REFERENCE);
        if usage.is_pointer() {
            return Expr::new(ExprKind::NullPointer, usage, line);
        }
        Expr::new(ExprKind::Literal(literal), usage, line)
    }
}
