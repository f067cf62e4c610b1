//! Built-in arithmetic on decoded numbers.
//!
//! Operands are converted to the operation's scalar kind first. Integer
//! results are computed in 64 bits and truncated to the kind's width when
//! written back, which gives the wrap-around of the narrower type.

use ember_diagnostic::RuntimeErrorKind;
use ember_ir::{BinaryOp, UnaryOp};
use ember_value::{Number, ScalarKind};

/// `l op r` for an arithmetic or bitwise operator.
pub(crate) fn arithmetic(
    op: BinaryOp,
    kind: ScalarKind,
    l: Number,
    r: Number,
) -> Result<Number, RuntimeErrorKind> {
    let (l, r) = (l.convert(kind), r.convert(kind));
    if kind.is_float() {
        let (l, r) = (l.as_f64(), r.as_f64());
        return Ok(Number::Float(match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            _ => return Err(unsupported(op)),
        }));
    }
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && r.as_u64() == 0 {
        return Err(RuntimeErrorKind::DivisionByZero);
    }
    let shift = r.as_u64().min(63) as u32;
    if let ScalarKind::Signed(_) = kind {
        let (l, r) = (l.as_i64(), r.as_i64());
        return Ok(Number::Signed(match op {
            BinaryOp::Add => l.wrapping_add(r),
            BinaryOp::Sub => l.wrapping_sub(r),
            BinaryOp::Mul => l.wrapping_mul(r),
            BinaryOp::Div => l.wrapping_div(r),
            BinaryOp::Mod => l.wrapping_rem(r),
            BinaryOp::Shl => l.wrapping_shl(shift),
            BinaryOp::Shr => l.wrapping_shr(shift),
            BinaryOp::BitAnd => l & r,
            BinaryOp::BitOr => l | r,
            BinaryOp::BitXor => l ^ r,
            _ => return Err(unsupported(op)),
        }));
    }
    let (l, r) = (l.as_u64(), r.as_u64());
    Ok(Number::Unsigned(match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div => l / r,
        BinaryOp::Mod => l % r,
        BinaryOp::Shl => l.wrapping_shl(shift),
        BinaryOp::Shr => l.wrapping_shr(shift),
        BinaryOp::BitAnd => l & r,
        BinaryOp::BitOr => l | r,
        BinaryOp::BitXor => l ^ r,
        _ => return Err(unsupported(op)),
    }))
}

/// `l op r` for a comparison, both operands converted to `kind`.
pub(crate) fn compare(op: BinaryOp, kind: ScalarKind, l: Number, r: Number) -> bool {
    let ordering = match (l.convert(kind), r.convert(kind)) {
        (Number::Float(l), Number::Float(r)) => l.partial_cmp(&r),
        (Number::Signed(l), Number::Signed(r)) => Some(l.cmp(&r)),
        (l, r) => Some(l.as_u64().cmp(&r.as_u64())),
    };
    let Some(ordering) = ordering else {
        // NaN compares unequal to everything
        return op == BinaryOp::NotEq;
    };
    match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::NotEq => ordering.is_ne(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::GtEq => ordering.is_ge(),
        _ => false,
    }
}

/// Prefix `+`, `-` and `~` in the promoted kind of the operand.
pub(crate) fn unary(op: UnaryOp, kind: ScalarKind, operand: Number) -> Result<Number, RuntimeErrorKind> {
    let operand = operand.convert(kind);
    Ok(match (op, operand) {
        (UnaryOp::Plus, n) => n,
        (UnaryOp::Negate, Number::Float(v)) => Number::Float(-v),
        (UnaryOp::Negate, Number::Signed(v)) => Number::Signed(v.wrapping_neg()),
        (UnaryOp::Negate, Number::Unsigned(v)) => Number::Unsigned(v.wrapping_neg()),
        (UnaryOp::BitNot, Number::Signed(v)) => Number::Signed(!v),
        (UnaryOp::BitNot, Number::Unsigned(v)) => Number::Unsigned(!v),
        _ => {
            return Err(RuntimeErrorKind::custom(format!(
                "invalid operand for '{}'",
                op.as_symbol()
            )))
        }
    })
}

fn unsupported(op: BinaryOp) -> RuntimeErrorKind {
    RuntimeErrorKind::custom(format!("unsupported operator '{}'", op.as_symbol()))
}

#[cfg(test)]
mod tests;
