//! Expression nodes.
//!
//! Every expression carries the [`TypeUsage`] the parser resolved for it, so
//! the evaluator never has to infer types: it converts values to the usage
//! recorded on the node that consumes them.

use crate::{
    BinaryOp, CastKind, Compatibility, FunctionId, LiteralId, Name, NamespaceId, TypeId,
    TypeUsage, UnaryOp,
};

/// Constant operand decoded by the parser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    /// Bit pattern of an integral constant; the node's type usage gives its
    /// width and signedness.
    Integer(u64),
    Float(f64),
    /// Pointer to a pooled, null-terminated string.
    String(LiteralId),
}

/// Where a named non-local instance lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceOwner {
    Namespace(NamespaceId),
    /// Static member of a struct (or value of an enum).
    Type(TypeId),
}

/// Reference to a global, static member or enum value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceRef {
    pub owner: InstanceOwner,
    pub name: Name,
}

/// A typed expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub type_usage: TypeUsage,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    NullPointer,
    /// Variable declared in the current function (or a parameter).
    Local(Name),
    Global(InstanceRef),
    /// The `this` pointer of the executing method.
    This,
    /// Field access. `offset` already includes base-type offsets.
    Member {
        object: Box<Expr>,
        name: Name,
        offset: u32,
        through_pointer: bool,
    },
    ArrayElement {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `target = value` or a compound assignment when `op` is set.
    Assignment {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// Conversion to the node's type usage.
    Cast {
        kind: CastKind,
        compatibility: Compatibility,
        operand: Box<Expr>,
    },
    /// Free function or static method call.
    Call {
        function: FunctionId,
        args: Vec<Expr>,
    },
    MethodCall {
        object: Box<Expr>,
        method: FunctionId,
        args: Vec<Expr>,
        through_pointer: bool,
    },
    /// `T(args)`: constructor call, or default/copy/zero construction when
    /// `constructor` is `None`.
    Construction {
        constructor: Option<FunctionId>,
        args: Vec<Expr>,
    },
    /// `{a, b, c}` for an array or aggregate struct of the node's type.
    InitializerList(Vec<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, type_usage: TypeUsage, line: u32) -> Self {
        Expr {
            kind,
            type_usage,
            line,
        }
    }

    /// Whether the expression designates storage that can be assigned or
    /// have its address taken.
    pub fn is_lvalue(&self) -> bool {
        match &self.kind {
            ExprKind::Local(_)
            | ExprKind::Global(_)
            | ExprKind::Member { .. }
            | ExprKind::ArrayElement { .. } => true,
            ExprKind::Unary { op, .. } => matches!(
                op,
                UnaryOp::Dereference | UnaryOp::PreIncrement | UnaryOp::PreDecrement
            ),
            ExprKind::Assignment { .. } => true,
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } => self.type_usage.is_reference(),
            ExprKind::Conditional {
                if_true, if_false, ..
            } => if_true.is_lvalue() && if_false.is_lvalue(),
            _ => false,
        }
    }
}
