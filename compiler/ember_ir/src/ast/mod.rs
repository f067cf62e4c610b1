//! Abstract syntax tree produced by the parser.

mod expr;
mod operators;
mod stmt;

pub use expr::{Expr, ExprKind, InstanceOwner, InstanceRef, Literal};
pub use operators::{BinaryOp, CastKind, UnaryOp};
pub use stmt::{
    MemberInitializer, ScriptFunction, Stmt, StmtKind, SwitchCase, VariableDeclaration,
    VariableStorage,
};
