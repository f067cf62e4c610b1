//! Ember IR - shared vocabulary of the interpreter.
//!
//! - [`Name`] and [`StringInterner`] for identifiers
//! - Arena handles ([`TypeId`], [`FunctionId`], [`NamespaceId`], ...)
//! - [`TypeUsage`]: a type plus its qualifiers at one site
//! - [`Token`] and the pinned grammar tables in [`grammar`]
//! - The AST ([`Stmt`], [`Expr`]) the parser builds and the evaluator walks
//!
//! # Design Philosophy
//!
//! - **Intern everything**: identifiers become `Name(u32)`.
//! - **Handles, not pointers**: registry entries are referenced by index, so
//!   the AST can outlive nothing it does not own.

pub mod ast;
mod compatibility;
pub mod grammar;
mod ids;
mod interner;
mod name;
mod settings;
mod token;
mod type_usage;

pub use ast::{
    BinaryOp, CastKind, Expr, ExprKind, InstanceOwner, InstanceRef, Literal, MemberInitializer,
    ScriptFunction, Stmt, StmtKind, SwitchCase, UnaryOp, VariableDeclaration, VariableStorage,
};
pub use compatibility::Compatibility;
pub use ids::{FunctionId, LiteralId, NamespaceId, StaticSlot, TypeId};
pub use interner::StringInterner;
pub use name::Name;
pub use settings::Settings;
pub use token::{Token, TokenKind};
pub use type_usage::{TypeUsage, TypeUsageFlags};
