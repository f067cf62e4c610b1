//! Type registry for the Ember interpreter.
//!
//! The [`Registry`] is the single reflection database of an environment:
//!
//! - every [`Type`], [`Function`] and [`Namespace`] lives in an arena and is
//!   referenced by handle ([`TypeId`](ember_ir::TypeId),
//!   [`FunctionId`](ember_ir::FunctionId),
//!   [`NamespaceId`](ember_ir::NamespaceId))
//! - names are interned in the registry's own
//!   [`StringInterner`](ember_ir::StringInterner)
//! - each namespace and each type owns a [`Holders`] triple of nested types,
//!   functions and instances (globals, static members, enum values)
//!
//! The host populates it through the registration API, the parser adds the
//! declarations it finds and resolves names and overloads against it, and
//! the evaluator reads it.
//!
//! Overload resolution ranks each argument with a
//! [`Compatibility`](ember_ir::Compatibility) and picks the candidate whose
//! worst rank is best; ties go to the first registered candidate.

mod builtins;
mod compatibility;
mod holders;
mod layout;
mod model;
mod namespace;
mod naming;
mod registry;

pub use builtins::built_in_from_words;
pub use holders::{FunctionsHolder, Holders, InstancesHolder, TypeAlias, TypesHolder};
pub use layout::ENUM_SIZE;
pub use model::{
    BaseType, Callable, EnumData, Function, FunctionFlags, Instance, InstanceFlags, Member,
    StructData, Type, TypeKind, Visibility,
};
pub use namespace::Namespace;
pub use registry::Registry;

/// Size in bytes of pointers and references.
pub const POINTER_SIZE: u32 = 8;
