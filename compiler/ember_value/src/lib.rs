//! Runtime values and the memory they live in.
//!
//! Script objects never live in Rust-owned structs. Every variable,
//! temporary with an address, global and static occupies bytes in a
//! [`Memory`], reached through an [`Address`]:
//!
//! - block 0 is null; any access through it is a null pointer access
//! - block 1 is the execution stack, a fixed-capacity LIFO arena that holds
//!   locals and call arguments
//! - blocks 2 and up are heap blocks, one per global, static or host
//!   allocation
//!
//! A pointer value is its address stored as eight little-endian bytes, so
//! pointers, references and `this` all work the same way as in the host
//! language the scripts are written for, without any `unsafe`.
//!
//! A [`Value`] is a typed view of bytes: owned (a heap buffer), a stack slot,
//! or an alias of memory owned by someone else.

mod address;
mod memory;
mod native;
mod scalar;
mod value;

pub use address::Address;
pub use memory::{ExecutionStack, Memory, StackMark, STACK_BLOCK};
pub use native::{NativeCall, NativeFn};
pub use scalar::{Number, Scalar, ScalarKind};
pub use value::{Buffer, Value};
