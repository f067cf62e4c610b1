//! Tree-walking evaluator for Ember programs.
//!
//! Executes the typed AST built by `ember_parse` directly against the
//! environment's [`Memory`](ember_value::Memory) and
//! [`Registry`](ember_types::Registry). Every name, overload and conversion
//! was resolved by the parser, so evaluation is a walk over statements and
//! expressions with no lookups by text.
//!
//! # Architecture
//!
//! - [`Interpreter`]: borrows the registry, memory and [`Runtime`] for one
//!   execution and walks statements and expressions
//! - [`ExecutionContext`]: frames, locals, scope levels and pending
//!   temporaries of that execution
//! - [`CallStack`]: script frames for diagnostics and the execution hook
//! - [`Runtime`]: state that outlives a single execution: initialized
//!   function-local statics, the execution hook and call limits
//!
//! # Object lifetime
//!
//! Locals live on the execution stack and are released when their block
//! exits, on every path including `return`, `break` and runtime errors.
//! Struct values are destroyed in reverse declaration order: destructor
//! body, then members, then bases. Struct temporaries live until the end of
//! the full expression that created them. A struct local named by `return`
//! is moved into the caller's result slot and not destroyed.

mod call_stack;
mod context;
mod interpreter;
mod runtime;

pub use call_stack::{CallFrame, CallStack};
pub use context::{ExecutionContext, Flow, LocalSlot};
pub use interpreter::{Interpreter, ScopedInterpreter};
pub use runtime::{ExecutionHook, HookContext, Runtime, DEFAULT_MAX_CALL_DEPTH};

use ember_diagnostic::RuntimeError;

/// Result of evaluating a statement or expression.
pub type EvalResult<T> = Result<T, RuntimeError>;
