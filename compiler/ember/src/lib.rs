//! Ember: an embeddable interpreter for a C++-like scripting language.
//!
//! The host builds an [`Environment`], registers the native types,
//! functions and globals scripts may use, then loads script source. Each
//! load is preprocessed, parsed against the environment's registry and
//! executed at once; the declarations it makes stay visible to later loads.
//!
//! ```ignore
//! fn square(call: &mut NativeCall<'_>) -> Result<(), RuntimeErrorKind> {
//!     let v = call.arg::<i32>(0)?;
//!     call.set_result(v * v)
//! }
//!
//! let mut env = Environment::new();
//! let f = env.native_function("square", TypeUsage::INT, vec![TypeUsage::INT], square);
//! env.register_function(env.global(), f);
//! if !env.load("main", "int answer = square(6) + 6;") {
//!     eprintln!("{}", env.error_message());
//! }
//! assert_eq!(env.get_instance_value::<i32>("answer"), Some(42));
//! ```
//!
//! # Errors
//!
//! The `bool`-returning entry points ([`Environment::load`],
//! [`Environment::evaluate_expression`]) record a formatted message
//! retrievable through [`Environment::error_message`]. The `try_` variants
//! return the structured [`Diagnostic`] instead.
//!
//! # Tracing
//!
//! Call [`init_tracing`] once and set `RUST_LOG=ember=debug` (or `trace`)
//! to see registration, parsing and execution events.

mod builder;
mod environment;
mod registration;

use std::sync::Once;

pub use builder::{EnvironmentBuilder, DEFAULT_STACK_CAPACITY};
pub use environment::Environment;

pub use ember_diagnostic::{
    CallStackEntry, CompileError, CompileErrorKind, Diagnostic, Error, PreprocessorError,
    PreprocessorErrorKind, RuntimeError, RuntimeErrorKind,
};
pub use ember_eval::{HookContext, DEFAULT_MAX_CALL_DEPTH};
pub use ember_ir::{
    FunctionId, InstanceOwner, NamespaceId, Settings, TypeId, TypeUsage, TypeUsageFlags,
};
pub use ember_lexer::Macro;
pub use ember_types::{Function, FunctionFlags, Member, Registry, Visibility};
pub use ember_value::{Address, Memory, NativeCall, NativeFn, Scalar, Value};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
