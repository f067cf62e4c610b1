//! Error taxonomies for the Ember interpreter.
//!
//! Three closed, non-overlapping sets of error kinds, one per phase:
//!
//! - [`PreprocessorErrorKind`]: malformed directives and macro misuse
//! - [`CompileErrorKind`]: lexical, semantic and type errors found while
//!   parsing; the program is never executed
//! - [`RuntimeErrorKind`]: faults raised while evaluating
//!
//! Each kind renders a templated message. A phase error pairs a kind with
//! the source line, and [`Diagnostic`] renders the single string an embedder
//! retrieves after a failed `load` or `evaluate_expression`.

mod compile;
mod preprocessor;
mod runtime;

pub use compile::{CompileError, CompileErrorKind};
pub use preprocessor::{PreprocessorError, PreprocessorErrorKind};
pub use runtime::{CallStackEntry, RuntimeError, RuntimeErrorKind};

use std::fmt;

/// Any error surfaced by a load or evaluate call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Preprocessor(#[from] PreprocessorError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// Source line of the failure.
    pub fn line(&self) -> u32 {
        match self {
            Error::Preprocessor(error) => error.line,
            Error::Compile(error) => error.line,
            Error::Runtime(error) => error.line,
        }
    }

    pub const fn category(&self) -> &'static str {
        match self {
            Error::Preprocessor(_) => "Preprocessor Error",
            Error::Compile(_) => "Compile Error",
            Error::Runtime(_) => "Runtime Error",
        }
    }
}

/// An error attributed to the program it happened in.
///
/// Renders as `[Compile Error] 'program' -- Line 3: undefined variable ('y')`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub program: String,
    pub error: Error,
}

impl Diagnostic {
    pub fn new(program: impl Into<String>, error: impl Into<Error>) -> Self {
        Diagnostic {
            program: program.into(),
            error: error.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] '{}' -- Line {}: {}",
            self.error.category(),
            self.program,
            self.error.line(),
            self.error
        )?;
        if let Error::Runtime(runtime) = &self.error {
            for entry in runtime.call_stack.iter().rev() {
                write!(f, "\n  at {entry}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
