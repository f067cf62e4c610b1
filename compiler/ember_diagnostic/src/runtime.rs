//! Runtime errors raised by the evaluator.

use std::fmt;

/// Faults raised while executing a program or expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("null pointer access")]
    NullPointerAccess,
    #[error("invalid array index (index {index}, size {size})")]
    InvalidArrayIndex { index: i64, size: u32 },
    #[error("division by zero")]
    DivisionByZero,
    #[error("missing function implementation ('{function}')")]
    MissingFunctionImplementation { function: String },
    #[error("invalid memory access")]
    InvalidMemoryAccess,
    #[error("execution stack overflow")]
    StackOverflow,
    #[error("maximum call depth exceeded ({depth})")]
    CallDepthExceeded { depth: usize },
    #[error("{message}")]
    Custom { message: String },
}

impl RuntimeErrorKind {
    pub fn custom(message: impl Into<String>) -> Self {
        RuntimeErrorKind::Custom {
            message: message.into(),
        }
    }
}

/// One frame of the script call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallStackEntry {
    pub program: String,
    pub function: String,
    pub line: u32,
}

impl fmt::Display for CallStackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ('{}', line {})", self.function, self.program, self.line)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: u32,
    /// Script frames active when the error was raised, outermost first.
    pub call_stack: Vec<CallStackEntry>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, line: u32) -> Self {
        RuntimeError {
            kind,
            line,
            call_stack: Vec::new(),
        }
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    /// An error not yet attributed to a line. The evaluator fills in the
    /// line and call stack of the statement it escapes from.
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind, 0)
    }
}

impl RuntimeError {
    /// Whether a line has been attributed.
    pub fn is_located(&self) -> bool {
        self.line != 0
    }
}
