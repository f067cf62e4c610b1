//! Preprocessor errors.

/// What went wrong while expanding directives and macros.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PreprocessorErrorKind {
    #[error("invalid preprocessor directive ('{directive}')")]
    InvalidDirective { directive: String },
    #[error("invalid macro definition ('{definition}')")]
    InvalidMacroDefinition { definition: String },
    #[error("macro '{name}' expects {expected} argument(s), {found} provided")]
    MacroArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("unterminated invocation of macro '{name}'")]
    UnterminatedMacroInvocation { name: String },
    #[error("unterminated conditional block")]
    UnterminatedConditional,
    #[error("'{directive}' without matching '#if'")]
    UnmatchedConditional { directive: String },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct PreprocessorError {
    pub kind: PreprocessorErrorKind,
    pub line: u32,
}

impl PreprocessorError {
    pub fn new(kind: PreprocessorErrorKind, line: u32) -> Self {
        PreprocessorError { kind, line }
    }
}
