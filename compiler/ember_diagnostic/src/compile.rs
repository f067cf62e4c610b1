//! Compile errors raised by the tokenizer and parser.

/// Lexical, semantic and type errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileErrorKind {
    // Lexical
    #[error("unexpected symbol ('{symbol}')")]
    UnexpectedSymbol { symbol: String },
    #[error("'{expected}' expected")]
    Expected { expected: String },
    #[error("invalid literal ('{literal}')")]
    InvalidLiteral { literal: String },
    #[error("invalid escape sequence ('{sequence}')")]
    InvalidEscapeSequence { sequence: String },
    #[error("unterminated literal")]
    UnterminatedLiteral,

    // Lookup
    #[error("undefined type ('{name}')")]
    UndefinedType { name: String },
    #[error("undefined variable ('{name}')")]
    UndefinedVariable { name: String },
    #[error("undefined function ('{name}')")]
    UndefinedFunction { name: String },
    #[error("undefined namespace ('{name}')")]
    UndefinedNamespace { name: String },
    #[error("no matching overload for '{name}' with arguments ({arguments})")]
    NoMatchingOverload { name: String, arguments: String },

    // Redefinition
    #[error("variable redefinition ('{name}')")]
    VariableRedefinition { name: String },
    #[error("function redefinition ('{name}')")]
    FunctionRedefinition { name: String },
    #[error("conflicting declaration ('{name}'): return types differ")]
    ConflictingDeclaration { name: String },
    #[error("type redefinition ('{name}')")]
    TypeRedefinition { name: String },

    // Declarations and initialization
    #[error("invalid type usage ('{name}')")]
    InvalidTypeUsage { name: String },
    #[error("uninitialized reference ('{name}')")]
    UninitializedReference { name: String },
    #[error("array initialization expected ('{name}')")]
    ArrayInitializationExpected { name: String },
    #[error("non-homogeneous initializer list")]
    NonHomogeneousInitializerList,
    #[error("too many initializers: {expected} expected, {found} provided")]
    TooManyInitializers { expected: usize, found: usize },
    #[error("no default constructor defined ('{type_name}')")]
    NoDefaultConstructor { type_name: String },
    #[error("no copy constructor defined ('{type_name}')")]
    NoCopyConstructor { type_name: String },

    // Members and methods
    #[error("no member named '{member}' in '{type_name}'")]
    MissingMember { member: String, type_name: String },
    #[error("no static member named '{member}' in '{type_name}'")]
    MissingStaticMember { member: String, type_name: String },
    #[error("no matching constructor for '{type_name}'")]
    MissingConstructor { type_name: String },
    #[error("no method named '{method}' in '{type_name}'")]
    MissingMethod { method: String, type_name: String },
    #[error("no static method named '{method}' in '{type_name}'")]
    MissingStaticMethod { method: String, type_name: String },
    #[error("non-const method called on const object ('{method}')")]
    NonConstMethod { method: String },
    #[error("'{member}' is a private member of '{type_name}'")]
    InaccessibleMember { member: String, type_name: String },
    #[error("invalid member access operator ('{member}' is a pointer; use '->')")]
    InvalidMemberAccessOperatorPtr { member: String },
    #[error("invalid member access operator ('{member}' is not a pointer; use '.')")]
    InvalidMemberAccessOperatorNonPtr { member: String },

    // Expressions
    #[error("invalid operator ('{operator}' on '{type_name}')")]
    InvalidOperator { operator: String, type_name: String },
    #[error("invalid conditional expression")]
    InvalidConditionalExpression,
    #[error("invalid cast from '{from}' to '{to}'")]
    InvalidCast { from: String, to: String },
    #[error("incompatible types: cannot convert '{from}' to '{to}'")]
    IncompatibleTypes { from: String, to: String },
    #[error("invalid assignment: the left-hand side is not assignable")]
    InvalidAssignment,
    #[error("cannot modify a const expression")]
    CannotModifyConstExpression,
    #[error("integer value expected ({context})")]
    NonIntegerValue { context: String },
    #[error("'this' used outside of a method")]
    InvalidThis,

    // Functions and statements
    #[error("missing return statement ('{function}')")]
    MissingReturnStatement { function: String },
    #[error("missing return expression ('{function}')")]
    MissingReturnExpression { function: String },
    #[error("void function returning a value ('{function}')")]
    VoidFunctionReturningValue { function: String },
    #[error("misplaced statement ('{statement}')")]
    MisplacedStatement { statement: String },

    // Settings
    #[error("static pointers are not allowed ('{name}')")]
    StaticPointersNotAllowed { name: String },
    #[error("dynamic_cast is not allowed")]
    DynamicCastNotAllowed,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub line: u32,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, line: u32) -> Self {
        CompileError { kind, line }
    }
}
