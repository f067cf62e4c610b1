//! Statement nodes.

use std::rc::Rc;

use crate::{Expr, FunctionId, InstanceOwner, Name, NamespaceId, StaticSlot, TypeId, TypeUsage};

/// Where a declared variable's storage comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableStorage {
    /// Execution-stack slot released when the enclosing block exits.
    Local,
    /// Namespace global or static member, allocated once.
    Global(InstanceOwner),
    /// Function-local `static`, initialized on first execution.
    Static(StaticSlot),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDeclaration {
    pub name: Name,
    pub type_usage: TypeUsage,
    pub initializer: Option<Expr>,
    pub storage: VariableStorage,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub value: Option<Expr>,
    pub statements: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expression(Expr),
    Block(Vec<Stmt>),
    UsingDirective(NamespaceId),
    TypeDefinition(Name),
    NamespaceDeclaration {
        namespace: NamespaceId,
        statements: Vec<Stmt>,
    },
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(FunctionId),
    StructDeclaration {
        type_id: TypeId,
        static_members: Vec<VariableDeclaration>,
    },
    EnumDeclaration(TypeId),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Switch {
        condition: Expr,
        cases: Vec<SwitchCase>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        initialization: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    ForRange {
        variable: VariableDeclaration,
        collection: Expr,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
}

impl Stmt {
    pub fn new(kind: StmtKind, line: u32) -> Self {
        Stmt { kind, line }
    }

    /// Whether a `return` appears anywhere in this statement.
    pub fn contains_return(&self) -> bool {
        match &self.kind {
            StmtKind::Return(_) => true,
            StmtKind::Block(statements) => statements.iter().any(Stmt::contains_return),
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                then_branch.contains_return()
                    || else_branch.as_ref().is_some_and(|s| s.contains_return())
            }
            StmtKind::Switch { cases, .. } => cases
                .iter()
                .any(|case| case.statements.iter().any(Stmt::contains_return)),
            StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::For { body, .. }
            | StmtKind::ForRange { body, .. } => body.contains_return(),
            _ => false,
        }
    }
}

/// Member initialized from a constructor's initializer list.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberInitializer {
    pub offset: u32,
    pub type_usage: TypeUsage,
    pub initializer: Expr,
}

/// Body of a function or method written in script.
///
/// The body is shared with the `FunctionDeclaration` statement of the
/// program that defined it, so the registry entry stays valid for as long as
/// either holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptFunction {
    pub program: Name,
    pub parameters: Vec<Name>,
    pub member_initializers: Vec<MemberInitializer>,
    pub body: Rc<Stmt>,
}
