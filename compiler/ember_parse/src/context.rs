//! Parsing context: what is in scope at the token being parsed.
//!
//! The registry holds everything with static storage. The context holds the
//! rest: the namespace being declared into, active `using namespace`
//! directives, local variables of the function being parsed, and the scope
//! level that decides when locals, usings and local aliases go away.

use ember_ir::{InstanceOwner, Name, NamespaceId, TypeId, TypeUsage};
use rustc_hash::FxHashMap;

/// A variable declared inside a function body (or a parameter).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalVariable {
    pub name: Name,
    pub type_usage: TypeUsage,
    pub scope_level: u32,
}

/// The function whose body is being parsed.
#[derive(Clone, Debug)]
pub struct FunctionFrame {
    /// Display name for return diagnostics.
    pub name: String,
    pub return_type: TypeUsage,
    /// Struct of a method, constructor or destructor.
    pub owner: Option<TypeId>,
    pub is_const: bool,
    pub is_static: bool,
    /// Index of the first local belonging to this function.
    pub locals_base: usize,
}

pub struct ParsingContext {
    namespaces: Vec<NamespaceId>,
    usings: Vec<(NamespaceId, u32)>,
    locals: Vec<LocalVariable>,
    scope_level: u32,
    pub function: Option<FunctionFrame>,
    /// Structs whose bodies are being parsed, innermost last.
    pub structs: Vec<TypeId>,
    /// Enclosing loops (for `continue`).
    pub loops: u32,
    /// Enclosing loops and switches (for `break`).
    pub breakables: u32,
    /// Values of integral constants known at parse time, for array sizes.
    constants: FxHashMap<(InstanceOwner, Name), i64>,
}

impl ParsingContext {
    pub fn new() -> Self {
        ParsingContext {
            namespaces: vec![NamespaceId::GLOBAL],
            usings: Vec::new(),
            locals: Vec::new(),
            scope_level: 0,
            function: None,
            structs: Vec::new(),
            loops: 0,
            breakables: 0,
            constants: FxHashMap::default(),
        }
    }

    pub fn namespace(&self) -> NamespaceId {
        self.namespaces
            .last()
            .copied()
            .unwrap_or(NamespaceId::GLOBAL)
    }

    pub fn push_namespace(&mut self, namespace: NamespaceId) {
        self.namespaces.push(namespace);
    }

    pub fn pop_namespace(&mut self) {
        if self.namespaces.len() > 1 {
            self.namespaces.pop();
        }
    }

    /// Namespaces brought in by `using namespace`, innermost first.
    pub fn usings(&self) -> impl Iterator<Item = NamespaceId> + '_ {
        self.usings.iter().rev().map(|&(namespace, _)| namespace)
    }

    pub fn add_using(&mut self, namespace: NamespaceId) {
        self.usings.push((namespace, self.scope_level));
    }

    #[inline]
    pub fn scope_level(&self) -> u32 {
        self.scope_level
    }

    pub fn is_local_scope(&self) -> bool {
        self.function.is_some()
    }

    pub fn enter_scope(&mut self) {
        self.scope_level += 1;
    }

    /// Leave the current scope, dropping its locals and usings. Returns the
    /// level that was left.
    pub fn leave_scope(&mut self) -> u32 {
        let level = self.scope_level;
        self.locals.retain(|local| local.scope_level < level);
        self.usings.retain(|&(_, using_level)| using_level < level);
        self.scope_level = level.saturating_sub(1);
        level
    }

    pub fn declare_local(&mut self, name: Name, type_usage: TypeUsage) {
        self.locals.push(LocalVariable {
            name,
            type_usage,
            scope_level: self.scope_level,
        });
    }

    /// Innermost local named `name` in the current function.
    pub fn local(&self, name: Name) -> Option<&LocalVariable> {
        let base = self.function.as_ref().map_or(0, |f| f.locals_base);
        self.locals[base.min(self.locals.len())..]
            .iter()
            .rev()
            .find(|local| local.name == name)
    }

    /// Whether `name` is already declared at the current level.
    pub fn is_declared_here(&self, name: Name) -> bool {
        self.local(name)
            .is_some_and(|local| local.scope_level == self.scope_level)
    }

    pub fn locals_len(&self) -> usize {
        self.locals.len()
    }

    pub fn truncate_locals(&mut self, len: usize) {
        self.locals.truncate(len);
    }

    pub fn define_constant(&mut self, owner: InstanceOwner, name: Name, value: i64) {
        self.constants.insert((owner, name), value);
    }

    pub fn constant(&self, owner: InstanceOwner, name: Name) -> Option<i64> {
        self.constants.get(&(owner, name)).copied()
    }

    /// Struct scopes visible from here, innermost first: structs being
    /// declared, then the owner of the method being parsed.
    pub fn struct_scopes(&self) -> Vec<TypeId> {
        let mut scopes: Vec<TypeId> = self.structs.iter().rev().copied().collect();
        if let Some(owner) = self.function.as_ref().and_then(|f| f.owner) {
            if !scopes.contains(&owner) {
                scopes.push(owner);
            }
        }
        scopes
    }
}

impl Default for ParsingContext {
    fn default() -> Self {
        Self::new()
    }
}
