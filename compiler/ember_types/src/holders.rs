//! Per-scope tables of types, functions and instances.
//!
//! Every namespace and every type owns one [`Holders`] triple. Lookups here
//! are local to the holder; walking up to parent namespaces is the
//! registry's job.

use ember_ir::{FunctionId, Name, TypeId, TypeUsage};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::Instance;

/// A `typedef` or `using` alias and the scope level it was declared at.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TypeAlias {
    pub name: Name,
    pub type_usage: TypeUsage,
    pub scope_level: u32,
}

#[derive(Debug, Default)]
pub struct TypesHolder {
    /// All instantiations registered under a name (one per template
    /// argument list).
    types: FxHashMap<Name, SmallVec<[TypeId; 1]>>,
    aliases: Vec<TypeAlias>,
}

impl TypesHolder {
    pub fn insert(&mut self, name: Name, type_id: TypeId) {
        self.types.entry(name).or_default().push(type_id);
    }

    pub fn get(&self, name: Name) -> &[TypeId] {
        self.types.get(&name).map_or(&[], |ids| ids.as_slice())
    }

    pub fn register_alias(&mut self, name: Name, type_usage: TypeUsage, scope_level: u32) {
        self.aliases.push(TypeAlias {
            name,
            type_usage,
            scope_level,
        });
    }

    /// Innermost alias named `name`.
    pub fn alias(&self, name: Name) -> Option<TypeUsage> {
        self.aliases
            .iter()
            .rev()
            .find(|alias| alias.name == name)
            .map(|alias| alias.type_usage)
    }

    /// Drop aliases declared at `scope_level` or deeper.
    pub fn release_aliases(&mut self, scope_level: u32) {
        self.aliases.retain(|alias| alias.scope_level < scope_level);
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

#[derive(Debug, Default)]
pub struct FunctionsHolder {
    functions: FxHashMap<Name, Vec<FunctionId>>,
}

impl FunctionsHolder {
    pub fn insert(&mut self, name: Name, function: FunctionId) {
        self.functions.entry(name).or_default().push(function);
    }

    /// Overloads named `name`, in registration order.
    pub fn get(&self, name: Name) -> &[FunctionId] {
        self.functions.get(&name).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Default)]
pub struct InstancesHolder {
    instances: Vec<Instance>,
}

impl InstancesHolder {
    pub fn insert(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    /// Most recently registered instance named `name`.
    pub fn get(&self, name: Name) -> Option<&Instance> {
        self.instances.iter().rev().find(|i| i.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// The holder triple of one namespace or type.
#[derive(Debug, Default)]
pub struct Holders {
    pub types: TypesHolder,
    pub functions: FunctionsHolder,
    pub instances: InstancesHolder,
}

#[cfg(test)]
mod tests;
