//! The registry: arenas, registration and name lookup.

use ember_ir::{
    FunctionId, InstanceOwner, LiteralId, Name, NamespaceId, StaticSlot, StringInterner, TypeId,
    TypeUsage,
};
use ember_value::{Address, Memory};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::builtins;
use crate::{
    BaseType, Function, FunctionFlags, Holders, Instance, InstanceFlags, Member, Namespace, Type,
    TypeKind,
};

/// Reflection database of one environment.
pub struct Registry {
    interner: StringInterner,
    types: Vec<Type>,
    functions: Vec<Function>,
    namespaces: Vec<Namespace>,
    /// Distinct types that are interchangeable for overload resolution
    /// (`int32_t` and `int`).
    perfect_matches: Vec<(TypeId, TypeId)>,
    literals: Vec<Address>,
    literal_index: FxHashMap<Vec<u8>, LiteralId>,
    statics: Vec<Address>,
}

/// Split `a::b::c` into its qualifier (`["a", "b"]`) and last component.
/// A leading `::` yields an empty first component.
pub(crate) fn split_qualified(name: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = name.split("::").map(str::trim).collect();
    let last = parts.pop().unwrap_or_default();
    (parts, last)
}

impl Registry {
    /// A registry holding the global namespace and the built-in types.
    pub fn new() -> Self {
        let mut registry = Registry {
            interner: StringInterner::new(),
            types: Vec::with_capacity(64),
            functions: Vec::with_capacity(64),
            namespaces: vec![Namespace::new(Name::EMPTY, Name::EMPTY, None)],
            perfect_matches: Vec::new(),
            literals: Vec::new(),
            literal_index: FxHashMap::default(),
            statics: Vec::new(),
        };
        builtins::register_built_ins(&mut registry);
        registry
    }

    // Names

    pub fn intern(&mut self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Interned name for `text`, without interning it.
    pub fn find_name(&self, text: &str) -> Option<Name> {
        self.interner.get(text)
    }

    pub fn name(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    // Arenas

    pub fn type_info(&self, type_id: TypeId) -> &Type {
        &self.types[type_id.index()]
    }

    pub fn type_info_mut(&mut self, type_id: TypeId) -> &mut Type {
        &mut self.types[type_id.index()]
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn function(&self, function: FunctionId) -> &Function {
        &self.functions[function.index()]
    }

    pub fn function_mut(&mut self, function: FunctionId) -> &mut Function {
        &mut self.functions[function.index()]
    }

    pub fn namespace(&self, namespace: NamespaceId) -> &Namespace {
        &self.namespaces[namespace.index()]
    }

    /// Holder triple of a namespace or type.
    pub fn holders(&self, owner: InstanceOwner) -> &Holders {
        match owner {
            InstanceOwner::Namespace(namespace) => &self.namespaces[namespace.index()].holders,
            InstanceOwner::Type(type_id) => &self.types[type_id.index()].holders,
        }
    }

    pub fn holders_mut(&mut self, owner: InstanceOwner) -> &mut Holders {
        match owner {
            InstanceOwner::Namespace(namespace) => {
                &mut self.namespaces[namespace.index()].holders
            }
            InstanceOwner::Type(type_id) => &mut self.types[type_id.index()].holders,
        }
    }

    /// Namespace a scope belongs to.
    pub fn owner_namespace(&self, owner: InstanceOwner) -> NamespaceId {
        match owner {
            InstanceOwner::Namespace(namespace) => namespace,
            InstanceOwner::Type(type_id) => self.type_info(type_id).namespace,
        }
    }

    // Namespaces

    /// Find or create the (possibly qualified) namespace `name` inside
    /// `parent`.
    pub fn request_namespace(&mut self, parent: NamespaceId, name: &str) -> NamespaceId {
        let mut current = parent;
        for component in name.split("::").map(str::trim).filter(|c| !c.is_empty()) {
            let component = self.intern(component);
            if let Some(&child) = self.namespaces[current.index()].children.get(&component) {
                current = child;
                continue;
            }
            let parent_full = self.name(self.namespaces[current.index()].full_name);
            let full = if parent_full.is_empty() {
                self.name(component).to_string()
            } else {
                format!("{parent_full}::{}", self.name(component))
            };
            let full_name = self.intern(&full);
            let id = NamespaceId::new(self.namespaces.len() as u32);
            self.namespaces
                .push(Namespace::new(component, full_name, Some(current)));
            self.namespaces[current.index()]
                .children
                .insert(component, id);
            debug!(namespace = %full, "namespace created");
            current = id;
        }
        current
    }

    /// Resolve a (possibly qualified) namespace name as seen from `from`.
    pub fn get_namespace(&self, from: NamespaceId, name: &str) -> Option<NamespaceId> {
        let (mut qualifier, last) = split_qualified(name);
        qualifier.push(last);
        match self.resolve_scope(from, &qualifier)? {
            InstanceOwner::Namespace(namespace) => Some(namespace),
            InstanceOwner::Type(_) => None,
        }
    }

    /// Namespaces from `from` up to the global one.
    pub fn namespace_chain(&self, from: NamespaceId) -> impl Iterator<Item = NamespaceId> + '_ {
        std::iter::successors(Some(from), |&id| self.namespaces[id.index()].parent)
    }

    /// Resolve the scope named by `qualifier` as seen from `from`. The first
    /// component is searched from `from` outward; an empty first component
    /// (a leading `::`) starts at the global namespace.
    pub fn resolve_scope(&self, from: NamespaceId, qualifier: &[&str]) -> Option<InstanceOwner> {
        let (first, rest) = qualifier.split_first()?;
        let mut scope = if first.is_empty() {
            InstanceOwner::Namespace(NamespaceId::GLOBAL)
        } else {
            let name = self.find_name(first)?;
            self.namespace_chain(from)
                .find_map(|namespace| self.child_scope(InstanceOwner::Namespace(namespace), name))?
        };
        for component in rest {
            let name = self.find_name(component)?;
            scope = self.child_scope(scope, name)?;
        }
        Some(scope)
    }

    fn child_scope(&self, scope: InstanceOwner, name: Name) -> Option<InstanceOwner> {
        if let InstanceOwner::Namespace(namespace) = scope {
            if let Some(&child) = self.namespaces[namespace.index()].children.get(&name) {
                return Some(InstanceOwner::Namespace(child));
            }
        }
        self.holders(scope)
            .types
            .get(name)
            .first()
            .map(|&type_id| InstanceOwner::Type(type_id))
    }

    // Types

    /// Register a type in a namespace or nested in a type.
    ///
    /// # Panics
    ///
    /// When a type with the same name and template arguments is already
    /// registered in `owner`.
    pub fn register_type(
        &mut self,
        owner: InstanceOwner,
        name: &str,
        template_types: Vec<TypeUsage>,
        kind: TypeKind,
        size: u32,
        alignment: u32,
    ) -> TypeId {
        let name_id = self.intern(name);
        let duplicate = self
            .holders(owner)
            .types
            .get(name_id)
            .iter()
            .any(|&existing| self.types[existing.index()].template_types == template_types);
        assert!(!duplicate, "type '{name}' is already registered");

        let (namespace, parent) = match owner {
            InstanceOwner::Namespace(namespace) => (namespace, None),
            InstanceOwner::Type(parent) => (self.type_info(parent).namespace, Some(parent)),
        };
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(Type {
            name: name_id,
            namespace,
            parent,
            template_types,
            size,
            alignment: alignment.max(1),
            kind,
            holders: Holders::default(),
        });
        self.holders_mut(owner).types.insert(name_id, id);
        debug!(name, ?id, size, "type registered");
        id
    }

    /// Look up a (possibly qualified) type name as seen from `from`.
    pub fn get_type(&self, from: NamespaceId, name: &str) -> Option<TypeId> {
        self.get_type_instantiation(from, name, &[])
    }

    /// Look up the instantiation of a type with the given template
    /// arguments.
    pub fn get_type_instantiation(
        &self,
        from: NamespaceId,
        name: &str,
        template_types: &[TypeUsage],
    ) -> Option<TypeId> {
        let (qualifier, last) = split_qualified(name);
        let last = self.find_name(last)?;
        if qualifier.is_empty() {
            self.namespace_chain(from).find_map(|namespace| {
                self.type_in(InstanceOwner::Namespace(namespace), last, template_types)
            })
        } else {
            let scope = self.resolve_scope(from, &qualifier)?;
            self.type_in(scope, last, template_types)
        }
    }

    /// Type registered directly in `owner`.
    pub fn type_in(
        &self,
        owner: InstanceOwner,
        name: Name,
        template_types: &[TypeUsage],
    ) -> Option<TypeId> {
        self.holders(owner)
            .types
            .get(name)
            .iter()
            .copied()
            .find(|&id| self.types[id.index()].template_types == template_types)
    }

    /// Whether any type named `name` (with any template arguments) is
    /// visible from `from`.
    pub fn is_template_name(&self, from: NamespaceId, name: &str) -> bool {
        let (qualifier, last) = split_qualified(name);
        let Some(last) = self.find_name(last) else {
            return false;
        };
        let has_template = |owner: InstanceOwner| {
            self.holders(owner)
                .types
                .get(last)
                .iter()
                .any(|id| !self.types[id.index()].template_types.is_empty())
        };
        if qualifier.is_empty() {
            self.namespace_chain(from)
                .any(|namespace| has_template(InstanceOwner::Namespace(namespace)))
        } else {
            self.resolve_scope(from, &qualifier)
                .is_some_and(has_template)
        }
    }

    /// Register an alias in `owner` at `scope_level`.
    pub fn register_type_alias(
        &mut self,
        owner: InstanceOwner,
        name: &str,
        type_usage: TypeUsage,
        scope_level: u32,
    ) {
        let name = self.intern(name);
        self.holders_mut(owner)
            .types
            .register_alias(name, type_usage, scope_level);
    }

    /// Innermost alias visible from `from`.
    pub fn get_type_alias(&self, from: NamespaceId, name: &str) -> Option<TypeUsage> {
        let (qualifier, last) = split_qualified(name);
        let last = self.find_name(last)?;
        if qualifier.is_empty() {
            self.namespace_chain(from).find_map(|namespace| {
                self.holders(InstanceOwner::Namespace(namespace))
                    .types
                    .alias(last)
            })
        } else {
            let scope = self.resolve_scope(from, &qualifier)?;
            self.holders(scope).types.alias(last)
        }
    }

    /// Declare that `a` and `b` are the same type for overload resolution.
    pub fn register_perfect_match(&mut self, a: TypeId, b: TypeId) {
        self.perfect_matches.push((a, b));
    }

    pub fn is_perfect_match(&self, a: TypeId, b: TypeId) -> bool {
        a == b
            || self
                .perfect_matches
                .iter()
                .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    // Structs

    /// Append a base type at an explicit offset.
    pub fn add_base_type(&mut self, type_id: TypeId, base: TypeId, offset: u32) {
        if let Some(data) = self.type_info_mut(type_id).as_struct_mut() {
            data.bases.push(BaseType {
                type_id: base,
                offset,
            });
        }
    }

    /// Add a data member at an explicit offset.
    pub fn add_member(&mut self, type_id: TypeId, member: Member) {
        if let Some(data) = self.type_info_mut(type_id).as_struct_mut() {
            data.members.push(member);
        }
    }

    /// Byte offset of the `base` subobject within `derived`, searching
    /// bases recursively.
    pub fn base_offset(&self, derived: TypeId, base: TypeId) -> Option<u32> {
        if derived == base {
            return Some(0);
        }
        let data = self.type_info(derived).as_struct()?;
        data.bases.iter().find_map(|candidate| {
            self.base_offset(candidate.type_id, base)
                .map(|offset| candidate.offset + offset)
        })
    }

    /// Member named `name`, searching bases; the returned offset is relative
    /// to the start of `type_id`.
    pub fn find_member(&self, type_id: TypeId, name: Name) -> Option<Member> {
        let data = self.type_info(type_id).as_struct()?;
        if let Some(member) = data.members.iter().find(|m| m.name == name) {
            return Some(member.clone());
        }
        data.bases.iter().find_map(|base| {
            self.find_member(base.type_id, name).map(|mut member| {
                member.offset += base.offset;
                member
            })
        })
    }

    /// Struct declaring methods named `name` as seen from `type_id` (itself
    /// or the first base that has any), with those methods.
    pub fn find_methods(&self, type_id: TypeId, name: Name) -> Option<(TypeId, Vec<FunctionId>)> {
        let data = self.type_info(type_id).as_struct()?;
        let own: Vec<FunctionId> = data
            .methods
            .iter()
            .copied()
            .filter(|&id| {
                let function = self.function(id);
                function.name == name && !function.is_constructor() && !function.is_destructor()
            })
            .collect();
        if !own.is_empty() {
            return Some((type_id, own));
        }
        data.bases
            .iter()
            .find_map(|base| self.find_methods(base.type_id, name))
    }

    /// Static methods named `name` declared in `type_id` or its bases.
    pub fn find_static_methods(&self, type_id: TypeId, name: Name) -> Vec<FunctionId> {
        let own = self.type_info(type_id).holders.functions.get(name);
        if !own.is_empty() {
            return own.to_vec();
        }
        self.type_info(type_id)
            .as_struct()
            .map(|data| {
                data.bases
                    .iter()
                    .map(|base| self.find_static_methods(base.type_id, name))
                    .find(|found| !found.is_empty())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    pub fn constructors(&self, type_id: TypeId) -> Vec<FunctionId> {
        self.type_info(type_id)
            .as_struct()
            .map(|data| {
                data.methods
                    .iter()
                    .copied()
                    .filter(|&id| self.function(id).is_constructor())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn default_constructor(&self, type_id: TypeId) -> Option<FunctionId> {
        self.type_info(type_id).as_struct()?.default_constructor
    }

    pub fn copy_constructor(&self, type_id: TypeId) -> Option<FunctionId> {
        self.type_info(type_id).as_struct()?.copy_constructor
    }

    pub fn destructor(&self, type_id: TypeId) -> Option<FunctionId> {
        self.type_info(type_id).as_struct()?.destructor
    }

    // Functions

    /// Register a free function in a namespace, or a static method when
    /// `owner` is a type.
    pub fn register_function(&mut self, owner: InstanceOwner, mut function: Function) -> FunctionId {
        function.namespace = self.owner_namespace(owner);
        if let InstanceOwner::Type(type_id) = owner {
            function.owner = Some(type_id);
            function.flags |= FunctionFlags::STATIC;
        }
        let name = function.name;
        let id = self.push_function(function);
        self.holders_mut(owner).functions.insert(name, id);
        debug!(name = self.name(name), ?id, "function registered");
        id
    }

    /// Register a method, constructor or destructor of a struct.
    pub fn register_method(&mut self, type_id: TypeId, mut function: Function) -> FunctionId {
        function.namespace = self.type_info(type_id).namespace;
        function.owner = Some(type_id);
        function.flags |= FunctionFlags::METHOD;
        let is_constructor = function.is_constructor();
        let is_destructor = function.is_destructor();
        let default_ctor = is_constructor && function.parameters.is_empty();
        let copy_ctor = is_constructor
            && function.parameters.len() == 1
            && function.parameters[0].type_id == type_id
            && function.parameters[0].is_reference()
            && !function.parameters[0].is_pointer();
        let name = function.name;
        let id = self.push_function(function);

        if let Some(data) = self.type_info_mut(type_id).as_struct_mut() {
            data.methods.push(id);
            if default_ctor && data.default_constructor.is_none() {
                data.default_constructor = Some(id);
            }
            if copy_ctor && data.copy_constructor.is_none() {
                data.copy_constructor = Some(id);
            }
            if is_destructor {
                data.destructor = Some(id);
            }
        }
        debug!(name = self.name(name), ?id, ?type_id, "method registered");
        id
    }

    fn push_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    /// Overloads named `name` visible from `from`: the qualified scope's
    /// functions, or those of the innermost enclosing namespace declaring
    /// any.
    pub fn get_functions(&self, from: NamespaceId, name: &str) -> Vec<FunctionId> {
        let (qualifier, last) = split_qualified(name);
        let Some(last) = self.find_name(last) else {
            return Vec::new();
        };
        if qualifier.is_empty() {
            self.namespace_chain(from)
                .map(|namespace| {
                    self.holders(InstanceOwner::Namespace(namespace))
                        .functions
                        .get(last)
                })
                .find(|found| !found.is_empty())
                .map(<[FunctionId]>::to_vec)
                .unwrap_or_default()
        } else {
            match self.resolve_scope(from, &qualifier) {
                Some(InstanceOwner::Type(type_id)) => self.find_static_methods(type_id, last),
                Some(scope) => self.holders(scope).functions.get(last).to_vec(),
                None => Vec::new(),
            }
        }
    }

    // Instances

    /// Register a global, static member or enum value backed by `address`.
    pub fn register_instance(&mut self, owner: InstanceOwner, instance: Instance) {
        debug!(name = self.name(instance.name), ?owner, "instance registered");
        self.holders_mut(owner).instances.insert(instance);
    }

    /// Look up a (possibly qualified) instance as seen from `from`.
    pub fn get_instance(&self, from: NamespaceId, name: &str) -> Option<(InstanceOwner, &Instance)> {
        let (qualifier, last) = split_qualified(name);
        let last = self.find_name(last)?;
        if qualifier.is_empty() {
            self.namespace_chain(from).find_map(|namespace| {
                let owner = InstanceOwner::Namespace(namespace);
                self.holders(owner).instances.get(last).map(|i| (owner, i))
            })
        } else {
            let scope = self.resolve_scope(from, &qualifier)?;
            self.instance_in(scope, last).map(|i| (scope, i))
        }
    }

    /// Instance declared directly in `owner`, or for a type, in its bases.
    pub fn instance_in(&self, owner: InstanceOwner, name: Name) -> Option<&Instance> {
        if let Some(instance) = self.holders(owner).instances.get(name) {
            return Some(instance);
        }
        let InstanceOwner::Type(type_id) = owner else {
            return None;
        };
        self.type_info(type_id).as_struct()?.bases.iter().find_map(|base| {
            self.instance_in(InstanceOwner::Type(base.type_id), name)
        })
    }

    /// Add a value to an enum. Values of a plain enum are also visible in
    /// the scope enclosing the enum.
    pub fn add_enum_value(&mut self, type_id: TypeId, name: &str, value: i64, address: Address) {
        let name = self.intern(name);
        let ty = self.type_info(type_id);
        let plain = matches!(ty.kind, TypeKind::Enum(_));
        let enclosing = match ty.parent {
            Some(parent) => InstanceOwner::Type(parent),
            None => InstanceOwner::Namespace(ty.namespace),
        };
        let size = ty.size;
        if let TypeKind::Enum(data) | TypeKind::EnumClass(data) = &mut self.type_info_mut(type_id).kind {
            data.values.push((name, value));
        }
        let instance = Instance {
            name,
            type_usage: TypeUsage::of(type_id),
            address,
            len: size,
            scope_level: 0,
            flags: InstanceFlags::ENUM_VALUE | InstanceFlags::CONSTANT,
        };
        self.holders_mut(InstanceOwner::Type(type_id))
            .instances
            .insert(instance.clone());
        if plain {
            self.holders_mut(enclosing).instances.insert(instance);
        }
    }

    /// Value of an enum constant.
    pub fn enum_value(&self, type_id: TypeId, name: Name) -> Option<i64> {
        self.type_info(type_id).as_enum()?.value(name)
    }

    // Literals and statics

    /// Store a string literal's bytes (terminator included), reusing the
    /// storage of an identical literal.
    pub fn register_literal(&mut self, memory: &mut Memory, bytes: Vec<u8>) -> LiteralId {
        if let Some(&id) = self.literal_index.get(&bytes) {
            return id;
        }
        let address = memory.allocate(bytes.len());
        if let Ok(slot) = memory.slice_mut(address, bytes.len()) {
            slot.copy_from_slice(&bytes);
        }
        let id = LiteralId::new(self.literals.len() as u32);
        self.literals.push(address);
        self.literal_index.insert(bytes, id);
        id
    }

    pub fn literal_address(&self, literal: LiteralId) -> Address {
        self.literals
            .get(literal.index())
            .copied()
            .unwrap_or(Address::NULL)
    }

    /// Reserve the storage slot of a function-local `static`.
    pub fn register_static(&mut self, address: Address) -> StaticSlot {
        let slot = StaticSlot::new(self.statics.len() as u32);
        self.statics.push(address);
        slot
    }

    pub fn static_address(&self, slot: StaticSlot) -> Address {
        self.statics
            .get(slot.index())
            .copied()
            .unwrap_or(Address::NULL)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
