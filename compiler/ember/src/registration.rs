//! Native registration: the host side of the registry.
//!
//! Host types give their size and alignment and place members and bases at
//! explicit offsets, matching however the host lays the data out. Globals
//! and static members live in environment memory at addresses the host
//! allocates.

use ember_diagnostic::Diagnostic;
use ember_ir::{FunctionId, InstanceOwner, NamespaceId, TypeId, TypeUsage};
use ember_parse::parse_type;
use ember_types::{
    Callable, Function, FunctionFlags, Instance, InstanceFlags, Member, TypeKind, Visibility,
    ENUM_SIZE,
};
use ember_value::{Address, NativeFn, Scalar};

use crate::Environment;

impl Environment {
    // Scopes

    /// The global namespace.
    pub fn global(&self) -> InstanceOwner {
        InstanceOwner::Namespace(NamespaceId::GLOBAL)
    }

    /// Find or create a namespace by qualified name (`a::b`).
    pub fn namespace(&mut self, path: &str) -> InstanceOwner {
        InstanceOwner::Namespace(self.registry_mut().request_namespace(NamespaceId::GLOBAL, path))
    }

    /// Parse a type spelling such as `const char*` or `geo::Point&`.
    pub fn type_usage(&mut self, spelling: &str) -> Result<TypeUsage, Diagnostic> {
        let settings = self.settings();
        let (registry, memory) = self.parts_mut();
        parse_type(registry, memory, settings, spelling).map_err(|e| Diagnostic::new("type", e))
    }

    // Types

    /// An opaque type scripts can only handle through pointers and native
    /// functions.
    pub fn register_type(&mut self, owner: InstanceOwner, name: &str, size: u32, alignment: u32) -> TypeId {
        self.registry_mut()
            .register_type(owner, name, Vec::new(), TypeKind::BuiltIn, size, alignment)
    }

    pub fn register_struct(&mut self, owner: InstanceOwner, name: &str, size: u32, alignment: u32) -> TypeId {
        self.registry_mut().register_struct(owner, name, size, alignment)
    }

    pub fn register_class(&mut self, owner: InstanceOwner, name: &str, size: u32, alignment: u32) -> TypeId {
        self.registry_mut().register_class(owner, name, size, alignment)
    }

    /// A plain enum whose values are also visible in `owner`.
    pub fn register_enum(&mut self, owner: InstanceOwner, name: &str, values: &[(&str, i64)]) -> TypeId {
        let type_id = self.registry_mut().register_enum(owner, name);
        self.add_enum_values(type_id, values);
        type_id
    }

    /// An `enum class`: values are only reachable qualified.
    pub fn register_enum_class(&mut self, owner: InstanceOwner, name: &str, values: &[(&str, i64)]) -> TypeId {
        let type_id = self.registry_mut().register_enum_class(owner, name);
        self.add_enum_values(type_id, values);
        type_id
    }

    fn add_enum_values(&mut self, type_id: TypeId, values: &[(&str, i64)]) {
        let (registry, memory) = self.parts_mut();
        for &(name, value) in values {
            let address = memory.allocate(ENUM_SIZE as usize);
            if let Ok(slot) = memory.slice_mut(address, ENUM_SIZE as usize) {
                slot.copy_from_slice(&(value as i32).to_le_bytes());
            }
            registry.add_enum_value(type_id, name, value, address);
        }
    }

    pub fn register_type_alias(&mut self, owner: InstanceOwner, name: &str, usage: TypeUsage) {
        self.registry_mut().register_type_alias(owner, name, usage, 0);
    }

    // Struct layout

    pub fn add_member(&mut self, type_id: TypeId, name: &str, usage: TypeUsage, offset: u32) {
        let registry = self.registry_mut();
        let name = registry.intern(name);
        registry.add_member(
            type_id,
            Member {
                name,
                type_usage: usage,
                offset,
                visibility: Visibility::Public,
            },
        );
    }

    pub fn add_base_type(&mut self, type_id: TypeId, base: TypeId, offset: u32) {
        self.registry_mut().add_base_type(type_id, base, offset);
    }

    // Functions

    /// A function entry backed by `native`, ready to register. Add flags
    /// with [`Function::with_flags`].
    pub fn native_function(
        &mut self,
        name: &str,
        return_type: TypeUsage,
        parameters: Vec<TypeUsage>,
        native: NativeFn,
    ) -> Function {
        let name = self.registry_mut().intern(name);
        Function::new(name, return_type, parameters).with_callable(Callable::Native(native))
    }

    pub fn register_function(&mut self, owner: InstanceOwner, function: Function) -> FunctionId {
        self.registry_mut().register_function(owner, function)
    }

    /// A method; `this` is the object it is called on.
    pub fn register_method(&mut self, type_id: TypeId, function: Function) -> FunctionId {
        self.registry_mut().register_method(type_id, function)
    }

    pub fn register_static_method(&mut self, type_id: TypeId, function: Function) -> FunctionId {
        self.registry_mut()
            .register_function(InstanceOwner::Type(type_id), function)
    }

    /// A constructor initializing the object at `this`.
    pub fn register_constructor(&mut self, type_id: TypeId, parameters: Vec<TypeUsage>, native: NativeFn) -> FunctionId {
        let name = self.registry().name(self.registry().type_info(type_id).name).to_string();
        let function = self
            .native_function(&name, TypeUsage::VOID, parameters, native)
            .with_flags(FunctionFlags::CONSTRUCTOR);
        self.register_method(type_id, function)
    }

    pub fn register_destructor(&mut self, type_id: TypeId, native: NativeFn) -> FunctionId {
        let name = format!("~{}", self.registry().name(self.registry().type_info(type_id).name));
        let function = self
            .native_function(&name, TypeUsage::VOID, Vec::new(), native)
            .with_flags(FunctionFlags::DESTRUCTOR);
        self.register_method(type_id, function)
    }

    // Instances

    /// A global backed by host-owned storage at `address`.
    pub fn register_instance(&mut self, owner: InstanceOwner, name: &str, usage: TypeUsage, address: Address) {
        let registry = self.registry_mut();
        let instance = Instance {
            name: registry.intern(name),
            type_usage: usage,
            address,
            len: registry.size_of(usage),
            scope_level: 0,
            flags: if usage.is_const() {
                InstanceFlags::CONSTANT
            } else {
                InstanceFlags::empty()
            },
        };
        registry.register_instance(owner, instance);
    }

    pub fn register_static_member(&mut self, type_id: TypeId, name: &str, usage: TypeUsage, address: Address) {
        self.register_instance(InstanceOwner::Type(type_id), name, usage, address);
    }

    /// Allocate storage for a scalar global, store `value` and register it.
    pub fn register_global<T: Scalar>(
        &mut self,
        owner: InstanceOwner,
        name: &str,
        usage: TypeUsage,
        value: T,
    ) -> Address {
        let size = (self.registry().size_of(usage) as usize).max(T::SIZE);
        let address = self.allocate(size);
        if let Ok(slot) = self.memory_mut().slice_mut(address, size) {
            value.write_bytes(slot);
        }
        self.register_instance(owner, name, usage, address);
        address
    }

    /// Zeroed storage that lives as long as the environment.
    pub fn allocate(&mut self, size: usize) -> Address {
        self.memory_mut().allocate(size)
    }
}
