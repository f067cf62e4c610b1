//! Registry entries: types, functions and instances.

use std::fmt;

use bitflags::bitflags;
use ember_ir::{FunctionId, Name, NamespaceId, ScriptFunction, TypeId, TypeUsage};
use ember_value::{Address, NativeFn, Value};

use crate::Holders;

/// A registered type.
#[derive(Debug)]
pub struct Type {
    /// Unqualified name.
    pub name: Name,
    pub namespace: NamespaceId,
    /// Enclosing struct of a nested type.
    pub parent: Option<TypeId>,
    /// Template arguments of a registered instantiation (`Vec<int>`).
    pub template_types: Vec<TypeUsage>,
    pub size: u32,
    pub alignment: u32,
    pub kind: TypeKind,
    /// Nested types, static methods, static members and enum values.
    pub holders: Holders,
}

impl Type {
    pub fn as_struct(&self) -> Option<&StructData> {
        match &self.kind {
            TypeKind::Struct(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructData> {
        match &mut self.kind {
            TypeKind::Struct(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumData> {
        match &self.kind {
            TypeKind::Enum(data) | TypeKind::EnumClass(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_) | TypeKind::EnumClass(_))
    }
}

/// The closed set of type categories.
#[derive(Debug)]
pub enum TypeKind {
    BuiltIn,
    Enum(EnumData),
    EnumClass(EnumData),
    /// Structs and classes; a class only differs in default visibility.
    Struct(StructData),
}

#[derive(Debug, Default)]
pub struct EnumData {
    pub values: Vec<(Name, i64)>,
}

impl EnumData {
    pub fn value(&self, name: Name) -> Option<i64> {
        self.values
            .iter()
            .find(|(value_name, _)| *value_name == name)
            .map(|(_, value)| *value)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A base type and the offset of its subobject.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct BaseType {
    pub type_id: TypeId,
    pub offset: u32,
}

/// A data member.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub name: Name,
    pub type_usage: TypeUsage,
    pub offset: u32,
    pub visibility: Visibility,
}

#[derive(Debug, Default)]
pub struct StructData {
    pub is_class: bool,
    pub bases: Vec<BaseType>,
    pub members: Vec<Member>,
    /// Methods, constructors, destructor and operators, in registration
    /// order.
    pub methods: Vec<FunctionId>,
    pub default_constructor: Option<FunctionId>,
    pub copy_constructor: Option<FunctionId>,
    pub destructor: Option<FunctionId>,
}

impl StructData {
    pub fn default_visibility(&self) -> Visibility {
        if self.is_class {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct FunctionFlags: u16 {
        const STATIC = 1 << 0;
        const VARIADIC = 1 << 1;
        const CONST = 1 << 2;
        const METHOD = 1 << 3;
        const CONSTRUCTOR = 1 << 4;
        const DESTRUCTOR = 1 << 5;
        const EXPLICIT = 1 << 6;
    }
}

/// How a function is executed.
#[derive(Clone)]
pub enum Callable {
    /// Declared but not (yet) defined.
    Unbound,
    Native(NativeFn),
    Script(ScriptFunction),
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Unbound => f.write_str("Unbound"),
            Callable::Native(_) => f.write_str("Native"),
            Callable::Script(script) => f.debug_tuple("Script").field(&script.program).finish(),
        }
    }
}

/// A free function, static method, method, constructor or destructor.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: Name,
    pub namespace: NamespaceId,
    /// Struct owning a method, constructor, destructor or static method.
    pub owner: Option<TypeId>,
    pub return_type: TypeUsage,
    pub parameters: Vec<TypeUsage>,
    pub template_types: Vec<TypeUsage>,
    pub flags: FunctionFlags,
    pub visibility: Visibility,
    /// Line of the declaration; `0` for native functions.
    pub line: u32,
    pub callable: Callable,
}

impl Function {
    pub fn new(name: Name, return_type: TypeUsage, parameters: Vec<TypeUsage>) -> Self {
        Function {
            name,
            namespace: NamespaceId::GLOBAL,
            owner: None,
            return_type,
            parameters,
            template_types: Vec::new(),
            flags: FunctionFlags::empty(),
            visibility: Visibility::Public,
            line: 0,
            callable: Callable::Unbound,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FunctionFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_template_types(mut self, template_types: Vec<TypeUsage>) -> Self {
        self.template_types = template_types;
        self
    }

    #[must_use]
    pub fn with_callable(mut self, callable: Callable) -> Self {
        self.callable = callable;
        self
    }

    pub fn is_method(&self) -> bool {
        self.flags.contains(FunctionFlags::METHOD)
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(FunctionFlags::CONST)
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(FunctionFlags::STATIC)
    }

    pub fn is_variadic(&self) -> bool {
        self.flags.contains(FunctionFlags::VARIADIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(FunctionFlags::CONSTRUCTOR)
    }

    pub fn is_destructor(&self) -> bool {
        self.flags.contains(FunctionFlags::DESTRUCTOR)
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self.callable, Callable::Unbound)
    }
}

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct InstanceFlags: u8 {
        const ENUM_VALUE = 1 << 0;
        const CONSTANT = 1 << 1;
    }
}

/// A named object with static storage: a global, a static member or an
/// enum value.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub name: Name,
    pub type_usage: TypeUsage,
    pub address: Address,
    pub len: u32,
    pub scope_level: u32,
    pub flags: InstanceFlags,
}

impl Instance {
    /// Value aliasing the instance's storage.
    pub fn value(&self) -> Value {
        Value::external(self.type_usage, self.address, self.len as usize)
    }
}
