//! Index handles into the registry arenas.
//!
//! Types, functions and namespaces live in flat vectors owned by the
//! registry; everything else refers to them through these `u32` handles.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Handle to a registered type.
    TypeId
);
define_id!(
    /// Handle to a registered function, method, constructor or destructor.
    FunctionId
);
define_id!(
    /// Handle to a namespace. The global namespace is [`NamespaceId::GLOBAL`].
    NamespaceId
);
define_id!(
    /// Handle to a decoded string literal in the literal pool.
    LiteralId
);
define_id!(
    /// Storage slot of a function-local `static` variable.
    StaticSlot
);

impl NamespaceId {
    pub const GLOBAL: NamespaceId = NamespaceId(0);
}

/// Built-in types are registered first and in this order, so their ids are
/// fixed for every registry.
impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const CHAR: TypeId = TypeId(2);
    pub const WCHAR: TypeId = TypeId(3);
    pub const SHORT: TypeId = TypeId(4);
    pub const INT: TypeId = TypeId(5);
    pub const LONG: TypeId = TypeId(6);
    pub const FLOAT: TypeId = TypeId(7);
    pub const DOUBLE: TypeId = TypeId(8);
    pub const INT8: TypeId = TypeId(9);
    pub const INT16: TypeId = TypeId(10);
    pub const INT32: TypeId = TypeId(11);
    pub const INT64: TypeId = TypeId(12);
    pub const UINT8: TypeId = TypeId(13);
    pub const UINT16: TypeId = TypeId(14);
    pub const UINT32: TypeId = TypeId(15);
    pub const UINT64: TypeId = TypeId(16);
    pub const SIZE: TypeId = TypeId(17);

    /// Number of built-in types registered ahead of everything else.
    pub const BUILT_IN_COUNT: u32 = 18;

    #[inline]
    pub const fn is_built_in(self) -> bool {
        self.0 < Self::BUILT_IN_COUNT
    }
}
