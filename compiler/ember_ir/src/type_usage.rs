//! How a type is used at one site.
//!
//! A [`TypeUsage`] pairs a [`TypeId`] with the qualifiers written next to it:
//! constness, pointer depth, reference-ness and a fixed array size. The type
//! itself says nothing about these; `const int* const&` and `int` share the
//! same `TypeId`.

use crate::TypeId;
use bitflags::bitflags;

bitflags! {
    /// Qualifiers of a [`TypeUsage`].
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeUsageFlags: u8 {
        /// `const T` (or `const T*`: the pointee is const).
        const CONST = 1 << 0;
        /// `T* const`: the pointer itself is const.
        const CONST_POINTER = 1 << 1;
        /// `T&`.
        const REFERENCE = 1 << 2;
        /// `T[N]`.
        const ARRAY = 1 << 3;
        /// A temporary produced by an expression.
        const RVALUE = 1 << 4;
    }
}

/// A type plus the qualifiers of one particular use of it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeUsage {
    pub type_id: TypeId,
    pub array_size: u32,
    pub pointer_level: u8,
    pub flags: TypeUsageFlags,
}

impl TypeUsage {
    /// Plain by-value use of `type_id`.
    pub const fn of(type_id: TypeId) -> Self {
        TypeUsage {
            type_id,
            array_size: 1,
            pointer_level: 0,
            flags: TypeUsageFlags::empty(),
        }
    }

    pub const VOID: TypeUsage = TypeUsage::of(TypeId::VOID);
    pub const BOOL: TypeUsage = TypeUsage::of(TypeId::BOOL);
    pub const INT: TypeUsage = TypeUsage::of(TypeId::INT);
    pub const DOUBLE: TypeUsage = TypeUsage::of(TypeId::DOUBLE);
    pub const SIZE: TypeUsage = TypeUsage::of(TypeId::SIZE);

    /// `T*` for this usage's type.
    #[must_use]
    pub fn pointer_to(mut self) -> Self {
        if self.is_array() {
            self.flags.remove(TypeUsageFlags::ARRAY);
            self.array_size = 1;
        }
        self.flags.remove(TypeUsageFlags::REFERENCE | TypeUsageFlags::RVALUE);
        self.pointer_level += 1;
        self
    }

    /// Usage obtained by dereferencing one pointer level.
    #[must_use]
    pub fn pointee(mut self) -> Self {
        self.pointer_level = self.pointer_level.saturating_sub(1);
        self.flags.remove(TypeUsageFlags::CONST_POINTER | TypeUsageFlags::RVALUE);
        self
    }

    /// Usage of one element of an array.
    #[must_use]
    pub fn element(mut self) -> Self {
        if self.is_array() {
            self.flags.remove(TypeUsageFlags::ARRAY);
            self.array_size = 1;
        } else {
            self = self.pointee();
        }
        self.flags.remove(TypeUsageFlags::REFERENCE);
        self
    }

    /// The usage with reference and rvalue markers stripped.
    #[must_use]
    pub fn value_usage(mut self) -> Self {
        self.flags.remove(TypeUsageFlags::REFERENCE | TypeUsageFlags::RVALUE);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TypeUsageFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn without_flags(mut self, flags: TypeUsageFlags) -> Self {
        self.flags.remove(flags);
        self
    }

    #[must_use]
    pub fn array_of(mut self, size: u32) -> Self {
        self.flags |= TypeUsageFlags::ARRAY;
        self.array_size = size;
        self
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.flags.contains(TypeUsageFlags::CONST)
    }

    #[inline]
    pub fn is_const_pointer(&self) -> bool {
        self.flags.contains(TypeUsageFlags::CONST_POINTER)
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        self.flags.contains(TypeUsageFlags::REFERENCE)
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.flags.contains(TypeUsageFlags::ARRAY)
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.pointer_level > 0
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.type_id == TypeId::VOID && self.pointer_level == 0
    }

    /// Whether a value of this usage may be written through.
    pub fn is_writable(&self) -> bool {
        if self.is_pointer() {
            !self.is_const_pointer()
        } else {
            !self.is_const()
        }
    }

    /// Structural equality ignoring reference/rvalue markers.
    pub fn same_value_type(&self, other: &TypeUsage) -> bool {
        self.type_id == other.type_id
            && self.pointer_level == other.pointer_level
            && self.is_array() == other.is_array()
            && (!self.is_array() || self.array_size == other.array_size)
    }
}

#[cfg(test)]
mod tests;
