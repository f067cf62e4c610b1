//! Struct and enum registration plus byte layout.
//!
//! Script structs are laid out the way a C compiler would: bases first in
//! declaration order, then members, each aligned to its own alignment, and
//! the total size rounded up to the largest alignment. Host-registered types
//! give their size and alignment explicitly and place members at explicit
//! offsets instead.

use ember_ir::{InstanceOwner, Name, TypeId, TypeUsage};
use ember_value::ScalarKind;

use crate::{
    BaseType, EnumData, Member, Registry, StructData, TypeKind, Visibility, POINTER_SIZE,
};

/// Enums are stored as `int`.
pub const ENUM_SIZE: u32 = 4;

fn align_up(value: u32, alignment: u32) -> u32 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

impl Registry {
    pub fn register_struct(
        &mut self,
        owner: InstanceOwner,
        name: &str,
        size: u32,
        alignment: u32,
    ) -> TypeId {
        self.register_template_struct(owner, name, Vec::new(), size, alignment)
    }

    /// Register one instantiation of a templated host struct (`Vec<int>`).
    pub fn register_template_struct(
        &mut self,
        owner: InstanceOwner,
        name: &str,
        template_types: Vec<TypeUsage>,
        size: u32,
        alignment: u32,
    ) -> TypeId {
        let kind = TypeKind::Struct(StructData::default());
        self.register_type(owner, name, template_types, kind, size, alignment)
    }

    pub fn register_class(
        &mut self,
        owner: InstanceOwner,
        name: &str,
        size: u32,
        alignment: u32,
    ) -> TypeId {
        let kind = TypeKind::Struct(StructData {
            is_class: true,
            ..StructData::default()
        });
        self.register_type(owner, name, Vec::new(), kind, size, alignment)
    }

    pub fn register_enum(&mut self, owner: InstanceOwner, name: &str) -> TypeId {
        let kind = TypeKind::Enum(EnumData::default());
        self.register_type(owner, name, Vec::new(), kind, ENUM_SIZE, ENUM_SIZE)
    }

    pub fn register_enum_class(&mut self, owner: InstanceOwner, name: &str) -> TypeId {
        let kind = TypeKind::EnumClass(EnumData::default());
        self.register_type(owner, name, Vec::new(), kind, ENUM_SIZE, ENUM_SIZE)
    }

    /// Bytes occupied by a value of `usage`. References occupy the size of
    /// what they refer to.
    pub fn size_of(&self, usage: TypeUsage) -> u32 {
        let single = if usage.is_pointer() {
            POINTER_SIZE
        } else {
            self.type_info(usage.type_id).size
        };
        if usage.is_array() {
            single * usage.array_size
        } else {
            single
        }
    }

    pub fn alignment_of(&self, usage: TypeUsage) -> u32 {
        if usage.is_pointer() {
            POINTER_SIZE
        } else {
            self.type_info(usage.type_id).alignment
        }
    }

    /// Place `base` after what `type_id` already holds. Returns its offset.
    pub fn append_base(&mut self, type_id: TypeId, base: TypeId) -> u32 {
        let base_size = self.type_info(base).size;
        let base_alignment = self.type_info(base).alignment;
        let ty = self.type_info_mut(type_id);
        let offset = align_up(ty.size, base_alignment);
        ty.size = offset + base_size;
        ty.alignment = ty.alignment.max(base_alignment);
        if let Some(data) = ty.as_struct_mut() {
            data.bases.push(BaseType {
                type_id: base,
                offset,
            });
        }
        offset
    }

    /// Place a member after what `type_id` already holds. Returns its
    /// offset.
    pub fn append_member(
        &mut self,
        type_id: TypeId,
        name: Name,
        usage: TypeUsage,
        visibility: Visibility,
    ) -> u32 {
        let size = self.size_of(usage);
        let alignment = self.alignment_of(usage);
        let ty = self.type_info_mut(type_id);
        let offset = align_up(ty.size, alignment);
        ty.size = offset + size;
        ty.alignment = ty.alignment.max(alignment);
        if let Some(data) = ty.as_struct_mut() {
            data.members.push(Member {
                name,
                type_usage: usage,
                offset,
                visibility,
            });
        }
        offset
    }

    /// Round the size up to the alignment; an empty struct still occupies
    /// one byte.
    pub fn finish_layout(&mut self, type_id: TypeId) {
        let ty = self.type_info_mut(type_id);
        ty.size = align_up(ty.size.max(1), ty.alignment);
    }

    /// Machine representation of a value of `usage`: pointers are unsigned
    /// addresses and enums are `int`. `None` for structs, arrays and `void`.
    pub fn scalar_kind(&self, usage: TypeUsage) -> Option<ScalarKind> {
        if usage.is_array() {
            return None;
        }
        if usage.is_pointer() {
            return Some(ScalarKind::POINTER);
        }
        if self.type_info(usage.type_id).is_enum() {
            return Some(ScalarKind::Signed(ENUM_SIZE as u8));
        }
        ScalarKind::of(usage.type_id)
    }

    /// Built-in integral type or enum, by value.
    pub fn is_integral(&self, usage: TypeUsage) -> bool {
        !usage.is_pointer()
            && !usage.is_array()
            && self.scalar_kind(usage).is_some_and(ScalarKind::is_integral)
    }

    /// Built-in arithmetic type by value; enums are excluded.
    pub fn is_arithmetic(&self, usage: TypeUsage) -> bool {
        !usage.is_pointer()
            && !usage.is_array()
            && usage.type_id.is_built_in()
            && ScalarKind::of(usage.type_id).is_some()
    }

    pub fn is_struct_value(&self, usage: TypeUsage) -> bool {
        !usage.is_pointer() && !usage.is_array() && self.type_info(usage.type_id).is_struct()
    }
}
