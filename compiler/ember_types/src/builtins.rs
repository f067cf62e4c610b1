//! Built-in types and their multi-word spellings.

use ember_ir::{InstanceOwner, NamespaceId, TypeId};

use crate::{Registry, TypeKind};

/// Built-in types in `TypeId` order: name and size (alignment equals size).
const BUILT_INS: [(&str, u32); TypeId::BUILT_IN_COUNT as usize] = [
    ("void", 0),
    ("bool", 1),
    ("char", 1),
    ("wchar_t", 4),
    ("short", 2),
    ("int", 4),
    ("long", 8),
    ("float", 4),
    ("double", 8),
    ("int8_t", 1),
    ("int16_t", 2),
    ("int32_t", 4),
    ("int64_t", 8),
    ("uint8_t", 1),
    ("uint16_t", 2),
    ("uint32_t", 4),
    ("uint64_t", 8),
    ("size_t", 8),
];

/// Spellings that name the same type for overload resolution.
const PERFECT_PAIRS: [(TypeId, TypeId); 5] = [
    (TypeId::INT8, TypeId::CHAR),
    (TypeId::INT16, TypeId::SHORT),
    (TypeId::INT32, TypeId::INT),
    (TypeId::INT64, TypeId::LONG),
    (TypeId::UINT64, TypeId::SIZE),
];

pub(crate) fn register_built_ins(registry: &mut Registry) {
    let global = InstanceOwner::Namespace(NamespaceId::GLOBAL);
    for (index, (name, size)) in BUILT_INS.into_iter().enumerate() {
        let id = registry.register_type(global, name, Vec::new(), TypeKind::BuiltIn, size, size);
        debug_assert_eq!(id.index(), index);
    }
    for (a, b) in PERFECT_PAIRS {
        registry.register_perfect_match(a, b);
    }
}

/// Type named by a sequence of built-in keywords (`unsigned long long`,
/// `short int`). `None` when the words do not form a valid spelling.
pub fn built_in_from_words(words: &[&str]) -> Option<TypeId> {
    let mut unsigned = false;
    let mut signed = false;
    let mut longs = 0u8;
    let mut base: Option<&str> = None;

    for &word in words {
        match word {
            "unsigned" if !unsigned && !signed => unsigned = true,
            "signed" if !unsigned && !signed => signed = true,
            "long" if longs < 2 => longs += 1,
            "int" if base == Some("short") => {}
            "int" | "char" | "short" | "double" | "float" | "bool" | "void" if base.is_none() => {
                base = Some(word);
            }
            _ => return None,
        }
    }

    let sign_qualified = unsigned || signed;
    Some(match (base, longs) {
        (Some("char"), 0) if unsigned => TypeId::UINT8,
        (Some("char"), 0) if signed => TypeId::INT8,
        (Some("char"), 0) => TypeId::CHAR,
        (Some("short"), 0) => {
            if unsigned {
                TypeId::UINT16
            } else {
                TypeId::SHORT
            }
        }
        (Some("int") | None, 0) if sign_qualified || base.is_some() => {
            if unsigned {
                TypeId::UINT32
            } else {
                TypeId::INT
            }
        }
        (Some("int") | None, 1) => {
            if unsigned {
                TypeId::UINT64
            } else {
                TypeId::LONG
            }
        }
        (Some("int") | None, 2) => {
            if unsigned {
                TypeId::UINT64
            } else {
                TypeId::INT64
            }
        }
        (Some("double"), 0 | 1) if !sign_qualified => TypeId::DOUBLE,
        (Some("float"), 0) if !sign_qualified => TypeId::FLOAT,
        (Some("bool"), 0) if !sign_qualified => TypeId::BOOL,
        (Some("void"), 0) if !sign_qualified => TypeId::VOID,
        _ => return None,
    })
}
