//! Conversion ranks used by overload resolution and casts.

/// How an argument of one type usage converts to a parameter of another.
///
/// Variants are ordered from best to worst; `Ord` follows that order, so the
/// best candidate is the one with the *smallest* worst-parameter rank.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Compatibility {
    PerfectMatch,
    ImplicitCastableInteger,
    ImplicitCastableIntegerFloat,
    ImplicitCastableFloat,
    ImplicitCastableInheritance,
    ImplicitConstructable,
    Incompatible,
}

impl Compatibility {
    #[inline]
    pub fn is_compatible(self) -> bool {
        self != Compatibility::Incompatible
    }
}
