//! Environment settings that reject specific constructs at compile time.

use bitflags::bitflags;

bitflags! {
    /// Constructs an embedder can forbid in loaded scripts.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Settings: u32 {
        /// Reject pointer variables with static storage (globals, `static`
        /// locals and static members).
        const DISALLOW_STATIC_POINTERS = 1 << 0;
        /// Reject `dynamic_cast`.
        const DISALLOW_DYNAMIC_CAST = 1 << 1;
    }
}
