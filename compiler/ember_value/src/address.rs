//! Addresses into [`Memory`](crate::Memory).

use std::fmt;

/// A location in memory: a block number and a byte offset within it.
///
/// Packed as `block << 32 | offset`, which is also the pointer
/// representation scripts see.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Address(u64);

impl Address {
    pub const NULL: Address = Address(0);

    #[inline]
    pub const fn new(block: u32, offset: u32) -> Self {
        Address(((block as u64) << 32) | offset as u64)
    }

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Address(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn block(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub const fn offset(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Pointer arithmetic within the block. Moving outside the block yields
    /// an address every access rejects.
    #[must_use]
    pub fn offset_by(self, delta: i64) -> Self {
        let offset = i64::from(self.offset()) + delta;
        match u32::try_from(offset) {
            Ok(offset) => Address::new(self.block(), offset),
            Err(_) => Address::new(self.block(), u32::MAX),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}:{})", self.block(), self.offset())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}
