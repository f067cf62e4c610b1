//! Fixed-size scalars and numeric conversion.

use crate::Address;
use ember_ir::TypeId;

/// A plain value with a fixed little-endian byte representation.
pub trait Scalar: Copy + 'static {
    const SIZE: usize;

    /// Decode from the first `SIZE` bytes; missing bytes read as zero.
    fn from_bytes(bytes: &[u8]) -> Self;

    /// Encode into the first `SIZE` bytes of `out`.
    fn write_bytes(self, out: &mut [u8]);
}

fn padded<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buffer = [0u8; N];
    let len = bytes.len().min(N);
    buffer[..len].copy_from_slice(&bytes[..len]);
    buffer
}

fn store(encoded: &[u8], out: &mut [u8]) {
    let len = encoded.len().min(out.len());
    out[..len].copy_from_slice(&encoded[..len]);
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {$(
        impl Scalar for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn from_bytes(bytes: &[u8]) -> Self {
                <$ty>::from_le_bytes(padded(bytes))
            }

            #[inline]
            fn write_bytes(self, out: &mut [u8]) {
                store(&self.to_le_bytes(), out);
            }
        }
    )*};
}

impl_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    fn from_bytes(bytes: &[u8]) -> Self {
        bytes.first().is_some_and(|&b| b != 0)
    }

    fn write_bytes(self, out: &mut [u8]) {
        store(&[u8::from(self)], out);
    }
}

impl Scalar for Address {
    const SIZE: usize = 8;

    fn from_bytes(bytes: &[u8]) -> Self {
        Address::from_raw(u64::from_bytes(bytes))
    }

    fn write_bytes(self, out: &mut [u8]) {
        self.raw().write_bytes(out);
    }
}

/// Machine representation of a built-in arithmetic type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScalarKind {
    Bool,
    Signed(u8),
    Unsigned(u8),
    Float(u8),
}

impl ScalarKind {
    /// Representation of a built-in type; `None` for `void` and
    /// user-defined types.
    pub const fn of(type_id: TypeId) -> Option<ScalarKind> {
        Some(match type_id {
            TypeId::BOOL => ScalarKind::Bool,
            TypeId::CHAR | TypeId::INT8 => ScalarKind::Signed(1),
            TypeId::SHORT | TypeId::INT16 => ScalarKind::Signed(2),
            TypeId::INT | TypeId::INT32 => ScalarKind::Signed(4),
            TypeId::LONG | TypeId::INT64 => ScalarKind::Signed(8),
            TypeId::UINT8 => ScalarKind::Unsigned(1),
            TypeId::UINT16 => ScalarKind::Unsigned(2),
            TypeId::WCHAR | TypeId::UINT32 => ScalarKind::Unsigned(4),
            TypeId::UINT64 | TypeId::SIZE => ScalarKind::Unsigned(8),
            TypeId::FLOAT => ScalarKind::Float(4),
            TypeId::DOUBLE => ScalarKind::Float(8),
            _ => return None,
        })
    }

    /// Pointer-sized unsigned representation.
    pub const POINTER: ScalarKind = ScalarKind::Unsigned(8);

    pub const fn size(self) -> usize {
        match self {
            ScalarKind::Bool => 1,
            ScalarKind::Signed(size) | ScalarKind::Unsigned(size) | ScalarKind::Float(size) => {
                size as usize
            }
        }
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        !matches!(self, ScalarKind::Float(_))
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, ScalarKind::Float(_))
    }

    /// Type of the result of a binary arithmetic operation, following the
    /// usual arithmetic conversions: floats win, then integer promotion to
    /// at least four bytes, then the wider operand, then unsigned on a tie.
    pub fn common(self, other: ScalarKind) -> ScalarKind {
        use ScalarKind::{Bool, Float, Signed, Unsigned};
        match (self, other) {
            (Float(a), Float(b)) => Float(a.max(b)),
            (Float(size), _) | (_, Float(size)) => Float(size),
            _ => {
                let promote = |kind: ScalarKind| match kind {
                    Bool => Signed(4),
                    Signed(size) if size < 4 => Signed(4),
                    Unsigned(size) if size < 4 => Signed(4),
                    other => other,
                };
                match (promote(self), promote(other)) {
                    (a, b) if a == b => a,
                    (a, b) if a.size() != b.size() => {
                        if a.size() > b.size() {
                            a
                        } else {
                            b
                        }
                    }
                    (Unsigned(size), _) | (_, Unsigned(size)) => Unsigned(size),
                    (a, _) => a,
                }
            }
        }
    }
}

/// A decoded arithmetic value.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    /// Decode `bytes` as `kind`.
    pub fn read(kind: ScalarKind, bytes: &[u8]) -> Number {
        match kind {
            ScalarKind::Bool => Number::Unsigned(u64::from(bool::from_bytes(bytes))),
            ScalarKind::Signed(1) => Number::Signed(i64::from(i8::from_bytes(bytes))),
            ScalarKind::Signed(2) => Number::Signed(i64::from(i16::from_bytes(bytes))),
            ScalarKind::Signed(4) => Number::Signed(i64::from(i32::from_bytes(bytes))),
            ScalarKind::Signed(_) => Number::Signed(i64::from_bytes(bytes)),
            ScalarKind::Unsigned(1) => Number::Unsigned(u64::from(u8::from_bytes(bytes))),
            ScalarKind::Unsigned(2) => Number::Unsigned(u64::from(u16::from_bytes(bytes))),
            ScalarKind::Unsigned(4) => Number::Unsigned(u64::from(u32::from_bytes(bytes))),
            ScalarKind::Unsigned(_) => Number::Unsigned(u64::from_bytes(bytes)),
            ScalarKind::Float(4) => Number::Float(f64::from(f32::from_bytes(bytes))),
            ScalarKind::Float(_) => Number::Float(f64::from_bytes(bytes)),
        }
    }

    /// Encode as `kind`, converting (and truncating) as a C cast would.
    pub fn write(self, kind: ScalarKind, out: &mut [u8]) {
        match kind {
            ScalarKind::Bool => self.is_truthy().write_bytes(out),
            ScalarKind::Float(4) => (self.as_f64() as f32).write_bytes(out),
            ScalarKind::Float(_) => self.as_f64().write_bytes(out),
            ScalarKind::Signed(size) | ScalarKind::Unsigned(size) => {
                let bits = self.as_u64().to_le_bytes();
                store(&bits[..usize::from(size).min(8)], out);
            }
        }
    }

    /// Encode into a fresh buffer of `kind.size()` bytes.
    pub fn to_bytes(self, kind: ScalarKind) -> Vec<u8> {
        let mut bytes = vec![0u8; kind.size()];
        self.write(kind, &mut bytes);
        bytes
    }

    /// Reinterpret as `kind` (truncating integers to its width).
    #[must_use]
    pub fn convert(self, kind: ScalarKind) -> Number {
        Number::read(kind, &self.to_bytes(kind))
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Number::Signed(v) => v,
            Number::Unsigned(v) => v as i64,
            Number::Float(v) => v as i64,
        }
    }

    pub fn as_u64(self) -> u64 {
        match self {
            Number::Signed(v) => v as u64,
            Number::Unsigned(v) => v,
            Number::Float(v) if v < 0.0 => (v as i64) as u64,
            Number::Float(v) => v as u64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Number::Signed(v) => v as f64,
            Number::Unsigned(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    pub fn is_truthy(self) -> bool {
        match self {
            Number::Signed(v) => v != 0,
            Number::Unsigned(v) => v != 0,
            Number::Float(v) => v != 0.0,
        }
    }
}

#[cfg(test)]
mod tests;
