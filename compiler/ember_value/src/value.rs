//! Typed views of bytes.

use ember_diagnostic::RuntimeErrorKind;
use ember_ir::TypeUsage;
use smallvec::SmallVec;

use crate::{Address, Memory, Scalar};

/// Where a value's bytes are.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Buffer {
    /// No storage yet (an unset result slot).
    #[default]
    Uninitialized,
    /// A slot on the execution stack, owned by the scope that pushed it.
    Stack { address: Address, len: u32 },
    /// Bytes owned by the value itself.
    Heap(SmallVec<[u8; 16]>),
    /// Bytes owned by someone else: a referenced variable, a global, a
    /// member reached through a pointer.
    External { address: Address, len: u32 },
}

/// A type usage plus the bytes of a value of that usage.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub type_usage: TypeUsage,
    buffer: Buffer,
}

impl Value {
    pub fn uninitialized(type_usage: TypeUsage) -> Self {
        Value {
            type_usage,
            buffer: Buffer::Uninitialized,
        }
    }

    pub fn void() -> Self {
        Value::uninitialized(TypeUsage::VOID)
    }

    /// An owned copy of `bytes`.
    pub fn from_bytes(type_usage: TypeUsage, bytes: &[u8]) -> Self {
        Value {
            type_usage,
            buffer: Buffer::Heap(SmallVec::from_slice(bytes)),
        }
    }

    pub fn of<T: Scalar>(type_usage: TypeUsage, scalar: T) -> Self {
        let mut bytes: SmallVec<[u8; 16]> = SmallVec::from_elem(0, T::SIZE);
        scalar.write_bytes(&mut bytes);
        Value {
            type_usage,
            buffer: Buffer::Heap(bytes),
        }
    }

    pub fn on_stack(type_usage: TypeUsage, address: Address, len: usize) -> Self {
        Value {
            type_usage,
            buffer: Buffer::Stack {
                address,
                len: len as u32,
            },
        }
    }

    /// A value aliasing `len` bytes at `address`.
    pub fn external(type_usage: TypeUsage, address: Address, len: usize) -> Self {
        Value {
            type_usage,
            buffer: Buffer::External {
                address,
                len: len as u32,
            },
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self.buffer, Buffer::Uninitialized)
    }

    /// Address of the storage, for values that live in memory.
    pub fn address(&self) -> Option<Address> {
        match self.buffer {
            Buffer::Stack { address, .. } | Buffer::External { address, .. } => Some(address),
            Buffer::Uninitialized | Buffer::Heap(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.buffer {
            Buffer::Uninitialized => 0,
            Buffer::Stack { len, .. } | Buffer::External { len, .. } => *len as usize,
            Buffer::Heap(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes<'a>(&'a self, memory: &'a Memory) -> Result<&'a [u8], RuntimeErrorKind> {
        match &self.buffer {
            Buffer::Uninitialized => Ok(&[]),
            Buffer::Heap(bytes) => Ok(bytes),
            Buffer::Stack { address, len } | Buffer::External { address, len } => {
                memory.read(*address, *len as usize)
            }
        }
    }

    pub fn read<T: Scalar>(&self, memory: &Memory) -> Result<T, RuntimeErrorKind> {
        Ok(T::from_bytes(self.bytes(memory)?))
    }

    /// Overwrite the value's bytes. An uninitialized or owned value takes a
    /// copy of `bytes`; one in memory writes through.
    pub fn write(&mut self, memory: &mut Memory, bytes: &[u8]) -> Result<(), RuntimeErrorKind> {
        match &mut self.buffer {
            buffer @ Buffer::Uninitialized => {
                *buffer = Buffer::Heap(SmallVec::from_slice(bytes));
                Ok(())
            }
            Buffer::Heap(owned) => {
                owned.clear();
                owned.extend_from_slice(bytes);
                Ok(())
            }
            Buffer::Stack { address, len } | Buffer::External { address, len } => {
                let len = (*len as usize).min(bytes.len());
                memory.write(*address, &bytes[..len])
            }
        }
    }

    pub fn set<T: Scalar>(&mut self, memory: &mut Memory, scalar: T) -> Result<(), RuntimeErrorKind> {
        let mut bytes = [0u8; 16];
        scalar.write_bytes(&mut bytes);
        self.write(memory, &bytes[..T::SIZE])
    }

    /// Copy semantics: owned and stack-backed values are duplicated into an
    /// owned buffer; external values keep aliasing the same memory.
    pub fn copied(&self, memory: &Memory) -> Result<Value, RuntimeErrorKind> {
        match &self.buffer {
            Buffer::External { .. } | Buffer::Uninitialized | Buffer::Heap(_) => Ok(self.clone()),
            Buffer::Stack { .. } => Ok(Value::from_bytes(self.type_usage, self.bytes(memory)?)),
        }
    }

    /// An owned snapshot of the current bytes, whatever the buffer kind.
    pub fn detached(&self, memory: &Memory) -> Result<Value, RuntimeErrorKind> {
        Ok(Value::from_bytes(self.type_usage, self.bytes(memory)?))
    }

    #[must_use]
    pub fn with_type_usage(mut self, type_usage: TypeUsage) -> Self {
        self.type_usage = type_usage;
        self
    }
}
