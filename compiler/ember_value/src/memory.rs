//! Block-structured memory: null, the execution stack and heap blocks.

use std::collections::BTreeMap;

use ember_diagnostic::RuntimeErrorKind;
use ember_ir::TypeId;
use tracing::trace;

use crate::{Address, Scalar};

/// Block number of the execution stack.
pub const STACK_BLOCK: u32 = 1;
const FIRST_HEAP_BLOCK: u32 = 2;

/// Position of the stack top, used to release everything pushed after it.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct StackMark(u32);

/// Fixed-capacity LIFO arena for locals and call arguments.
#[derive(Debug)]
pub struct ExecutionStack {
    data: Vec<u8>,
    top: u32,
}

impl ExecutionStack {
    pub fn new(capacity: usize) -> Self {
        ExecutionStack {
            data: vec![0; capacity],
            top: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes currently in use.
    pub fn used(&self) -> usize {
        self.top as usize
    }

    pub fn mark(&self) -> StackMark {
        StackMark(self.top)
    }

    /// Reserve `size` zeroed bytes aligned to `alignment`.
    fn push(&mut self, size: usize, alignment: usize) -> Result<u32, RuntimeErrorKind> {
        let alignment = alignment.max(1);
        let start = (self.top as usize).div_ceil(alignment) * alignment;
        let end = start + size;
        if end > self.data.len() {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.data[start..end].fill(0);
        self.top = end as u32;
        Ok(start as u32)
    }
}

/// All memory reachable by scripts of one environment.
#[derive(Debug)]
pub struct Memory {
    stack: ExecutionStack,
    heap: Vec<Option<Vec<u8>>>,
    free_blocks: Vec<u32>,
    /// Complete object type at each constructed struct address, consulted by
    /// `dynamic_cast`.
    objects: BTreeMap<Address, TypeId>,
}

impl Memory {
    pub fn new(stack_capacity: usize) -> Self {
        Memory {
            stack: ExecutionStack::new(stack_capacity),
            heap: Vec::new(),
            free_blocks: Vec::new(),
            objects: BTreeMap::new(),
        }
    }

    pub fn stack(&self) -> &ExecutionStack {
        &self.stack
    }

    /// Push a zeroed slot onto the execution stack.
    pub fn push_stack(&mut self, size: usize, alignment: usize) -> Result<Address, RuntimeErrorKind> {
        let offset = self.stack.push(size, alignment)?;
        Ok(Address::new(STACK_BLOCK, offset))
    }

    pub fn stack_mark(&self) -> StackMark {
        self.stack.mark()
    }

    /// Pop everything pushed since `mark`, forgetting objects recorded there.
    pub fn release_stack(&mut self, mark: StackMark) {
        if mark.0 >= self.stack.top {
            return;
        }
        let from = Address::new(STACK_BLOCK, mark.0);
        let to = Address::new(STACK_BLOCK, self.stack.top);
        let released: Vec<Address> = self.objects.range(from..to).map(|(a, _)| *a).collect();
        for address in released {
            self.objects.remove(&address);
        }
        self.stack.top = mark.0;
    }

    /// Allocate a zeroed heap block.
    pub fn allocate(&mut self, size: usize) -> Address {
        let bytes = vec![0; size];
        let block = match self.free_blocks.pop() {
            Some(block) => {
                self.heap[(block - FIRST_HEAP_BLOCK) as usize] = Some(bytes);
                block
            }
            None => {
                self.heap.push(Some(bytes));
                self.heap.len() as u32 - 1 + FIRST_HEAP_BLOCK
            }
        };
        trace!(block, size, "heap block allocated");
        Address::new(block, 0)
    }

    /// Free the heap block containing `address`.
    pub fn free(&mut self, address: Address) -> Result<(), RuntimeErrorKind> {
        let block = address.block();
        let slot = block
            .checked_sub(FIRST_HEAP_BLOCK)
            .and_then(|index| self.heap.get_mut(index as usize))
            .filter(|slot| slot.is_some())
            .ok_or(RuntimeErrorKind::InvalidMemoryAccess)?;
        *slot = None;
        self.free_blocks.push(block);
        let from = Address::new(block, 0);
        let to = Address::new(block + 1, 0);
        let released: Vec<Address> = self.objects.range(from..to).map(|(a, _)| *a).collect();
        for address in released {
            self.objects.remove(&address);
        }
        Ok(())
    }

    /// Number of live heap blocks.
    pub fn heap_blocks(&self) -> usize {
        self.heap.iter().filter(|slot| slot.is_some()).count()
    }

    fn block(&self, block: u32) -> Result<&[u8], RuntimeErrorKind> {
        match block {
            0 => Err(RuntimeErrorKind::NullPointerAccess),
            STACK_BLOCK => Ok(&self.stack.data[..self.stack.top as usize]),
            _ => self
                .heap
                .get((block - FIRST_HEAP_BLOCK) as usize)
                .and_then(Option::as_deref)
                .ok_or(RuntimeErrorKind::InvalidMemoryAccess),
        }
    }

    fn block_mut(&mut self, block: u32) -> Result<&mut [u8], RuntimeErrorKind> {
        match block {
            0 => Err(RuntimeErrorKind::NullPointerAccess),
            STACK_BLOCK => Ok(&mut self.stack.data[..self.stack.top as usize]),
            _ => self
                .heap
                .get_mut((block - FIRST_HEAP_BLOCK) as usize)
                .and_then(Option::as_deref_mut)
                .ok_or(RuntimeErrorKind::InvalidMemoryAccess),
        }
    }

    pub fn read(&self, address: Address, len: usize) -> Result<&[u8], RuntimeErrorKind> {
        let start = address.offset() as usize;
        self.block(address.block())?
            .get(start..start + len)
            .ok_or(RuntimeErrorKind::InvalidMemoryAccess)
    }

    pub fn slice_mut(&mut self, address: Address, len: usize) -> Result<&mut [u8], RuntimeErrorKind> {
        let start = address.offset() as usize;
        self.block_mut(address.block())?
            .get_mut(start..start + len)
            .ok_or(RuntimeErrorKind::InvalidMemoryAccess)
    }

    pub fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), RuntimeErrorKind> {
        self.slice_mut(address, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Copy `len` bytes between possibly overlapping locations.
    pub fn copy(&mut self, destination: Address, source: Address, len: usize) -> Result<(), RuntimeErrorKind> {
        let bytes = self.read(source, len)?.to_vec();
        self.write(destination, &bytes)
    }

    pub fn fill(&mut self, address: Address, len: usize, byte: u8) -> Result<(), RuntimeErrorKind> {
        self.slice_mut(address, len)?.fill(byte);
        Ok(())
    }

    pub fn read_scalar<T: Scalar>(&self, address: Address) -> Result<T, RuntimeErrorKind> {
        Ok(T::from_bytes(self.read(address, T::SIZE)?))
    }

    pub fn write_scalar<T: Scalar>(&mut self, address: Address, value: T) -> Result<(), RuntimeErrorKind> {
        value.write_bytes(self.slice_mut(address, T::SIZE)?);
        Ok(())
    }

    /// Read a null-terminated narrow string.
    pub fn read_c_string(&self, address: Address) -> Result<String, RuntimeErrorKind> {
        let start = address.offset() as usize;
        let block = self.block(address.block())?;
        let tail = block
            .get(start..)
            .ok_or(RuntimeErrorKind::InvalidMemoryAccess)?;
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(RuntimeErrorKind::InvalidMemoryAccess)?;
        Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
    }

    /// Record the complete type of an object constructed at `address`.
    pub fn record_object(&mut self, address: Address, type_id: TypeId) {
        self.objects.insert(address, type_id);
    }

    pub fn forget_object(&mut self, address: Address) {
        self.objects.remove(&address);
    }

    /// Complete type of the object at `address`, when one was recorded.
    pub fn object_type(&self, address: Address) -> Option<TypeId> {
        self.objects.get(&address).copied()
    }
}

#[cfg(test)]
mod tests;
