//! Calling convention for functions implemented by the host.
//!
//! A native function is a plain `fn` pointer. It receives a [`NativeCall`]
//! giving access to memory, the `this` pointer of a method call, the
//! already-converted arguments and the result slot.
//!
//! ```ignore
//! fn add(call: &mut NativeCall<'_>) -> Result<(), RuntimeErrorKind> {
//!     let sum = call.arg::<i32>(0)? + call.arg::<i32>(1)?;
//!     call.set_result(sum)
//! }
//! ```

use ember_diagnostic::RuntimeErrorKind;

use crate::{Address, Memory, Scalar, Value};

/// Host implementation of a function, method, constructor or destructor.
pub type NativeFn = fn(&mut NativeCall<'_>) -> Result<(), RuntimeErrorKind>;

pub struct NativeCall<'a> {
    pub memory: &'a mut Memory,
    this: Address,
    args: &'a [Value],
    result: &'a mut Value,
}

impl<'a> NativeCall<'a> {
    pub fn new(
        memory: &'a mut Memory,
        this: Address,
        args: &'a [Value],
        result: &'a mut Value,
    ) -> Self {
        NativeCall {
            memory,
            this,
            args,
            result,
        }
    }

    /// Object a method was called on.
    pub fn this(&self) -> Result<Address, RuntimeErrorKind> {
        if self.this.is_null() {
            Err(RuntimeErrorKind::NullPointerAccess)
        } else {
            Ok(self.this)
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn arg_value(&self, index: usize) -> Result<&Value, RuntimeErrorKind> {
        self.args.get(index).ok_or_else(|| {
            RuntimeErrorKind::custom(format!("missing native argument {index}"))
        })
    }

    /// Argument `index` decoded as `T`. Reference parameters read the
    /// referenced storage; pointer parameters decode as [`Address`].
    pub fn arg<T: Scalar>(&self, index: usize) -> Result<T, RuntimeErrorKind> {
        self.arg_value(index)?.read(&*self.memory)
    }

    /// Storage of a reference argument.
    pub fn arg_address(&self, index: usize) -> Result<Address, RuntimeErrorKind> {
        self.arg_value(index)?
            .address()
            .ok_or(RuntimeErrorKind::InvalidMemoryAccess)
    }

    /// Text of a `const char*` argument.
    pub fn arg_str(&self, index: usize) -> Result<String, RuntimeErrorKind> {
        let pointer: Address = self.arg(index)?;
        self.memory.read_c_string(pointer)
    }

    /// Read a field of `this` at a byte offset.
    pub fn member<T: Scalar>(&self, offset: u32) -> Result<T, RuntimeErrorKind> {
        let this = self.this()?;
        self.memory.read_scalar(this.offset_by(i64::from(offset)))
    }

    pub fn set_member<T: Scalar>(&mut self, offset: u32, value: T) -> Result<(), RuntimeErrorKind> {
        let this = self.this()?;
        self.memory
            .write_scalar(this.offset_by(i64::from(offset)), value)
    }

    pub fn set_result<T: Scalar>(&mut self, value: T) -> Result<(), RuntimeErrorKind> {
        self.result.set(self.memory, value)
    }

    pub fn set_result_bytes(&mut self, bytes: &[u8]) -> Result<(), RuntimeErrorKind> {
        self.result.write(self.memory, bytes)
    }

    /// Return a reference to `len` bytes at `address`.
    pub fn return_reference(&mut self, address: Address, len: usize) {
        *self.result = Value::external(self.result.type_usage, address, len);
    }
}
