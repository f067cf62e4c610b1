//! Per-execution state: frames, locals, scope levels and temporaries.

use ember_ir::{FunctionId, Name, TypeUsage};
use ember_value::{Address, StackMark, Value};

use crate::CallStack;

/// How a statement finished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return,
}

/// A local variable or parameter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalSlot {
    pub name: Name,
    /// Usage of the object, without the reference marker.
    pub type_usage: TypeUsage,
    /// Storage of the object. A reference local points at the referenced
    /// object.
    pub address: Address,
    /// The local owns its storage and destroys the object when its scope
    /// exits. Parameters, references and statics own nothing.
    pub owned: bool,
}

/// An active function invocation.
#[derive(Clone, Debug)]
pub(crate) struct Frame {
    pub function: Option<FunctionId>,
    pub this: Address,
    /// Index of the frame's first local.
    pub locals_base: usize,
    /// Storage the caller provided for a struct returned by value.
    pub return_slot: Option<Address>,
    pub return_value: Option<Value>,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Scope {
    pub locals: usize,
    pub temporaries: usize,
    pub stack: StackMark,
}

/// A struct materialized during a full expression, destroyed at its end.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Temporary {
    pub address: Address,
    pub type_usage: TypeUsage,
}

/// Everything one execution tracks while it walks the AST.
#[derive(Debug)]
pub struct ExecutionContext {
    pub(crate) frames: Vec<Frame>,
    pub(crate) locals: Vec<LocalSlot>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) temporaries: Vec<Temporary>,
    pub(crate) call_stack: CallStack,
}

impl ExecutionContext {
    pub fn new(max_call_depth: usize) -> Self {
        ExecutionContext {
            frames: Vec::new(),
            locals: Vec::new(),
            scopes: Vec::new(),
            temporaries: Vec::new(),
            call_stack: CallStack::new(max_call_depth),
        }
    }

    pub fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Local named `name` in the innermost frame, latest declaration first.
    pub fn local(&self, name: Name) -> Option<&LocalSlot> {
        let base = self.frames.last().map_or(0, |frame| frame.locals_base);
        self.locals[base..].iter().rev().find(|local| local.name == name)
    }

    pub(crate) fn local_index(&self, name: Name) -> Option<usize> {
        let base = self.frames.last().map_or(0, |frame| frame.locals_base);
        self.locals[base..]
            .iter()
            .rposition(|local| local.name == name)
            .map(|index| base + index)
    }

    pub(crate) fn declare(&mut self, local: LocalSlot) {
        self.locals.push(local);
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// `this` of the executing method, null outside methods.
    pub fn this(&self) -> Address {
        self.frames.last().map_or(Address::NULL, |frame| frame.this)
    }
}

#[cfg(test)]
mod tests;
