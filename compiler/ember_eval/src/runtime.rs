//! Evaluation state that outlives a single execution.

use std::fmt;

use ember_diagnostic::{CallStackEntry, RuntimeErrorKind};
use ember_ir::StaticSlot;
use ember_types::Registry;
use rustc_hash::FxHashSet;

use crate::CallStack;

/// Nested script calls allowed before `CallDepthExceeded`.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// What the execution hook sees before each statement.
pub struct HookContext<'h> {
    registry: &'h Registry,
    call_stack: &'h CallStack,
}

impl<'h> HookContext<'h> {
    pub(crate) fn new(registry: &'h Registry, call_stack: &'h CallStack) -> Self {
        HookContext {
            registry,
            call_stack,
        }
    }

    /// Line of the statement about to execute.
    pub fn line(&self) -> u32 {
        self.call_stack.line()
    }

    /// Number of active script frames, the top-level frame included.
    pub fn depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Active frames, outermost first.
    pub fn call_stack(&self) -> Vec<CallStackEntry> {
        self.call_stack.capture(self.registry)
    }
}

/// Called before every statement; an error aborts the execution.
pub type ExecutionHook = Box<dyn FnMut(&HookContext<'_>) -> Result<(), RuntimeErrorKind>>;

/// Settings and state shared by every execution of an environment.
pub struct Runtime {
    max_call_depth: usize,
    initialized_statics: FxHashSet<StaticSlot>,
    hook: Option<ExecutionHook>,
}

impl Runtime {
    pub fn new(max_call_depth: usize) -> Self {
        Runtime {
            max_call_depth,
            initialized_statics: FxHashSet::default(),
            hook: None,
        }
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    pub fn set_hook(&mut self, hook: Option<ExecutionHook>) {
        self.hook = hook;
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Whether a function-local static has run its initializer.
    pub(crate) fn is_static_initialized(&self, slot: StaticSlot) -> bool {
        self.initialized_statics.contains(&slot)
    }

    pub(crate) fn mark_static_initialized(&mut self, slot: StaticSlot) {
        self.initialized_statics.insert(slot);
    }

    pub(crate) fn run_hook(
        &mut self,
        registry: &Registry,
        call_stack: &CallStack,
    ) -> Result<(), RuntimeErrorKind> {
        match self.hook.as_mut() {
            Some(hook) => hook(&HookContext::new(registry, call_stack)),
            None => Ok(()),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(DEFAULT_MAX_CALL_DEPTH)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("max_call_depth", &self.max_call_depth)
            .field("initialized_statics", &self.initialized_statics.len())
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
