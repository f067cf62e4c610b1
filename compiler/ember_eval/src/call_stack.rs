//! Script call frames, for runtime error reports and the execution hook.
//!
//! Only script functions push a frame; native functions run inside the
//! frame of their caller. The bottom frame is the program (or expression)
//! being executed and has no function.

use ember_diagnostic::{CallStackEntry, RuntimeErrorKind};
use ember_ir::{FunctionId, Name};
use ember_types::Registry;

/// One active script frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// Program the executing code was loaded from.
    pub program: Name,
    /// `None` for the top-level statements of a program.
    pub function: Option<FunctionId>,
    /// Line of the statement currently executing in this frame.
    pub line: u32,
}

/// Live stack of script frames with a depth limit.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: usize,
}

impl CallStack {
    pub fn new(max_depth: usize) -> Self {
        CallStack {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame. The frame is not pushed when the limit is reached.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), RuntimeErrorKind> {
        if self.frames.len() >= self.max_depth {
            return Err(RuntimeErrorKind::CallDepthExceeded {
                depth: self.max_depth,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(!self.frames.is_empty(), "CallStack::pop on an empty stack");
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Record the line executing in the innermost frame.
    pub fn set_line(&mut self, line: u32) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = line;
        }
    }

    pub fn line(&self) -> u32 {
        self.frames.last().map_or(0, |frame| frame.line)
    }

    /// Snapshot with names resolved, outermost frame first.
    pub fn capture(&self, registry: &Registry) -> Vec<CallStackEntry> {
        self.frames
            .iter()
            .map(|frame| CallStackEntry {
                program: registry.name(frame.program).to_string(),
                function: frame
                    .function
                    .map_or_else(|| "<global>".to_string(), |id| registry.function_name(id)),
                line: frame.line,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
