//! RAII guard for block scopes.
//!
//! Entering a scope records the number of locals and temporaries and the
//! stack top. Leaving it destroys the owned locals declared since, newest
//! first, then releases their stack. The guard's `Drop` does the same when
//! an error unwinds past the block, so every exit path runs destructors
//! and frees storage.

use std::ops::{Deref, DerefMut};

use ember_diagnostic::RuntimeError;
use tracing::warn;

use super::Interpreter;
use crate::context::Scope;
use crate::EvalResult;

/// An [`Interpreter`] inside one block scope.
///
/// Call [`finish`](Self::finish) on the normal exit path to surface
/// destructor errors; dropping the guard unwinds the scope and only logs
/// them.
pub struct ScopedInterpreter<'guard, 'a> {
    interpreter: &'guard mut Interpreter<'a>,
    finished: bool,
}

impl<'guard, 'a> ScopedInterpreter<'guard, 'a> {
    /// Leave the scope, returning the first destructor error.
    pub fn finish(mut self) -> EvalResult<()> {
        self.finished = true;
        match self.interpreter.release_scope() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<'a> Deref for ScopedInterpreter<'_, 'a> {
    type Target = Interpreter<'a>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(error) = self.interpreter.release_scope() {
            warn!(%error, "destructor failed while unwinding a scope");
        }
    }
}

impl<'a> Interpreter<'a> {
    /// Enter a block scope.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_, 'a> {
        self.context.scopes.push(Scope {
            locals: self.context.locals.len(),
            temporaries: self.context.temporaries.len(),
            stack: self.memory.stack_mark(),
        });
        ScopedInterpreter {
            interpreter: self,
            finished: false,
        }
    }

    /// Run `f` in a new block scope.
    pub fn with_scope<T>(
        &mut self,
        f: impl FnOnce(&mut ScopedInterpreter<'_, 'a>) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let mut scoped = self.scoped();
        let value = f(&mut scoped)?;
        scoped.finish()?;
        Ok(value)
    }

    /// Destroy what the innermost scope owns and release its stack.
    fn release_scope(&mut self) -> Option<RuntimeError> {
        let scope = self.context.scopes.pop()?;
        let mut first_error = None;
        while self.context.locals.len() > scope.locals {
            let Some(local) = self.context.locals.pop() else {
                break;
            };
            if !local.owned {
                continue;
            }
            if let Err(error) = self.destroy(local.address, local.type_usage) {
                first_error.get_or_insert(error);
            }
        }
        if let Err(error) = self.destroy_temporaries(scope.temporaries) {
            first_error.get_or_insert(error);
        }
        self.memory.release_stack(scope.stack);
        first_error
    }
}
