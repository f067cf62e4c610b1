//! The tree-walking interpreter.
//!
//! Expressions evaluate to [`Value`]s. An lvalue evaluates to an external
//! value aliasing its storage, so assignment and `&` work on the same
//! result; an rvalue scalar carries its own bytes. Struct rvalues are
//! always materialized in stack storage.
//!
//! Statement execution returns a [`Flow`] so `break`, `continue` and
//! `return` unwind through nested blocks and release their scopes on the
//! way out.

mod call;
mod cast;
mod expr;
mod object;
mod operators;
mod scope_guard;
mod stmt;

pub use scope_guard::ScopedInterpreter;

use ember_diagnostic::{RuntimeError, RuntimeErrorKind};
use ember_ir::{Expr, FunctionId, Name, Stmt, TypeId};
use ember_types::Registry;
use ember_value::{Address, Memory, Value};
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::context::Frame;
use crate::{CallFrame, EvalResult, ExecutionContext, Flow, Runtime};

/// Executes statements and evaluates expressions of one program against an
/// environment's registry and memory.
pub struct Interpreter<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) memory: &'a mut Memory,
    pub(crate) runtime: &'a mut Runtime,
    pub(crate) context: ExecutionContext,
    program: Name,
    /// Whether objects of a struct type need any destructor to run.
    destructible: FxHashMap<TypeId, bool>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        registry: &'a Registry,
        memory: &'a mut Memory,
        runtime: &'a mut Runtime,
        program: Name,
    ) -> Self {
        let context = ExecutionContext::new(runtime.max_call_depth());
        Interpreter {
            registry,
            memory,
            runtime,
            context,
            program,
            destructible: FxHashMap::default(),
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Run the top-level statements of a program in order.
    #[tracing::instrument(level = "debug", skip_all, fields(program = self.registry.name(self.program)))]
    pub fn execute_program(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        self.at_top_level(|interpreter| {
            interpreter.with_scope(|scoped| {
                for statement in statements {
                    if scoped.execute(statement)? == Flow::Return {
                        break;
                    }
                }
                Ok(())
            })
        })
    }

    /// Evaluate a standalone expression to a value that owns its bytes.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.at_top_level(|interpreter| {
            interpreter.context.call_stack.set_line(expr.line);
            interpreter
                .with_scope(|scoped| {
                    scoped.full_expression(|interpreter| {
                        let value = interpreter.eval(expr)?;
                        Ok(value.detached(interpreter.memory)?)
                    })
                })
                .map_err(|error| interpreter.locate(error, expr.line))
        })
    }

    /// Call a function from the host. Each argument is bound to its
    /// parameter the way a script call would bind a value of the same type;
    /// a reference parameter binds to the argument's storage when it has
    /// one. `this` is null for free and static functions.
    #[tracing::instrument(level = "debug", skip_all, fields(function = %self.registry.function_name(function)))]
    pub fn call_function(
        &mut self,
        function: FunctionId,
        this: Address,
        args: &[Value],
    ) -> EvalResult<Value> {
        self.at_top_level(|interpreter| {
            interpreter
                .with_scope(|scoped| {
                    scoped.full_expression(|interpreter| {
                        let arguments = interpreter.host_arguments(function, args)?;
                        let value = interpreter.invoke(function, this, arguments, None)?;
                        Ok(value.detached(interpreter.memory)?)
                    })
                })
                .map_err(|error| interpreter.locate(error, 0))
        })
    }

    /// Run `f` inside the frame that stands for the program itself.
    fn at_top_level<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.context
            .call_stack
            .push(CallFrame {
                program: self.program,
                function: None,
                line: 0,
            })
            .map_err(|kind| self.locate(kind.into(), 0))?;
        self.context.frames.push(Frame {
            function: None,
            this: Address::NULL,
            locals_base: self.context.locals.len(),
            return_slot: None,
            return_value: None,
        });
        let result = f(self);
        self.context.frames.pop();
        self.context.call_stack.pop();
        result
    }

    /// Attribute an error to `line` and capture the call stack, unless a
    /// deeper statement already did.
    pub(crate) fn locate(&self, mut error: RuntimeError, line: u32) -> RuntimeError {
        if !error.is_located() {
            error.line = line;
            error.call_stack = self.context.call_stack.capture(self.registry);
        }
        error
    }

    /// Run `f` as one full expression: struct temporaries it creates are
    /// destroyed, and the stack it pushes is released, when it returns.
    pub(crate) fn full_expression<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let temporaries = self.context.temporaries.len();
        let stack = self.memory.stack_mark();
        let result = f(self);
        let cleanup = self.destroy_temporaries(temporaries);
        self.memory.release_stack(stack);
        match (result, cleanup) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(error)) => Err(error),
            (Err(error), cleanup) => {
                if let Err(cleanup) = cleanup {
                    warn!(%cleanup, "destructor failed while unwinding");
                }
                Err(error)
            }
        }
    }

    /// Destroy temporaries registered after the first `keep`, newest first.
    /// Every one is destroyed even if some fail; the first error is kept.
    pub(crate) fn destroy_temporaries(&mut self, keep: usize) -> EvalResult<()> {
        let mut first_error = None;
        while self.context.temporaries.len() > keep {
            let Some(temporary) = self.context.temporaries.pop() else {
                break;
            };
            if let Err(error) = self.destroy(temporary.address, temporary.type_usage) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Error for a name the parser resolved but the evaluator cannot find.
fn unresolved(what: &str, name: &str) -> RuntimeError {
    RuntimeErrorKind::custom(format!("unresolved {what} '{name}'")).into()
}
