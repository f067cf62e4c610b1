//! The embedder-facing environment: one registry, one memory and the
//! state shared by every program loaded into it.

use ember_diagnostic::{Diagnostic, RuntimeError, RuntimeErrorKind};
use ember_eval::{HookContext, Interpreter, Runtime};
use ember_ir::{FunctionId, NamespaceId, Settings, TypeId, TypeUsage};
use ember_lexer::{Macro, MacroTable};
use ember_parse::{parse_expression, parse_program};
use ember_types::Registry;
use ember_value::{Address, Memory, Scalar, Value};
use tracing::{debug, info};

use crate::EnvironmentBuilder;

/// Program name reported for errors in standalone expressions.
const EXPRESSION_PROGRAM: &str = "expression";

/// An interpreter instance.
///
/// Everything loaded into an environment shares its registry: types,
/// functions and globals declared by one program are visible to every
/// later program, expression and host call.
pub struct Environment {
    registry: Registry,
    memory: Memory,
    runtime: Runtime,
    macros: MacroTable,
    settings: Settings,
    error_message: String,
}

impl Environment {
    /// An environment with default settings and limits.
    pub fn new() -> Self {
        EnvironmentBuilder::new().build()
    }

    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub(crate) fn with_limits(settings: Settings, stack_capacity: usize, max_call_depth: usize) -> Self {
        debug!(?settings, stack_capacity, max_call_depth, "environment created");
        Environment {
            registry: Registry::new(),
            memory: Memory::new(stack_capacity),
            runtime: Runtime::new(max_call_depth),
            macros: MacroTable::new(),
            settings,
            error_message: String::new(),
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct access for registrations the convenience methods do not
    /// cover.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Registry, &mut Memory) {
        (&mut self.registry, &mut self.memory)
    }

    // Loading and evaluation

    /// Preprocess, parse and execute a program. On failure returns `false`
    /// and records the message returned by [`error_message`](Self::error_message).
    ///
    /// Declarations registered before the failing point stay registered.
    pub fn load(&mut self, name: &str, code: &str) -> bool {
        self.error_message.clear();
        let result = self.try_load(name, code);
        self.record(result).is_some()
    }

    #[tracing::instrument(level = "debug", skip(self, code))]
    pub fn try_load(&mut self, name: &str, code: &str) -> Result<(), Diagnostic> {
        let source =
            ember_lexer::preprocess(code, &mut self.macros).map_err(|e| Diagnostic::new(name, e))?;
        let program = parse_program(
            &mut self.registry,
            &mut self.memory,
            self.settings,
            name,
            source,
        )
        .map_err(|e| Diagnostic::new(name, e))?;
        info!(
            statements = program.statements.len(),
            functions = program.function_count(),
            "program loaded"
        );
        let program_name = self.registry.intern(name);
        Interpreter::new(&self.registry, &mut self.memory, &mut self.runtime, program_name)
            .execute_program(&program.statements)
            .map_err(|e| Diagnostic::new(name, e))
    }

    /// Evaluate an expression in the global scope into `out`.
    pub fn evaluate_expression(&mut self, expr: &str, out: &mut Value) -> bool {
        self.error_message.clear();
        let result = self.try_evaluate(expr);
        match self.record(result) {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    /// Evaluate an expression in the global scope. The value owns its
    /// bytes.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn try_evaluate(&mut self, expr: &str) -> Result<Value, Diagnostic> {
        let source = ember_lexer::preprocess(expr, &mut self.macros)
            .map_err(|e| Diagnostic::new(EXPRESSION_PROGRAM, e))?;
        let parsed = parse_expression(&mut self.registry, &mut self.memory, self.settings, &source)
            .map_err(|e| Diagnostic::new(EXPRESSION_PROGRAM, e))?;
        let program = self.registry.intern(EXPRESSION_PROGRAM);
        Interpreter::new(&self.registry, &mut self.memory, &mut self.runtime, program)
            .evaluate(&parsed)
            .map_err(|e| Diagnostic::new(EXPRESSION_PROGRAM, e))
    }

    /// Message of the last failed call, empty after a successful one.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    fn record<T>(&mut self, result: Result<T, Diagnostic>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(diagnostic) => {
                debug!(%diagnostic, "call failed");
                self.error_message = diagnostic.to_string();
                None
            }
        }
    }

    // Host calls

    /// Call a function with host values. `this` is the object of a method
    /// call and null otherwise.
    pub fn try_call(&mut self, function: FunctionId, this: Address, args: &[Value]) -> Result<Value, Diagnostic> {
        let name = self.registry.function_name(function);
        let target = self.registry.function(function);
        let expected = target.parameters.len();
        let arity_ok = if target.is_variadic() {
            args.len() >= expected
        } else {
            args.len() == expected
        };
        if !arity_ok {
            let kind = RuntimeErrorKind::custom(format!(
                "'{name}' takes {expected} argument(s), {} given",
                args.len()
            ));
            return Err(Diagnostic::new(name, RuntimeError::from(kind)));
        }
        let program = self.registry.intern(&name);
        Interpreter::new(&self.registry, &mut self.memory, &mut self.runtime, program)
            .call_function(function, this, args)
            .map_err(|e| Diagnostic::new(name, e))
    }

    /// Call a function for its side effects.
    pub fn void_function_call(&mut self, function: FunctionId, args: &[Value]) -> bool {
        self.error_message.clear();
        let result = self.try_call(function, Address::NULL, args);
        self.record(result).is_some()
    }

    /// Call a function and decode its scalar result as `T`, which must have
    /// the size of the declared return type.
    pub fn return_function_call<T: Scalar>(&mut self, function: FunctionId, args: &[Value]) -> Option<T> {
        self.error_message.clear();
        let result = self.try_call(function, Address::NULL, args).and_then(|value| {
            if value.len() != T::SIZE {
                let name = self.registry.function_name(function);
                let kind = RuntimeErrorKind::custom(format!(
                    "'{name}' returns {} byte(s), requested {}",
                    value.len(),
                    T::SIZE
                ));
                return Err(Diagnostic::new(name, RuntimeError::from(kind)));
            }
            value
                .read::<T>(&self.memory)
                .map_err(|kind| Diagnostic::new(self.registry.function_name(function), RuntimeError::from(kind)))
        });
        self.record(result)
    }

    /// Decode a scalar value.
    pub fn read<T: Scalar>(&self, value: &Value) -> Result<T, RuntimeErrorKind> {
        value.read(&self.memory)
    }

    // Lookups

    /// Type by (possibly qualified) name.
    pub fn get_type(&self, name: &str) -> Option<TypeId> {
        self.registry.get_type(NamespaceId::GLOBAL, name)
    }

    /// First registered overload of a function or static method.
    pub fn get_function(&self, name: &str) -> Option<FunctionId> {
        self.get_functions(name).first().copied()
    }

    /// Every overload of a function or static method, in registration
    /// order.
    pub fn get_functions(&self, name: &str) -> Vec<FunctionId> {
        self.registry.get_functions(NamespaceId::GLOBAL, name)
    }

    /// The overload of `name` whose parameters take exactly `parameters`,
    /// with no implicit conversion. Typedef spellings of the same type
    /// count as exact.
    pub fn get_function_overload(&self, name: &str, parameters: &[TypeUsage]) -> Option<FunctionId> {
        self.registry
            .select_perfect_overload(&self.get_functions(name), parameters, &[])
    }

    /// A global or static member, aliasing its storage. A reference global
    /// aliases the object it refers to.
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        let (_, instance) = self.registry.get_instance(NamespaceId::GLOBAL, name)?;
        let usage = instance.type_usage;
        if usage.is_reference() {
            let target: Address = self.memory.read_scalar(instance.address).ok()?;
            let len = self.registry.size_of(usage.value_usage()) as usize;
            return Some(Value::external(usage, target, len));
        }
        Some(instance.value())
    }

    /// Current value of a scalar global.
    pub fn get_instance_value<T: Scalar>(&self, name: &str) -> Option<T> {
        self.get_variable(name)?.read(&self.memory).ok()
    }

    // Preprocessor

    pub fn define_macro(&mut self, name: &str, definition: Macro) {
        debug!(name, "macro defined");
        self.macros.define(name, definition);
    }

    pub fn undefine_macro(&mut self, name: &str) -> bool {
        self.macros.undefine(name)
    }

    // Execution hook

    /// Run `hook` before every statement. Returning an error aborts the
    /// running load or call with that error.
    pub fn set_execution_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&HookContext<'_>) -> Result<(), RuntimeErrorKind> + 'static,
    {
        self.runtime.set_hook(Some(Box::new(hook)));
    }

    pub fn clear_execution_hook(&mut self) {
        self.runtime.set_hook(None);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
