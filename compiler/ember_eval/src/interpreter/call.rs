//! Function calls.
//!
//! Arguments are evaluated in the caller's frame. A reference parameter
//! binds to the argument's storage, a struct passed by value is copied into
//! a temporary owned by the caller's full expression, and a scalar carries
//! its converted bytes. Script functions then get a frame of their own;
//! native functions run in the caller's.

use ember_diagnostic::RuntimeErrorKind;
use ember_ir::{Expr, FunctionId, ScriptFunction, TypeUsage};
use ember_types::{Callable, Function};
use ember_value::{Address, NativeCall, NativeFn, Value};
use tracing::trace;

use super::Interpreter;
use crate::context::Frame;
use crate::{CallFrame, EvalResult, Flow, LocalSlot};

/// An argument bound to a parameter.
#[derive(Clone, Debug)]
pub(crate) enum Argument {
    /// Storage the parameter refers to: a referenced object or the copy of
    /// a struct passed by value.
    Object {
        address: Address,
        type_usage: TypeUsage,
    },
    /// Converted bytes of a scalar passed by value.
    Scalar(Value),
}

impl Interpreter<'_> {
    /// Evaluate the arguments of `function`, then invoke it.
    pub(crate) fn call(
        &mut self,
        function: FunctionId,
        this: Address,
        args: &[Expr],
        destination: Option<Address>,
    ) -> EvalResult<Value> {
        let registry = self.registry;
        let parameters = &registry.function(function).parameters;
        let mut arguments = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            arguments.push(self.argument(parameters.get(index).copied(), arg)?);
        }
        self.invoke(function, this, arguments, destination)
    }

    fn argument(&mut self, parameter: Option<TypeUsage>, arg: &Expr) -> EvalResult<Argument> {
        let Some(parameter) = parameter else {
            // Extra arguments of a variadic function keep their own type.
            return self.variadic_argument(arg);
        };
        let usage = parameter.value_usage();
        if parameter.is_reference() {
            let address = if self.binds_directly(arg) {
                self.eval_place(arg)?
            } else {
                self.temporary(usage, |interpreter, address| interpreter.initialize(address, usage, arg))?
            };
            return Ok(Argument::Object {
                address,
                type_usage: usage,
            });
        }
        if self.registry.is_struct_value(usage) {
            let address =
                self.temporary(usage, |interpreter, address| interpreter.initialize(address, usage, arg))?;
            return Ok(Argument::Object {
                address,
                type_usage: usage,
            });
        }
        let value = self.eval(arg)?;
        let bytes = self.converted_bytes(&value, usage)?;
        Ok(Argument::Scalar(Value::from_bytes(usage, &bytes)))
    }

    fn variadic_argument(&mut self, arg: &Expr) -> EvalResult<Argument> {
        let usage = arg.type_usage.value_usage();
        if usage.is_array() {
            let address = self.eval_place(arg)?;
            return Ok(Argument::Scalar(Value::of(usage.element().pointer_to(), address)));
        }
        if self.registry.is_struct_value(usage) {
            let address = self.eval_place(arg)?;
            return Ok(Argument::Object {
                address,
                type_usage: usage,
            });
        }
        let value = self.eval(arg)?;
        Ok(Argument::Scalar(value.detached(self.memory)?))
    }

    /// Bind values supplied by the host to the parameters of `function`.
    pub(crate) fn host_arguments(&mut self, function: FunctionId, args: &[Value]) -> EvalResult<Vec<Argument>> {
        let registry = self.registry;
        let parameters = &registry.function(function).parameters;
        let mut arguments = Vec::with_capacity(args.len());
        for (index, value) in args.iter().enumerate() {
            let Some(parameter) = parameters.get(index).copied() else {
                arguments.push(Argument::Scalar(value.detached(self.memory)?));
                continue;
            };
            let usage = parameter.value_usage();
            let source = match value.address() {
                Some(address) => address,
                None => {
                    let bytes = value.bytes(self.memory)?.to_vec();
                    let address = self.stack_slot(value.type_usage.value_usage())?;
                    self.memory.write(address, &bytes)?;
                    address
                }
            };
            let from = value.type_usage.value_usage();
            let argument = if parameter.is_reference() && self.registry.scalar_kind(from) == self.registry.scalar_kind(usage) {
                Argument::Object {
                    address: source,
                    type_usage: usage,
                }
            } else if parameter.is_reference() || self.registry.is_struct_value(usage) {
                let address = self.temporary(usage, |interpreter, address| {
                    interpreter.convert_object(address, usage, source, from)
                })?;
                Argument::Object {
                    address,
                    type_usage: usage,
                }
            } else {
                let copy = Value::from_bytes(from, self.memory.read(source, self.registry.size_of(from) as usize)?);
                Argument::Scalar(Value::from_bytes(usage, &self.converted_bytes(&copy, usage)?))
            };
            arguments.push(argument);
        }
        Ok(arguments)
    }

    /// Invoke `function` with bound arguments. A struct returned by value is
    /// built in `destination`, or in a new temporary without one.
    pub(crate) fn invoke(
        &mut self,
        id: FunctionId,
        this: Address,
        arguments: Vec<Argument>,
        destination: Option<Address>,
    ) -> EvalResult<Value> {
        let registry = self.registry;
        let function = registry.function(id);
        let return_type = function.return_type;
        let returns_struct =
            !return_type.is_reference() && registry.is_struct_value(return_type.value_usage());
        let result_slot = match (returns_struct, destination) {
            (false, _) => None,
            (true, Some(destination)) => Some(destination),
            (true, None) => Some(self.stack_slot(return_type)?),
        };
        trace!(function = %registry.function_name(id), "call");

        let value = match &function.callable {
            Callable::Unbound => {
                return Err(RuntimeErrorKind::MissingFunctionImplementation {
                    function: registry.function_name(id),
                }
                .into())
            }
            Callable::Native(native) => {
                let value = self.call_native(*native, function, this, &arguments, result_slot)?;
                if function.is_constructor() {
                    if let Some(owner) = function.owner {
                        self.memory.record_object(this, owner);
                    }
                }
                value
            }
            Callable::Script(script) => self.call_script(id, function, script, this, arguments, result_slot)?,
        };

        if let (Some(slot), None) = (result_slot, destination) {
            self.register_temporary(slot, return_type);
        }
        Ok(value)
    }

    fn call_native(
        &mut self,
        native: NativeFn,
        function: &Function,
        this: Address,
        arguments: &[Argument],
        result_slot: Option<Address>,
    ) -> EvalResult<Value> {
        let values: Vec<Value> = arguments
            .iter()
            .map(|argument| match argument {
                Argument::Object {
                    address,
                    type_usage,
                } => Value::external(*type_usage, *address, self.registry.size_of(*type_usage) as usize),
                Argument::Scalar(value) => value.clone(),
            })
            .collect();
        let return_type = function.return_type;
        let usage = return_type.value_usage();
        let size = self.registry.size_of(usage) as usize;
        let mut result = match result_slot {
            Some(slot) => Value::external(usage, slot, size),
            None => Value::uninitialized(usage),
        };
        native(&mut NativeCall::new(self.memory, this, &values, &mut result))?;

        if return_type.is_void() {
            return Ok(Value::void());
        }
        if return_type.is_reference() {
            return match result.address() {
                Some(_) => Ok(result),
                None => Err(RuntimeErrorKind::InvalidMemoryAccess.into()),
            };
        }
        if result.address().is_some() {
            return Ok(result);
        }
        let mut bytes = result.bytes(self.memory)?.to_vec();
        bytes.resize(size, 0);
        Ok(Value::from_bytes(usage, &bytes))
    }

    fn call_script(
        &mut self,
        id: FunctionId,
        function: &Function,
        script: &ScriptFunction,
        this: Address,
        arguments: Vec<Argument>,
        result_slot: Option<Address>,
    ) -> EvalResult<Value> {
        self.context.call_stack.push(CallFrame {
            program: script.program,
            function: Some(id),
            line: function.line,
        })?;
        self.context.frames.push(Frame {
            function: Some(id),
            this,
            locals_base: self.context.locals.len(),
            return_slot: result_slot,
            return_value: None,
        });
        let result = self.with_scope(|scoped| {
            scoped.bind_parameters(function, script, arguments)?;
            if function.is_constructor() {
                if let Some(owner) = function.owner {
                    scoped.construct_subobjects(this, owner, &script.member_initializers)?;
                }
            }
            scoped.execute(&script.body).map(|flow| flow == Flow::Return)
        });
        let frame = self.context.frames.pop();
        self.context.call_stack.pop();
        result?;

        if let Some(value) = frame.and_then(|frame| frame.return_value) {
            return Ok(value);
        }
        // Control reached the end of the body without a `return`.
        let return_type = function.return_type;
        let usage = return_type.value_usage();
        let size = self.registry.size_of(usage) as usize;
        if return_type.is_void() {
            Ok(Value::void())
        } else if return_type.is_reference() {
            Err(RuntimeErrorKind::InvalidMemoryAccess.into())
        } else if let Some(slot) = result_slot {
            self.default_construct(slot, usage)?;
            Ok(Value::external(usage, slot, size))
        } else {
            Ok(Value::from_bytes(usage, &vec![0; size]))
        }
    }

    fn bind_parameters(
        &mut self,
        function: &Function,
        script: &ScriptFunction,
        arguments: Vec<Argument>,
    ) -> EvalResult<()> {
        let bindings = script.parameters.iter().zip(&function.parameters).zip(arguments);
        for ((&name, &parameter), argument) in bindings {
            let usage = parameter.value_usage();
            let address = match argument {
                Argument::Object { address, .. } => address,
                Argument::Scalar(value) => {
                    let bytes = value.bytes(self.memory)?.to_vec();
                    let address = self.stack_slot(usage)?;
                    self.memory.write(address, &bytes)?;
                    address
                }
            };
            self.context.declare(LocalSlot {
                name,
                type_usage: usage,
                address,
                owned: false,
            });
        }
        Ok(())
    }
}
