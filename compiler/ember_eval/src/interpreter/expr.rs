//! Expression evaluation.

use ember_diagnostic::RuntimeErrorKind;
use ember_ir::{BinaryOp, Expr, ExprKind, InstanceRef, Literal, TypeUsage, UnaryOp};
use ember_stack::ensure_sufficient_stack;
use ember_value::{Address, Number, ScalarKind, Value};

use super::operators::{arithmetic, compare, unary};
use super::{unresolved, Interpreter};
use crate::EvalResult;

fn is_pointer_like(usage: TypeUsage) -> bool {
    usage.is_pointer() || usage.is_array()
}

impl Interpreter<'_> {
    /// Evaluate `expr`. Lvalues alias their storage; struct rvalues live in
    /// temporaries of the enclosing full expression.
    pub(crate) fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        ensure_sufficient_stack(|| self.eval_kind(expr))
    }

    fn eval_kind(&mut self, expr: &Expr) -> EvalResult<Value> {
        let usage = expr.type_usage.value_usage();
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(self.literal(usage, *literal)),
            ExprKind::NullPointer => Ok(Value::of(usage, Address::NULL)),
            ExprKind::Local(name) => {
                let local = self
                    .context
                    .local(*name)
                    .copied()
                    .ok_or_else(|| unresolved("local", self.registry.name(*name)))?;
                Ok(self.object(usage, local.address))
            }
            ExprKind::Global(instance) => {
                let address = self.global_address(*instance)?;
                Ok(self.object(usage, address))
            }
            ExprKind::This => Ok(Value::of(usage, self.context.this())),
            ExprKind::Member {
                object,
                offset,
                through_pointer,
                ..
            } => {
                let base = self.object_address(object, *through_pointer)?;
                let mut address = base.offset_by(i64::from(*offset));
                if expr.type_usage.is_reference() {
                    address = self.memory.read_scalar(address)?;
                    if address.is_null() {
                        return Err(RuntimeErrorKind::NullPointerAccess.into());
                    }
                }
                Ok(self.object(usage, address))
            }
            ExprKind::ArrayElement { array, index } => self.array_element(usage, array, index),
            ExprKind::Unary { op, operand } => self.eval_unary(usage, *op, operand),
            ExprKind::Binary { op, left, right } => self.eval_binary(usage, *op, left, right),
            ExprKind::Assignment { op, target, value } => self.eval_assignment(usage, *op, target, value),
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                if self.truthy(condition)? {
                    self.eval(if_true)
                } else {
                    self.eval(if_false)
                }
            }
            ExprKind::Cast {
                kind,
                compatibility,
                operand,
            } => self.eval_cast(usage, *kind, *compatibility, operand),
            ExprKind::Call { function, args } => self.call(*function, Address::NULL, args, None),
            ExprKind::MethodCall {
                object,
                method,
                args,
                through_pointer,
            } => {
                let this = self.object_address(object, *through_pointer)?;
                self.call(*method, this, args, None)
            }
            ExprKind::Construction { constructor, args } => {
                let address = self.temporary(usage, |interpreter, address| {
                    interpreter.construct(address, usage.type_id, *constructor, args)
                })?;
                Ok(self.object(usage, address))
            }
            ExprKind::InitializerList(_) => {
                let address = self.temporary(usage, |interpreter, address| {
                    interpreter.initialize(address, usage, expr)
                })?;
                Ok(self.object(usage, address))
            }
        }
    }

    /// A value aliasing the object of `usage` at `address`.
    fn object(&self, usage: TypeUsage, address: Address) -> Value {
        Value::external(usage, address, self.registry.size_of(usage) as usize)
    }

    fn literal(&self, usage: TypeUsage, literal: Literal) -> Value {
        match literal {
            Literal::Bool(value) => Value::of(usage, value),
            Literal::Integer(bits) => self.number_value(usage, Number::Unsigned(bits)),
            Literal::Float(value) => self.number_value(usage, Number::Float(value)),
            Literal::String(id) => Value::of(usage, self.registry.literal_address(id)),
        }
    }

    /// Storage of a global. A global reference holds the address it is
    /// bound to.
    fn global_address(&self, instance: InstanceRef) -> EvalResult<Address> {
        let found = self
            .registry
            .instance_in(instance.owner, instance.name)
            .ok_or_else(|| unresolved("variable", self.registry.name(instance.name)))?;
        if !found.type_usage.is_reference() {
            return Ok(found.address);
        }
        let address: Address = self.memory.read_scalar(found.address)?;
        if address.is_null() {
            return Err(RuntimeErrorKind::NullPointerAccess.into());
        }
        Ok(address)
    }

    /// The object a member access or method call applies to.
    pub(crate) fn object_address(&mut self, object: &Expr, through_pointer: bool) -> EvalResult<Address> {
        if !through_pointer {
            return self.eval_place(object);
        }
        let address = self.pointer_operand(object)?;
        if address.is_null() {
            return Err(RuntimeErrorKind::NullPointerAccess.into());
        }
        Ok(address)
    }

    /// Address held by a pointer expression; an array decays to its first
    /// element.
    pub(crate) fn pointer_operand(&mut self, expr: &Expr) -> EvalResult<Address> {
        if expr.type_usage.is_array() {
            return self.eval_place(expr);
        }
        let value = self.eval(expr)?;
        Ok(value.read(self.memory)?)
    }

    /// Element access. Indexing a declared array is bounds-checked; indexing
    /// through a pointer only checks for null.
    fn array_element(&mut self, usage: TypeUsage, array: &Expr, index: &Expr) -> EvalResult<Value> {
        let collection = array.type_usage;
        let base = self.pointer_operand(array)?;
        let index = self.eval_number(index)?.as_i64();
        if collection.is_array() {
            if index < 0 || index >= i64::from(collection.array_size) {
                return Err(RuntimeErrorKind::InvalidArrayIndex {
                    index,
                    size: collection.array_size,
                }
                .into());
            }
        } else if base.is_null() {
            return Err(RuntimeErrorKind::NullPointerAccess.into());
        }
        let size = i64::from(self.registry.size_of(usage));
        Ok(self.object(usage, base.offset_by(index * size)))
    }

    /// `expr` read as a number of its own scalar kind. An array reads as
    /// the address of its first element.
    pub(crate) fn eval_number(&mut self, expr: &Expr) -> EvalResult<Number> {
        if expr.type_usage.is_array() {
            return Ok(Number::Unsigned(self.eval_place(expr)?.raw()));
        }
        let value = self.eval(expr)?;
        self.number_of(&value)
    }

    pub(crate) fn number_of(&self, value: &Value) -> EvalResult<Number> {
        let kind = self.kind_of(value.type_usage)?;
        Ok(Number::read(kind, value.bytes(self.memory)?))
    }

    fn kind_of(&self, usage: TypeUsage) -> EvalResult<ScalarKind> {
        self.registry.scalar_kind(usage.value_usage()).ok_or_else(|| {
            RuntimeErrorKind::custom(format!(
                "'{}' is not a scalar type",
                self.registry.type_usage_name(usage)
            ))
            .into()
        })
    }

    pub(crate) fn number_value(&self, usage: TypeUsage, number: Number) -> Value {
        match self.registry.scalar_kind(usage) {
            Some(kind) => Value::from_bytes(usage, &number.to_bytes(kind)),
            None => Value::of(usage, number.as_u64()),
        }
    }

    pub(crate) fn truthy(&mut self, expr: &Expr) -> EvalResult<bool> {
        Ok(self.eval_number(expr)?.is_truthy())
    }

    fn eval_unary(&mut self, usage: TypeUsage, op: UnaryOp, operand: &Expr) -> EvalResult<Value> {
        match op {
            UnaryOp::Plus | UnaryOp::Negate | UnaryOp::BitNot => {
                let number = self.eval_number(operand)?;
                let result = unary(op, self.kind_of(usage)?, number)?;
                Ok(self.number_value(usage, result))
            }
            UnaryOp::Not => Ok(Value::of(usage, !self.truthy(operand)?)),
            UnaryOp::PreIncrement | UnaryOp::PreDecrement => {
                let address = self.eval_place(operand)?;
                self.step(address, usage, op == UnaryOp::PreIncrement)?;
                Ok(self.object(usage, address))
            }
            UnaryOp::PostIncrement | UnaryOp::PostDecrement => {
                let address = self.eval_place(operand)?;
                let size = self.registry.size_of(usage) as usize;
                let previous = Value::from_bytes(usage, self.memory.read(address, size)?);
                self.step(address, usage, op == UnaryOp::PostIncrement)?;
                Ok(previous)
            }
            UnaryOp::Dereference => {
                let address = self.pointer_operand(operand)?;
                if address.is_null() {
                    return Err(RuntimeErrorKind::NullPointerAccess.into());
                }
                Ok(self.object(usage, address))
            }
            UnaryOp::AddressOf => {
                let address = self.eval_place(operand)?;
                Ok(Value::of(usage, address))
            }
        }
    }

    /// Add or subtract one in place. A pointer moves by one element.
    fn step(&mut self, address: Address, usage: TypeUsage, increment: bool) -> EvalResult<()> {
        let delta: i64 = if increment { 1 } else { -1 };
        if usage.is_pointer() {
            let pointer: Address = self.memory.read_scalar(address)?;
            let size = i64::from(self.registry.size_of(usage.pointee()));
            self.memory.write_scalar(address, pointer.offset_by(delta * size))?;
            return Ok(());
        }
        let kind = self.kind_of(usage)?;
        let current = Number::read(kind, self.memory.read(address, kind.size())?);
        let result = arithmetic(BinaryOp::Add, kind, current, Number::Signed(delta))?;
        self.memory.write(address, &result.to_bytes(kind))?;
        Ok(())
    }

    fn eval_binary(&mut self, usage: TypeUsage, op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult<Value> {
        match op {
            BinaryOp::And => {
                let result = self.truthy(left)? && self.truthy(right)?;
                return Ok(Value::of(usage, result));
            }
            BinaryOp::Or => {
                let result = self.truthy(left)? || self.truthy(right)?;
                return Ok(Value::of(usage, result));
            }
            _ => {}
        }
        if is_pointer_like(left.type_usage) || is_pointer_like(right.type_usage) {
            return self.pointer_binary(usage, op, left, right);
        }
        let lhs = self.eval_number(left)?;
        let rhs = self.eval_number(right)?;
        if op.is_comparison() {
            let kind = self.kind_of(left.type_usage)?.common(self.kind_of(right.type_usage)?);
            return Ok(Value::of(usage, compare(op, kind, lhs, rhs)));
        }
        let result = arithmetic(op, self.kind_of(usage)?, lhs, rhs)?;
        Ok(self.number_value(usage, result))
    }

    /// Pointer arithmetic and comparison. Offsets scale by the element
    /// size; the difference of two pointers counts elements.
    fn pointer_binary(&mut self, usage: TypeUsage, op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult<Value> {
        if op.is_comparison() {
            let lhs = self.raw_operand(left)?;
            let rhs = self.raw_operand(right)?;
            let result = compare(op, ScalarKind::POINTER, Number::Unsigned(lhs), Number::Unsigned(rhs));
            return Ok(Value::of(usage, result));
        }
        let left_is_pointer = is_pointer_like(left.type_usage);
        let right_is_pointer = is_pointer_like(right.type_usage);
        if left_is_pointer && right_is_pointer {
            let lhs = self.pointer_operand(left)?;
            let rhs = self.pointer_operand(right)?;
            let size = i64::from(self.registry.size_of(left.type_usage.element()).max(1));
            let difference = (i64::from(lhs.offset()) - i64::from(rhs.offset())) / size;
            return Ok(self.number_value(usage, Number::Signed(difference)));
        }
        let (pointer, offset) = if left_is_pointer { (left, right) } else { (right, left) };
        let address = self.pointer_operand(pointer)?;
        let count = self.eval_number(offset)?.as_i64();
        let count = if op == BinaryOp::Sub { -count } else { count };
        let size = i64::from(self.registry.size_of(pointer.type_usage.element()));
        Ok(Value::of(usage, address.offset_by(count * size)))
    }

    fn raw_operand(&mut self, expr: &Expr) -> EvalResult<u64> {
        if is_pointer_like(expr.type_usage) {
            Ok(self.pointer_operand(expr)?.raw())
        } else {
            Ok(self.eval_number(expr)?.as_u64())
        }
    }

    /// Assignment evaluates the value before the target. A compound
    /// assignment computes in the common kind of both sides and converts
    /// back to the target's type.
    fn eval_assignment(
        &mut self,
        usage: TypeUsage,
        op: Option<BinaryOp>,
        target: &Expr,
        value: &Expr,
    ) -> EvalResult<Value> {
        let size = self.registry.size_of(usage) as usize;
        if self.registry.is_struct_value(usage) || usage.is_array() {
            let source = self.eval_place(value)?;
            let address = self.eval_place(target)?;
            if source != address {
                self.memory.copy(address, source, size)?;
            }
            return Ok(self.object(usage, address));
        }
        let Some(op) = op else {
            let value = self.eval(value)?;
            let bytes = self.converted_bytes(&value, usage)?;
            let address = self.eval_place(target)?;
            self.memory.write(address, &bytes)?;
            return Ok(self.object(usage, address));
        };

        let operand = self.eval_number(value)?;
        let address = self.eval_place(target)?;
        if usage.is_pointer() {
            let pointer: Address = self.memory.read_scalar(address)?;
            let count = operand.as_i64();
            let count = if op == BinaryOp::Sub { -count } else { count };
            let element = i64::from(self.registry.size_of(usage.pointee()));
            self.memory.write_scalar(address, pointer.offset_by(count * element))?;
            return Ok(self.object(usage, address));
        }
        let target_kind = self.kind_of(usage)?;
        let current = Number::read(target_kind, self.memory.read(address, size)?);
        let kind = match op {
            BinaryOp::Shl | BinaryOp::Shr => target_kind.common(target_kind),
            _ => target_kind.common(self.kind_of(value.type_usage)?),
        };
        let result = arithmetic(op, kind, current, operand)?;
        self.memory.write(address, &result.to_bytes(target_kind))?;
        Ok(self.object(usage, address))
    }
}
