//! Object storage and lifetime: stack slots, construction, copies and
//! destruction.
//!
//! Every constructed struct object is recorded in memory with its complete
//! type, which is what `dynamic_cast` consults.

use ember_diagnostic::RuntimeErrorKind;
use ember_ir::{Expr, ExprKind, FunctionId, MemberInitializer, TypeId, TypeUsage};
use ember_value::{Address, Number, Value};

use super::call::Argument;
use super::Interpreter;
use crate::context::Temporary;
use crate::EvalResult;

/// Address of element `index` of an array whose elements are `size` bytes.
pub(crate) fn element_address(base: Address, index: u32, size: u32) -> Address {
    base.offset_by(i64::from(index) * i64::from(size))
}

impl Interpreter<'_> {
    /// Fresh zeroed stack storage for an object of `usage`.
    pub(crate) fn stack_slot(&mut self, usage: TypeUsage) -> EvalResult<Address> {
        let size = self.registry.size_of(usage) as usize;
        let alignment = self.registry.alignment_of(usage) as usize;
        Ok(self.memory.push_stack(size, alignment)?)
    }

    /// Stack storage initialized by `init`, registered for destruction at
    /// the end of the enclosing full expression once `init` succeeds.
    pub(crate) fn temporary(
        &mut self,
        usage: TypeUsage,
        init: impl FnOnce(&mut Self, Address) -> EvalResult<()>,
    ) -> EvalResult<Address> {
        let address = self.stack_slot(usage)?;
        init(self, address)?;
        self.register_temporary(address, usage);
        Ok(address)
    }

    pub(crate) fn register_temporary(&mut self, address: Address, usage: TypeUsage) {
        if self.needs_destruction(usage) {
            self.context.temporaries.push(Temporary {
                address,
                type_usage: usage,
            });
        }
    }

    /// Address of the object `expr` designates. An rvalue scalar is spilled
    /// to the stack first.
    pub(crate) fn eval_place(&mut self, expr: &Expr) -> EvalResult<Address> {
        let value = self.eval(expr)?;
        if let Some(address) = value.address() {
            return Ok(address);
        }
        let bytes = value.bytes(self.memory)?.to_vec();
        let alignment = self.registry.alignment_of(value.type_usage) as usize;
        let address = self.memory.push_stack(bytes.len(), alignment)?;
        self.memory.write(address, &bytes)?;
        Ok(address)
    }

    /// Whether `expr` names an object a reference can bind to without a
    /// temporary. A conversion to a base class still designates the
    /// original object.
    pub(crate) fn binds_directly(&self, expr: &Expr) -> bool {
        if expr.is_lvalue() {
            return true;
        }
        match &expr.kind {
            ExprKind::Cast { operand, .. } => {
                self.registry.is_struct_value(expr.type_usage.value_usage())
                    && self.binds_directly(operand)
            }
            _ => false,
        }
    }

    /// Write `value` into storage of `usage`, converting between scalar
    /// kinds when they differ.
    pub(crate) fn store(&mut self, destination: Address, usage: TypeUsage, value: &Value) -> EvalResult<()> {
        let bytes = self.converted_bytes(value, usage)?;
        self.memory.write(destination, &bytes)?;
        Ok(())
    }

    pub(crate) fn converted_bytes(&self, value: &Value, usage: TypeUsage) -> EvalResult<Vec<u8>> {
        let bytes = value.bytes(self.memory)?;
        let from = self.registry.scalar_kind(value.type_usage.value_usage());
        let to = self.registry.scalar_kind(usage.value_usage());
        if let (Some(from), Some(to)) = (from, to) {
            if from != to {
                return Ok(Number::read(from, bytes).to_bytes(to));
            }
        }
        let mut bytes = bytes.to_vec();
        bytes.resize(self.registry.size_of(usage.value_usage()) as usize, 0);
        Ok(bytes)
    }

    /// Initialize the object of `usage` at `destination` from `expr`.
    ///
    /// Constructions, initializer lists and calls returning a struct by
    /// value build the object in place; any other struct expression is
    /// copied from the object it designates.
    pub(crate) fn initialize(&mut self, destination: Address, usage: TypeUsage, expr: &Expr) -> EvalResult<()> {
        let usage = usage.value_usage();
        if usage.is_array() {
            if let ExprKind::InitializerList(items) = &expr.kind {
                return self.initialize_array(destination, usage, items);
            }
            let source = self.eval_place(expr)?;
            let size = self.registry.size_of(usage) as usize;
            self.memory.copy(destination, source, size)?;
            return Ok(());
        }
        if !self.registry.is_struct_value(usage) {
            let value = self.eval(expr)?;
            return self.store(destination, usage, &value);
        }
        match &expr.kind {
            ExprKind::Construction { constructor, args } => {
                self.construct(destination, usage.type_id, *constructor, args)
            }
            ExprKind::InitializerList(items) => self.initialize_aggregate(destination, usage.type_id, items),
            ExprKind::Call { function, args } if !expr.type_usage.is_reference() => {
                self.call(*function, Address::NULL, args, Some(destination))?;
                Ok(())
            }
            ExprKind::MethodCall {
                object,
                method,
                args,
                through_pointer,
            } if !expr.type_usage.is_reference() => {
                let this = self.object_address(object, *through_pointer)?;
                self.call(*method, this, args, Some(destination))?;
                Ok(())
            }
            ExprKind::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let branch = if self.truthy(condition)? { if_true } else { if_false };
                self.initialize(destination, usage, branch)
            }
            _ => {
                let source = self.eval_place(expr)?;
                self.copy_construct(destination, usage.type_id, source)
            }
        }
    }

    /// Elements without an initializer are default-constructed.
    fn initialize_array(&mut self, destination: Address, usage: TypeUsage, items: &[Expr]) -> EvalResult<()> {
        let element = usage.element();
        let size = self.registry.size_of(element);
        let mut index = 0;
        for item in items.iter().take(usage.array_size as usize) {
            self.initialize(element_address(destination, index, size), element, item)?;
            index += 1;
        }
        for index in index..usage.array_size {
            self.default_construct(element_address(destination, index, size), element)?;
        }
        Ok(())
    }

    /// Members in declaration order; the rest, and all bases, are
    /// default-constructed.
    fn initialize_aggregate(&mut self, destination: Address, type_id: TypeId, items: &[Expr]) -> EvalResult<()> {
        let registry = self.registry;
        let Some(data) = registry.type_info(type_id).as_struct() else {
            return Ok(());
        };
        for base in &data.bases {
            self.default_construct(destination.offset_by(i64::from(base.offset)), TypeUsage::of(base.type_id))?;
        }
        for (index, member) in data.members.iter().enumerate() {
            let address = destination.offset_by(i64::from(member.offset));
            match items.get(index) {
                Some(item) => self.initialize(address, member.type_usage, item)?,
                None => self.default_construct(address, member.type_usage)?,
            }
        }
        self.memory.record_object(destination, type_id);
        Ok(())
    }

    /// Run a constructor, or without one default-construct (no arguments)
    /// or copy (one argument of the type).
    pub(crate) fn construct(
        &mut self,
        destination: Address,
        type_id: TypeId,
        constructor: Option<FunctionId>,
        args: &[Expr],
    ) -> EvalResult<()> {
        let usage = TypeUsage::of(type_id);
        match (constructor, args) {
            (Some(constructor), args) => {
                self.call(constructor, destination, args, None)?;
                Ok(())
            }
            (None, []) => self.default_construct(destination, usage),
            (None, [source]) => self.initialize(destination, usage, source),
            (None, _) => Err(RuntimeErrorKind::custom(format!(
                "no constructor of '{}' takes {} arguments",
                self.registry.type_usage_name(usage),
                args.len()
            ))
            .into()),
        }
    }

    /// Default-initialize: the default constructor for structs that have
    /// one, member-wise construction for those that don't, zero for
    /// everything else.
    pub(crate) fn default_construct(&mut self, destination: Address, usage: TypeUsage) -> EvalResult<()> {
        let usage = usage.value_usage();
        let size = self.registry.size_of(usage);
        if usage.is_array() {
            let element = usage.element();
            if !self.registry.is_struct_value(element) {
                self.memory.fill(destination, size as usize, 0)?;
                return Ok(());
            }
            let element_size = self.registry.size_of(element);
            for index in 0..usage.array_size {
                self.default_construct(element_address(destination, index, element_size), element)?;
            }
            return Ok(());
        }
        if !self.registry.is_struct_value(usage) {
            self.memory.fill(destination, size as usize, 0)?;
            return Ok(());
        }
        if let Some(constructor) = self.registry.default_constructor(usage.type_id) {
            self.invoke(constructor, destination, Vec::new(), None)?;
            return Ok(());
        }
        self.memory.fill(destination, size as usize, 0)?;
        self.construct_subobjects(destination, usage.type_id, &[])
    }

    /// Construct bases then members from a constructor's initializer list.
    /// A base is initialized by the entry at its offset naming its type;
    /// anything without an entry is default-constructed.
    pub(crate) fn construct_subobjects(
        &mut self,
        this: Address,
        type_id: TypeId,
        initializers: &[MemberInitializer],
    ) -> EvalResult<()> {
        let registry = self.registry;
        let Some(data) = registry.type_info(type_id).as_struct() else {
            return Ok(());
        };
        let is_base_entry = |entry: &MemberInitializer| {
            data.bases
                .iter()
                .any(|base| base.offset == entry.offset && base.type_id == entry.type_usage.type_id)
                && !entry.type_usage.is_pointer()
                && registry.is_struct_value(entry.type_usage)
        };
        for base in &data.bases {
            let address = this.offset_by(i64::from(base.offset));
            let usage = TypeUsage::of(base.type_id);
            let entry = initializers
                .iter()
                .find(|entry| entry.offset == base.offset && entry.type_usage.type_id == base.type_id && is_base_entry(entry));
            match entry {
                Some(entry) => self.initialize(address, usage, &entry.initializer)?,
                None => self.default_construct(address, usage)?,
            }
        }
        for member in &data.members {
            let address = this.offset_by(i64::from(member.offset));
            let entry = initializers
                .iter()
                .find(|entry| entry.offset == member.offset && !is_base_entry(entry));
            match entry {
                Some(entry) => self.initialize(address, member.type_usage, &entry.initializer)?,
                None => self.default_construct(address, member.type_usage)?,
            }
        }
        self.memory.record_object(this, type_id);
        Ok(())
    }

    /// Copy-construct from the object at `source`: through the copy
    /// constructor when the type has one, byte-wise otherwise.
    pub(crate) fn copy_construct(&mut self, destination: Address, type_id: TypeId, source: Address) -> EvalResult<()> {
        if let Some(constructor) = self.registry.copy_constructor(type_id) {
            let argument = Argument::Object {
                address: source,
                type_usage: TypeUsage::of(type_id),
            };
            self.invoke(constructor, destination, vec![argument], None)?;
            return Ok(());
        }
        let size = self.registry.type_info(type_id).size as usize;
        if destination != source {
            self.memory.copy(destination, source, size)?;
        }
        self.memory.record_object(destination, type_id);
        Ok(())
    }

    /// Initialize an object of `usage` from the object of `from` at
    /// `source`, converting scalars and slicing derived objects.
    pub(crate) fn convert_object(
        &mut self,
        destination: Address,
        usage: TypeUsage,
        source: Address,
        from: TypeUsage,
    ) -> EvalResult<()> {
        if self.registry.is_struct_value(usage) {
            let offset = self.registry.base_offset(from.type_id, usage.type_id).unwrap_or(0);
            return self.copy_construct(destination, usage.type_id, source.offset_by(i64::from(offset)));
        }
        let size = self.registry.size_of(from) as usize;
        let value = Value::from_bytes(from, self.memory.read(source, size)?);
        self.store(destination, usage, &value)
    }

    /// Whether destroying an object of `usage` runs any destructor.
    pub(crate) fn needs_destruction(&mut self, usage: TypeUsage) -> bool {
        if usage.is_pointer() || usage.is_reference() {
            return false;
        }
        let type_id = usage.type_id;
        if let Some(&cached) = self.destructible.get(&type_id) {
            return cached;
        }
        let registry = self.registry;
        let Some(data) = registry.type_info(type_id).as_struct() else {
            return false;
        };
        let needed = data.destructor.is_some()
            || data
                .bases
                .iter()
                .any(|base| self.needs_destruction(TypeUsage::of(base.type_id)))
            || data
                .members
                .iter()
                .any(|member| self.needs_destruction(member.type_usage));
        self.destructible.insert(type_id, needed);
        needed
    }

    /// Destroy the object of `usage` at `address`: array elements last to
    /// first; for a struct its destructor, then members and bases in
    /// reverse order.
    pub(crate) fn destroy(&mut self, address: Address, usage: TypeUsage) -> EvalResult<()> {
        if !self.needs_destruction(usage) {
            return Ok(());
        }
        if usage.is_array() {
            let element = usage.element();
            let size = self.registry.size_of(element);
            for index in (0..usage.array_size).rev() {
                self.destroy(element_address(address, index, size), element)?;
            }
            return Ok(());
        }
        let registry = self.registry;
        let Some(data) = registry.type_info(usage.type_id).as_struct() else {
            return Ok(());
        };
        if let Some(destructor) = data.destructor {
            self.invoke(destructor, address, Vec::new(), None)?;
        }
        for member in data.members.iter().rev() {
            self.destroy(address.offset_by(i64::from(member.offset)), member.type_usage)?;
        }
        for base in data.bases.iter().rev() {
            self.destroy(address.offset_by(i64::from(base.offset)), TypeUsage::of(base.type_id))?;
        }
        self.memory.forget_object(address);
        Ok(())
    }
}
