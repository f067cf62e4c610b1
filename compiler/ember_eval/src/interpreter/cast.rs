//! Casts and conversions.
//!
//! Converting a pointer between a derived struct and one of its bases
//! moves it by the base's offset. `dynamic_cast` looks up the complete
//! type of the object the pointer designates and yields null when that
//! object has no subobject of the target type.

use ember_ir::{CastKind, Compatibility, Expr, TypeUsage};
use ember_value::{Address, Value};
use tracing::trace;

use super::Interpreter;
use crate::EvalResult;

impl Interpreter<'_> {
    pub(crate) fn eval_cast(
        &mut self,
        target: TypeUsage,
        kind: CastKind,
        compatibility: Compatibility,
        operand: &Expr,
    ) -> EvalResult<Value> {
        trace!(?kind, ?compatibility, "cast");
        let source = operand.type_usage.value_usage();
        if target.is_void() {
            self.eval(operand)?;
            return Ok(Value::void());
        }
        if self.registry.is_struct_value(target) {
            // A slice of the operand: the base subobject of a derived object.
            let address = self.eval_place(operand)?;
            let offset = if self.registry.is_struct_value(source) {
                self.registry
                    .base_offset(source.type_id, target.type_id)
                    .unwrap_or(0)
            } else {
                0
            };
            let size = self.registry.size_of(target) as usize;
            return Ok(Value::external(target, address.offset_by(i64::from(offset)), size));
        }
        if target.is_pointer() {
            let address = if source.is_pointer() || source.is_array() {
                self.pointer_operand(operand)?
            } else {
                Address::from_raw(self.eval_number(operand)?.as_u64())
            };
            let address = match kind {
                CastKind::Dynamic => self.dynamic_pointer(address, source, target),
                CastKind::Reinterpret | CastKind::Const => address,
                CastKind::Static | CastKind::CStyle => {
                    if compatibility == Compatibility::ImplicitCastableInheritance {
                        self.adjust_pointer(address, source, target)
                    } else {
                        address
                    }
                }
            };
            return Ok(Value::of(target, address));
        }
        let number = self.eval_number(operand)?;
        Ok(self.number_value(target, number))
    }

    /// Move a pointer between a struct and one of its bases. Null stays
    /// null.
    fn adjust_pointer(&self, address: Address, source: TypeUsage, target: TypeUsage) -> Address {
        if address.is_null() || source.pointer_level != 1 || target.pointer_level != 1 {
            return address;
        }
        let (from, to) = (source.type_id, target.type_id);
        if let Some(offset) = self.registry.base_offset(from, to) {
            return address.offset_by(i64::from(offset));
        }
        if let Some(offset) = self.registry.base_offset(to, from) {
            return address.offset_by(-i64::from(offset));
        }
        address
    }

    /// Checked pointer conversion. An upcast always succeeds; otherwise the
    /// complete object is found either at the pointer itself or where a
    /// target object would start, and must contain a target subobject.
    fn dynamic_pointer(&self, address: Address, source: TypeUsage, target: TypeUsage) -> Address {
        if address.is_null() {
            return Address::NULL;
        }
        let registry = self.registry;
        let (from, to) = (source.type_id, target.type_id);
        if let Some(offset) = registry.base_offset(from, to) {
            return address.offset_by(i64::from(offset));
        }
        if let Some(complete) = self.memory.object_type(address) {
            if registry.base_offset(complete, from) == Some(0) {
                if let Some(offset) = registry.base_offset(complete, to) {
                    return address.offset_by(i64::from(offset));
                }
            }
        }
        if let Some(offset) = registry.base_offset(to, from) {
            let start = address.offset_by(-i64::from(offset));
            if let Some(complete) = self.memory.object_type(start) {
                if registry.base_offset(complete, to) == Some(0) {
                    return start;
                }
            }
        }
        Address::NULL
    }
}
