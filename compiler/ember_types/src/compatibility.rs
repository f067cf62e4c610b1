//! Conversion ranking and overload selection.
//!
//! Every argument is ranked against its parameter with [`Compatibility`];
//! a candidate's rank is its worst argument rank and the candidate with the
//! best rank wins. Ties go to the candidate registered first, so overload
//! selection never depends on hash order.

use ember_ir::{Compatibility, FunctionId, TypeId, TypeUsage};
use tracing::trace;

use crate::{FunctionFlags, Registry};

impl Registry {
    /// Rank passing an argument of usage `arg` to a parameter of usage
    /// `param`.
    pub fn compatibility(&self, param: TypeUsage, arg: TypeUsage) -> Compatibility {
        self.compatibility_inner(param, arg, true)
    }

    fn compatibility_inner(
        &self,
        param: TypeUsage,
        arg: TypeUsage,
        allow_construction: bool,
    ) -> Compatibility {
        if param.is_pointer() {
            return self.pointer_compatibility(param, arg);
        }
        if param.is_array() {
            return if param.same_value_type(&arg) {
                Compatibility::PerfectMatch
            } else {
                Compatibility::Incompatible
            };
        }
        if arg.is_pointer() || arg.is_array() {
            return Compatibility::Incompatible;
        }
        if param.is_reference() && !param.is_const() && arg.is_const() {
            return Compatibility::Incompatible;
        }
        if self.is_perfect_match(param.type_id, arg.type_id) {
            return Compatibility::PerfectMatch;
        }

        let param_type = self.type_info(param.type_id);
        let arg_type = self.type_info(arg.type_id);
        if self.is_arithmetic(param) {
            let Some(param_kind) = self.scalar_kind(param) else {
                return Compatibility::Incompatible;
            };
            // plain enums convert implicitly; enum classes do not
            let arg_kind = match &arg_type.kind {
                crate::TypeKind::EnumClass(_) => return Compatibility::Incompatible,
                _ => self.scalar_kind(arg),
            };
            let Some(arg_kind) = arg_kind else {
                return Compatibility::Incompatible;
            };
            return match (param_kind.is_float(), arg_kind.is_float()) {
                (false, false) => Compatibility::ImplicitCastableInteger,
                (true, true) => Compatibility::ImplicitCastableFloat,
                _ => Compatibility::ImplicitCastableIntegerFloat,
            };
        }
        if param_type.is_struct() {
            if arg_type.is_struct() && self.base_offset(arg.type_id, param.type_id).is_some() {
                return Compatibility::ImplicitCastableInheritance;
            }
            if allow_construction && self.implicit_constructor(param.type_id, arg).is_some() {
                return Compatibility::ImplicitConstructable;
            }
        }
        Compatibility::Incompatible
    }

    fn pointer_compatibility(&self, param: TypeUsage, arg: TypeUsage) -> Compatibility {
        let arg_level = arg.pointer_level + u8::from(arg.is_array());
        if arg_level == 0 {
            return Compatibility::Incompatible;
        }
        // `nullptr` and other untyped pointers go anywhere
        if arg.type_id == TypeId::VOID && arg.pointer_level == 1 && !arg.is_const() {
            return Compatibility::PerfectMatch;
        }
        if arg.is_const() && !param.is_const() {
            return Compatibility::Incompatible;
        }
        if param.type_id == TypeId::VOID && param.pointer_level == 1 {
            return if arg.type_id == TypeId::VOID && arg_level == 1 {
                Compatibility::PerfectMatch
            } else {
                Compatibility::ImplicitCastableInheritance
            };
        }
        if arg_level != param.pointer_level {
            return Compatibility::Incompatible;
        }
        if self.is_perfect_match(param.type_id, arg.type_id) {
            return Compatibility::PerfectMatch;
        }
        if param.pointer_level == 1
            && self.type_info(arg.type_id).is_struct()
            && self.base_offset(arg.type_id, param.type_id).is_some()
        {
            return Compatibility::ImplicitCastableInheritance;
        }
        Compatibility::Incompatible
    }

    /// Worst argument rank of calling `function` with `args`, or `None` when
    /// arity or template arguments rule it out.
    pub fn call_compatibility(
        &self,
        function: FunctionId,
        args: &[TypeUsage],
        template_types: &[TypeUsage],
    ) -> Option<Compatibility> {
        let function = self.function(function);
        if function.template_types != template_types {
            return None;
        }
        let arity_matches = if function.flags.contains(FunctionFlags::VARIADIC) {
            args.len() >= function.parameters.len()
        } else {
            args.len() == function.parameters.len()
        };
        if !arity_matches {
            return None;
        }
        let worst = function
            .parameters
            .iter()
            .zip(args)
            .map(|(&param, &arg)| self.compatibility(param, arg))
            .max()
            .unwrap_or(Compatibility::PerfectMatch);
        worst.is_compatible().then_some(worst)
    }

    /// Best candidate for `args`. Ties go to the first candidate.
    pub fn select_overload(
        &self,
        candidates: &[FunctionId],
        args: &[TypeUsage],
        template_types: &[TypeUsage],
    ) -> Option<FunctionId> {
        let mut best: Option<(FunctionId, Compatibility)> = None;
        for &candidate in candidates {
            let Some(rank) = self.call_compatibility(candidate, args, template_types) else {
                continue;
            };
            if best.map_or(true, |(_, best_rank)| rank < best_rank) {
                best = Some((candidate, rank));
            }
        }
        trace!(candidates = candidates.len(), selected = ?best, "overload resolution");
        best.map(|(function, _)| function)
    }

    /// First candidate taking exactly `args` with every argument a perfect
    /// match.
    pub fn select_perfect_overload(
        &self,
        candidates: &[FunctionId],
        args: &[TypeUsage],
        template_types: &[TypeUsage],
    ) -> Option<FunctionId> {
        candidates.iter().copied().find(|&candidate| {
            self.call_compatibility(candidate, args, template_types)
                == Some(Compatibility::PerfectMatch)
        })
    }

    pub fn find_constructor(&self, type_id: TypeId, args: &[TypeUsage]) -> Option<FunctionId> {
        self.select_overload(&self.constructors(type_id), args, &[])
    }

    /// Non-explicit single-argument constructor of `type_id` accepting
    /// `arg` without a further user-defined conversion.
    pub fn implicit_constructor(&self, type_id: TypeId, arg: TypeUsage) -> Option<FunctionId> {
        let mut best: Option<(FunctionId, Compatibility)> = None;
        for constructor in self.constructors(type_id) {
            let function = self.function(constructor);
            if function.flags.contains(FunctionFlags::EXPLICIT) || function.parameters.len() != 1 {
                continue;
            }
            let rank = self.compatibility_inner(function.parameters[0], arg, false);
            if rank.is_compatible() && best.map_or(true, |(_, best_rank)| rank < best_rank) {
                best = Some((constructor, rank));
            }
        }
        best.map(|(constructor, _)| constructor)
    }

    /// Whether `derived` is `base` or inherits from it.
    pub fn is_derived_from(&self, derived: TypeId, base: TypeId) -> bool {
        self.base_offset(derived, base).is_some()
    }
}

#[cfg(test)]
mod tests;
