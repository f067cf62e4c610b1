//! Display names for diagnostics.

use ember_ir::{FunctionId, TypeId, TypeUsage};

use crate::Registry;

impl Registry {
    /// `ns::Outer::Inner<int>`.
    pub fn qualified_type_name(&self, type_id: TypeId) -> String {
        let ty = self.type_info(type_id);
        let prefix = match ty.parent {
            Some(parent) => format!("{}::", self.qualified_type_name(parent)),
            None => {
                let namespace = self.name(self.namespace(ty.namespace).full_name);
                if namespace.is_empty() {
                    String::new()
                } else {
                    format!("{namespace}::")
                }
            }
        };
        let mut name = format!("{prefix}{}", self.name(ty.name));
        if !ty.template_types.is_empty() {
            let args: Vec<String> = ty
                .template_types
                .iter()
                .map(|&usage| self.type_usage_name(usage))
                .collect();
            name.push('<');
            name.push_str(&args.join(", "));
            name.push('>');
        }
        name
    }

    /// `const char*`, `S&`, `int[4]`.
    pub fn type_usage_name(&self, usage: TypeUsage) -> String {
        let mut name = String::new();
        if usage.is_const() {
            name.push_str("const ");
        }
        name.push_str(&self.qualified_type_name(usage.type_id));
        for _ in 0..usage.pointer_level {
            name.push('*');
        }
        if usage.is_const_pointer() {
            name.push_str(" const");
        }
        if usage.is_reference() {
            name.push('&');
        }
        if usage.is_array() {
            name.push_str(&format!("[{}]", usage.array_size));
        }
        name
    }

    /// `ns::S::method`.
    pub fn function_name(&self, function: FunctionId) -> String {
        let function = self.function(function);
        let name = self.name(function.name);
        match function.owner {
            Some(owner) if function.is_destructor() => {
                format!("{}::~{name}", self.qualified_type_name(owner))
            }
            Some(owner) => format!("{}::{name}", self.qualified_type_name(owner)),
            None => {
                let namespace = self.name(self.namespace(function.namespace).full_name);
                if namespace.is_empty() {
                    name.to_string()
                } else {
                    format!("{namespace}::{name}")
                }
            }
        }
    }

    /// Argument list for "no matching overload" messages: `(int, double)`.
    pub fn argument_list_name(&self, args: &[TypeUsage]) -> String {
        let names: Vec<String> = args.iter().map(|&arg| self.type_usage_name(arg)).collect();
        format!("({})", names.join(", "))
    }
}
