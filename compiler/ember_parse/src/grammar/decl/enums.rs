use ember_diagnostic::CompileErrorKind;
use ember_ir::{InstanceOwner, Stmt, StmtKind};
use ember_types::ENUM_SIZE;

use super::misplaced;
use crate::{ParseResult, Parser};

impl Parser<'_> {
    /// `enum [class] Name [: type] { A, B = expr, ... };`
    ///
    /// Values are stored as 4-byte integers whatever the underlying type
    /// says. Values of a plain enum are visible in the enclosing scope.
    pub(crate) fn parse_enum_declaration(&mut self) -> ParseResult<Stmt> {
        let line = self.cursor.line();
        if self.context.is_local_scope() {
            return Err(self.error(misplaced("enum")));
        }
        self.cursor.advance();
        let scoped = self.cursor.eat("class") || self.cursor.eat("struct");
        let name = self.cursor.expect_identifier()?;
        if self.cursor.eat(":") {
            let underlying = self.parse_type_usage()?;
            if !self.registry.is_integral(underlying) {
                return Err(self.error_at(
                    CompileErrorKind::NonIntegerValue {
                        context: "enum type".to_string(),
                    },
                    line,
                ));
            }
        }

        let owner = self.declaration_owner();
        let exists = self
            .registry
            .find_name(name)
            .is_some_and(|id| !self.registry.holders(owner).types.get(id).is_empty());
        if exists {
            return Err(self.error_at(
                CompileErrorKind::TypeRedefinition {
                    name: name.to_string(),
                },
                line,
            ));
        }
        let type_id = if scoped {
            self.registry.register_enum_class(owner, name)
        } else {
            self.registry.register_enum(owner, name)
        };

        self.cursor.expect("{")?;
        let mut next = 0i64;
        while !self.cursor.eat("}") {
            let value_line = self.cursor.line();
            let value_name = self.cursor.expect_identifier()?;
            if self.cursor.eat("=") {
                let expr = self.parse_expression()?;
                let Some(value) = self.const_eval(&expr) else {
                    return Err(self.error_at(
                        CompileErrorKind::NonIntegerValue {
                            context: "enum value".to_string(),
                        },
                        value_line,
                    ));
                };
                next = value;
            }
            let address = self.memory.allocate(ENUM_SIZE as usize);
            if let Ok(slot) = self.memory.slice_mut(address, ENUM_SIZE as usize) {
                slot.copy_from_slice(&(next as i32).to_le_bytes());
            }
            self.registry.add_enum_value(type_id, value_name, next, address);

            let id = self.registry.intern(value_name);
            self.context.define_constant(InstanceOwner::Type(type_id), id, next);
            if !scoped {
                self.context.define_constant(owner, id, next);
            }
            next = next.wrapping_add(1);
            if !self.cursor.eat(",") {
                self.cursor.expect("}")?;
                break;
            }
        }
        self.cursor.expect(";")?;
        tracing::trace!(name, "enum declared");
        Ok(Stmt::new(StmtKind::EnumDeclaration(type_id), line))
    }
}
