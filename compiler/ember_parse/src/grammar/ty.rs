//! Type usages: `const unsigned int*`, `ns::Vec<int>&`, `Alias`.
//!
//! Every `try_` production either consumes a complete type and returns it,
//! or leaves the cursor where it was and returns `None`. Callers use that to
//! tell declarations from expressions without a separate lookahead pass.

use ember_diagnostic::CompileErrorKind;
use ember_ir::{InstanceOwner, TokenKind, TypeId, TypeUsage, TypeUsageFlags};
use ember_types::built_in_from_words;

use crate::{ParseResult, Parser};

/// Keywords that spell (part of) a built-in type.
const BUILT_IN_WORDS: &[&str] = &[
    "void", "bool", "char", "short", "int", "long", "float", "double", "signed", "unsigned",
];

pub(crate) fn is_built_in_word(text: &str) -> bool {
    BUILT_IN_WORDS.contains(&text)
}

impl Parser<'_> {
    /// `a::b::c`, optionally starting with `::`. Stops before a `::` that is
    /// not followed by an identifier.
    pub(crate) fn parse_qualified_name(&mut self) -> ParseResult<String> {
        let mut name = String::new();
        if self.cursor.eat("::") {
            name.push_str("::");
        }
        name.push_str(self.cursor.expect_identifier()?);
        while self.cursor.check("::") && self.cursor.peek_kind(1) == Some(TokenKind::Identifier) {
            self.cursor.advance();
            name.push_str("::");
            name.push_str(self.cursor.expect_identifier()?);
        }
        Ok(name)
    }

    /// A full type usage or an `UndefinedType` / `Expected` error.
    pub(crate) fn parse_type_usage(&mut self) -> ParseResult<TypeUsage> {
        if let Some(usage) = self.try_parse_type_usage()? {
            return Ok(usage);
        }
        if self.cursor.check_kind(TokenKind::Identifier) {
            let name = self.cursor.text().to_string();
            return Err(self.error(CompileErrorKind::UndefinedType { name }));
        }
        Err(self.cursor.expected("type"))
    }

    pub(crate) fn try_parse_type_usage(&mut self) -> ParseResult<Option<TypeUsage>> {
        Ok(self
            .try_parse_base_type()?
            .map(|base| self.parse_type_suffix(base)))
    }

    /// Type without declarator suffixes: `const T`, `T const`, built-in
    /// spellings and template instantiations.
    pub(crate) fn try_parse_base_type(&mut self) -> ParseResult<Option<TypeUsage>> {
        let start = self.cursor.pos();
        let mut flags = TypeUsageFlags::empty();
        if self.cursor.eat("const") {
            flags |= TypeUsageFlags::CONST;
        }

        let mut words = Vec::new();
        while self.cursor.check_kind(TokenKind::Keyword) && is_built_in_word(self.cursor.text()) {
            words.push(self.cursor.text());
            self.cursor.advance();
        }

        let usage = if !words.is_empty() {
            match built_in_from_words(&words) {
                Some(type_id) => TypeUsage::of(type_id),
                None => {
                    return Err(self.error(CompileErrorKind::InvalidTypeUsage {
                        name: words.join(" "),
                    }))
                }
            }
        } else if self.cursor.check_kind(TokenKind::Identifier)
            || (self.cursor.check("::") && self.cursor.peek_kind(1) == Some(TokenKind::Identifier))
        {
            let name = self.parse_qualified_name()?;
            let template_types = if self.cursor.check("<") && self.is_template_type_name(&name) {
                match self.try_parse_template_arguments()? {
                    Some(types) => types,
                    None => {
                        self.cursor.set_pos(start);
                        return Ok(None);
                    }
                }
            } else {
                Vec::new()
            };
            match self.lookup_type(&name, &template_types) {
                Some(usage) => usage,
                None => {
                    self.cursor.set_pos(start);
                    return Ok(None);
                }
            }
        } else {
            self.cursor.set_pos(start);
            return Ok(None);
        };

        if self.cursor.eat("const") {
            flags |= TypeUsageFlags::CONST;
        }
        Ok(Some(usage.with_flags(flags)))
    }

    /// `*`, `* const` and `&` after a base type.
    pub(crate) fn parse_type_suffix(&mut self, mut usage: TypeUsage) -> TypeUsage {
        while self.cursor.check("*") {
            self.cursor.advance();
            usage = usage
                .pointer_to()
                .without_flags(TypeUsageFlags::CONST_POINTER);
            if self.cursor.eat("const") {
                usage = usage.with_flags(TypeUsageFlags::CONST_POINTER);
            }
        }
        if self.cursor.eat("&") {
            usage = usage.with_flags(TypeUsageFlags::REFERENCE);
        }
        usage
    }

    /// `<T, U>` when it parses completely as a type list; otherwise the
    /// cursor is restored and `None` returned.
    pub(crate) fn try_parse_template_arguments(&mut self) -> ParseResult<Option<Vec<TypeUsage>>> {
        let start = self.cursor.pos();
        if !self.cursor.eat("<") {
            return Ok(None);
        }
        let mut types = Vec::new();
        loop {
            match self.try_parse_type_usage()? {
                Some(usage) => types.push(usage),
                None => {
                    self.cursor.set_pos(start);
                    return Ok(None);
                }
            }
            if self.cursor.eat(",") {
                continue;
            }
            self.cursor.split_shift();
            if self.cursor.eat(">") {
                return Ok(Some(types));
            }
            self.cursor.set_pos(start);
            return Ok(None);
        }
    }

    fn is_template_type_name(&self, name: &str) -> bool {
        let namespace = self.context.namespace();
        self.registry.is_template_name(namespace, name)
            || self
                .context
                .usings()
                .any(|using| self.registry.is_template_name(using, name))
    }

    /// Resolve a type name: aliases and nested types of the structs in
    /// scope, then aliases and types of the enclosing namespaces, then of
    /// the namespaces brought in by `using namespace`.
    pub(crate) fn lookup_type(&self, name: &str, template_types: &[TypeUsage]) -> Option<TypeUsage> {
        if !name.contains("::") && template_types.is_empty() {
            if let Some(usage) = self.lookup_struct_scope_type(name) {
                return Some(usage);
            }
        }
        let namespace = self.context.namespace();
        std::iter::once(namespace)
            .chain(self.context.usings())
            .find_map(|from| {
                if template_types.is_empty() {
                    if let Some(alias) = self.registry.get_type_alias(from, name) {
                        return Some(alias);
                    }
                }
                self.registry
                    .get_type_instantiation(from, name, template_types)
                    .map(TypeUsage::of)
            })
            .or_else(|| self.lookup_struct_relative_type(name))
    }

    fn lookup_struct_scope_type(&self, name: &str) -> Option<TypeUsage> {
        let name = self.registry.find_name(name)?;
        for scope in self.context.struct_scopes() {
            let mut current = Some(scope);
            while let Some(type_id) = current {
                let owner = InstanceOwner::Type(type_id);
                if let Some(alias) = self.registry.holders(owner).types.alias(name) {
                    return Some(alias);
                }
                if let Some(nested) = self.registry.type_in(owner, name, &[]) {
                    return Some(TypeUsage::of(nested));
                }
                current = self.registry.type_info(type_id).parent;
            }
        }
        None
    }

    /// `Inner::Type` written inside a struct whose scope contains `Inner`.
    fn lookup_struct_relative_type(&self, name: &str) -> Option<TypeUsage> {
        let (first, rest) = name.split_once("::")?;
        let TypeUsage { type_id, .. } = self.lookup_struct_scope_type(first)?;
        let mut current: TypeId = type_id;
        for component in rest.split("::") {
            let component = self.registry.find_name(component)?;
            current = self
                .registry
                .type_in(InstanceOwner::Type(current), component, &[])?;
        }
        Some(TypeUsage::of(current))
    }

    /// Whether the tokens at the cursor start a type. The cursor does not
    /// move.
    pub(crate) fn is_type_ahead(&mut self) -> ParseResult<bool> {
        let start = self.cursor.pos();
        let found = self.try_parse_base_type()?.is_some();
        self.cursor.set_pos(start);
        Ok(found)
    }
}

#[cfg(test)]
mod tests;
