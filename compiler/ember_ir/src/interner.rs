//! String interner for identifiers and qualified names.
//!
//! Unlike a process-wide table, an interner is owned by the registry of one
//! environment and dropped with it. Interning needs `&mut self`; lookups are
//! shared.

use super::Name;
use rustc_hash::FxHashMap;

/// Owned string interner.
pub struct StringInterner {
    map: FxHashMap<Box<str>, Name>,
    strings: Vec<Box<str>>,
}

impl StringInterner {
    /// Create an interner holding only the empty string.
    pub fn new() -> Self {
        let mut interner = StringInterner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        interner.map.insert("".into(), Name::EMPTY);
        interner.strings.push("".into());
        interner
    }

    /// Intern `text`, returning the existing name when already present.
    pub fn intern(&mut self, text: &str) -> Name {
        if let Some(&name) = self.map.get(text) {
            return name;
        }
        let raw = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| panic!("identifier table exceeded {} entries", u32::MAX));
        let name = Name::from_raw(raw);
        self.strings.push(text.into());
        self.map.insert(text.into(), name);
        name
    }

    /// Look up a name without interning it.
    pub fn get(&self, text: &str) -> Option<Name> {
        self.map.get(text).copied()
    }

    /// Text of an interned name.
    ///
    /// Names from another interner resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &str {
        self.strings.get(name.index()).map_or("", |s| s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
