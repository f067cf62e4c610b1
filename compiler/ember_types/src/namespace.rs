//! Namespaces.

use ember_ir::{Name, NamespaceId};
use rustc_hash::FxHashMap;

use crate::Holders;

/// A namespace: children by name, a holder triple and a parent link.
#[derive(Debug)]
pub struct Namespace {
    pub name: Name,
    /// `a::b` for namespace `b` inside `a`; empty for the global namespace.
    pub full_name: Name,
    pub parent: Option<NamespaceId>,
    pub children: FxHashMap<Name, NamespaceId>,
    pub holders: Holders,
}

impl Namespace {
    pub(crate) fn new(name: Name, full_name: Name, parent: Option<NamespaceId>) -> Self {
        Namespace {
            name,
            full_name,
            parent,
            children: FxHashMap::default(),
            holders: Holders::default(),
        }
    }
}
