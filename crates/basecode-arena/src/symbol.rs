//! Symbols and qualified names (spec §3.5).

use basecode_common::ElementId;

/// `a.b.c` — an ordered list of namespace parts plus the terminal name.
/// Produced by the parser for qualified references and declarations, and
/// built synthetically by `add_namespaces_to_scope` (spec §4.3) when a
/// source file writes `a.b.c = ...` directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QualifiedSymbol {
    pub namespaces: Vec<String>,
    pub name: String,
}

impl QualifiedSymbol {
    pub fn simple(name: impl Into<String>) -> Self {
        Self { namespaces: Vec::new(), name: name.into() }
    }

    pub fn qualified(namespaces: Vec<String>, name: impl Into<String>) -> Self {
        Self { namespaces, name: name.into() }
    }

    /// Dotted concatenation, e.g. `a.b.c`.
    pub fn fully_qualified_name(&self) -> String {
        if self.namespaces.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespaces.join("."), self.name)
        }
    }

    /// `[ns0, ns1, ..., name]`, outer-to-inner, matching the walk order
    /// `find_identifier` consumes (spec §4.2).
    pub fn parts(&self) -> Vec<&str> {
        self.namespaces.iter().map(String::as_str).chain(std::iter::once(self.name.as_str())).collect()
    }
}

/// A symbol: a qualified name, optional type-parameter bindings, a
/// constant flag, and the declaring location (spec §3.5). `type_params`
/// holds other symbols (e.g. `T` in `Box<T>`), each itself tagged as a
/// generic binding by the owning `Identifier` element's type.
#[derive(Clone, Debug, Default)]
pub struct Symbol {
    pub qualified: QualifiedSymbol,
    pub type_params: Vec<QualifiedSymbol>,
    pub is_constant: bool,
    pub declared_at: Option<ElementId>,
}

impl Symbol {
    pub fn new(qualified: QualifiedSymbol, is_constant: bool) -> Self {
        Self { qualified, type_params: Vec::new(), is_constant, declared_at: None }
    }

    pub fn name(&self) -> &str {
        &self.qualified.name
    }
}
