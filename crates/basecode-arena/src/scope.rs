//! A lexical block (spec §3.2). Blocks form a tree via `Element::parent_scope`
//! back-references; modules are root blocks (`is_root`).

use crate::element::ElementList;
use basecode_common::ElementId;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Identifiers declared directly in a block, keyed by name. Insertion
/// order within a name's bucket is preserved — the overload-resolution
/// ordering guarantee of spec §4.2 ("the first-inserted identifier under
/// a name is the first in the result list").
pub type IdentifierMap = IndexMap<String, ElementList, FxBuildHasher>;

#[derive(Clone, Debug, Default)]
pub struct Block {
    pub statements: ElementList,
    pub imports: ElementList,
    pub types: ElementList,
    pub identifiers: IdentifierMap,
    pub references: ElementList,
    pub blocks: ElementList,
    /// LIFO defer stack; drained in reverse insertion order at
    /// end-of-block emission (spec §4.3 "Defer semantics").
    pub defer_stack: Vec<ElementId>,
    pub has_stack_frame: bool,
    pub is_root: bool,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root() -> Self {
        Self { is_root: true, ..Self::default() }
    }

    pub fn declare(&mut self, name: impl Into<String>, id: ElementId) {
        self.identifiers.entry(name.into()).or_default().push(id);
    }

    pub fn find_local(&self, name: &str) -> Option<&ElementList> {
        self.identifiers.get(name)
    }

    pub fn push_defer(&mut self, expr: ElementId) {
        self.defer_stack.push(expr);
    }

    /// Statements queued for emission at end-of-block, in the order
    /// they must run (reverse of push order).
    pub fn drain_defers(&mut self) -> Vec<ElementId> {
        let mut drained: Vec<ElementId> = self.defer_stack.drain(..).collect();
        drained.reverse();
        drained
    }
}
