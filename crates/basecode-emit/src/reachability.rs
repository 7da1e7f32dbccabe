//! Reachability (spec §4.8): the emitter only lowers procedures that
//! are transitively callable from a module's top-level statements, so
//! dead overloads and unused helpers never reach the byte-code image.

use basecode_arena::{ElementData, ElementKind, ElementMap};
use basecode_common::ElementId;
use rustc_hash::{FxHashMap, FxHashSet};

/// Walks `parent_element` upward from `start` and returns the
/// `procedure_instance` it is nested in, or `None` if `start` sits
/// directly in module-level code (a root call site).
fn enclosing_procedure(arena: &ElementMap, start: ElementId) -> Option<ElementId> {
    let mut current = arena.find(start)?.parent_element;
    while let Some(id) = current {
        let element = arena.find(id)?;
        if matches!(element.data, ElementData::ProcedureInstance { .. }) {
            return Some(id);
        }
        current = element.parent_element;
    }
    None
}

/// An identifier's declared procedure body, following
/// `identifier -> initializer -> procedure_instance` (spec §3's
/// initializer-expression link, the same path `infer_initializer_type`
/// walks for ordinary variables).
fn procedure_instance_of(arena: &ElementMap, identifier: ElementId) -> Option<ElementId> {
    let ElementData::Identifier { initializer, .. } = &arena.find(identifier)?.data else { return None };
    let ElementData::Initializer { expression } = &arena.find((*initializer)?)?.data else { return None };
    let target = *expression;
    matches!(arena.find(target)?.data, ElementData::ProcedureInstance { .. }).then_some(target)
}

/// The call graph, keyed by `procedure_instance` element id, plus the
/// set of root call sites found directly in module-level code.
pub struct CallGraph {
    edges: FxHashMap<ElementId, Vec<ElementId>>,
    roots: FxHashSet<ElementId>,
}

impl CallGraph {
    /// Builds the graph from every resolved `procedure_call` in the
    /// arena (spec §4.8 "Reachability"): an edge runs from the caller's
    /// enclosing procedure to the callee's procedure body, and a call
    /// site with no enclosing procedure is a root.
    pub fn build(arena: &ElementMap) -> Self {
        let mut edges: FxHashMap<ElementId, Vec<ElementId>> = FxHashMap::default();
        let mut roots = FxHashSet::default();
        for call in arena.find_by_kind(ElementKind::ProcedureCall) {
            let Some(element) = arena.find(*call) else { continue };
            let ElementData::ProcedureCall { resolved, .. } = &element.data else { continue };
            let Some(target) = resolved else { continue };
            let Some(callee_body) = procedure_instance_of(arena, *target) else { continue };
            match enclosing_procedure(arena, *call) {
                Some(caller_body) => edges.entry(caller_body).or_default().push(callee_body),
                None => {
                    roots.insert(callee_body);
                }
            }
        }
        Self { edges, roots }
    }

    /// The set of `procedure_instance` ids transitively reachable from
    /// a module-level call site.
    pub fn reachable(&self) -> FxHashSet<ElementId> {
        let mut seen = FxHashSet::default();
        let mut stack: Vec<ElementId> = self.roots.iter().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(callees) = self.edges.get(&id) {
                stack.extend(callees.iter().copied());
            }
        }
        seen
    }

    pub fn is_root(&self, procedure_instance: ElementId) -> bool {
        self.roots.contains(&procedure_instance)
    }
}
