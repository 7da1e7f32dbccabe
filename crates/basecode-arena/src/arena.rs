//! The element arena (spec §4.1): id-indexed storage plus a kind index,
//! with cascade removal through `owned_elements()`.

use crate::element::{Element, ElementData, ElementKind};
use basecode_common::{ElementId, SourceLocation};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct ElementMap {
    by_id: FxHashMap<ElementId, Element>,
    by_kind: FxHashMap<ElementKind, Vec<ElementId>>,
    next_id: u32,
}

impl ElementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next element id. Ids are strictly monotone per
    /// process (spec §5 ordering guarantee) — never reused, even after
    /// `remove`.
    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Construct and insert an element with a freshly allocated id.
    pub fn add(
        &mut self,
        data: ElementData,
        parent_element: Option<ElementId>,
        parent_scope: Option<ElementId>,
        location: SourceLocation,
    ) -> ElementId {
        let id = self.next_id();
        let kind = data.kind();
        let element = Element {
            id,
            data,
            parent_element,
            parent_scope,
            attributes: Default::default(),
            comments: Default::default(),
            location,
            is_singleton: false,
            non_owning: false,
        };
        self.by_id.insert(id, element);
        self.by_kind.entry(kind).or_default().push(id);
        id
    }

    /// Insert a singleton literal (`nil`, `true`, `false`, `uninitialized`,
    /// `value_sink`) — never removed by `remove` (spec §3.1, §9).
    pub fn add_singleton(&mut self, data: ElementData, location: SourceLocation) -> ElementId {
        let id = self.add(data, None, None, location);
        self.by_id.get_mut(&id).unwrap().is_singleton = true;
        id
    }

    pub fn find(&self, id: ElementId) -> Option<&Element> {
        self.by_id.get(&id)
    }

    pub fn find_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.by_id.get_mut(&id)
    }

    pub fn find_by_kind(&self, kind: ElementKind) -> &[ElementId] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove an element and, unless it is non-owning, its transitive
    /// owned subtree. A no-op on missing ids and on singletons (spec
    /// §4.1, §8 "Ownership tree acyclic").
    pub fn remove(&mut self, id: ElementId) {
        let Some(element) = self.by_id.get(&id) else { return };
        if element.is_singleton {
            tracing::trace!(?id, "skipping removal of singleton element");
            return;
        }
        if !element.non_owning {
            let owned = element.owned_elements();
            for child in owned {
                self.remove(child);
            }
        }
        if let Some(element) = self.by_id.remove(&id) {
            if let Some(list) = self.by_kind.get_mut(&element.kind()) {
                list.retain(|&e| e != id);
            }
        }
        tracing::trace!(?id, remaining = self.by_id.len(), "removed element");
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.by_id.values()
    }
}
