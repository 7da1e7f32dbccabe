//! Scope-stack bookkeeping shared by the evaluator and resolver (spec
//! §4.3 "scoped acquisition": every scope push is paired with a
//! guaranteed pop on all exit paths).

use crate::arena::ElementMap;
use crate::element::ElementData;
use crate::lookup::find_identifier;
use crate::symbol::QualifiedSymbol;
use basecode_common::{ElementId, TypeId};

#[derive(Default)]
pub struct ScopeManager {
    scope_stack: Vec<ElementId>,
    top_level_stack: Vec<ElementId>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self, scope: ElementId) {
        self.scope_stack.push(scope);
    }

    pub fn pop_scope(&mut self) -> Option<ElementId> {
        self.scope_stack.pop()
    }

    pub fn current_scope(&self) -> Option<ElementId> {
        self.scope_stack.last().copied()
    }

    pub fn push_top_level(&mut self, module: ElementId) {
        self.top_level_stack.push(module);
    }

    pub fn pop_top_level(&mut self) -> Option<ElementId> {
        self.top_level_stack.pop()
    }

    pub fn current_top_level(&self) -> Option<ElementId> {
        self.top_level_stack.last().copied()
    }

    /// RAII-ish scoped push: runs `f` with `scope` pushed, always pops,
    /// even if `f` short-circuits (spec §5 "scoped acquisition").
    pub fn with_scope<T>(&mut self, scope: ElementId, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push_scope(scope);
        let result = f(self);
        self.pop_scope();
        result
    }

    pub fn find_identifier(&self, arena: &ElementMap, symbol: &QualifiedSymbol, scope: Option<ElementId>) -> Vec<ElementId> {
        let scope = scope.or_else(|| self.current_scope());
        match scope {
            Some(scope) => find_identifier(arena, symbol, scope).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Resolves `symbol` to the type id bound to its identifier, if any
    /// (spec §4.2 `find_type`: "look up `vars.front()`, return its
    /// `type_ref()->type()`").
    pub fn find_type(&self, arena: &ElementMap, symbol: &QualifiedSymbol, scope: Option<ElementId>) -> Option<TypeId> {
        let hits = self.find_identifier(arena, symbol, scope);
        let identifier = hits.first()?;
        let ElementData::Identifier { type_ref, .. } = &arena.find(*identifier)?.data else { return None };
        let type_ref_id = (*type_ref)?;
        match &arena.find(type_ref_id)?.data {
            ElementData::TypeReference { type_id, .. } => *type_id,
            _ => None,
        }
    }

    /// True when any scope from `scope` up to (and including) the
    /// nearest enclosing procedure header has a stack frame — used by
    /// the emitter to decide whether `return` needs an epilogue.
    pub fn within_procedure_scope(&self, arena: &ElementMap, scope: ElementId) -> bool {
        let mut current = Some(scope);
        while let Some(cur) = current {
            if let Some(element) = arena.find(cur) {
                if let ElementData::Block { scope: block } = &element.data {
                    if block.has_stack_frame {
                        return true;
                    }
                }
                current = element.parent_scope;
            } else {
                current = None;
            }
        }
        false
    }
}
