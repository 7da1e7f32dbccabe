//! `find_identifier` (spec §4.2): left-to-right qualified-name resolution
//! with fall-through into `import` edges.
//!
//! Import handling here covers a single hop — `import X` followed by a
//! lookup of `X.name` — rather than the original's fully recursive
//! re-walk of an imported qualified symbol through further imports
//! (`from X import Y.Z` chains). Cross-module import wiring itself
//! (resolving an `import` element's `imported_module` to a concrete
//! `Module` element) is the evaluator's job (`basecode-eval`), consistent
//! with source-file I/O being an explicit non-goal here.

use crate::arena::ElementMap;
use crate::element::{ElementData, ElementList};
use crate::symbol::QualifiedSymbol;
use basecode_common::ElementId;

fn as_block(arena: &ElementMap, id: ElementId) -> Option<&crate::scope::Block> {
    match &arena.find(id)?.data {
        ElementData::Block { scope } => Some(scope),
        _ => None,
    }
}

/// If `identifier` is declared with an initializer expression that is a
/// namespace or a module reference, return the inner scope the next
/// qualified-name part should resolve against (spec §4.2 step 3).
fn advance_into_inner_scope(arena: &ElementMap, identifier: ElementId) -> Option<ElementId> {
    let element = arena.find(identifier)?;
    let ElementData::Identifier { initializer, .. } = &element.data else { return None };
    let init_id = (*initializer)?;
    let init = arena.find(init_id)?;
    let ElementData::Initializer { expression } = &init.data else { return None };
    match &arena.find(*expression)?.data {
        ElementData::Namespace { expression } => Some(*expression),
        ElementData::ModuleReference { reference } => match &arena.find(*reference)?.data {
            ElementData::Module { scope, .. } => Some(*scope),
            _ => None,
        },
        _ => None,
    }
}

/// Walk parent scopes from `start` upward (spec §4.2 step 2.1),
/// collecting every `import` edge visible along the way. Returns the
/// first non-empty hit list found and the imports collected before it
/// (so the caller can fall back to those imports when nothing direct
/// was found).
fn walk_parent_scopes(arena: &ElementMap, start: ElementId, part: &str) -> (Option<ElementList>, Vec<ElementId>) {
    let mut imports = Vec::new();
    let mut current = Some(start);
    while let Some(cur) = current {
        if let Some(block) = as_block(arena, cur) {
            if let Some(ids) = block.find_local(part) {
                return (Some(ids.clone()), imports);
            }
            imports.extend(block.imports.iter().copied());
        }
        current = arena.find(cur).and_then(|e| e.parent_scope);
    }
    (None, imports)
}

fn try_imports(arena: &ElementMap, imports: &[ElementId], part: &str) -> Option<ElementList> {
    for &import_id in imports {
        let ElementData::Import { imported_module, .. } = &arena.find(import_id)?.data else { continue };
        let Some(module_id) = imported_module else { continue };
        let ElementData::Module { scope, .. } = &arena.find(*module_id)?.data else { continue };
        if let Some(block) = as_block(arena, *scope) {
            if let Some(ids) = block.find_local(part) {
                return Some(ids.clone());
            }
        }
    }
    None
}

/// Returns zero, one, or many identifiers (spec §4.2). Empty means
/// unresolved — the caller reports **P004**.
pub fn find_identifier(arena: &ElementMap, symbol: &QualifiedSymbol, scope: ElementId) -> ElementList {
    let parts = symbol.parts();
    let mut block_scope = scope;
    let mut result = ElementList::new();

    for (i, part) in parts.iter().enumerate() {
        let (found, imports) = walk_parent_scopes(arena, block_scope, part);
        let ids = match found.or_else(|| try_imports(arena, &imports, part)) {
            Some(ids) if !ids.is_empty() => ids,
            _ => return ElementList::new(),
        };

        if i + 1 == parts.len() {
            result = ids;
            break;
        }

        let Some(first) = ids.first().copied() else { return ElementList::new() };
        match advance_into_inner_scope(arena, first) {
            Some(next_scope) => block_scope = next_scope,
            // An intermediate part resolved to something that is neither
            // a namespace nor a module reference: abort the walk.
            None => return ElementList::new(),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{append_statement, declare_in_scope, ElementBuilder};
    use crate::element::Literal;
    use crate::symbol::Symbol;
    use basecode_common::{ModuleId, SourceLocation, Span};

    fn loc() -> SourceLocation {
        SourceLocation::new(ModuleId::NONE, Span::synthetic())
    }

    #[test]
    fn innermost_declaration_wins() {
        let mut arena = ElementMap::new();
        let outer = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_block(None, true, loc())
        };
        let inner = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_block(Some(outer), false, loc())
        };

        let outer_id = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_literal(Literal::Int(1), Some(outer), loc())
        };
        let outer_ident = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_identifier(Symbol::new(crate::symbol::QualifiedSymbol::simple("x"), false), None, Some(outer_id), Some(outer), loc())
        };
        declare_in_scope(&mut arena, outer, "x", outer_ident);
        append_statement(&mut arena, outer, outer_ident);

        let inner_id = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_literal(Literal::Int(2), Some(inner), loc())
        };
        let inner_ident = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_identifier(Symbol::new(crate::symbol::QualifiedSymbol::simple("x"), false), None, Some(inner_id), Some(inner), loc())
        };
        declare_in_scope(&mut arena, inner, "x", inner_ident);
        append_statement(&mut arena, inner, inner_ident);

        let hits = find_identifier(&arena, &QualifiedSymbol::simple("x"), inner);
        assert_eq!(hits.as_slice(), [inner_ident]);
    }

    #[test]
    fn unresolved_name_returns_empty() {
        let mut arena = ElementMap::new();
        let scope = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_block(None, true, loc())
        };
        let hits = find_identifier(&arena, &QualifiedSymbol::simple("missing"), scope);
        assert!(hits.is_empty());
    }

    #[test]
    fn overloads_preserve_insertion_order() {
        let mut arena = ElementMap::new();
        let scope = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_block(None, true, loc())
        };
        let first = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_identifier(Symbol::new(crate::symbol::QualifiedSymbol::simple("f"), false), None, None, Some(scope), loc())
        };
        let second = {
            let mut b = ElementBuilder::new(&mut arena);
            b.make_identifier(Symbol::new(crate::symbol::QualifiedSymbol::simple("f"), false), None, None, Some(scope), loc())
        };
        declare_in_scope(&mut arena, scope, "f", first);
        declare_in_scope(&mut arena, scope, "f", second);

        let hits = find_identifier(&arena, &QualifiedSymbol::simple("f"), scope);
        assert_eq!(hits.as_slice(), [first, second]);
    }
}
