//! The element builder (spec §2.3): a factory that constructs every
//! CodeDOM variant and wires parent/child ownership. Centralizing
//! construction here is what lets `basecode-eval`'s handlers stay
//! declarative — they ask the builder for an element, they never poke at
//! `ElementMap` directly.

use crate::element::{Element, ElementData, ElementList, Literal};
use crate::scope::Block;
use crate::symbol::{QualifiedSymbol, Symbol};
use crate::ElementMap;
use basecode_ast::{BinaryOp, UnaryOp};
use basecode_common::{ElementId, SourceLocation, TypeId};

pub struct ElementBuilder<'a> {
    pub arena: &'a mut ElementMap,
}

impl<'a> ElementBuilder<'a> {
    pub fn new(arena: &'a mut ElementMap) -> Self {
        Self { arena }
    }

    fn insert(&mut self, data: ElementData, parent_scope: Option<ElementId>, location: SourceLocation) -> ElementId {
        self.arena.add(data, None, parent_scope, location)
    }

    pub fn make_literal(&mut self, lit: Literal, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Literal(lit), scope, loc)
    }

    pub fn make_string_literal(&mut self, value: impl Into<String>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::StringLiteral { value: value.into() }, scope, loc)
    }

    pub fn make_type_literal(&mut self, type_id: Option<TypeId>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::TypeLiteral { type_id }, scope, loc)
    }

    pub fn make_block(&mut self, parent_scope: Option<ElementId>, is_root: bool, loc: SourceLocation) -> ElementId {
        let block = if is_root { Block::root() } else { Block::new() };
        let id = self.insert(ElementData::Block { scope: block }, parent_scope, loc);
        if let Some(parent) = parent_scope {
            if let Some(parent_element) = self.arena.find_mut(parent) {
                if let ElementData::Block { scope } = &mut parent_element.data {
                    scope.blocks.push(id);
                }
            }
        }
        id
    }

    pub fn make_module(&mut self, name: impl Into<String>, scope: ElementId, is_root: bool, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Module { name: name.into(), scope, is_root }, None, loc)
    }

    /// Builds a `declaration`'s `identifier` element. `initializer` is
    /// either the constant-expression element or the synthetic assignment
    /// binary operator built by `declare_identifier` (spec §4.3).
    pub fn make_identifier(
        &mut self,
        symbol: Symbol,
        type_ref: Option<ElementId>,
        initializer: Option<ElementId>,
        scope: Option<ElementId>,
        loc: SourceLocation,
    ) -> ElementId {
        self.insert(ElementData::Identifier { symbol, type_ref, initializer }, scope, loc)
    }

    pub fn make_type_reference(&mut self, symbol: QualifiedSymbol, type_id: Option<TypeId>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::TypeReference { symbol, type_id, is_inferred: false }, scope, loc)
    }

    pub fn make_initializer(&mut self, expression: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Initializer { expression }, scope, loc)
    }

    pub fn make_identifier_reference(&mut self, symbol: QualifiedSymbol, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::IdentifierReference { symbol, resolved: ElementList::new() }, scope, loc)
    }

    pub fn make_binary(&mut self, op: BinaryOp, lhs: ElementId, rhs: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Binary { op, lhs, rhs }, scope, loc)
    }

    pub fn make_unary(&mut self, op: UnaryOp, operand: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Unary { op, operand }, scope, loc)
    }

    pub fn make_member_access(&mut self, base: ElementId, member: impl Into<String>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::MemberAccess { base, member: member.into() }, scope, loc)
    }

    pub fn make_subscript(&mut self, base: ElementId, index: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Subscript { base, index, is_assign_target: false }, scope, loc)
    }

    pub fn make_cast(&mut self, type_ref: ElementId, expr: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Cast { type_ref, expr }, scope, loc)
    }

    pub fn make_transmute(&mut self, type_ref: ElementId, expr: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Transmute { type_ref, expr }, scope, loc)
    }

    pub fn make_if(&mut self, predicate: ElementId, true_branch: ElementId, false_branch: Option<ElementId>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::If { predicate, true_branch, false_branch }, scope, loc)
    }

    pub fn make_while(&mut self, predicate: ElementId, body: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::While { predicate, body }, scope, loc)
    }

    pub fn make_for(&mut self, init: ElementId, predicate: ElementId, step: ElementId, body: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::For { init, predicate, step, body }, scope, loc)
    }

    pub fn make_return(&mut self, values: ElementList, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Return { values }, scope, loc)
    }

    pub fn make_break(&mut self, label: Option<String>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Break { label }, scope, loc)
    }

    pub fn make_continue(&mut self, label: Option<String>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Continue { label }, scope, loc)
    }

    pub fn make_defer(&mut self, expr: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Defer { expr }, scope, loc)
    }

    pub fn make_field(&mut self, name: impl Into<String>, type_ref: ElementId, initializer: Option<ElementId>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(
            ElementData::Field { name: name.into(), type_ref, initializer, offset: Default::default() },
            scope,
            loc,
        )
    }

    pub fn make_argument_list(&mut self, args: Vec<crate::element::Argument>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::ArgumentList { args }, scope, loc)
    }

    pub fn make_procedure_call(
        &mut self,
        callee: QualifiedSymbol,
        candidates: ElementList,
        args: ElementId,
        scope: Option<ElementId>,
        loc: SourceLocation,
    ) -> ElementId {
        self.insert(ElementData::ProcedureCall { callee, candidates, args, resolved: None }, scope, loc)
    }

    pub fn make_statement(&mut self, expr: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Statement { expr }, scope, loc)
    }

    pub fn make_program(&mut self, statements: ElementList, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Program { statements }, None, loc)
    }

    pub fn make_import(&mut self, path: QualifiedSymbol, items: Vec<String>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Import { path, items, imported_module: None }, scope, loc)
    }

    pub fn make_namespace(&mut self, expression: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Namespace { expression }, scope, loc)
    }

    pub fn make_switch(&mut self, expr: ElementId, cases: ElementList, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Switch { expr, cases }, scope, loc)
    }

    pub fn make_case(&mut self, value: Option<ElementId>, body: ElementId, falls_through: bool, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Case { value, body, falls_through }, scope, loc)
    }

    pub fn make_fallthrough(&mut self, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Fallthrough, scope, loc)
    }

    pub fn make_procedure_instance(&mut self, type_id: TypeId, header_scope: ElementId, body: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::ProcedureInstance { type_id, header_scope, body }, scope, loc)
    }

    pub fn make_directive(&mut self, name: impl Into<String>, args: Vec<crate::element::Argument>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Directive { name: name.into(), args }, scope, loc)
    }

    pub fn make_label(&mut self, name: impl Into<String>, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        self.insert(ElementData::Label { name: name.into() }, scope, loc)
    }

    pub fn make_value_sink(&mut self, loc: SourceLocation) -> ElementId {
        let id = self.insert(ElementData::ValueSink, None, loc);
        self.arena.find_mut(id).unwrap().is_singleton = true;
        id
    }
}

/// Adds `element` to `scope`'s statement list and sets its parent scope;
/// use after constructing a top-level statement element so the block
/// owns it in source order (spec §5 ordering guarantee).
pub fn append_statement(arena: &mut ElementMap, scope: ElementId, element: ElementId) {
    if let Some(parent) = arena.find_mut(scope) {
        if let ElementData::Block { scope: block } = &mut parent.data {
            block.statements.push(element);
        }
    }
    if let Some(e) = arena.find_mut(element) {
        e.parent_scope = Some(scope);
    }
}

/// Declares `identifier` under `name` in `scope`'s identifier map
/// (spec §4.2 "within a single scope, the first-inserted identifier
/// under a name is the first in the result list").
pub fn declare_in_scope(arena: &mut ElementMap, scope: ElementId, name: &str, identifier: ElementId) {
    if let Some(element) = arena.find_mut(scope) {
        if let ElementData::Block { scope: block } = &mut element.data {
            block.declare(name, identifier);
        }
    }
}
