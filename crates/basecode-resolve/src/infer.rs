//! Shared lookups used by both the unknown-types sub-pass and type
//! checking: pulling a type id out of a `type_reference`, inferring an
//! expression's type well enough to drive inference and assignment
//! checks, and recognizing a literal RHS (spec §4.5 "strict=false only
//! when the RHS is a literal integer or float").

use basecode_arena::{ElementData, ElementMap, Literal};
use basecode_common::TypeId;
use basecode_types::{NumericKind, TypeTable};
use basecode_common::ElementId;

pub fn type_id_of(arena: &ElementMap, type_reference: ElementId) -> Option<TypeId> {
    match &arena.find(type_reference)?.data {
        ElementData::TypeReference { type_id, .. } => *type_id,
        _ => None,
    }
}

/// An identifier's declared procedure type, whether its initializer
/// points at a bare `type_literal` (bodyless signature) or straight at a
/// `procedure_instance` (a declaration with a body).
pub fn procedure_type_of(arena: &ElementMap, identifier: ElementId) -> Option<TypeId> {
    let ElementData::Identifier { initializer, .. } = &arena.find(identifier)?.data else { return None };
    let ElementData::Initializer { expression } = &arena.find((*initializer)?)?.data else { return None };
    match &arena.find(*expression)?.data {
        ElementData::TypeLiteral { type_id } => *type_id,
        ElementData::ProcedureInstance { type_id, .. } => Some(*type_id),
        _ => None,
    }
}

/// Strips an identifier's `initializer` slot down to the expression that
/// actually produces its value: either the constant expression wrapped
/// by `Initializer`, or the RHS of the synthetic assignment
/// `declare_identifier` builds for non-constant declarations.
pub fn initializer_expr(arena: &ElementMap, initializer: ElementId) -> Option<ElementId> {
    match &arena.find(initializer)?.data {
        ElementData::Initializer { expression } => Some(*expression),
        ElementData::Binary { op, rhs, .. } if *op == basecode_ast::BinaryOp::Assign => Some(*rhs),
        _ => Some(initializer),
    }
}

pub fn is_literal_number(arena: &ElementMap, expr: ElementId) -> bool {
    matches!(arena.find(expr).map(|e| &e.data), Some(ElementData::Literal(Literal::Int(_))) | Some(ElementData::Literal(Literal::Float(_))))
}

fn literal_type(types: &mut TypeTable, lit: Literal) -> TypeId {
    match lit {
        Literal::Nil | Literal::Uninitialized => types.find_unknown_type(),
        Literal::Bool(_) => types.find_bool_type(),
        Literal::Int(_) => types.find_numeric_type(NumericKind::S32),
        Literal::Float(_) => types.find_numeric_type(NumericKind::F64),
        Literal::Char(_) => types.find_rune_type(),
    }
}

/// Infers an expression's type well enough to drive §4.4.2's unknown-type
/// resolution and §4.5's assignment check. This is deliberately shallow —
/// the full system would thread inferred types back onto every
/// sub-expression, but every caller here only needs the type of a
/// top-level initializer or assignment RHS.
pub fn infer_expr_type(arena: &ElementMap, types: &mut TypeTable, expr: ElementId) -> Option<TypeId> {
    match &arena.find(expr)?.data {
        ElementData::Literal(lit) => Some(literal_type(types, *lit)),
        ElementData::TypeLiteral { type_id } => *type_id,
        ElementData::IdentifierReference { resolved, .. } => {
            let target = *resolved.first()?;
            let ElementData::Identifier { type_ref, .. } = &arena.find(target)?.data else { return None };
            type_id_of(arena, (*type_ref)?)
        }
        ElementData::Cast { type_ref, .. } | ElementData::Transmute { type_ref, .. } => type_id_of(arena, *type_ref),
        ElementData::Binary { lhs, .. } => infer_expr_type(arena, types, *lhs),
        ElementData::Unary { operand, .. } => infer_expr_type(arena, types, *operand),
        ElementData::MemberAccess { .. } | ElementData::Subscript { .. } => None,
        _ => None,
    }
}

pub fn infer_initializer_type(arena: &ElementMap, types: &mut TypeTable, initializer: ElementId) -> Option<TypeId> {
    let expr = initializer_expr(arena, initializer)?;
    infer_expr_type(arena, types, expr)
}
