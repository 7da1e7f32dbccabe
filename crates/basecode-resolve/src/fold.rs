//! Constant folding (spec §4.4.3). The spec's `fold(session)` protocol
//! splices a freshly built substitute element into the parent via
//! `parent.apply_fold_result(old, new)`; this arena has no generic
//! "replace this child id in whichever parent kind holds it" operation
//! (every parent variant would need its own case), so folding here
//! collapses a foldable element's `data` to the literal result in place,
//! keeping its id stable. Observers holding that id see a literal
//! afterward, same as they would see the spliced-in replacement.

use basecode_arena::{ElementData, ElementKind, ElementList, ElementMap, Literal};
use basecode_ast::{BinaryOp, UnaryOp};
use basecode_common::ElementId;

/// Runs one folding pass over every `unary`, `binary`, and
/// `identifier_reference` element; returns how many elements changed, so
/// the resolver's fix-point loop can tell when to stop.
pub fn fold_constants(arena: &mut ElementMap) -> usize {
    let mut folded = 0;
    folded += fold_kind(arena, ElementKind::Unary, fold_unary);
    folded += fold_kind(arena, ElementKind::Binary, fold_binary);
    folded += fold_kind(arena, ElementKind::IdentifierReference, fold_identifier_reference);
    folded
}

fn fold_kind(arena: &mut ElementMap, kind: ElementKind, f: fn(&ElementMap, ElementId) -> Option<Literal>) -> usize {
    let candidates: Vec<ElementId> = arena.find_by_kind(kind).to_vec();
    let mut folded = 0;
    for id in candidates {
        let Some(literal) = f(arena, id) else { continue };
        if let Some(element) = arena.find_mut(id) {
            element.data = ElementData::Literal(literal);
        }
        folded += 1;
    }
    folded
}

fn literal_of(arena: &ElementMap, id: ElementId) -> Option<Literal> {
    match &arena.find(id)?.data {
        ElementData::Literal(lit) => Some(*lit),
        _ => None,
    }
}

fn fold_unary(arena: &ElementMap, id: ElementId) -> Option<Literal> {
    let ElementData::Unary { op, operand } = &arena.find(id)?.data else { return None };
    let operand = literal_of(arena, *operand)?;
    match (op, operand) {
        (UnaryOp::Negate, Literal::Int(v)) => Some(Literal::Int(-v)),
        (UnaryOp::Negate, Literal::Float(bits)) => Some(Literal::Float((-f64::from_bits(bits)).to_bits())),
        (UnaryOp::LogicalNot, Literal::Bool(v)) => Some(Literal::Bool(!v)),
        (UnaryOp::BitwiseNot, Literal::Int(v)) => Some(Literal::Int(!v)),
        _ => None,
    }
}

fn fold_binary(arena: &ElementMap, id: ElementId) -> Option<Literal> {
    let ElementData::Binary { op, lhs, rhs } = &arena.find(id)?.data else { return None };
    let lhs = literal_of(arena, *lhs)?;
    let rhs = literal_of(arena, *rhs)?;
    match (op, lhs, rhs) {
        (BinaryOp::Add, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_add(b))),
        (BinaryOp::Subtract, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_sub(b))),
        (BinaryOp::Multiply, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_mul(b))),
        (BinaryOp::Divide, Literal::Int(a), Literal::Int(b)) if b != 0 => Some(Literal::Int(a.wrapping_div(b))),
        (BinaryOp::Modulo, Literal::Int(a), Literal::Int(b)) if b != 0 => Some(Literal::Int(a.wrapping_rem(b))),
        (BinaryOp::BitwiseAnd, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a & b)),
        (BinaryOp::BitwiseOr, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a | b)),
        (BinaryOp::BitwiseXor, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a ^ b)),
        (BinaryOp::ShiftLeft, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_shl(b as u32))),
        (BinaryOp::ShiftRight, Literal::Int(a), Literal::Int(b)) => Some(Literal::Int(a.wrapping_shr(b as u32))),
        (BinaryOp::Equals, Literal::Int(a), Literal::Int(b)) => Some(Literal::Bool(a == b)),
        (BinaryOp::NotEquals, Literal::Int(a), Literal::Int(b)) => Some(Literal::Bool(a != b)),
        (BinaryOp::LessThan, Literal::Int(a), Literal::Int(b)) => Some(Literal::Bool(a < b)),
        (BinaryOp::LessThanOrEqual, Literal::Int(a), Literal::Int(b)) => Some(Literal::Bool(a <= b)),
        (BinaryOp::GreaterThan, Literal::Int(a), Literal::Int(b)) => Some(Literal::Bool(a > b)),
        (BinaryOp::GreaterThanOrEqual, Literal::Int(a), Literal::Int(b)) => Some(Literal::Bool(a >= b)),
        (BinaryOp::LogicalAnd, Literal::Bool(a), Literal::Bool(b)) => Some(Literal::Bool(a && b)),
        (BinaryOp::LogicalOr, Literal::Bool(a), Literal::Bool(b)) => Some(Literal::Bool(a || b)),
        (BinaryOp::Equals, Literal::Bool(a), Literal::Bool(b)) => Some(Literal::Bool(a == b)),
        (BinaryOp::NotEquals, Literal::Bool(a), Literal::Bool(b)) => Some(Literal::Bool(a != b)),
        _ => None,
    }
}

/// Folds `identifier_reference`s that resolved to exactly one constant
/// identifier whose own initializer is itself already a literal — a
/// chain of `a :: 1`, `b :: a` collapses `b`'s reference to `1` one hop
/// per pass, which is why this needs the fix-point loop rather than a
/// single sweep.
fn fold_identifier_reference(arena: &ElementMap, id: ElementId) -> Option<Literal> {
    let ElementData::IdentifierReference { resolved, .. } = &arena.find(id)?.data else { return None };
    let target = single(resolved)?;
    let ElementData::Identifier { symbol, initializer, .. } = &arena.find(target)?.data else { return None };
    if !symbol.is_constant {
        return None;
    }
    let ElementData::Initializer { expression } = &arena.find((*initializer)?)?.data else { return None };
    literal_of(arena, *expression)
}

fn single(list: &ElementList) -> Option<ElementId> {
    if list.len() == 1 { Some(list[0]) } else { None }
}
