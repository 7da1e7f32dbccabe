//! Assignment type checking (spec §4.5): "ask the LHS type to
//! `type_check(rhs_type, {strict})`".

use basecode_common::TypeId;
use basecode_types::{TypeKind, TypeTable};

/// `strict=false` only when the RHS is a literal int/float, which lets a
/// bare numeric literal narrow into any numeric destination.
pub fn type_check(types: &TypeTable, lhs: TypeId, rhs: TypeId, strict: bool) -> bool {
    if lhs == rhs {
        return true;
    }
    let (Some(lhs_ty), Some(rhs_ty)) = (types.find(lhs), types.find(rhs)) else {
        return true;
    };
    if lhs_ty.is_unknown() || rhs_ty.is_unknown() {
        return true;
    }
    match (&lhs_ty.kind, &rhs_ty.kind) {
        (TypeKind::Numeric(_), TypeKind::Numeric(_)) => {
            if !strict {
                return true;
            }
            lhs_ty.number_class == rhs_ty.number_class && lhs_ty.size_in_bytes >= rhs_ty.size_in_bytes
        }
        (TypeKind::Pointer { base: a }, TypeKind::Pointer { base: b }) => a == b,
        (TypeKind::Bool, TypeKind::Bool) | (TypeKind::Rune, TypeKind::Rune) => true,
        (TypeKind::Composite { .. }, TypeKind::Composite { .. }) => lhs == rhs,
        _ => false,
    }
}
