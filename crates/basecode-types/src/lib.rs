//! The Basecode type system (spec §2.5): type variants, canonicalizing
//! constructors for derived types (pointers, arrays), and composite
//! layout calculation. Corresponds to the teacher's `tsz-solver` crate
//! sitting above name binding.

pub mod numeric;
pub mod table;
pub mod types;

pub use numeric::NumericKind;
pub use table::TypeTable;
pub use types::{AccessModel, CompositeKind, FieldMap, NumberClass, Type, TypeKind};

#[cfg(test)]
mod tests {
    use super::*;
    use basecode_arena::{ElementMap, QualifiedSymbol, Symbol};
    use basecode_common::{ModuleId, SourceLocation, Span};

    fn scope(arena: &mut ElementMap) -> basecode_common::ElementId {
        use basecode_arena::ElementBuilder;
        ElementBuilder::new(arena).make_block(None, true, SourceLocation::new(ModuleId::NONE, Span::synthetic()))
    }

    #[test]
    fn numeric_types_are_interned() {
        let mut table = TypeTable::new();
        let a = table.find_numeric_type(NumericKind::U32);
        let b = table.find_numeric_type(NumericKind::U32);
        assert_eq!(a, b);
        assert_eq!(table.find(a).unwrap().size_in_bytes, 4);
    }

    #[test]
    fn pointer_type_is_canonicalized() {
        let mut table = TypeTable::new();
        let base = table.find_numeric_type(NumericKind::U8);
        let p1 = table.find_pointer_type(base);
        let p2 = table.find_pointer_type(base);
        assert_eq!(p1, p2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn array_type_with_same_subscripts_is_canonicalized() {
        let mut arena = ElementMap::new();
        let decl = scope(&mut arena);
        let mut table = TypeTable::new();
        let base = table.find_numeric_type(NumericKind::U32);
        let a1 = table.find_array_type(base, vec![decl], Some(10));
        let a2 = table.find_array_type(base, vec![decl], Some(10));
        assert_eq!(a1, a2);
        assert_eq!(table.find(a1).unwrap().size_in_bytes, 40);
    }

    #[test]
    fn struct_fields_stack_with_padding() {
        let mut arena = ElementMap::new();
        let s = scope(&mut arena);
        let mut table = TypeTable::new();
        let u8_ty = table.find_numeric_type(NumericKind::U8);
        let u32_ty = table.find_numeric_type(NumericKind::U32);
        let composite = table.make_composite_type(Symbol::new(QualifiedSymbol::simple("Point"), false), CompositeKind::Struct, s, None);

        let decl_a = scope(&mut arena);
        let decl_b = scope(&mut arena);
        let off_a = table.add_field(composite, "flag".to_string(), decl_a, table.find(u8_ty).unwrap().size_in_bytes, table.find(u8_ty).unwrap().alignment).unwrap();
        let off_b = table.add_field(composite, "value".to_string(), decl_b, table.find(u32_ty).unwrap().size_in_bytes, table.find(u32_ty).unwrap().alignment).unwrap();

        assert_eq!(off_a, 0);
        assert_eq!(off_b, 4, "second field should pad up to its own alignment");
        assert_eq!(table.find(composite).unwrap().size_in_bytes, 8);
    }

    #[test]
    fn union_fields_share_offset_zero() {
        let mut arena = ElementMap::new();
        let s = scope(&mut arena);
        let mut table = TypeTable::new();
        let u8_ty = table.find_numeric_type(NumericKind::U8);
        let u64_ty = table.find_numeric_type(NumericKind::U64);
        let composite = table.make_composite_type(Symbol::new(QualifiedSymbol::simple("Slot"), false), CompositeKind::Union, s, None);

        let decl_a = scope(&mut arena);
        let decl_b = scope(&mut arena);
        let off_a = table.add_field(composite, "byte".to_string(), decl_a, table.find(u8_ty).unwrap().size_in_bytes, table.find(u8_ty).unwrap().alignment).unwrap();
        let off_b = table.add_field(composite, "quad".to_string(), decl_b, table.find(u64_ty).unwrap().size_in_bytes, table.find(u64_ty).unwrap().alignment).unwrap();

        assert_eq!(off_a, 0);
        assert_eq!(off_b, 0);
        assert_eq!(table.find(composite).unwrap().size_in_bytes, 8);
    }

    #[test]
    fn pending_array_resolves_element_count_later() {
        let mut arena = ElementMap::new();
        let decl = scope(&mut arena);
        let mut table = TypeTable::new();
        let base = table.find_numeric_type(NumericKind::U16);
        let array = table.find_array_type(base, vec![decl], None);
        assert_eq!(table.find(array).unwrap().size_in_bytes, 0);
        table.set_array_element_count(array, 5);
        assert_eq!(table.find(array).unwrap().size_in_bytes, 10);
    }
}
