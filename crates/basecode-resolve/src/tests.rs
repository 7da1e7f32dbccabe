use crate::Resolver;
use basecode_arena::{append_statement, declare_in_scope, ElementBuilder, Literal, QualifiedSymbol, Symbol};
use basecode_common::{ModuleId, SourceLocation, Span};
use basecode_types::{NumericKind, TypeTable};

fn loc() -> SourceLocation {
    SourceLocation::new(ModuleId::NONE, Span::synthetic())
}

#[test]
fn identifier_reference_resolves_once_its_target_exists() {
    let mut arena = basecode_arena::ElementMap::new();
    let scope = ElementBuilder::new(&mut arena).make_block(None, true, loc());

    let lit = ElementBuilder::new(&mut arena).make_literal(Literal::Int(7), Some(scope), loc());
    let ident = ElementBuilder::new(&mut arena).make_identifier(Symbol::new(QualifiedSymbol::simple("x"), true), None, None, Some(scope), loc());
    declare_in_scope(&mut arena, scope, "x", ident);
    append_statement(&mut arena, scope, ident);
    let init = ElementBuilder::new(&mut arena).make_initializer(lit, Some(scope), loc());
    if let Some(element) = arena.find_mut(ident) {
        if let basecode_arena::ElementData::Identifier { initializer, .. } = &mut element.data {
            *initializer = Some(init);
        }
    }

    let reference = ElementBuilder::new(&mut arena).make_identifier_reference(QualifiedSymbol::simple("x"), Some(scope), loc());
    append_statement(&mut arena, scope, reference);

    let mut types = TypeTable::new();
    let mut resolver = Resolver::new(&mut arena, &mut types);
    resolver.run();

    assert!(!resolver.diagnostics.is_failed());
    let basecode_arena::ElementData::IdentifierReference { resolved, .. } = &arena.find(reference).unwrap().data else { panic!("still a reference") };
    assert_eq!(resolved.as_slice(), [ident]);
}

#[test]
fn unresolved_reference_raises_p004_on_the_final_phase() {
    let mut arena = basecode_arena::ElementMap::new();
    let scope = ElementBuilder::new(&mut arena).make_block(None, true, loc());
    let reference = ElementBuilder::new(&mut arena).make_identifier_reference(QualifiedSymbol::simple("missing"), Some(scope), loc());
    append_statement(&mut arena, scope, reference);

    let mut types = TypeTable::new();
    let mut resolver = Resolver::new(&mut arena, &mut types);
    resolver.run();

    assert!(resolver.diagnostics.is_failed());
    assert_eq!(resolver.diagnostics.diagnostics()[0].code.id(), "P004");
}

#[test]
fn a_declaration_with_no_type_annotation_infers_from_its_literal_initializer() {
    let mut arena = basecode_arena::ElementMap::new();
    let scope = ElementBuilder::new(&mut arena).make_block(None, true, loc());

    let type_ref = ElementBuilder::new(&mut arena).make_type_reference(QualifiedSymbol::simple("unknown"), None, Some(scope), loc());
    let ident = ElementBuilder::new(&mut arena).make_identifier(Symbol::new(QualifiedSymbol::simple("n"), true), Some(type_ref), None, Some(scope), loc());
    declare_in_scope(&mut arena, scope, "n", ident);
    append_statement(&mut arena, scope, ident);
    let lit = ElementBuilder::new(&mut arena).make_literal(Literal::Int(3), Some(scope), loc());
    let init = ElementBuilder::new(&mut arena).make_initializer(lit, Some(scope), loc());
    if let Some(element) = arena.find_mut(ident) {
        if let basecode_arena::ElementData::Identifier { initializer, .. } = &mut element.data {
            *initializer = Some(init);
        }
    }

    let mut types = TypeTable::new();
    let mut resolver = Resolver::new(&mut arena, &mut types);
    resolver.run();

    assert!(!resolver.diagnostics.is_failed());
    let type_id = crate::infer::type_id_of(&arena, type_ref).expect("type was inferred");
    assert_eq!(types.find(type_id).unwrap().size_in_bytes, 4, "bare int literals infer to s32");
}

#[test]
fn mismatched_assignment_raises_c051() {
    let mut arena = basecode_arena::ElementMap::new();
    let scope = ElementBuilder::new(&mut arena).make_block(None, true, loc());

    let mut types = TypeTable::new();
    let bool_type = types.find_bool_type();
    let type_ref = ElementBuilder::new(&mut arena).make_type_reference(QualifiedSymbol::simple("bool"), Some(bool_type), Some(scope), loc());
    let ident = ElementBuilder::new(&mut arena).make_identifier(Symbol::new(QualifiedSymbol::simple("flag"), true), Some(type_ref), None, Some(scope), loc());
    declare_in_scope(&mut arena, scope, "flag", ident);
    append_statement(&mut arena, scope, ident);
    let lit = ElementBuilder::new(&mut arena).make_literal(Literal::Float(1.0f64.to_bits()), Some(scope), loc());
    let init = ElementBuilder::new(&mut arena).make_initializer(lit, Some(scope), loc());
    if let Some(element) = arena.find_mut(ident) {
        if let basecode_arena::ElementData::Identifier { initializer, .. } = &mut element.data {
            *initializer = Some(init);
        }
    }

    let mut resolver = Resolver::new(&mut arena, &mut types);
    resolver.run();

    assert!(resolver.diagnostics.is_failed());
    assert_eq!(resolver.diagnostics.diagnostics()[0].code.id(), "C051");
}

#[test]
fn constant_folds_a_binary_add_of_two_literals() {
    let mut arena = basecode_arena::ElementMap::new();
    let scope = ElementBuilder::new(&mut arena).make_block(None, true, loc());
    let a = ElementBuilder::new(&mut arena).make_literal(Literal::Int(2), Some(scope), loc());
    let b = ElementBuilder::new(&mut arena).make_literal(Literal::Int(3), Some(scope), loc());
    let sum = ElementBuilder::new(&mut arena).make_binary(basecode_ast::BinaryOp::Add, a, b, Some(scope), loc());
    append_statement(&mut arena, scope, sum);

    let mut types = TypeTable::new();
    let mut resolver = Resolver::new(&mut arena, &mut types);
    resolver.run();

    assert!(matches!(arena.find(sum).unwrap().data, basecode_arena::ElementData::Literal(Literal::Int(5))));
}

#[test]
fn string_literals_with_equal_contents_share_one_intern_id() {
    let mut arena = basecode_arena::ElementMap::new();
    let scope = ElementBuilder::new(&mut arena).make_block(None, true, loc());
    let a = ElementBuilder::new(&mut arena).make_string_literal("hello", Some(scope), loc());
    let b = ElementBuilder::new(&mut arena).make_string_literal("hello", Some(scope), loc());
    append_statement(&mut arena, scope, a);
    append_statement(&mut arena, scope, b);

    let mut types = TypeTable::new();
    let mut resolver = Resolver::new(&mut arena, &mut types);
    resolver.run();

    assert_eq!(resolver.strings.len(), 1);
    assert_eq!(resolver.strings.intern_id_of(a), resolver.strings.intern_id_of(b));
}
