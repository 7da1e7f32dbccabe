use crate::Evaluator;
use basecode_arena::{ElementData, ElementMap, Literal as ElemLiteral};
use basecode_ast::{AstArena, AstKind, Literal as AstLiteral};
use basecode_common::{ModuleId, Span};
use basecode_types::TypeTable;

fn module_with(ast: &mut AstArena, statements: Vec<basecode_ast::NodeId>) -> basecode_ast::NodeId {
    ast.add(AstKind::Module { name: "main".to_string(), statements: statements.into() }, Span::new(0, 1))
}

#[test]
fn literal_declaration_builds_an_identifier() {
    let mut ast = AstArena::new();
    let lit = ast.add(AstKind::Literal(AstLiteral::Int(42)), Span::new(0, 2));
    let decl = ast.add(AstKind::Declaration { name: "answer".to_string(), ty: None, initializer: Some(lit), is_constant: true }, Span::new(0, 10));
    let module = module_with(&mut ast, vec![decl]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    let module_id = eval.evaluate_module(&ast, module, "main.bc", ModuleId(0)).expect("module evaluates");

    assert!(!eval.diagnostics.is_failed());
    assert!(arena.find(module_id).is_some());
}

#[test]
fn non_constant_declaration_of_a_type_raises_p029() {
    let mut ast = AstArena::new();
    let composite = ast.add(
        AstKind::CompositeType { kind: basecode_ast::CompositeKind::Struct, fields: vec![], base_type: None },
        Span::new(0, 10),
    );
    let decl = ast.add(
        AstKind::Declaration { name: "Point".to_string(), ty: None, initializer: Some(composite), is_constant: false },
        Span::new(0, 10),
    );
    let module = module_with(&mut ast, vec![decl]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));

    assert!(eval.diagnostics.is_failed());
    assert_eq!(eval.diagnostics.diagnostics()[0].code.id(), "P029");
}

#[test]
fn constant_type_declaration_does_not_raise_p029() {
    let mut ast = AstArena::new();
    let composite = ast.add(
        AstKind::CompositeType {
            kind: basecode_ast::CompositeKind::Struct,
            fields: vec![
                basecode_ast::FieldDecl { name: "x".to_string(), ty: basecode_ast::TypeNode::Named { parts: vec!["u32".to_string()], type_args: vec![] }, initializer: None },
                basecode_ast::FieldDecl { name: "y".to_string(), ty: basecode_ast::TypeNode::Named { parts: vec!["u32".to_string()], type_args: vec![] }, initializer: None },
            ],
            base_type: None,
        },
        Span::new(0, 10),
    );
    let decl = ast.add(
        AstKind::Declaration { name: "Point".to_string(), ty: None, initializer: Some(composite), is_constant: true },
        Span::new(0, 10),
    );
    let module = module_with(&mut ast, vec![decl]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));

    assert!(!eval.diagnostics.is_failed());
    assert_eq!(types.len(), 2, "the composite plus one interned u32 (shared by both fields)");
    let composite_type = types.find(basecode_common::TypeId(0)).expect("composite type was interned first");
    assert_eq!(composite_type.size_in_bytes, 8, "two u32 fields pack to 8 bytes");
}

#[test]
fn if_with_non_binary_predicate_gets_wrapped_in_a_comparison() {
    let mut ast = AstArena::new();
    let cond = ast.add(AstKind::Literal(AstLiteral::Bool(true)), Span::new(0, 1));
    let then_branch = ast.add(AstKind::Block { statements: Default::default() }, Span::new(0, 1));
    let if_node = ast.add(AstKind::If { predicate: cond, then_branch, else_branch: None }, Span::new(0, 10));
    let module = module_with(&mut ast, vec![if_node]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));

    let if_element = arena.iter().find(|e| matches!(e.data, ElementData::If { .. })).expect("an if element exists");
    let ElementData::If { predicate, .. } = &if_element.data else { unreachable!() };
    match &arena.find(*predicate).unwrap().data {
        ElementData::Binary { op, rhs, .. } => {
            assert_eq!(*op, basecode_ast::BinaryOp::Equals);
            assert!(matches!(arena.find(*rhs).unwrap().data, ElementData::Literal(ElemLiteral::Bool(true))));
        }
        other => panic!("expected a binary comparison, got {other:?}"),
    }
}

#[test]
fn break_outside_a_loop_raises_p081() {
    let mut ast = AstArena::new();
    let brk = ast.add(AstKind::Break { label: None }, Span::new(0, 1));
    let module = module_with(&mut ast, vec![brk]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));

    assert!(eval.diagnostics.is_failed());
    assert_eq!(eval.diagnostics.diagnostics()[0].code.id(), "P081");
}

#[test]
fn a_bodied_procedure_decl_wires_its_identifier_straight_to_the_instance() {
    let mut ast = AstArena::new();
    let body = ast.add(AstKind::Block { statements: Default::default() }, Span::new(0, 1));
    let signature = AstKind::ProcedureType { params: vec![], returns: vec![], is_foreign: false, is_variadic: false };
    let decl = ast.add(AstKind::ProcedureDecl { name: "doit".to_string(), signature: Box::new(signature), body: Some(body) }, Span::new(0, 10));
    let module = module_with(&mut ast, vec![decl]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));

    let identifier = arena.iter().find(|e| matches!(&e.data, ElementData::Identifier { symbol, .. } if symbol.name() == "doit")).expect("identifier exists");
    let ElementData::Identifier { initializer, .. } = &identifier.data else { unreachable!() };
    let init_element = arena.find(initializer.expect("identifier has an initializer")).expect("initializer exists");
    let ElementData::Initializer { expression } = &init_element.data else { panic!("expected an Initializer element") };
    let target = arena.find(*expression).expect("initializer expression exists");
    assert!(matches!(target.data, ElementData::ProcedureInstance { .. }), "expected the initializer to point straight at a procedure_instance, got {:?}", target.data);
}

#[test]
fn a_bodyless_procedure_signature_wires_its_identifier_to_a_type_literal() {
    let mut ast = AstArena::new();
    let signature = AstKind::ProcedureType { params: vec![], returns: vec![], is_foreign: true, is_variadic: false };
    let decl = ast.add(AstKind::ProcedureDecl { name: "extern_fn".to_string(), signature: Box::new(signature), body: None }, Span::new(0, 10));
    let module = module_with(&mut ast, vec![decl]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));

    let identifier = arena.iter().find(|e| matches!(&e.data, ElementData::Identifier { symbol, .. } if symbol.name() == "extern_fn")).expect("identifier exists");
    let ElementData::Identifier { initializer, .. } = &identifier.data else { unreachable!() };
    let init_element = arena.find(initializer.expect("identifier has an initializer")).expect("initializer exists");
    let ElementData::Initializer { expression } = &init_element.data else { panic!("expected an Initializer element") };
    let target = arena.find(*expression).expect("initializer expression exists");
    assert!(matches!(target.data, ElementData::TypeLiteral { .. }), "expected the initializer to point at a type_literal, got {:?}", target.data);
}

#[test]
fn module_is_only_evaluated_once_when_cached() {
    let mut ast = AstArena::new();
    let lit = ast.add(AstKind::Literal(AstLiteral::Int(1)), Span::new(0, 1));
    let decl = ast.add(AstKind::Declaration { name: "one".to_string(), ty: None, initializer: Some(lit), is_constant: true }, Span::new(0, 1));
    let module = module_with(&mut ast, vec![decl]);

    let mut arena = ElementMap::new();
    let mut types = TypeTable::new();
    let mut eval = Evaluator::new(&mut arena, &mut types);
    let first = eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));
    let element_count = eval.arena.len();
    let second = eval.evaluate_module(&ast, module, "main.bc", ModuleId(0));

    assert_eq!(first, second);
    assert_eq!(eval.arena.len(), element_count, "second evaluation must not re-build the module");
}
