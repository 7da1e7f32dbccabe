//! End-to-end tests driving the whole compile sequence through
//! [`Session::compile`] from hand-built ASTs (no lexer/parser exists in
//! this workspace). These cover two of the end-to-end scenarios
//! (spec §8): a reachable `main` returning a constant, and an
//! assignment type mismatch that must fail before an image is produced.

use crate::session::{ModuleSource, Session};
use crate::options::SessionOptions;
use basecode_ast::{AstArena, AstKind, Literal as AstLiteral, NodeList, Param, TypeNode};
use basecode_common::Code;
use basecode_emit::Opcode;
use clap::Parser;

fn options() -> SessionOptions {
    SessionOptions::try_parse_from(["basecode"]).unwrap()
}

fn module(ast: &mut AstArena, statements: Vec<basecode_ast::NodeId>) -> basecode_ast::NodeId {
    let list: NodeList = statements.into_iter().collect();
    ast.add(AstKind::Module { name: "main".to_string(), statements: list }, basecode_common::Span::new(0, 1))
}

#[test]
fn a_reachable_main_procedure_compiles_to_a_non_failing_image() {
    let mut ast = AstArena::new();
    let span = basecode_common::Span::new(0, 1);

    let forty_two = ast.add(AstKind::Literal(AstLiteral::Int(42)), span);
    let return_stmt = ast.add(AstKind::Return { values: std::iter::once(forty_two).collect() }, span);
    let body = ast.add(AstKind::Block { statements: std::iter::once(return_stmt).collect() }, span);

    let returns = vec![Param { name: "result".to_string(), ty: TypeNode::Named { parts: vec!["u32".to_string()], type_args: vec![] }, default: None }];
    let signature = AstKind::ProcedureType { params: vec![], returns, is_foreign: false, is_variadic: false };
    let main_decl = ast.add(AstKind::ProcedureDecl { name: "main".to_string(), signature: Box::new(signature), body: Some(body) }, span);

    let callee = ast.add(AstKind::IdentifierRef { parts: vec!["main".to_string()] }, span);
    let call = ast.add(AstKind::Call { callee, args: vec![] }, span);

    let root = module(&mut ast, vec![main_decl, call]);

    let mut session = Session::new(options());
    let image = session.compile(vec![ModuleSource { path: "main.bc".to_string(), ast, root }]).expect("compile succeeds");

    assert!(!session.is_failed());
    assert!(session.diagnostics().is_empty(), "unexpected diagnostics: {:?}", session.diagnostics());
    let phases: Vec<&str> = session.tasks.tasks().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(phases, vec!["core types", "generate model", "resolve", "emit byte-code", "assemble", "execute directives"]);

    // `main` is called from module scope, so its body must actually be
    // lowered — a regression in reachability would leave the image with
    // no blocks at all, and this would pass vacuously without this check.
    let all_ops: Vec<Opcode> = image.blocks.iter().flat_map(|b| b.instructions.iter().map(|i| i.op)).collect();
    assert!(all_ops.contains(&Opcode::Return), "expected `main`'s body to be emitted, got {:?}", image.listing());
}

#[test]
fn assigning_an_integer_literal_to_a_bool_declaration_fails_with_type_mismatch() {
    let mut ast = AstArena::new();
    let span = basecode_common::Span::new(0, 1);

    let forty_two = ast.add(AstKind::Literal(AstLiteral::Int(42)), span);
    let decl = ast.add(
        AstKind::Declaration { name: "flag".to_string(), ty: Some(TypeNode::Named { parts: vec!["bool".to_string()], type_args: vec![] }), initializer: Some(forty_two), is_constant: false },
        span,
    );
    let root = module(&mut ast, vec![decl]);

    let mut session = Session::new(options());
    let result = session.compile(vec![ModuleSource { path: "main.bc".to_string(), ast, root }]);

    assert!(result.is_err());
    assert!(session.is_failed());
    assert!(session.diagnostics().iter().any(|d| d.code == Code::TypeMismatch), "expected a TypeMismatch diagnostic, got {:?}", session.diagnostics());
}

#[test]
fn an_assert_directive_over_a_folded_true_literal_raises_no_diagnostic() {
    let mut ast = AstArena::new();
    let span = basecode_common::Span::new(0, 1);

    let true_lit = ast.add(AstKind::Literal(AstLiteral::Bool(true)), span);
    let directive = ast.add(AstKind::Directive { name: "assert".to_string(), args: vec![basecode_ast::Argument { name: None, value: true_lit }] }, span);
    let root = module(&mut ast, vec![directive]);

    let mut session = Session::new(options());
    let result = session.compile(vec![ModuleSource { path: "main.bc".to_string(), ast, root }]);

    assert!(result.is_ok(), "diagnostics: {:?}", session.diagnostics());
}

#[test]
fn an_assert_directive_over_a_folded_false_literal_fails_the_directive_phase() {
    let mut ast = AstArena::new();
    let span = basecode_common::Span::new(0, 1);

    let false_lit = ast.add(AstKind::Literal(AstLiteral::Bool(false)), span);
    let directive = ast.add(AstKind::Directive { name: "assert".to_string(), args: vec![basecode_ast::Argument { name: None, value: false_lit }] }, span);
    let root = module(&mut ast, vec![directive]);

    let mut session = Session::new(options());
    let result = session.compile(vec![ModuleSource { path: "main.bc".to_string(), ast, root }]);

    assert!(result.is_err());
    assert!(session.diagnostics().iter().any(|d| d.code == Code::DirectiveFailed));
}
