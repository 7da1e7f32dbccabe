//! End-to-end lowering tests: each builds a small resolved CodeDOM graph
//! directly (no parser, since these exercise the emitter in isolation)
//! and checks the basic blocks/instructions `Emitter::emit_module`
//! produces.

use crate::{Emitter, Opcode, Operand};
use basecode_arena::{Block, ElementData, ElementList, IdentifierMap, QualifiedSymbol, Symbol};
use basecode_common::{ElementId, ModuleId, SourceLocation, Span};
use basecode_resolve::StringInternMap;
use basecode_types::{NumericKind, TypeTable};

fn has_label(emitter: &Emitter, label: &str) -> bool {
    emitter.blocks.iter().any(|b| b.label.as_deref() == Some(label))
}

fn loc() -> SourceLocation {
    SourceLocation::new(ModuleId::NONE, Span::synthetic())
}

fn list(ids: &[ElementId]) -> ElementList {
    ids.iter().copied().collect()
}

fn literal(arena: &mut basecode_arena::ElementMap, value: i64) -> ElementId {
    arena.add(ElementData::Literal(basecode_arena::Literal::Int(value)), None, None, loc())
}

/// Wires `procedure_instance` up as a module-level root: `name()` called
/// directly from the module's top-level statement list, which is what
/// makes `CallGraph` treat it as reachable.
fn call_as_root(arena: &mut basecode_arena::ElementMap, name: &str, procedure_instance: ElementId, module_statements: &[ElementId]) -> ElementId {
    let proc_init = arena.add(ElementData::Initializer { expression: procedure_instance }, None, None, loc());
    let proc_ident = arena.add(ElementData::Identifier { symbol: Symbol::new(QualifiedSymbol::simple(name), false), type_ref: None, initializer: Some(proc_init) }, None, None, loc());
    let call_args = arena.add(ElementData::ArgumentList { args: Vec::new() }, None, None, loc());
    let call = arena.add(ElementData::ProcedureCall { callee: QualifiedSymbol::simple(name), candidates: ElementList::new(), args: call_args, resolved: Some(proc_ident) }, None, None, loc());
    let call_stmt = arena.add(ElementData::Statement { expr: call }, None, None, loc());
    let mut statements = Vec::from(module_statements);
    statements.push(call_stmt);
    let module_scope = arena.add(ElementData::Block { scope: Block { statements: list(&statements), ..Block::root() } }, None, None, loc());
    arena.add(ElementData::Module { name: "test".to_string(), scope: module_scope, is_root: true }, None, None, loc())
}

/// `proc sum(a: s32, b: s32): s32 { return a + b }`, called once from
/// module scope, lowers to an `Add` followed by a `Return`.
#[test]
fn a_procedure_body_lowers_its_add_and_return() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    let s32 = types.find_numeric_type(NumericKind::S32);
    let procedure_type = types.make_procedure_type(Symbol::new(QualifiedSymbol::simple("sum"), false), ElementId::default(), vec![s32, s32], vec![s32], false, false);

    let s32_ref_a = arena.add(ElementData::TypeReference { symbol: QualifiedSymbol::simple("s32"), type_id: Some(s32), is_inferred: false }, None, None, loc());
    let s32_ref_b = arena.add(ElementData::TypeReference { symbol: QualifiedSymbol::simple("s32"), type_id: Some(s32), is_inferred: false }, None, None, loc());
    let param_a = arena.add(ElementData::Identifier { symbol: Symbol::new(QualifiedSymbol::simple("a"), false), type_ref: Some(s32_ref_a), initializer: None }, None, None, loc());
    let param_b = arena.add(ElementData::Identifier { symbol: Symbol::new(QualifiedSymbol::simple("b"), false), type_ref: Some(s32_ref_b), initializer: None }, None, None, loc());
    let header_scope = arena.add(ElementData::Block { scope: Block { statements: list(&[param_a, param_b]), ..Block::new() } }, None, None, loc());

    let ref_a = arena.add(ElementData::IdentifierReference { symbol: QualifiedSymbol::simple("a"), resolved: list(&[param_a]) }, None, None, loc());
    let ref_b = arena.add(ElementData::IdentifierReference { symbol: QualifiedSymbol::simple("b"), resolved: list(&[param_b]) }, None, None, loc());
    let sum_expr = arena.add(ElementData::Binary { op: basecode_ast::BinaryOp::Add, lhs: ref_a, rhs: ref_b }, None, None, loc());
    let return_stmt = arena.add(ElementData::Return { values: list(&[sum_expr]) }, None, None, loc());
    let body = arena.add(ElementData::Block { scope: Block { statements: list(&[return_stmt]), ..Block::new() } }, None, None, loc());

    let procedure_instance = arena.add(ElementData::ProcedureInstance { type_id: procedure_type, header_scope, body }, None, None, loc());
    let module = call_as_root(&mut arena, "sum", procedure_instance, &[]);

    let strings = StringInternMap::new();
    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_module(module);

    assert!(!emitter.diagnostics.is_failed());
    let all_ops: Vec<Opcode> = emitter.blocks.iter().flat_map(|b| b.instructions.iter().map(|i| i.op)).collect();
    assert!(all_ops.contains(&Opcode::Add), "expected an Add instruction, got {all_ops:?}");
    assert!(all_ops.contains(&Opcode::Return), "expected a Return instruction, got {all_ops:?}");
}

/// An `if` with both branches lowers to a conditional jump plus separate
/// predicate/true/false blocks.
#[test]
fn an_if_with_both_branches_emits_a_conditional_jump_and_both_branch_blocks() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    let s32 = types.find_numeric_type(NumericKind::S32);
    let procedure_type = types.make_procedure_type(Symbol::new(QualifiedSymbol::simple("pick"), false), ElementId::default(), Vec::new(), vec![s32], false, false);

    let predicate = arena.add(ElementData::Literal(basecode_arena::Literal::Bool(true)), None, None, loc());
    let true_expr = literal(&mut arena, 1);
    let false_expr = literal(&mut arena, 2);
    let true_branch = arena.add(ElementData::Statement { expr: true_expr }, None, None, loc());
    let false_branch = arena.add(ElementData::Statement { expr: false_expr }, None, None, loc());
    let if_stmt = arena.add(ElementData::If { predicate, true_branch, false_branch: Some(false_branch) }, None, None, loc());
    let header_scope = arena.add(ElementData::Block { scope: Block::new() }, None, None, loc());
    let body = arena.add(ElementData::Block { scope: Block { statements: list(&[if_stmt]), ..Block::new() } }, None, None, loc());
    let procedure_instance = arena.add(ElementData::ProcedureInstance { type_id: procedure_type, header_scope, body }, None, None, loc());
    let module = call_as_root(&mut arena, "pick", procedure_instance, &[]);

    let strings = StringInternMap::new();
    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_module(module);

    assert!(!emitter.diagnostics.is_failed());
    let has_conditional_jump = emitter.blocks.iter().any(|b| b.instructions.iter().any(|i| i.op == Opcode::JumpIfZero));
    assert!(has_conditional_jump, "an `if` must emit a conditional jump on its predicate");
    let non_empty_blocks = emitter.blocks.iter().filter(|b| !b.is_empty()).count();
    assert!(non_empty_blocks >= 3, "expected separate predicate/true/false blocks with instructions, found {non_empty_blocks}");
}

/// A module-scope `x := 7` declaration reserves storage in `.data`
/// (it has an initializer, so it cannot live in `.bss`).
#[test]
fn a_module_variable_with_an_initializer_lands_in_the_data_section() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    let s32 = types.find_numeric_type(NumericKind::S32);

    let type_ref = arena.add(ElementData::TypeReference { symbol: QualifiedSymbol::simple("s32"), type_id: Some(s32), is_inferred: false }, None, None, loc());
    let init_lit = literal(&mut arena, 7);
    let initializer = arena.add(ElementData::Initializer { expression: init_lit }, None, None, loc());
    let x = arena.add(ElementData::Identifier { symbol: Symbol::new(QualifiedSymbol::simple("x"), false), type_ref: Some(type_ref), initializer: Some(initializer) }, None, None, loc());

    let mut identifiers = IdentifierMap::default();
    identifiers.insert("x".to_string(), list(&[x]));
    let module_scope = arena.add(ElementData::Block { scope: Block { identifiers, ..Block::root() } }, None, None, loc());
    let module = arena.add(ElementData::Module { name: "test".to_string(), scope: module_scope, is_root: true }, None, None, loc());

    let strings = StringInternMap::new();
    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_module(module);

    assert_eq!(emitter.sections.data.len(), 1);
    assert!(emitter.sections.bss.is_empty());
    assert_eq!(emitter.sections.data[0].label, "_mod_x");
}

/// `break` outside any loop or switch raises P081 instead of panicking.
#[test]
fn a_break_outside_any_loop_raises_flow_control_outside_loop() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    let s32 = types.find_numeric_type(NumericKind::S32);
    let procedure_type = types.make_procedure_type(Symbol::new(QualifiedSymbol::simple("p"), false), ElementId::default(), Vec::new(), vec![s32], false, false);

    let break_stmt = arena.add(ElementData::Break { label: None }, None, None, loc());
    let header_scope = arena.add(ElementData::Block { scope: Block::new() }, None, None, loc());
    let body = arena.add(ElementData::Block { scope: Block { statements: list(&[break_stmt]), ..Block::new() } }, None, None, loc());
    let procedure_instance = arena.add(ElementData::ProcedureInstance { type_id: procedure_type, header_scope, body }, None, None, loc());
    let module = call_as_root(&mut arena, "p", procedure_instance, &[]);

    let strings = StringInternMap::new();
    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_module(module);

    assert!(emitter.diagnostics.is_failed());
    assert_eq!(emitter.diagnostics.diagnostics()[0].code.id(), "P081");
}

/// Parameters and named return parameters both classify without error,
/// in header-scope declaration order.
#[test]
fn parameters_and_return_parameters_both_classify_from_header_scope() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    let s32 = types.find_numeric_type(NumericKind::S32);
    let procedure_type = types.make_procedure_type(Symbol::new(QualifiedSymbol::simple("f"), false), ElementId::default(), vec![s32], vec![s32], false, false);

    let param_ref = arena.add(ElementData::TypeReference { symbol: QualifiedSymbol::simple("s32"), type_id: Some(s32), is_inferred: false }, None, None, loc());
    let return_ref = arena.add(ElementData::TypeReference { symbol: QualifiedSymbol::simple("s32"), type_id: Some(s32), is_inferred: false }, None, None, loc());
    let param = arena.add(ElementData::Identifier { symbol: Symbol::new(QualifiedSymbol::simple("n"), false), type_ref: Some(param_ref), initializer: None }, None, None, loc());
    let result = arena.add(ElementData::Identifier { symbol: Symbol::new(QualifiedSymbol::simple("result"), false), type_ref: Some(return_ref), initializer: None }, None, None, loc());
    let header_scope = arena.add(ElementData::Block { scope: Block { statements: list(&[param, result]), ..Block::new() } }, None, None, loc());
    let body = arena.add(ElementData::Block { scope: Block::new() }, None, None, loc());
    let procedure_instance = arena.add(ElementData::ProcedureInstance { type_id: procedure_type, header_scope, body }, None, None, loc());
    let module = call_as_root(&mut arena, "f", procedure_instance, &[]);

    let strings = StringInternMap::new();
    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_module(module);

    assert!(!emitter.diagnostics.is_failed());
}

/// Spec §4.8's structural scaffolding: `_start`, the module's own
/// implicit block, `_end`/`exit`, and a reachable procedure's labeled
/// entry/exit blocks must all show up, not just the procedure body.
#[test]
fn emit_module_produces_the_structural_blocks_and_labels_a_reachable_procedure() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    let s32 = types.find_numeric_type(NumericKind::S32);
    let procedure_type = types.make_procedure_type(Symbol::new(QualifiedSymbol::simple("main"), false), ElementId::default(), Vec::new(), vec![s32], false, false);

    let header_scope = arena.add(ElementData::Block { scope: Block::new() }, None, None, loc());
    let body = arena.add(ElementData::Block { scope: Block::new() }, None, None, loc());
    let procedure_instance = arena.add(ElementData::ProcedureInstance { type_id: procedure_type, header_scope, body }, None, None, loc());
    let module = call_as_root(&mut arena, "main", procedure_instance, &[]);

    let strings = StringInternMap::new();
    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_module(module);

    assert!(!emitter.diagnostics.is_failed());
    assert!(has_label(&emitter, "_start"), "missing _start block");
    assert!(has_label(&emitter, "_end"), "missing _end block");
    assert!(has_label(&emitter, "exit"), "missing exit block");
    assert!(emitter.blocks.iter().any(|b| b.label.as_deref() == Some("_module_test")), "missing the module's own implicit block");
    assert!(has_label(&emitter, "main_entry"), "reachable procedure's entry block must be labeled");
    assert!(has_label(&emitter, "main_exit"), "reachable procedure's exit block must be labeled");
}

/// `for` must lower its `step` element into a real block on the
/// `body -> step -> predicate` back-edge, and `continue` must target
/// that step block rather than jumping straight back to the predicate
/// (spec §4.8 "For over range intrinsic"; spec §8 scenario 2).
#[test]
fn for_wires_a_real_step_block_and_continue_targets_it() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    let s32 = types.find_numeric_type(NumericKind::S32);
    let procedure_type = types.make_procedure_type(Symbol::new(QualifiedSymbol::simple("loop"), false), ElementId::default(), Vec::new(), Vec::new(), false, false);

    let type_ref = arena.add(ElementData::TypeReference { symbol: QualifiedSymbol::simple("s32"), type_id: Some(s32), is_inferred: false }, None, None, loc());
    let init_lit = literal(&mut arena, 0);
    let init_initializer = arena.add(ElementData::Initializer { expression: init_lit }, None, None, loc());
    let i = arena.add(ElementData::Identifier { symbol: Symbol::new(QualifiedSymbol::simple("i"), false), type_ref: Some(type_ref), initializer: Some(init_initializer) }, None, None, loc());

    let predicate = arena.add(ElementData::Literal(basecode_arena::Literal::Bool(true)), None, None, loc());

    let i_ref_for_step = arena.add(ElementData::IdentifierReference { symbol: QualifiedSymbol::simple("i"), resolved: list(&[i]) }, None, None, loc());
    let one = literal(&mut arena, 1);
    let increment = arena.add(ElementData::Binary { op: basecode_ast::BinaryOp::Add, lhs: i_ref_for_step, rhs: one }, None, None, loc());
    let i_ref_for_assign = arena.add(ElementData::IdentifierReference { symbol: QualifiedSymbol::simple("i"), resolved: list(&[i]) }, None, None, loc());
    let assign = arena.add(ElementData::Binary { op: basecode_ast::BinaryOp::Assign, lhs: i_ref_for_assign, rhs: increment }, None, None, loc());
    let step = arena.add(ElementData::Statement { expr: assign }, None, None, loc());

    let continue_stmt = arena.add(ElementData::Continue { label: None }, None, None, loc());
    let body = arena.add(ElementData::Block { scope: Block { statements: list(&[continue_stmt]), ..Block::new() } }, None, None, loc());

    let for_stmt = arena.add(ElementData::For { init: i, predicate, step, body }, None, None, loc());
    let header_scope = arena.add(ElementData::Block { scope: Block::new() }, None, None, loc());
    let procedure_body = arena.add(ElementData::Block { scope: Block { statements: list(&[for_stmt]), ..Block::new() } }, None, None, loc());
    let procedure_instance = arena.add(ElementData::ProcedureInstance { type_id: procedure_type, header_scope, body: procedure_body }, None, None, loc());
    let module = call_as_root(&mut arena, "loop", procedure_instance, &[]);

    let strings = StringInternMap::new();
    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_module(module);

    assert!(!emitter.diagnostics.is_failed());
    let all_ops: Vec<Opcode> = emitter.blocks.iter().flat_map(|b| b.instructions.iter().map(|i| i.op)).collect();
    assert!(all_ops.contains(&Opcode::Add), "the step's increment must be lowered as a real instruction, not discarded");

    let step_block = emitter.blocks.iter().find(|b| b.instructions.iter().any(|i| i.op == Opcode::Add)).expect("step block with the increment");
    let step_label = Operand::Label(format!("block{}", step_block.id.0));
    let jumps_to_step = emitter
        .blocks
        .iter()
        .flat_map(|b| b.instructions.iter())
        .filter(|i| matches!(i.op, Opcode::Jump) && i.operands.contains(&step_label))
        .count();
    assert!(jumps_to_step >= 2, "expected both `continue` and the body's fallthrough to target the step block, found {jumps_to_step} jumps to it");
}

/// Interned strings and registered types must be materialized as
/// ro_data entries (spec §4.6/§4.8/§6.3), not just referenced by label.
#[test]
fn emit_tables_populates_ro_data_with_strings_and_type_info() {
    let mut arena = basecode_arena::ElementMap::new();
    let mut types = TypeTable::new();
    types.find_numeric_type(NumericKind::S32);

    let lit = arena.add(ElementData::StringLiteral { value: "hi".to_string() }, None, None, loc());
    let _ = lit;
    let mut strings = StringInternMap::new();
    strings.intern_all(&arena);

    let mut emitter = Emitter::new(&arena, &mut types, &strings);
    emitter.emit_tables();

    assert!(!emitter.sections.ro_data.is_empty(), "expected string and type-info entries in ro_data");
    assert!(emitter.sections.ro_data.iter().any(|e| e.label.contains("_intern_str_lit_")), "missing interned-string entry");
    assert!(emitter.sections.ro_data.iter().any(|e| e.label.contains("_type_info_")), "missing type-info entry");
}
