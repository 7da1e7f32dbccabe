//! The byte-code emitter (spec §4.8): walks each reachable procedure's
//! CodeDOM body post-order, lowering it into a graph of basic blocks
//! full of three-address instructions, plus the section table for
//! module-scope storage. The shared lowering skeleton for every
//! expression is: infer its type, produce operands from its children,
//! emit one instruction, then release any temporaries that are no
//! longer needed.

use crate::blocks::{BlockGraph, BlockId, FlowStack, FlowTarget};
use crate::instr::{Instruction, Opcode, Operand, OperandSize};
use crate::reachability::CallGraph;
use crate::sections::{string_table_align, type_info_align, SectionEntry, SectionKind, SectionTable};
use crate::variables::{group_variables, module_section_of, Offset, TempPool, VariableKind, VariableMap};
use basecode_arena::{ElementData, ElementKind, ElementMap, Literal};
use basecode_ast::{BinaryOp, UnaryOp};
use basecode_common::{limits::TYPE_INFO_RECORD_SIZE, Code, ElementId, ResultMessage, TypeId};
use basecode_resolve::StringInternMap;
use basecode_types::{NumberClass, TypeKind, TypeTable};

/// Per-procedure emission state: a fresh variable map and temporary
/// pool (frame offsets restart at every procedure), plus the
/// break/continue/fallthrough stack for whatever loop or switch body
/// is currently open.
struct Frame {
    variables: VariableMap,
    temps: TempPool,
    flow: FlowStack,
}

impl Frame {
    fn new() -> Self {
        Self { variables: VariableMap::new(), temps: TempPool::new(), flow: FlowStack::new() }
    }
}

pub struct Emitter<'a> {
    arena: &'a ElementMap,
    types: &'a mut TypeTable,
    strings: &'a StringInternMap,
    module_variables: VariableMap,
    pub blocks: BlockGraph,
    pub sections: SectionTable,
    pub diagnostics: ResultMessage,
}

/// `(size_in_bytes, number_class, is_pointer, is_composite)`. `is_pointer`
/// covers both raw pointers and composites — both are addressed rather
/// than loaded as a scalar immediate (spec §4.8's "always Qword for
/// pointers/composites"). `is_composite` is narrower: only it decides
/// whether an assignment copies bytes or stores a single scalar value.
fn class_of(types: &TypeTable, type_id: Option<TypeId>) -> (u32, NumberClass, bool, bool) {
    let Some(ty) = type_id.and_then(|id| types.find(id)) else { return (8, NumberClass::None, true, false) };
    let is_composite = ty.is_composite();
    (ty.size_in_bytes, ty.number_class, is_composite || ty.access_model == basecode_types::AccessModel::Pointer, is_composite)
}

impl<'a> Emitter<'a> {
    pub fn new(arena: &'a ElementMap, types: &'a mut TypeTable, strings: &'a StringInternMap) -> Self {
        Self { arena, types, strings, module_variables: VariableMap::new(), blocks: BlockGraph::new(), sections: SectionTable::new(), diagnostics: ResultMessage::new() }
    }

    /// Lowers a whole module (spec §4.8): module-scope variables are
    /// classified into section entries, only procedures transitively
    /// reachable from a module-level call site get bodies emitted, and
    /// everything else directly in module scope runs in the entry
    /// block in source order.
    pub fn emit_module(&mut self, module: ElementId) {
        let Some(ElementData::Module { scope, name, .. }) = self.arena.find(module).map(|e| &e.data) else { return };
        let (scope, module_name) = (*scope, name.clone());
        let Some(ElementData::Block { scope: block }) = self.arena.find(scope).map(|e| &e.data) else { return };
        let statements = block.statements.clone();

        self.declare_module_variables(scope);

        // Structural scaffolding (spec §4.8 "Sections emitted, in
        // order"): `_start`, one implicit block per distinct imported
        // module plus the root, then `_end` -> `exit`. The root's
        // implicit block is where this module's own top-level
        // statements actually run.
        let start_block = self.blocks.entry();
        self.blocks.set_label(start_block, "_start");

        let mut previous = start_block;
        for path in distinct_import_paths(self.arena, &statements) {
            let implicit = self.blocks.new_block();
            self.blocks.set_label(implicit, format!("_module_{path}"));
            self.blocks.push(previous, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", implicit.0))));
            self.blocks.connect(previous, implicit);
            previous = implicit;
        }
        let root_block = self.blocks.new_block();
        self.blocks.set_label(root_block, format!("_module_{module_name}"));
        self.blocks.push(previous, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", root_block.0))));
        self.blocks.connect(previous, root_block);

        let mut current = root_block;
        for statement in statements {
            if matches!(self.arena.find(statement).map(|e| e.kind()), Some(ElementKind::Identifier) | Some(ElementKind::Import)) {
                continue;
            }
            current = self.emit_statement(&mut Frame::new(), current, statement);
        }

        let end_block = self.blocks.new_block();
        let exit_block = self.blocks.new_block();
        self.blocks.set_label(end_block, "_end");
        self.blocks.set_label(exit_block, "exit");
        self.blocks.push(current, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", end_block.0))));
        self.blocks.connect(current, end_block);
        self.blocks.push(end_block, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", exit_block.0))));
        self.blocks.connect(end_block, exit_block);

        let graph = CallGraph::build(self.arena);
        let reachable = graph.reachable();
        for instance in &reachable {
            let entry = self.blocks.new_block();
            self.blocks.bind(*instance, entry);
            let name = procedure_name_of(self.arena, *instance);
            if let Some(name) = &name {
                self.blocks.set_label(entry, format!("{name}_entry"));
            }
            let procedure_exit = self.emit_procedure(*instance, entry);
            if let Some(name) = &name {
                self.blocks.set_label(procedure_exit, format!("{name}_exit"));
            }
        }
    }

    /// Materializes the interned-string table and the type-info table
    /// into `ro_data` (spec §4.6/§4.8/§6.3). Both tables are shared
    /// across the whole compile rather than scoped to one module, so
    /// the session driver calls this once after every module has been
    /// lowered, not from inside `emit_module`.
    pub fn emit_tables(&mut self) {
        for (id, value) in self.strings.iter() {
            let mut bytes = value.clone().into_bytes();
            bytes.push(0);
            self.sections.push(SectionKind::RoData, SectionEntry::initialized(format!("_intern_str_lit_{id}_data"), string_table_align(), bytes));
            self.sections.push(SectionKind::RoData, SectionEntry::reservation(format!("_intern_str_lit_{id}"), string_table_align(), 8));
        }

        let type_ids: Vec<TypeId> = self.types.iter().map(|ty| ty.id).collect();
        for type_id in type_ids {
            self.sections.push(SectionKind::RoData, SectionEntry::reservation(format!("_type_info_{}", type_id.0), type_info_align(), TYPE_INFO_RECORD_SIZE));
        }
    }

    /// Classifies every `identifier` declared directly in module scope
    /// and reserves its storage in the matching section (spec §4.7
    /// "Module-scope grouping").
    fn declare_module_variables(&mut self, scope: ElementId) {
        let Some(ElementData::Block { scope: block }) = self.arena.find(scope).map(|e| &e.data) else { return };
        let declarations: Vec<ElementId> = block.identifiers.values().flat_map(|ids| ids.iter().copied()).collect();
        for id in declarations {
            let Some(ElementData::Identifier { symbol, type_ref, initializer }) = self.arena.find(id).map(|e| &e.data) else { continue };
            // Procedure declarations carry no `type_ref` (spec §4.3
            // `evaluate_procedure_decl`); those are lowered separately
            // from the reachable-procedure set, not as storage.
            let Some(type_ref) = type_ref else { continue };
            let type_id = basecode_resolve::type_id_of(self.arena, *type_ref);
            let (size, number_class, is_pointer, is_composite) = class_of(self.types, type_id);
            let label = format!("_mod_{}", symbol.name());
            let has_initializer = initializer.is_some();
            self.module_variables.classify(id, VariableKind::Module, size, number_class, is_pointer, is_composite, label.clone());
            let section: SectionKind = module_section_of(symbol.is_constant, has_initializer).into();
            if !matches!(section, SectionKind::Text) {
                self.sections.push(section, SectionEntry::reservation(label, string_table_align().max(1), size as u64));
            }
        }
    }

    /// Emits one procedure's body (spec §4.8): declares parameters and
    /// named return parameters from the header scope, then walks the
    /// body statement list.
    fn emit_procedure(&mut self, instance: ElementId, entry: BlockId) -> BlockId {
        let Some(ElementData::ProcedureInstance { type_id, header_scope, body }) = self.arena.find(instance).map(|e| &e.data) else { return entry };
        let (type_id, header_scope, body) = (*type_id, *header_scope, *body);
        let mut frame = Frame::new();
        self.declare_parameters(&mut frame, type_id, header_scope);

        let Some(ElementData::Block { scope: block }) = self.arena.find(body).map(|e| &e.data) else { return entry };
        let statements = block.statements.clone();
        let mut current = entry;
        for statement in statements {
            current = self.emit_statement(&mut frame, current, statement);
        }
        current
    }

    /// Parameters and named return parameters share `header_scope`'s
    /// statement list, parameters first (spec §4.7; mirrors how
    /// `basecode-eval::procs::declare_params` appends them in that
    /// order).
    fn declare_parameters(&mut self, frame: &mut Frame, procedure_type: TypeId, header_scope: ElementId) {
        let Some(ty) = self.types.find(procedure_type) else { return };
        let TypeKind::Procedure { parameter_types, return_types, .. } = &ty.kind else { return };
        let parameter_count = parameter_types.len();
        let return_count = return_types.len();
        let Some(ElementData::Block { scope: block }) = self.arena.find(header_scope).map(|e| &e.data) else { return };
        let declarations: Vec<ElementId> = block.statements.iter().copied().collect();
        for (index, id) in declarations.into_iter().enumerate() {
            let Some(ElementData::Identifier { symbol, type_ref, .. }) = self.arena.find(id).map(|e| &e.data) else { continue };
            let type_id = type_ref.and_then(|r| basecode_resolve::type_id_of(self.arena, r));
            let (size, number_class, is_pointer, is_composite) = class_of(self.types, type_id);
            let kind = if index < parameter_count { VariableKind::Parameter } else if index < parameter_count + return_count { VariableKind::ReturnParameter } else { VariableKind::Local };
            frame.variables.classify(id, kind, size, number_class, is_pointer, is_composite, symbol.name().to_string());
        }
    }

    // ---- statements -------------------------------------------------

    fn emit_statement(&mut self, frame: &mut Frame, current: BlockId, id: ElementId) -> BlockId {
        let Some(element) = self.arena.find(id) else { return current };
        match &element.data {
            ElementData::Statement { expr } => self.emit_expr(frame, current, *expr).0,
            ElementData::Identifier { type_ref, initializer, .. } => self.emit_local_declaration(frame, current, id, *type_ref, *initializer),
            ElementData::If { predicate, true_branch, false_branch } => self.emit_if(frame, current, *predicate, *true_branch, *false_branch),
            ElementData::While { predicate, body } => self.emit_while(frame, current, *predicate, *body),
            ElementData::For { init, predicate, step, body } => self.emit_for(frame, current, *init, *predicate, *step, *body),
            ElementData::Switch { expr, cases } => self.emit_switch(frame, current, *expr, cases.clone()),
            ElementData::Break { .. } => self.emit_break(frame, current, id),
            ElementData::Continue { .. } => self.emit_continue(frame, current, id),
            ElementData::Return { values } => self.emit_return(frame, current, values.clone()),
            ElementData::Block { scope } => {
                let statements = scope.statements.clone();
                let mut current = current;
                for statement in statements {
                    current = self.emit_statement(frame, current, statement);
                }
                current
            }
            _ => self.emit_expr(frame, current, id).0,
        }
    }

    fn emit_local_declaration(&mut self, frame: &mut Frame, current: BlockId, id: ElementId, type_ref: Option<ElementId>, initializer: Option<ElementId>) -> BlockId {
        let type_id = type_ref.and_then(|r| basecode_resolve::type_id_of(self.arena, r));
        let (size, number_class, is_pointer, is_composite) = class_of(self.types, type_id);
        let name = match self.arena.find(id).map(|e| &e.data) {
            Some(ElementData::Identifier { symbol, .. }) => symbol.name().to_string(),
            _ => String::new(),
        };
        frame.variables.classify(id, VariableKind::Local, size, number_class, is_pointer, is_composite, name);
        let Some(initializer) = initializer else { return current };
        let Some(expr) = self.initializer_expr(initializer) else { return current };
        self.emit_store(frame, current, id, expr).0
    }

    fn initializer_expr(&self, initializer: ElementId) -> Option<ElementId> {
        match &self.arena.find(initializer)?.data {
            ElementData::Initializer { expression } => Some(*expression),
            ElementData::Binary { op, rhs, .. } if *op == BinaryOp::Assign => Some(*rhs),
            _ => Some(initializer),
        }
    }

    fn emit_if(&mut self, frame: &mut Frame, current: BlockId, predicate: ElementId, true_branch: ElementId, false_branch: Option<ElementId>) -> BlockId {
        let (current, cond) = self.emit_expr(frame, current, predicate);
        let true_block = self.blocks.new_block();
        let exit_block = self.blocks.new_block();
        let false_block = if false_branch.is_some() { self.blocks.new_block() } else { exit_block };

        self.blocks.push(current, Instruction::new(Opcode::JumpIfZero, OperandSize::Dword).with_operand(cond).with_operand(Operand::Label(format!("block{}", false_block.0))));
        self.blocks.connect(current, true_block);
        self.blocks.connect(current, false_block);

        let after_true = self.emit_statement(frame, true_block, true_branch);
        self.blocks.push(after_true, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", exit_block.0))));
        self.blocks.connect(after_true, exit_block);

        if let Some(false_branch) = false_branch {
            let after_false = self.emit_statement(frame, false_block, false_branch);
            self.blocks.connect(after_false, exit_block);
        }
        exit_block
    }

    fn emit_while(&mut self, frame: &mut Frame, current: BlockId, predicate: ElementId, body: ElementId) -> BlockId {
        let predicate_block = self.blocks.new_block();
        let body_block = self.blocks.new_block();
        let exit_block = self.blocks.new_block();
        self.blocks.connect(current, predicate_block);
        self.blocks.push(current, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", predicate_block.0))));

        let (after_predicate, cond) = self.emit_expr(frame, predicate_block, predicate);
        self.blocks.push(after_predicate, Instruction::new(Opcode::JumpIfZero, OperandSize::Dword).with_operand(cond).with_operand(Operand::Label(format!("block{}", exit_block.0))));
        self.blocks.connect(after_predicate, body_block);
        self.blocks.connect(after_predicate, exit_block);

        frame.flow.push(FlowTarget { break_block: exit_block, continue_block: Some(predicate_block), fallthrough_block: None });
        let after_body = self.emit_statement(frame, body_block, body);
        frame.flow.pop();
        self.blocks.push(after_body, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", predicate_block.0))));
        self.blocks.connect(after_body, predicate_block);
        exit_block
    }

    /// `for` lowers to `{entry, body, step, exit}` (spec §4.8 "For over
    /// range intrinsic"): unlike `while`, `continue` must still run the
    /// increment, so it targets `step` rather than jumping straight back
    /// to the predicate.
    fn emit_for(&mut self, frame: &mut Frame, current: BlockId, init: ElementId, predicate: ElementId, step: ElementId, body: ElementId) -> BlockId {
        let after_init = self.emit_statement(frame, current, init);

        let predicate_block = self.blocks.new_block();
        let body_block = self.blocks.new_block();
        let step_block = self.blocks.new_block();
        let exit_block = self.blocks.new_block();
        self.blocks.connect(after_init, predicate_block);
        self.blocks.push(after_init, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", predicate_block.0))));

        let (after_predicate, cond) = self.emit_expr(frame, predicate_block, predicate);
        self.blocks.push(after_predicate, Instruction::new(Opcode::JumpIfZero, OperandSize::Dword).with_operand(cond).with_operand(Operand::Label(format!("block{}", exit_block.0))));
        self.blocks.connect(after_predicate, body_block);
        self.blocks.connect(after_predicate, exit_block);

        frame.flow.push(FlowTarget { break_block: exit_block, continue_block: Some(step_block), fallthrough_block: None });
        let after_body = self.emit_statement(frame, body_block, body);
        frame.flow.pop();
        self.blocks.push(after_body, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", step_block.0))));
        self.blocks.connect(after_body, step_block);

        let after_step = self.emit_statement(frame, step_block, step);
        self.blocks.push(after_step, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", predicate_block.0))));
        self.blocks.connect(after_step, predicate_block);

        exit_block
    }

    fn emit_switch(&mut self, frame: &mut Frame, current: BlockId, expr: ElementId, cases: basecode_arena::ElementList) -> BlockId {
        let (mut current, scrutinee) = self.emit_expr(frame, current, expr);
        let exit_block = self.blocks.new_block();
        let mut previous_fallthrough: Option<BlockId> = None;

        for case in cases {
            let Some(ElementData::Case { value, body, falls_through }) = self.arena.find(case).map(|e| &e.data) else { continue };
            let (value, body, falls_through) = (*value, *body, *falls_through);
            let case_block = self.blocks.new_block();
            if let Some(prev) = previous_fallthrough {
                self.blocks.connect(prev, case_block);
            }
            match value {
                Some(value_expr) => {
                    let (after_value, value_operand) = self.emit_expr(frame, current, value_expr);
                    let dest = Operand::Register(frame.temps.retain_temp(NumberClass::Integer));
                    self.blocks.push(after_value, Instruction::new(Opcode::Cmp, OperandSize::Dword).with_dest(dest.clone()).with_operand(scrutinee.clone()).with_operand(value_operand));
                    let next_test = self.blocks.new_block();
                    self.blocks.push(after_value, Instruction::new(Opcode::JumpIfZero, OperandSize::Dword).with_operand(dest).with_operand(Operand::Label(format!("block{}", next_test.0))));
                    self.blocks.connect(after_value, case_block);
                    self.blocks.connect(after_value, next_test);
                    current = next_test;
                }
                None => {
                    // The `default` case: always falls into its body.
                    self.blocks.push(current, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", case_block.0))));
                    self.blocks.connect(current, case_block);
                }
            }

            let next_case_block = self.blocks.new_block();
            frame.flow.push(FlowTarget { break_block: exit_block, continue_block: None, fallthrough_block: Some(next_case_block) });
            let after_body = self.emit_statement(frame, case_block, body);
            frame.flow.pop();
            if falls_through {
                previous_fallthrough = Some(after_body);
            } else {
                self.blocks.push(after_body, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", exit_block.0))));
                self.blocks.connect(after_body, exit_block);
                previous_fallthrough = None;
            }
        }
        self.blocks.connect(current, exit_block);
        exit_block
    }

    fn emit_break(&mut self, frame: &mut Frame, current: BlockId, id: ElementId) -> BlockId {
        let Some(target) = frame.flow.top() else {
            let loc = self.arena.find(id).map(|e| e.location);
            self.diagnostics.error(Code::FlowControlOutsideLoop, "`break` with no enclosing loop or switch".to_string(), loc);
            return current;
        };
        let break_block = target.break_block;
        self.blocks.push(current, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", break_block.0))));
        self.blocks.connect(current, break_block);
        current
    }

    fn emit_continue(&mut self, frame: &mut Frame, current: BlockId, id: ElementId) -> BlockId {
        let Some(target) = frame.flow.top() else {
            let loc = self.arena.find(id).map(|e| e.location);
            self.diagnostics.error(Code::FlowControlOutsideLoop, "`continue` with no enclosing loop".to_string(), loc);
            return current;
        };
        let Some(continue_block) = target.continue_block else {
            let loc = self.arena.find(id).map(|e| e.location);
            self.diagnostics.error(Code::FlowControlOutsideLoop, "`continue` inside a switch has nothing to continue".to_string(), loc);
            return current;
        };
        self.blocks.push(current, Instruction::new(Opcode::Jump, OperandSize::Dword).with_operand(Operand::Label(format!("block{}", continue_block.0))));
        self.blocks.connect(current, continue_block);
        current
    }

    fn emit_return(&mut self, frame: &mut Frame, current: BlockId, values: basecode_arena::ElementList) -> BlockId {
        let return_slots: Vec<ElementId> = frame.variables.iter().filter(|v| v.kind == VariableKind::ReturnParameter).map(|v| v.declaration).collect();
        for (slot, value) in return_slots.into_iter().zip(values.iter().copied()) {
            let (after, operand) = self.emit_expr(frame, current, value);
            self.store_into(frame, after, slot, operand);
        }
        self.blocks.push(current, Instruction::new(Opcode::Return, OperandSize::Qword));
        current
    }

    // ---- expressions --------------------------------------------------

    fn emit_expr(&mut self, frame: &mut Frame, current: BlockId, id: ElementId) -> (BlockId, Operand) {
        let Some(element) = self.arena.find(id) else { return (current, Operand::ImmediateInt(0)) };
        match &element.data {
            ElementData::Literal(Literal::Int(v)) => (current, Operand::ImmediateInt(*v)),
            ElementData::Literal(Literal::Float(bits)) => (current, Operand::ImmediateFloat(*bits)),
            ElementData::Literal(Literal::Bool(v)) => (current, Operand::ImmediateInt(*v as i64)),
            ElementData::Literal(Literal::Char(c)) => (current, Operand::ImmediateInt(*c as i64)),
            ElementData::Literal(Literal::Nil) | ElementData::Literal(Literal::Uninitialized) => (current, Operand::ImmediateInt(0)),
            ElementData::StringLiteral { .. } => {
                let label = self.strings.label_of(id).unwrap_or_default();
                (current, Operand::Label(label))
            }
            ElementData::IdentifierReference { resolved, .. } => {
                let Some(target) = resolved.first().copied() else { return (current, Operand::ImmediateInt(0)) };
                self.emit_read(frame, current, target)
            }
            ElementData::Binary { op, lhs, rhs } if *op == BinaryOp::Assign => {
                let (after, value) = self.emit_expr(frame, current, *rhs);
                self.emit_assign(frame, after, *lhs, value)
            }
            ElementData::Binary { op, lhs, rhs } => {
                let (after_lhs, lhs_operand) = self.emit_expr(frame, current, *lhs);
                let (after_rhs, rhs_operand) = self.emit_expr(frame, after_lhs, *rhs);
                let dest = Operand::Register(frame.temps.retain_temp(NumberClass::Integer));
                let opcode = binary_opcode(*op);
                self.blocks.push(after_rhs, Instruction::new(opcode, OperandSize::Dword).with_dest(dest.clone()).with_operand(lhs_operand).with_operand(rhs_operand));
                (after_rhs, dest)
            }
            ElementData::Unary { op, operand } => {
                let (after, inner) = self.emit_expr(frame, current, *operand);
                let opcode = match op {
                    UnaryOp::Negate => Opcode::Neg,
                    UnaryOp::LogicalNot | UnaryOp::BitwiseNot => Opcode::Not,
                    UnaryOp::AddressOf => Opcode::AddressOf,
                    UnaryOp::Deref => Opcode::Load,
                };
                let dest = Operand::Register(frame.temps.retain_temp(NumberClass::Integer));
                self.blocks.push(after, Instruction::new(opcode, OperandSize::Dword).with_dest(dest.clone()).with_operand(inner));
                (after, dest)
            }
            ElementData::Cast { type_ref, expr } => self.emit_cast(frame, current, *type_ref, *expr),
            ElementData::Subscript { base, index, .. } => self.emit_subscript_address(frame, current, *base, *index),
            ElementData::MemberAccess { base, member } => self.emit_member_address(frame, current, *base, member.clone()),
            ElementData::ProcedureCall { resolved, args, .. } => self.emit_call(frame, current, *resolved, *args),
            _ => (current, Operand::ImmediateInt(0)),
        }
    }

    /// A read of a named variable (spec §4.7's per-use fill state
    /// machine): loads into a fresh register only when a fill is
    /// actually required, otherwise reuses the cached register.
    fn emit_read(&mut self, frame: &mut Frame, current: BlockId, declaration: ElementId) -> (BlockId, Operand) {
        let local = frame.variables.get(declaration).is_some();
        let needs_fill = if local { frame.variables.record_use(declaration, false) } else { self.module_variables.record_use(declaration, false) };
        if !needs_fill {
            let cached = if local { frame.variables.cached_register(declaration) } else { self.module_variables.cached_register(declaration) };
            if let Some(register) = cached {
                return (current, Operand::Register(register.to_string()));
            }
        }
        let Some(variable) = (if local { frame.variables.get(declaration) } else { self.module_variables.get(declaration) }) else {
            return (current, Operand::ImmediateInt(0));
        };
        let offset = variable.offset.clone();
        let is_pointer = variable.flags.pointer;
        let size = OperandSize::from_size_in_bytes(4, is_pointer);
        let register = frame.temps.retain_temp(variable.number_class);
        self.blocks.push(current, Instruction::new(Opcode::Load, size).with_dest(Operand::Register(register.clone())).with_operand(Operand::Memory(offset)));
        if local {
            frame.variables.cache_register(declaration, register.clone());
        } else {
            self.module_variables.cache_register(declaration, register.clone());
        }
        (current, Operand::Register(register))
    }

    /// `lhs = value` (spec §4.7 "composite vs scalar assign"): a
    /// composite destination copies bytes and invalidates every
    /// variable aliasing it; a scalar destination stores directly and
    /// caches the written register.
    fn emit_assign(&mut self, frame: &mut Frame, current: BlockId, lhs: ElementId, value: Operand) -> (BlockId, Operand) {
        match self.arena.find(lhs).map(|e| &e.data) {
            Some(ElementData::IdentifierReference { resolved, .. }) => {
                let Some(target) = resolved.first().copied() else { return (current, value) };
                let after = self.store_into(frame, current, target, value.clone());
                (after, value)
            }
            Some(ElementData::Subscript { base, index, .. }) => {
                let (base, index) = (*base, *index);
                let (after_addr, address) = self.emit_subscript_address(frame, current, base, index);
                self.blocks.push(after_addr, Instruction::new(Opcode::Store, OperandSize::Dword).with_dest(address).with_operand(value.clone()));
                if let Some(base_id) = self.alias_base_of(base) {
                    frame.variables.invalidate_aliases_of(base_id);
                }
                (after_addr, value)
            }
            Some(ElementData::MemberAccess { base, member }) => {
                let (base, member) = (*base, member.clone());
                let (after_addr, address) = self.emit_member_address(frame, current, base, member);
                self.blocks.push(after_addr, Instruction::new(Opcode::Store, OperandSize::Dword).with_dest(address).with_operand(value.clone()));
                if let Some(base_id) = self.alias_base_of(base) {
                    frame.variables.invalidate_aliases_of(base_id);
                }
                (after_addr, value)
            }
            _ => (current, value),
        }
    }

    fn alias_base_of(&self, base: ElementId) -> Option<ElementId> {
        match self.arena.find(base).map(|e| &e.data) {
            Some(ElementData::IdentifierReference { resolved, .. }) => resolved.first().copied(),
            _ => None,
        }
    }

    /// Stores directly into `declaration` from its initializer or from
    /// an assignment's RHS expression, choosing the composite
    /// (`CopyBytes`) or scalar (`Store`) path by the variable's own
    /// type (spec §4.7).
    fn emit_store(&mut self, frame: &mut Frame, current: BlockId, declaration: ElementId, value_expr: ElementId) -> (BlockId, Operand) {
        let (after, value) = self.emit_expr(frame, current, value_expr);
        let after = self.store_into(frame, after, declaration, value.clone());
        (after, value)
    }

    fn store_into(&mut self, frame: &mut Frame, current: BlockId, declaration: ElementId, value: Operand) -> BlockId {
        let local = frame.variables.get(declaration).is_some();
        let Some(variable) = (if local { frame.variables.get(declaration) } else { self.module_variables.get(declaration) }) else { return current };
        let offset = variable.offset.clone();
        let is_composite = variable.is_composite;
        if is_composite {
            self.blocks.push(current, Instruction::new(Opcode::CopyBytes, OperandSize::Qword).with_dest(Operand::Memory(offset)).with_operand(value));
            if local {
                frame.variables.invalidate_aliases_of(declaration);
            } else {
                self.module_variables.invalidate_aliases_of(declaration);
            }
        } else {
            self.blocks.push(current, Instruction::new(Opcode::Store, OperandSize::Dword).with_dest(Operand::Memory(offset)).with_operand(value.clone()));
            if local {
                frame.variables.record_spill(declaration);
                if let Operand::Register(name) = &value {
                    frame.variables.cache_register(declaration, name.clone());
                }
            } else {
                self.module_variables.record_spill(declaration);
                if let Operand::Register(name) = &value {
                    self.module_variables.cache_register(declaration, name.clone());
                }
            }
        }
        current
    }

    /// Cast lowering (spec §4.8): picks a no-op, a truncation, a
    /// sign/zero extension, or a float<->int conversion purely from the
    /// source and target `NumberClass`/size/signedness.
    fn emit_cast(&mut self, frame: &mut Frame, current: BlockId, type_ref: ElementId, expr: ElementId) -> (BlockId, Operand) {
        let target_type = basecode_resolve::type_id_of(self.arena, type_ref);
        let source_type = basecode_resolve::infer_expr_type(self.arena, self.types, expr);
        let (after, operand) = self.emit_expr(frame, current, expr);

        let target = target_type.and_then(|id| self.types.find(id));
        let source = source_type.and_then(|id| self.types.find(id));
        let (Some(target), Some(source)) = (target, source) else { return (after, operand) };

        let opcode = match (source.number_class, target.number_class) {
            (NumberClass::Float, NumberClass::Integer) => Opcode::ConvertFloatToInt,
            (NumberClass::Integer, NumberClass::Float) => Opcode::ConvertIntToFloat,
            (NumberClass::Float, NumberClass::Float) if target.size_in_bytes > source.size_in_bytes => Opcode::ConvertFloatExtend,
            (NumberClass::Float, NumberClass::Float) if target.size_in_bytes < source.size_in_bytes => Opcode::ConvertFloatTruncate,
            (NumberClass::Integer, NumberClass::Integer) if target.size_in_bytes > source.size_in_bytes => {
                let source_signed = matches!(source.kind, TypeKind::Numeric(kind) if kind.is_signed());
                if source_signed {
                    Opcode::ConvertSignExtend
                } else {
                    Opcode::ConvertZeroExtend
                }
            }
            (NumberClass::Integer, NumberClass::Integer) if target.size_in_bytes < source.size_in_bytes => Opcode::ConvertTruncateInt,
            _ => return (after, operand),
        };
        let dest = Operand::Register(frame.temps.retain_temp(target.number_class));
        let size = OperandSize::from_size_in_bytes(target.size_in_bytes, target.access_model == basecode_types::AccessModel::Pointer);
        self.blocks.push(after, Instruction::new(opcode, size).with_dest(dest.clone()).with_operand(operand));
        (after, dest)
    }

    /// `&base.data + index * elem_size` (spec §4.8 "Subscript").
    fn emit_subscript_address(&mut self, frame: &mut Frame, current: BlockId, base: ElementId, index: ElementId) -> (BlockId, Operand) {
        let (after_base, base_operand) = self.emit_expr(frame, current, base);
        let (after_index, index_operand) = self.emit_expr(frame, after_base, index);
        let elem_size = basecode_resolve::infer_expr_type(self.arena, self.types, base)
            .and_then(|id| self.types.find(id))
            .and_then(|ty| match &ty.kind {
                TypeKind::Array { base, .. } => self.types.find(*base).map(|t| t.size_in_bytes),
                _ => None,
            })
            .unwrap_or(1);
        let scaled = Operand::Register(frame.temps.retain_temp(NumberClass::Integer));
        self.blocks.push(
            after_index,
            Instruction::new(Opcode::Mul, OperandSize::Qword).with_dest(scaled.clone()).with_operand(index_operand).with_operand(Operand::ImmediateInt(elem_size as i64)),
        );
        let address = Operand::Register(frame.temps.retain_temp(NumberClass::Integer));
        self.blocks.push(after_index, Instruction::new(Opcode::AddressOf, OperandSize::Qword).with_dest(address.clone()).with_operand(base_operand).with_operand(scaled));
        (after_index, address)
    }

    fn emit_member_address(&mut self, frame: &mut Frame, current: BlockId, base: ElementId, member: String) -> (BlockId, Operand) {
        let (after_base, base_operand) = self.emit_expr(frame, current, base);
        let field_offset = basecode_resolve::infer_expr_type(self.arena, self.types, base)
            .and_then(|id| self.types.find(id))
            .and_then(|ty| match &ty.kind {
                TypeKind::Composite { fields, .. } => fields.get(&member).copied(),
                _ => None,
            })
            .and_then(|field_decl| self.arena.find(field_decl))
            .map(|e| match &e.data {
                ElementData::Field { offset, .. } => offset.offset,
                _ => 0,
            })
            .unwrap_or(0);
        let address = Operand::Register(frame.temps.retain_temp(NumberClass::Integer));
        self.blocks.push(
            after_base,
            Instruction::new(Opcode::AddressOf, OperandSize::Qword).with_dest(address.clone()).with_operand(base_operand).with_operand(Operand::ImmediateInt(field_offset as i64)),
        );
        (after_base, address)
    }

    /// A procedure call (spec §4.7 "`pushm`/`popm`"): the currently
    /// live, filled variables save around the call site via
    /// `group_variables`, excluding whichever locals feed the call's
    /// own arguments.
    fn emit_call(&mut self, frame: &mut Frame, current: BlockId, resolved: Option<ElementId>, args: ElementId) -> (BlockId, Operand) {
        let arg_values: Vec<ElementId> = match self.arena.find(args).map(|e| &e.data) {
            Some(ElementData::ArgumentList { args }) => args.iter().map(|a| a.value).collect(),
            _ => Vec::new(),
        };
        let excluded: Vec<ElementId> = arg_values.iter().filter_map(|expr| self.alias_base_of(*expr)).collect();
        let groups = group_variables(&frame.variables, &excluded);
        for group in &groups {
            if !group.integer_class.is_empty() {
                self.blocks.push(current, Instruction::new(Opcode::PushMulti, OperandSize::Qword));
            }
        }

        let mut current = current;
        let mut operands = Vec::with_capacity(arg_values.len());
        for arg in arg_values {
            let (after, operand) = self.emit_expr(frame, current, arg);
            operands.push(operand);
            current = after;
        }

        let dest = Operand::Register(frame.temps.retain_temp(NumberClass::Integer));
        let mut instruction = Instruction::new(Opcode::Call, OperandSize::Qword).with_dest(dest.clone());
        if let Some(target) = resolved {
            let label = match self.arena.find(target).map(|e| &e.data) {
                Some(ElementData::Identifier { symbol, .. }) => symbol.name().to_string(),
                _ => String::new(),
            };
            instruction = instruction.with_operand(Operand::Label(label));
        }
        for operand in operands {
            instruction = instruction.with_operand(operand);
        }
        self.blocks.push(current, instruction);

        for group in groups.iter().rev() {
            if !group.integer_class.is_empty() {
                self.blocks.push(current, Instruction::new(Opcode::PopMulti, OperandSize::Qword));
            }
        }
        (current, dest)
    }
}

/// Distinct `import`ed paths declared directly in a module's top-level
/// statement list, in source order deduplicated (spec §4.8 "implicit
/// module blocks ... one per distinct imported module"). `Import`'s
/// `imported_module` link is never resolved by this port (the session
/// driver owns cross-module loading), so this groups by the import's own
/// qualified path rather than its resolved target.
fn distinct_import_paths(arena: &ElementMap, statements: &[ElementId]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    for &id in statements {
        if let Some(ElementData::Import { path, .. }) = arena.find(id).map(|e| &e.data) {
            seen.insert(path.fully_qualified_name());
        }
    }
    seen.into_iter().collect()
}

/// Recovers a `procedure_instance`'s declared name by walking every
/// `identifier` for one whose `initializer -> expression` points at it
/// (the same link `reachability::procedure_instance_of` follows in
/// reverse) — instances carry no back-pointer to their declaring
/// identifier.
fn procedure_name_of(arena: &ElementMap, instance: ElementId) -> Option<String> {
    for id in arena.find_by_kind(ElementKind::Identifier) {
        let Some(ElementData::Identifier { symbol, initializer, .. }) = arena.find(*id).map(|e| &e.data) else { continue };
        let Some(init) = initializer else { continue };
        let Some(ElementData::Initializer { expression }) = arena.find(*init).map(|e| &e.data) else { continue };
        if *expression == instance {
            return Some(symbol.name().to_string());
        }
    }
    None
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Subtract => Opcode::Sub,
        BinaryOp::Multiply => Opcode::Mul,
        BinaryOp::Divide => Opcode::Div,
        BinaryOp::Modulo => Opcode::Mod,
        BinaryOp::BitwiseAnd | BinaryOp::LogicalAnd => Opcode::And,
        BinaryOp::BitwiseOr | BinaryOp::LogicalOr => Opcode::Or,
        BinaryOp::BitwiseXor => Opcode::Xor,
        BinaryOp::ShiftLeft => Opcode::Shl,
        BinaryOp::ShiftRight => Opcode::Shr,
        BinaryOp::Equals | BinaryOp::NotEquals | BinaryOp::LessThan | BinaryOp::LessThanOrEqual | BinaryOp::GreaterThan | BinaryOp::GreaterThanOrEqual => Opcode::Cmp,
        BinaryOp::Assign | BinaryOp::MemberAccess => Opcode::Move,
    }
}
