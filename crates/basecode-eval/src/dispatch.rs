use crate::context::{EvalOutcome, Evaluator};
use basecode_arena::{ElementList, Literal as ElemLiteral, QualifiedSymbol};
use basecode_ast::{AstArena, AstKind, Literal as AstLiteral, NodeId, RangeDirection, RangeKind};
use basecode_common::{Code, ElementId, ModuleId, SourceLocation, Span};

impl<'a> Evaluator<'a> {
    fn loc(&self, module: ModuleId, span: Span) -> SourceLocation {
        SourceLocation::new(module, span)
    }

    /// Entry point for a top-level compilation unit: evaluates `node`
    /// (expected to be `AstKind::Module`) under a fresh root scope,
    /// reusing the cached scope when `path` has already been evaluated
    /// (spec §4.3 re-entrancy across imports).
    pub fn evaluate_module(&mut self, ast: &AstArena, node: NodeId, path: &str, module: ModuleId) -> EvalOutcome {
        if let Some(cached) = self.cached_module(path) {
            return Some(cached);
        }
        // `AstKind::Module`'s handler builds its own root scope and
        // ignores the scope it is called with, so the placeholder id
        // below is never dereferenced.
        let scope = self.evaluate(ast, node, ElementId::default(), module)?;
        self.cache_module(path.to_string(), scope);
        Some(scope)
    }

    pub fn evaluate(&mut self, ast: &AstArena, node_id: NodeId, scope: ElementId, module: ModuleId) -> EvalOutcome {
        let node = ast.get(node_id);
        let loc = self.loc(module, node.span);

        match &node.kind {
            AstKind::Program { statements } => {
                let mut elements = ElementList::new();
                for &stmt in statements.iter() {
                    if let Some(e) = self.evaluate(ast, stmt, scope, module) {
                        elements.push(e);
                    }
                }
                Some(self.builder().make_program(elements, loc))
            }

            AstKind::Module { name, statements } => {
                let module_scope = self.builder().make_block(None, true, loc);
                let module_element = self.builder().make_module(name.clone(), module_scope, true, loc);
                self.scopes.push_scope(module_scope);
                for &stmt in statements.iter() {
                    if let Some(e) = self.evaluate(ast, stmt, module_scope, module) {
                        basecode_arena::append_statement(self.arena, module_scope, e);
                    }
                }
                self.scopes.pop_scope();
                Some(module_element)
            }

            AstKind::Import { path, items } => {
                let symbol = path.last().cloned().map(QualifiedSymbol::simple).unwrap_or_default();
                let import = self.builder().make_import(symbol, items.clone().unwrap_or_default(), Some(scope), loc);
                // Resolving `imported_module` against the session's module
                // cache by dotted path is the session driver's job (it
                // owns source-file loading); this leaves the edge pending
                // so `find_identifier`'s import fallback can still walk it
                // once the session wires it up.
                Some(import)
            }

            AstKind::Literal(lit) => Some(self.builder().make_literal(convert_literal(*lit), Some(scope), loc)),
            AstKind::StringLiteral(value) => Some(self.builder().make_string_literal(value.clone(), Some(scope), loc)),
            AstKind::IdentifierRef { parts } => {
                let symbol = if parts.len() == 1 {
                    QualifiedSymbol::simple(parts[0].clone())
                } else {
                    QualifiedSymbol::qualified(parts[..parts.len() - 1].to_vec(), parts.last().cloned().unwrap_or_default())
                };
                let hits = basecode_arena::find_identifier(self.arena, &symbol, scope);
                if hits.is_empty() {
                    self.error(Code::UnresolvedIdentifier, format!("unresolved identifier `{}`", symbol.fully_qualified_name()), loc);
                }
                Some(self.builder().make_identifier_reference(symbol, Some(scope), loc))
            }

            AstKind::Declaration { name, ty, initializer, is_constant } => self.declare_identifier(ast, name, ty.as_ref(), *initializer, *is_constant, scope, module, loc),

            AstKind::QualifiedAssign { parts, value } => {
                let inner_scope = self.add_namespaces_to_scope(&parts[..parts.len() - 1], scope, loc);
                let name = parts.last().cloned().unwrap_or_default();
                self.declare_identifier(ast, &name, None, Some(*value), false, inner_scope, module, loc)
            }

            AstKind::Binary { op, lhs, rhs } => {
                let lhs_id = self.evaluate(ast, *lhs, scope, module)?;
                let rhs_id = self.evaluate(ast, *rhs, scope, module)?;
                Some(self.builder().make_binary(*op, lhs_id, rhs_id, Some(scope), loc))
            }
            AstKind::Unary { op, operand } => {
                let operand_id = self.evaluate(ast, *operand, scope, module)?;
                Some(self.builder().make_unary(*op, operand_id, Some(scope), loc))
            }
            AstKind::Cast { ty, expr } => {
                let type_ref = self.make_type_reference(Some(ty), scope, loc);
                let expr_id = self.evaluate(ast, *expr, scope, module)?;
                Some(self.builder().make_cast(type_ref, expr_id, Some(scope), loc))
            }
            AstKind::Transmute { ty, expr } => {
                let type_ref = self.make_type_reference(Some(ty), scope, loc);
                let expr_id = self.evaluate(ast, *expr, scope, module)?;
                Some(self.builder().make_transmute(type_ref, expr_id, Some(scope), loc))
            }
            AstKind::Subscript { base, index } => {
                let base_id = self.evaluate(ast, *base, scope, module)?;
                let index_id = self.evaluate(ast, *index, scope, module)?;
                Some(self.builder().make_subscript(base_id, index_id, Some(scope), loc))
            }
            AstKind::MemberAccess { base, member } => {
                let base_id = self.evaluate(ast, *base, scope, module)?;
                Some(self.builder().make_member_access(base_id, member.clone(), Some(scope), loc))
            }

            AstKind::Call { callee, args } => {
                let callee_node = ast.get(*callee);
                let AstKind::IdentifierRef { parts } = &callee_node.kind else {
                    self.error(Code::Generic, "call target must be an identifier", loc);
                    return None;
                };
                let symbol = QualifiedSymbol::simple(parts.last().cloned().unwrap_or_default());
                let candidates = basecode_arena::find_identifier(self.arena, &symbol, scope);
                if candidates.is_empty() {
                    self.error(Code::UnresolvedIdentifier, format!("unresolved procedure `{}`", symbol.fully_qualified_name()), loc);
                }
                let mut built_args = Vec::with_capacity(args.len());
                for arg in args {
                    let Some(value) = self.evaluate(ast, arg.value, scope, module) else { continue };
                    built_args.push(basecode_arena::Argument { name: arg.name.clone(), value });
                }
                let args_element = self.builder().make_argument_list(built_args, Some(scope), loc);
                Some(self.builder().make_procedure_call(symbol, candidates, args_element, Some(scope), loc))
            }
            AstKind::ArgumentList(args) => {
                let mut built = Vec::with_capacity(args.len());
                for arg in args {
                    let Some(value) = self.evaluate(ast, arg.value, scope, module) else { continue };
                    built.push(basecode_arena::Argument { name: arg.name.clone(), value });
                }
                Some(self.builder().make_argument_list(built, Some(scope), loc))
            }

            AstKind::Block { statements } => {
                let block_scope = self.builder().make_block(Some(scope), false, loc);
                self.scopes.push_scope(block_scope);
                for &stmt in statements.iter() {
                    if let Some(e) = self.evaluate(ast, stmt, block_scope, module) {
                        basecode_arena::append_statement(self.arena, block_scope, e);
                    }
                }
                self.scopes.pop_scope();
                Some(block_scope)
            }

            AstKind::If { predicate, then_branch, else_branch } => {
                let predicate_id = self.evaluate(ast, *predicate, scope, module)?;
                let predicate_id = self.convert_predicate(predicate_id, Some(scope), loc);
                let then_id = self.evaluate(ast, *then_branch, scope, module)?;
                let else_id = match else_branch {
                    Some(n) => self.evaluate(ast, *n, scope, module),
                    None => None,
                };
                Some(self.builder().make_if(predicate_id, then_id, else_id, Some(scope), loc))
            }
            AstKind::While { predicate, body } => {
                let predicate_id = self.evaluate(ast, *predicate, scope, module)?;
                let predicate_id = self.convert_predicate(predicate_id, Some(scope), loc);
                self.enter_loop();
                let body_id = self.evaluate(ast, *body, scope, module);
                self.exit_loop();
                Some(self.builder().make_while(predicate_id, body_id?, Some(scope), loc))
            }
            AstKind::ForIn { binding, start, end, step, direction, kind, body } => self.evaluate_for_in(ast, binding, *start, *end, *step, *direction, *kind, *body, scope, module, loc),

            AstKind::Switch { expr, cases } => {
                let expr_id = self.evaluate(ast, *expr, scope, module)?;
                let mut case_ids = ElementList::new();
                for &case in cases.iter() {
                    if let Some(e) = self.evaluate(ast, case, scope, module) {
                        case_ids.push(e);
                    }
                }
                Some(self.builder().make_switch(expr_id, case_ids, Some(scope), loc))
            }
            AstKind::Case { value, body, falls_through } => {
                let value_id = match value {
                    Some(n) => self.evaluate(ast, *n, scope, module),
                    None => None,
                };
                let body_id = self.evaluate(ast, *body, scope, module)?;
                Some(self.builder().make_case(value_id, body_id, *falls_through, Some(scope), loc))
            }
            AstKind::Break { label } => {
                if !self.in_loop() {
                    self.error(Code::FlowControlOutsideLoop, "`break` with no enclosing loop", loc);
                }
                Some(self.builder().make_break(label.clone(), Some(scope), loc))
            }
            AstKind::Continue { label } => {
                if !self.in_loop() {
                    self.error(Code::FlowControlOutsideLoop, "`continue` with no enclosing loop", loc);
                }
                Some(self.builder().make_continue(label.clone(), Some(scope), loc))
            }
            AstKind::Return { values } => {
                let mut elements = ElementList::new();
                for &v in values.iter() {
                    if let Some(e) = self.evaluate(ast, v, scope, module) {
                        elements.push(e);
                    }
                }
                Some(self.builder().make_return(elements, Some(scope), loc))
            }
            AstKind::Defer { expr } => {
                let expr_id = self.evaluate(ast, *expr, scope, module)?;
                let defer_id = self.builder().make_defer(expr_id, Some(scope), loc);
                if let Some(element) = self.arena.find_mut(scope) {
                    if let basecode_arena::ElementData::Block { scope: block } = &mut element.data {
                        block.push_defer(defer_id);
                    }
                }
                Some(defer_id)
            }
            AstKind::Label(name) => Some(self.builder().make_label(name.clone(), Some(scope), loc)),

            AstKind::ProcedureType { .. } => self.evaluate_procedure_type(ast, node_id, scope, module, loc),
            AstKind::ProcedureDecl { name, signature, body } => self.evaluate_procedure_decl(ast, name, signature.as_ref(), *body, scope, module, loc),
            AstKind::CompositeType { kind, fields, base_type } => self.evaluate_composite_type(ast, *kind, fields, base_type.as_ref(), scope, module, loc),

            AstKind::Directive { name, args } => {
                let mut built = Vec::with_capacity(args.len());
                for arg in args {
                    let Some(value) = self.evaluate(ast, arg.value, scope, module) else { continue };
                    built.push(basecode_arena::Argument { name: arg.name.clone(), value });
                }
                Some(self.builder().make_directive(name.clone(), built, Some(scope), loc))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate_for_in(
        &mut self,
        ast: &AstArena,
        binding: &str,
        start: NodeId,
        end: NodeId,
        step: NodeId,
        direction: RangeDirection,
        kind: RangeKind,
        body: NodeId,
        scope: ElementId,
        module: ModuleId,
        loc: SourceLocation,
    ) -> EvalOutcome {
        let loop_scope = self.builder().make_block(Some(scope), false, loc);
        self.scopes.push_scope(loop_scope);

        let start_id = self.evaluate(ast, start, loop_scope, module)?;
        let init = self.declare_identifier(ast, binding, None, None, false, loop_scope, module, loc)?;
        let init_target = self.builder().make_identifier_reference(QualifiedSymbol::simple(binding), Some(loop_scope), loc);
        let init_assign = self.builder().make_binary(basecode_ast::BinaryOp::Assign, init_target, start_id, Some(loop_scope), loc);
        if let Some(element) = self.arena.find_mut(init) {
            if let basecode_arena::ElementData::Identifier { initializer, .. } = &mut element.data {
                *initializer = Some(init_assign);
            }
        }
        basecode_arena::append_statement(self.arena, loop_scope, init_assign);
        let binding_ref = self.builder().make_identifier_reference(QualifiedSymbol::simple(binding), Some(loop_scope), loc);

        let end_id = self.evaluate(ast, end, loop_scope, module)?;
        let compare_op = match (direction, kind) {
            (RangeDirection::Ascending, RangeKind::Inclusive) => basecode_ast::BinaryOp::LessThanOrEqual,
            (RangeDirection::Ascending, RangeKind::Exclusive) => basecode_ast::BinaryOp::LessThan,
            (RangeDirection::Descending, RangeKind::Inclusive) => basecode_ast::BinaryOp::GreaterThanOrEqual,
            (RangeDirection::Descending, RangeKind::Exclusive) => basecode_ast::BinaryOp::GreaterThan,
        };
        let predicate_lhs = self.builder().make_identifier_reference(QualifiedSymbol::simple(binding), Some(loop_scope), loc);
        let predicate = self.builder().make_binary(compare_op, predicate_lhs, end_id, Some(loop_scope), loc);

        let step_id = self.evaluate(ast, step, loop_scope, module)?;
        let step_op = match direction {
            RangeDirection::Ascending => basecode_ast::BinaryOp::Add,
            RangeDirection::Descending => basecode_ast::BinaryOp::Subtract,
        };
        let step_target = self.builder().make_identifier_reference(QualifiedSymbol::simple(binding), Some(loop_scope), loc);
        let step_rhs = self.builder().make_binary(step_op, binding_ref, step_id, Some(loop_scope), loc);
        let step_assign = self.builder().make_binary(basecode_ast::BinaryOp::Assign, step_target, step_rhs, Some(loop_scope), loc);

        self.enter_loop();
        let body_id = self.evaluate(ast, body, loop_scope, module);
        self.exit_loop();

        self.scopes.pop_scope();
        Some(self.builder().make_for(init, predicate, step_assign, body_id?, Some(scope), loc))
    }
}

fn convert_literal(lit: AstLiteral) -> ElemLiteral {
    ElemLiteral::from(lit)
}
