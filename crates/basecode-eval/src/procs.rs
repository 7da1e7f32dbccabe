use crate::context::{EvalOutcome, Evaluator};
use basecode_arena::{ElementData, QualifiedSymbol, Symbol};
use basecode_ast::{AstArena, AstKind, CompositeKind as AstCompositeKind, FieldDecl, NodeId, TypeNode};
use basecode_common::{ElementId, ModuleId, SourceLocation};
use basecode_types::{CompositeKind, NumericKind};

impl<'a> Evaluator<'a> {
    /// Evaluates a bare `proc(...) -> ...` type expression (e.g. a type
    /// annotation on a function-pointer variable) into a `type_literal`
    /// element wrapping the interned procedure type. Procedure
    /// *declarations* go through [`Evaluator::evaluate_procedure_decl`]
    /// instead, which also builds the instance and body.
    pub fn evaluate_procedure_type(&mut self, ast: &AstArena, node_id: NodeId, scope: ElementId, module: ModuleId, loc: SourceLocation) -> EvalOutcome {
        let AstKind::ProcedureType { params, returns, is_foreign, is_variadic } = &ast.get(node_id).kind else {
            return None;
        };
        let header_scope = self.builder().make_block(Some(scope), false, loc);
        let parameter_types = self.declare_params(ast, params, header_scope, module, loc);
        let return_types = self.declare_params(ast, returns, header_scope, module, loc);
        let type_id = self.types.make_procedure_type(Symbol::new(QualifiedSymbol::simple("proc"), true), header_scope, parameter_types, return_types, *is_foreign, *is_variadic);
        Some(self.builder().make_type_literal(Some(type_id), Some(scope), loc))
    }

    /// `name :: proc(...) -> ... { body }` (spec §4.3): builds the
    /// procedure type, a `proc_type` declaration in `scope`, and — when a
    /// body is present — one `procedure_instance` registered on the type
    /// (spec §3.3 "procedure types own ... a set of procedure-instances").
    pub fn evaluate_procedure_decl(&mut self, ast: &AstArena, name: &str, signature: &AstKind, body: Option<NodeId>, scope: ElementId, module: ModuleId, loc: SourceLocation) -> EvalOutcome {
        let AstKind::ProcedureType { params, returns, is_foreign, is_variadic } = signature else {
            return None;
        };
        let header_scope = self.builder().make_block(Some(scope), false, loc);
        let parameter_types = self.declare_params(ast, params, header_scope, module, loc);
        let return_types = self.declare_params(ast, returns, header_scope, module, loc);
        let type_id = self.types.make_procedure_type(Symbol::new(QualifiedSymbol::simple(name), true), header_scope, parameter_types, return_types, *is_foreign, *is_variadic);

        let identifier = self.builder().make_identifier(Symbol::new(QualifiedSymbol::simple(name), true), None, None, Some(scope), loc);
        basecode_arena::declare_in_scope(self.arena, scope, name, identifier);
        basecode_arena::append_statement(self.arena, scope, identifier);

        // A bodied declaration's initializer points straight at its
        // `procedure_instance` (reachability walks this same link, spec
        // §4.8); a bodyless signature only has a type to point at.
        let instance_id = body.and_then(|body_node| {
            self.scopes.push_scope(header_scope);
            let body_id = self.evaluate(ast, body_node, header_scope, module);
            self.scopes.pop_scope();
            body_id.map(|body_id| {
                let instance = self.builder().make_procedure_instance(type_id, header_scope, body_id, Some(scope), loc);
                self.types.add_procedure_instance(type_id, instance);
                instance
            })
        });
        let initializer_expr = match instance_id {
            Some(instance) => instance,
            None => self.builder().make_type_literal(Some(type_id), Some(scope), loc),
        };
        let initializer = self.builder().make_initializer(initializer_expr, Some(scope), loc);
        if let Some(ElementData::Identifier { initializer: slot, .. }) = self.arena.find_mut(identifier).map(|e| &mut e.data) {
            *slot = Some(initializer);
        }
        Some(identifier)
    }

    fn declare_params(&mut self, ast: &AstArena, params: &[basecode_ast::Param], header_scope: ElementId, module: ModuleId, loc: SourceLocation) -> Vec<basecode_common::TypeId> {
        let mut types = Vec::with_capacity(params.len());
        for param in params {
            let type_ref = self.make_type_reference(Some(&param.ty), header_scope, loc);
            let type_id = match self.arena.find(type_ref).map(|e| &e.data) {
                Some(ElementData::TypeReference { type_id, .. }) => *type_id,
                _ => None,
            };
            if let Some(id) = type_id {
                types.push(id);
            } else {
                types.push(self.types.find_unknown_type());
            }
            let initializer = param.default.map(|node| self.evaluate(ast, node, header_scope, module)).and_then(|x| x);
            let identifier = self.builder().make_identifier(Symbol::new(QualifiedSymbol::simple(param.name.clone()), false), Some(type_ref), initializer, Some(header_scope), loc);
            basecode_arena::declare_in_scope(self.arena, header_scope, &param.name, identifier);
            basecode_arena::append_statement(self.arena, header_scope, identifier);
        }
        types
    }

    /// `Name :: struct { ... }` / `union { ... }` / `enum { ... }` (spec
    /// §4.3 `add_composite_type_fields`). Builds the composite's field
    /// scope, interns the composite type, and wraps it as a
    /// `type_literal` element for the enclosing declaration.
    pub fn evaluate_composite_type(&mut self, ast: &AstArena, kind: AstCompositeKind, fields: &[FieldDecl], base_type: Option<&TypeNode>, scope: ElementId, module: ModuleId, loc: SourceLocation) -> EvalOutcome {
        let composite_scope = self.builder().make_block(Some(scope), false, loc);
        let table_kind = match kind {
            AstCompositeKind::Struct => CompositeKind::Struct,
            AstCompositeKind::Union => CompositeKind::Union,
            AstCompositeKind::Enum => CompositeKind::Enum,
        };
        let enum_base = if matches!(kind, AstCompositeKind::Enum) {
            match base_type {
                Some(_) => {
                    let type_ref = self.make_type_reference(base_type, composite_scope, loc);
                    match self.arena.find(type_ref).map(|e| &e.data) {
                        Some(ElementData::TypeReference { type_id, .. }) => *type_id,
                        _ => None,
                    }
                }
                None => Some(self.types.find_numeric_type(NumericKind::U32)),
            }
        } else {
            None
        };
        let composite_type = self.types.make_composite_type(Symbol::new(QualifiedSymbol::simple("composite"), true), table_kind, composite_scope, enum_base);
        self.add_composite_type_fields(ast, kind, fields, composite_type, composite_scope, module, loc);
        Some(self.builder().make_type_literal(Some(composite_type), Some(scope), loc))
    }
}
