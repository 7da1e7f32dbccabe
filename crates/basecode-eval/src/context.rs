use basecode_arena::{ElementBuilder, ElementData, ElementMap, QualifiedSymbol, ScopeManager};
use basecode_common::{Code, ElementId, ResultMessage, SourceLocation};
use basecode_types::TypeTable;
use rustc_hash::FxHashMap;

/// What evaluating one AST node produced. Most handlers succeed with an
/// element; a few (directives, imports already cached) legitimately
/// produce nothing.
pub type EvalOutcome = Option<ElementId>;

/// Owns the mutable state threaded through every handler: the element
/// arena, the type table, the scope stack, and the running diagnostic
/// aggregate (spec §7: failures accumulate rather than unwind).
pub struct Evaluator<'a> {
    pub arena: &'a mut ElementMap,
    pub types: &'a mut TypeTable,
    pub scopes: ScopeManager,
    pub diagnostics: ResultMessage,
    /// Absolute module path -> already-evaluated module scope, so a
    /// module `import`ed from two places is only evaluated once (spec
    /// §4.3 "the same source file may be evaluated only once").
    module_cache: FxHashMap<String, ElementId>,
    loop_depth: u32,
}

impl<'a> Evaluator<'a> {
    pub fn new(arena: &'a mut ElementMap, types: &'a mut TypeTable) -> Self {
        Self {
            arena,
            types,
            scopes: ScopeManager::new(),
            diagnostics: ResultMessage::new(),
            module_cache: FxHashMap::default(),
            loop_depth: 0,
        }
    }

    pub fn builder(&mut self) -> ElementBuilder<'_> {
        ElementBuilder::new(self.arena)
    }

    pub fn error(&mut self, code: Code, message: impl Into<String>, loc: SourceLocation) {
        let message = message.into();
        tracing::debug!(code = code.id(), %message, "evaluator diagnostic");
        self.diagnostics.error(code, message, Some(loc));
    }

    pub fn current_scope(&self) -> Option<ElementId> {
        self.scopes.current_scope()
    }

    pub fn cached_module(&self, path: &str) -> Option<ElementId> {
        self.module_cache.get(path).copied()
    }

    pub fn cache_module(&mut self, path: String, scope: ElementId) {
        self.module_cache.insert(path, scope);
    }

    pub fn enter_loop(&mut self) {
        self.loop_depth += 1;
    }

    pub fn exit_loop(&mut self) {
        self.loop_depth -= 1;
    }

    pub fn in_loop(&self) -> bool {
        self.loop_depth > 0
    }

    /// `convert_predicate` (spec §4.3): a predicate expression that is
    /// not already a binary operator is wrapped as `expr == true` so the
    /// emitter can always lower predicates as a comparison.
    pub fn convert_predicate(&mut self, expr: ElementId, scope: Option<ElementId>, loc: SourceLocation) -> ElementId {
        let is_binary = matches!(self.arena.find(expr).map(|e| &e.data), Some(ElementData::Binary { .. }));
        if is_binary {
            return expr;
        }
        let true_lit = self.builder().make_literal(basecode_arena::Literal::Bool(true), scope, loc);
        self.builder().make_binary(basecode_ast::BinaryOp::Equals, expr, true_lit, scope, loc)
    }

    /// `add_namespaces_to_scope` (spec §4.3): given `a.b.c`, walks or
    /// creates anonymous namespace identifiers for every part but the
    /// last, returning the innermost namespace's scope for the caller to
    /// declare `c` in.
    pub fn add_namespaces_to_scope(&mut self, parts: &[String], mut scope: ElementId, loc: SourceLocation) -> ElementId {
        for part in parts {
            let existing = basecode_arena::find_identifier(self.arena, &QualifiedSymbol::simple(part.clone()), scope)
                .into_iter()
                .next();
            scope = match existing {
                Some(identifier) => self.namespace_scope_of(identifier).unwrap_or(scope),
                None => {
                    let inner_scope = self.builder().make_block(Some(scope), false, loc);
                    let namespace = self.builder().make_namespace(inner_scope, Some(scope), loc);
                    let initializer = self.builder().make_initializer(namespace, Some(scope), loc);
                    let symbol = basecode_arena::Symbol::new(QualifiedSymbol::simple(part.clone()), true);
                    let identifier = self.builder().make_identifier(symbol, None, Some(initializer), Some(scope), loc);
                    basecode_arena::declare_in_scope(self.arena, scope, part, identifier);
                    basecode_arena::append_statement(self.arena, scope, identifier);
                    inner_scope
                }
            };
        }
        scope
    }

    fn namespace_scope_of(&self, identifier: ElementId) -> Option<ElementId> {
        let ElementData::Identifier { initializer, .. } = &self.arena.find(identifier)?.data else { return None };
        let ElementData::Initializer { expression } = &self.arena.find((*initializer)?)?.data else { return None };
        let ElementData::Namespace { expression: scope } = &self.arena.find(*expression)?.data else { return None };
        Some(*scope)
    }
}
