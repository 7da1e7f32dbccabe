//! The fix-point resolver (spec §4.4): identifiers, then types, then
//! constant folding, each re-run up to [`basecode_common::limits::TYPE_RESOLUTION_PHASES`]
//! times, with the final phase turning any remaining unknown into a
//! diagnostic. String interning and the two checking passes
//! (assignment compatibility, call-site overload resolution) run once
//! the fix-point settles.

use crate::fold::fold_constants;
use crate::infer::{infer_initializer_type, is_literal_number, procedure_type_of, type_id_of};
use crate::intern::StringInternMap;
use crate::typecheck::type_check;
use basecode_arena::{find_identifier, ElementData, ElementKind, ElementMap};
use basecode_common::{limits, Code, ElementId, ResultMessage};
use basecode_types::{TypeKind, TypeTable};

pub struct Resolver<'a> {
    arena: &'a mut ElementMap,
    types: &'a mut TypeTable,
    pub diagnostics: ResultMessage,
    pub strings: StringInternMap,
}

impl<'a> Resolver<'a> {
    pub fn new(arena: &'a mut ElementMap, types: &'a mut TypeTable) -> Self {
        Self { arena, types, diagnostics: ResultMessage::new(), strings: StringInternMap::new() }
    }

    /// Runs the whole sub-pass schedule to completion (spec §4.4): up to
    /// `TYPE_RESOLUTION_PHASES` rounds of identifier/type resolution
    /// interleaved with folding, then interning and the two checkers.
    pub fn run(&mut self) {
        for phase in 0..limits::TYPE_RESOLUTION_PHASES {
            let final_phase = phase + 1 == limits::TYPE_RESOLUTION_PHASES;
            let resolved_idents = self.resolve_identifiers(final_phase);
            let resolved_types = self.resolve_types(final_phase);
            let folded = fold_constants(self.arena);
            tracing::debug!(phase, resolved_idents, resolved_types, folded, "resolver pass");
            if resolved_idents == 0 && resolved_types == 0 && folded == 0 {
                break;
            }
        }
        self.strings.intern_all(self.arena);
        self.resolve_calls();
        self.check_assignments();
    }

    /// Re-runs `find_identifier` for every still-unresolved
    /// `identifier_reference`. On the final phase, a reference that still
    /// fails raises **P004**.
    fn resolve_identifiers(&mut self, final_phase: bool) -> usize {
        let candidates: Vec<ElementId> = self.arena.find_by_kind(ElementKind::IdentifierReference).to_vec();
        let mut changed = 0;
        for id in candidates {
            let Some(element) = self.arena.find(id) else { continue };
            let ElementData::IdentifierReference { symbol, resolved } = &element.data else { continue };
            if !resolved.is_empty() {
                continue;
            }
            let symbol = symbol.clone();
            let scope = element.parent_scope.unwrap_or(id);
            let loc = element.location;
            let hits = find_identifier(self.arena, &symbol, scope);
            if hits.is_empty() {
                if final_phase {
                    self.diagnostics.error(Code::UnresolvedIdentifier, format!("unresolved identifier `{}`", symbol.fully_qualified_name()), Some(loc));
                }
                continue;
            }
            if let Some(ElementData::IdentifierReference { resolved, .. }) = self.arena.find_mut(id).map(|e| &mut e.data) {
                *resolved = hits;
            }
            changed += 1;
        }
        changed
    }

    /// Infers and fills in the still-`None` `type_id` of every
    /// identifier's `type_reference`, from its initializer. Final phase
    /// raises **P019** for anything still unresolved.
    fn resolve_types(&mut self, final_phase: bool) -> usize {
        let candidates: Vec<ElementId> = self.arena.find_by_kind(ElementKind::Identifier).to_vec();
        let mut changed = 0;
        for id in candidates {
            let Some(element) = self.arena.find(id) else { continue };
            let ElementData::Identifier { symbol, type_ref, initializer } = &element.data else { continue };
            let Some(type_ref) = type_ref else { continue };
            if type_id_of(self.arena, *type_ref).is_some() {
                continue;
            }
            let name = symbol.name().to_string();
            let loc = element.location;
            let type_ref = *type_ref;
            let Some(initializer) = initializer else { continue };
            let inferred = infer_initializer_type(self.arena, self.types, *initializer);
            match inferred {
                Some(type_id) => {
                    if let Some(ElementData::TypeReference { type_id: slot, .. }) = self.arena.find_mut(type_ref).map(|e| &mut e.data) {
                        *slot = Some(type_id);
                    }
                    changed += 1;
                }
                None if final_phase => {
                    self.diagnostics.error(Code::CannotInferType, format!("cannot infer a type for `{name}`"), Some(loc));
                }
                None => {}
            }
        }
        changed
    }

    /// Picks the first candidate whose declared parameter count matches
    /// the call's argument count (spec §4.4.4's simplified overload
    /// resolution — full signature matching, including by-type
    /// disambiguation, is left to a later pass once `basecode-emit`
    /// needs it).
    fn resolve_calls(&mut self) {
        let candidates: Vec<ElementId> = self.arena.find_by_kind(ElementKind::ProcedureCall).to_vec();
        for id in candidates {
            let Some(element) = self.arena.find(id) else { continue };
            let ElementData::ProcedureCall { callee, candidates: overloads, args, resolved } = &element.data else { continue };
            if resolved.is_some() {
                continue;
            }
            let callee = callee.clone();
            let loc = element.location;
            let args = *args;
            let overloads = overloads.clone();
            let arg_count = match self.arena.find(args).map(|e| &e.data) {
                Some(ElementData::ArgumentList { args }) => args.len(),
                _ => 0,
            };
            let pick = overloads.iter().copied().find(|candidate| self.parameter_count_matches(*candidate, arg_count));
            match pick {
                Some(target) => {
                    if let Some(ElementData::ProcedureCall { resolved, .. }) = self.arena.find_mut(id).map(|e| &mut e.data) {
                        *resolved = Some(target);
                    }
                }
                None => {
                    self.diagnostics.error(Code::Generic, format!("no overload of `{}` accepts {arg_count} argument(s)", callee.fully_qualified_name()), Some(loc));
                }
            }
        }
    }

    fn parameter_count_matches(&self, identifier: ElementId, arg_count: usize) -> bool {
        let Some(type_id) = procedure_type_of(self.arena, identifier) else { return false };
        let Some(ty) = self.types.find(type_id) else { return false };
        match &ty.kind {
            TypeKind::Procedure { parameter_types, is_variadic, .. } => parameter_types.len() == arg_count || (*is_variadic && arg_count >= parameter_types.len()),
            _ => false,
        }
    }

    /// Assignment compatibility (spec §4.5): every identifier with both a
    /// resolved type and an initializer gets its RHS type-checked against
    /// the declared type, `strict` unless the RHS is a bare numeric
    /// literal.
    fn check_assignments(&mut self) {
        let candidates: Vec<ElementId> = self.arena.find_by_kind(ElementKind::Identifier).to_vec();
        for id in candidates {
            let Some(element) = self.arena.find(id) else { continue };
            let ElementData::Identifier { symbol, type_ref, initializer } = &element.data else { continue };
            let (Some(type_ref), Some(initializer)) = (type_ref, initializer) else { continue };
            let Some(lhs_type) = type_id_of(self.arena, *type_ref) else { continue };
            let name = symbol.name().to_string();
            let loc = element.location;
            let initializer = *initializer;
            let Some(rhs_type) = infer_initializer_type(self.arena, self.types, initializer) else { continue };
            let rhs_expr = crate::infer::initializer_expr(self.arena, initializer);
            let strict = !rhs_expr.map(|e| is_literal_number(self.arena, e)).unwrap_or(false);
            if !type_check(self.types, lhs_type, rhs_type, strict) {
                let lhs_name = self.types.find(lhs_type).map(|t| t.symbol.name().to_string()).unwrap_or_default();
                let rhs_name = self.types.find(rhs_type).map(|t| t.symbol.name().to_string()).unwrap_or_default();
                self.diagnostics.error(Code::TypeMismatch, format!("cannot assign `{rhs_name}` to `{name}` of type `{lhs_name}`"), Some(loc));
            }
        }
    }
}
