use crate::context::Evaluator;
use basecode_arena::{ElementData, Literal as ElemLiteral, QualifiedSymbol, Symbol};
use basecode_ast::{AstArena, CompositeKind as AstCompositeKind, FieldDecl, NodeId, TypeNode};
use basecode_common::{Code, ElementId, ModuleId, SourceLocation};
use basecode_types::{CompositeKind, NumericKind, TypeTable};

impl<'a> Evaluator<'a> {
    /// Builds (interning, if primitive) a `type_reference` element for a
    /// surface type annotation. User-defined names that have not been
    /// declared yet resolve to `None` here; `basecode-resolve`'s
    /// unknown-types sub-pass fills them in once the declaration exists.
    pub fn make_type_reference(&mut self, ty: Option<&TypeNode>, scope: ElementId, loc: SourceLocation) -> ElementId {
        match ty {
            None => self.builder().make_type_reference(QualifiedSymbol::simple("unknown"), None, Some(scope), loc),
            Some(TypeNode::Named { parts, .. }) => {
                let type_id = primitive_type_id(self.types, parts);
                self.builder().make_type_reference(QualifiedSymbol::qualified(parts[..parts.len() - 1].to_vec(), parts.last().cloned().unwrap_or_default()), type_id, Some(scope), loc)
            }
            Some(TypeNode::Pointer(inner)) => {
                let inner_ref = self.make_type_reference(Some(inner), scope, loc);
                let inner_type = type_id_of(self.arena, inner_ref);
                let type_id = inner_type.map(|base| self.types.find_pointer_type(base));
                self.builder().make_type_reference(QualifiedSymbol::simple("pointer"), type_id, Some(scope), loc)
            }
            Some(TypeNode::Array { base, .. }) => {
                let base_ref = self.make_type_reference(Some(base), scope, loc);
                let base_type = type_id_of(self.arena, base_ref);
                let type_id = base_type.map(|base| self.types.find_array_type(base, Vec::new(), None));
                self.builder().make_type_reference(QualifiedSymbol::simple("array"), type_id, Some(scope), loc)
            }
            Some(TypeNode::Tuple(elements)) => {
                let element_refs: Vec<_> = elements.iter().map(|e| self.make_type_reference(Some(e), scope, loc)).collect();
                let element_types: Vec<_> = element_refs.into_iter().filter_map(|r| type_id_of(self.arena, r)).collect();
                let type_id = if element_types.len() == elements.len() { Some(self.types.make_tuple_type(element_types)) } else { None };
                self.builder().make_type_reference(QualifiedSymbol::simple("tuple"), type_id, Some(scope), loc)
            }
            Some(TypeNode::Unknown) => self.builder().make_type_reference(QualifiedSymbol::simple("unknown"), None, Some(scope), loc),
        }
    }

    /// `declare_identifier` (spec §4.3): resolves the declared type and
    /// wires the initializer. Constant-only kinds (type, module,
    /// namespace) must use `::`; a `:=` declaration whose initializer
    /// evaluates to one of those kinds raises **P029**.
    pub fn declare_identifier(
        &mut self,
        ast: &AstArena,
        name: &str,
        ty: Option<&TypeNode>,
        initializer_ast: Option<NodeId>,
        is_constant: bool,
        scope: ElementId,
        module: ModuleId,
        loc: SourceLocation,
    ) -> Option<ElementId> {
        let type_ref = self.make_type_reference(ty, scope, loc);
        let identifier = self.builder().make_identifier(Symbol::new(QualifiedSymbol::simple(name), is_constant), Some(type_ref), None, Some(scope), loc);
        basecode_arena::declare_in_scope(self.arena, scope, name, identifier);

        let Some(init_node) = initializer_ast else {
            return Some(identifier);
        };
        let expr = self.evaluate(ast, init_node, scope, module)?;

        if let Some(kind) = self.arena.find(expr).map(|e| e.kind()) {
            let requires_constant = matches!(kind, basecode_arena::ElementKind::TypeLiteral | basecode_arena::ElementKind::Module | basecode_arena::ElementKind::Namespace);
            if requires_constant && !is_constant {
                self.error(Code::ConstantRequiresDoubleColon, format!("`{name}` declares a type, module or namespace and must use `::`"), loc);
            }
        }

        let initializer = if is_constant {
            self.builder().make_initializer(expr, Some(scope), loc)
        } else {
            let target = self.builder().make_identifier_reference(QualifiedSymbol::simple(name), Some(scope), loc);
            self.builder().make_binary(basecode_ast::BinaryOp::Assign, target, expr, Some(scope), loc)
        };

        if let Some(element) = self.arena.find_mut(identifier) {
            if let ElementData::Identifier { initializer: slot, .. } = &mut element.data {
                *slot = Some(initializer);
            }
        }
        if !is_constant {
            basecode_arena::append_statement(self.arena, scope, initializer);
        }
        Some(identifier)
    }

    /// `add_composite_type_fields` (spec §4.3): iterates declared fields
    /// in order. Struct fields pack with padding to each field's own
    /// alignment (the byte-accurate part of the "composite size law");
    /// union/enum fields share offset zero. Enum members get implicit
    /// sequential values from the declared base type (`u32` if none is
    /// given); an explicit value smaller than the running counter is a
    /// hard error.
    pub fn add_composite_type_fields(&mut self, ast: &AstArena, kind: AstCompositeKind, fields: &[FieldDecl], composite_type: basecode_common::TypeId, scope: ElementId, module: ModuleId, loc: SourceLocation) {
        let table_kind = match kind {
            AstCompositeKind::Struct => CompositeKind::Struct,
            AstCompositeKind::Union => CompositeKind::Union,
            AstCompositeKind::Enum => CompositeKind::Enum,
        };
        let mut next_enum_value: i64 = 0;

        for field in fields {
            let type_ref = self.make_type_reference(Some(&field.ty), scope, loc);
            let field_type = type_id_of(self.arena, type_ref);
            let (field_size, field_align) = field_type.and_then(|id| self.types.find(id)).map(|t| (t.size_in_bytes, t.alignment)).unwrap_or((0, 1));
            let initializer = field.initializer.map(|id| self.evaluate(ast, id, scope, module)).and_then(|x| x);
            let declaration = self.builder().make_field(field.name.clone(), type_ref, initializer, Some(scope), loc);

            let offset = if table_kind == CompositeKind::Enum {
                let value = initializer.and_then(|id| literal_int(self.arena, id)).unwrap_or(next_enum_value);
                if value < next_enum_value {
                    self.error(Code::InvalidStatement, format!("enum member `{}` value {} is smaller than the previous implicit value {}", field.name, value, next_enum_value), loc);
                }
                next_enum_value = value + 1;
                self.types.add_field(composite_type, field.name.clone(), declaration, 0, 1)
            } else {
                self.types.add_field(composite_type, field.name.clone(), declaration, field_size, field_align)
            };
            if let Some(ElementData::Field { offset: slot, .. }) = self.arena.find_mut(declaration).map(|e| &mut e.data) {
                *slot = basecode_arena::FieldOffset { offset: offset.unwrap_or(0), size_in_bytes: field_size };
            }
        }
    }
}

fn type_id_of(arena: &basecode_arena::ElementMap, type_reference: ElementId) -> Option<basecode_common::TypeId> {
    match &arena.find(type_reference)?.data {
        ElementData::TypeReference { type_id, .. } => *type_id,
        _ => None,
    }
}

fn literal_int(arena: &basecode_arena::ElementMap, id: ElementId) -> Option<i64> {
    match &arena.find(id)?.data {
        ElementData::Literal(ElemLiteral::Int(v)) => Some(*v),
        _ => None,
    }
}

fn primitive_type_id(types: &mut TypeTable, parts: &[String]) -> Option<basecode_common::TypeId> {
    if parts.len() != 1 {
        return None;
    }
    match parts[0].as_str() {
        "u8" => Some(types.find_numeric_type(NumericKind::U8)),
        "u16" => Some(types.find_numeric_type(NumericKind::U16)),
        "u32" => Some(types.find_numeric_type(NumericKind::U32)),
        "u64" => Some(types.find_numeric_type(NumericKind::U64)),
        "s8" => Some(types.find_numeric_type(NumericKind::S8)),
        "s16" => Some(types.find_numeric_type(NumericKind::S16)),
        "s32" => Some(types.find_numeric_type(NumericKind::S32)),
        "s64" => Some(types.find_numeric_type(NumericKind::S64)),
        "f32" => Some(types.find_numeric_type(NumericKind::F32)),
        "f64" => Some(types.find_numeric_type(NumericKind::F64)),
        "bool" => Some(types.find_bool_type()),
        "rune" => Some(types.find_rune_type()),
        _ => None,
    }
}
