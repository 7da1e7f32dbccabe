//! The type table: owns every [`Type`] by id and canonicalizes derived
//! types (pointers, arrays) so that two requests for "pointer to u32"
//! return the same [`TypeId`] (spec §3.3, §8 "Type canonicalization").

use crate::numeric::NumericKind;
use crate::types::{AccessModel, CompositeKind, FieldMap, NumberClass, Type, TypeKind};
use basecode_arena::{QualifiedSymbol, Symbol};
use basecode_common::{limits, ElementId, TypeId};
use rustc_hash::FxHashMap;

/// Key for the pointer-canonicalization cache: one pointer type per
/// distinct base.
type PointerKey = TypeId;
/// Key for the array-canonicalization cache: one array type per
/// distinct (base, subscript elements) pair. Subscripts are compared by
/// the declaring elements' ids since literal-vs-expression resolution
/// may still be pending when the cache is consulted.
type ArrayKey = (TypeId, Vec<ElementId>);

pub struct TypeTable {
    types: FxHashMap<TypeId, Type>,
    next_id: u32,
    pointer_cache: FxHashMap<PointerKey, TypeId>,
    array_cache: FxHashMap<ArrayKey, TypeId>,
    numeric_cache: FxHashMap<NumericKind, TypeId>,
    bool_type: Option<TypeId>,
    rune_type: Option<TypeId>,
    unknown_type: Option<TypeId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self {
            types: FxHashMap::default(),
            next_id: 0,
            pointer_cache: FxHashMap::default(),
            array_cache: FxHashMap::default(),
            numeric_cache: FxHashMap::default(),
            bool_type: None,
            rune_type: None,
            unknown_type: None,
        }
    }

    fn alloc_id(&mut self) -> TypeId {
        let id = TypeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, symbol: Symbol, size_in_bytes: u32, alignment: u32, number_class: NumberClass, access_model: AccessModel, kind: TypeKind) -> TypeId {
        let id = self.alloc_id();
        let ty = Type { id, symbol, parent_scope: None, size_in_bytes, alignment, number_class, access_model, kind };
        self.types.insert(id, ty);
        id
    }

    pub fn find(&self, id: TypeId) -> Option<&Type> {
        self.types.get(&id)
    }

    pub fn find_mut(&mut self, id: TypeId) -> Option<&mut Type> {
        self.types.get_mut(&id)
    }

    /// Every registered type in ascending `TypeId` order — deterministic
    /// regardless of the backing hash map's iteration order, needed by
    /// the emitter's type-info table (spec §4.8/§6.3).
    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        let mut ids: Vec<TypeId> = self.types.keys().copied().collect();
        ids.sort();
        ids.into_iter().map(move |id| &self.types[&id])
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Looks up (interning on first use) the numeric type for `kind`.
    pub fn find_numeric_type(&mut self, kind: NumericKind) -> TypeId {
        if let Some(&id) = self.numeric_cache.get(&kind) {
            return id;
        }
        let number_class = if kind.is_float() { NumberClass::Float } else { NumberClass::Integer };
        let id = self.insert(
            Symbol::new(QualifiedSymbol::simple(kind.name()), true),
            kind.size_in_bytes(),
            kind.alignment(),
            number_class,
            AccessModel::Value,
            TypeKind::Numeric(kind),
        );
        self.numeric_cache.insert(kind, id);
        id
    }

    pub fn find_bool_type(&mut self) -> TypeId {
        if let Some(id) = self.bool_type {
            return id;
        }
        let id = self.insert(Symbol::new(QualifiedSymbol::simple("bool"), true), 1, 1, NumberClass::None, AccessModel::Value, TypeKind::Bool);
        self.bool_type = Some(id);
        id
    }

    pub fn find_rune_type(&mut self) -> TypeId {
        if let Some(id) = self.rune_type {
            return id;
        }
        let id = self.insert(Symbol::new(QualifiedSymbol::simple("rune"), true), 4, 4, NumberClass::Integer, AccessModel::Value, TypeKind::Rune);
        self.rune_type = Some(id);
        id
    }

    pub fn find_unknown_type(&mut self) -> TypeId {
        if let Some(id) = self.unknown_type {
            return id;
        }
        let id = self.insert(Symbol::new(QualifiedSymbol::simple("unknown"), false), 0, 1, NumberClass::None, AccessModel::Value, TypeKind::Unknown);
        self.unknown_type = Some(id);
        id
    }

    /// Canonicalizing pointer constructor (spec §4.2 `find_pointer_type`):
    /// repeated calls with the same `base` return the same id.
    pub fn find_pointer_type(&mut self, base: TypeId) -> TypeId {
        if let Some(&id) = self.pointer_cache.get(&base) {
            return id;
        }
        let name = self.find(base).map(|t| format!("^{}", t.symbol.name())).unwrap_or_else(|| "^unknown".to_string());
        let id = self.insert(
            Symbol::new(QualifiedSymbol::simple(name), false),
            limits::TYPE_INFO_ALIGN as u32,
            limits::TYPE_INFO_ALIGN as u32,
            NumberClass::None,
            AccessModel::Pointer,
            TypeKind::Pointer { base },
        );
        self.pointer_cache.insert(base, id);
        tracing::debug!(?base, pointer = ?id, "interned new pointer type");
        id
    }

    /// Canonicalizing array constructor (spec §4.2 `find_array_type`).
    /// `element_count` is `Some` only when every subscript resolved to a
    /// literal at construction time (spec §9 Open Question: non-literal
    /// subscripts are deferred to the final resolver pass, which updates
    /// the stored type in place via [`TypeTable::set_array_element_count`]).
    pub fn find_array_type(&mut self, base: TypeId, subscripts: Vec<ElementId>, element_count: Option<u64>) -> TypeId {
        let key = (base, subscripts.clone());
        if let Some(&id) = self.array_cache.get(&key) {
            return id;
        }
        let base_size = self.find(base).map(|t| t.size_in_bytes).unwrap_or(0);
        let base_align = self.find(base).map(|t| t.alignment).unwrap_or(1);
        let size_in_bytes = element_count.map(|count| base_size as u64 * count).unwrap_or(0) as u32;
        let id = self.insert(
            Symbol::new(QualifiedSymbol::simple("array"), false),
            size_in_bytes,
            base_align,
            NumberClass::None,
            AccessModel::Value,
            TypeKind::Array { base, subscripts, element_count },
        );
        self.array_cache.insert(key, id);
        id
    }

    /// Fills in a pending array's element count once its subscript
    /// expressions fold to a constant, and recomputes its size.
    pub fn set_array_element_count(&mut self, array: TypeId, element_count: u64) {
        let base_size = match self.find(array).map(|t| &t.kind) {
            Some(TypeKind::Array { base, .. }) => self.find(*base).map(|t| t.size_in_bytes).unwrap_or(0),
            _ => return,
        };
        if let Some(ty) = self.find_mut(array) {
            if let TypeKind::Array { element_count: count, .. } = &mut ty.kind {
                *count = Some(element_count);
            }
            ty.size_in_bytes = base_size * element_count as u32;
        }
    }

    pub fn make_tuple_type(&mut self, elements: Vec<TypeId>) -> TypeId {
        let size_in_bytes = elements.iter().filter_map(|id| self.find(*id)).map(|t| t.size_in_bytes).sum();
        let alignment = elements.iter().filter_map(|id| self.find(*id)).map(|t| t.alignment).max().unwrap_or(1);
        self.insert(Symbol::new(QualifiedSymbol::simple("tuple"), false), size_in_bytes, alignment, NumberClass::None, AccessModel::Value, TypeKind::Tuple { elements })
    }

    /// Allocates a composite type with no fields yet; `add_field` fills
    /// in the field map and recomputes layout as fields are declared
    /// (spec §4.3 `add_composite_type_fields`).
    pub fn make_composite_type(&mut self, symbol: Symbol, kind: CompositeKind, scope: ElementId, enum_base: Option<TypeId>) -> TypeId {
        let access_model = match kind {
            CompositeKind::Enum => AccessModel::Value,
            CompositeKind::Struct | CompositeKind::Union => AccessModel::Value,
        };
        self.insert(symbol, 0, 1, NumberClass::None, access_model, TypeKind::Composite { kind, scope, fields: FieldMap::default(), enum_base })
    }

    /// Declares one field of a composite and recomputes size/alignment
    /// (spec §8 "Composite size law"): struct fields stack sequentially
    /// with padding to each field's own alignment, union/enum members
    /// share offset 0 and the composite's size is the widest member.
    pub fn add_field(&mut self, composite: TypeId, name: String, declaration: ElementId, field_size: u32, field_align: u32) -> Option<u32> {
        let ty = self.find_mut(composite)?;
        let TypeKind::Composite { kind, fields, .. } = &mut ty.kind else { return None };
        let field_kind = *kind;
        let offset = match field_kind {
            CompositeKind::Struct => align_up(ty.size_in_bytes, field_align),
            CompositeKind::Union | CompositeKind::Enum => 0,
        };
        fields.insert(name, declaration);
        let new_size = match field_kind {
            CompositeKind::Struct => offset + field_size,
            CompositeKind::Union | CompositeKind::Enum => ty.size_in_bytes.max(field_size),
        };
        ty.size_in_bytes = align_up(new_size, ty.alignment.max(field_align));
        ty.alignment = ty.alignment.max(field_align);
        Some(offset)
    }

    pub fn make_procedure_type(&mut self, symbol: Symbol, header_scope: ElementId, parameter_types: Vec<TypeId>, return_types: Vec<TypeId>, is_foreign: bool, is_variadic: bool) -> TypeId {
        self.insert(
            symbol,
            limits::TYPE_INFO_ALIGN as u32,
            limits::TYPE_INFO_ALIGN as u32,
            NumberClass::None,
            AccessModel::Pointer,
            TypeKind::Procedure { header_scope, return_types, parameter_types, is_foreign, is_variadic, instances: Vec::new() },
        )
    }

    pub fn add_procedure_instance(&mut self, procedure: TypeId, instance: ElementId) {
        if let Some(ty) = self.find_mut(procedure) {
            if let TypeKind::Procedure { instances, .. } = &mut ty.kind {
                instances.push(instance);
            }
        }
    }

    pub fn make_namespace_type(&mut self, symbol: Symbol, scope: ElementId) -> TypeId {
        self.insert(symbol, 0, 1, NumberClass::None, AccessModel::Value, TypeKind::Namespace { scope })
    }

    pub fn make_module_type(&mut self, symbol: Symbol, scope: ElementId) -> TypeId {
        self.insert(symbol, 0, 1, NumberClass::None, AccessModel::Value, TypeKind::Module { scope })
    }

    pub fn make_generic_type(&mut self, symbol: Symbol, constraints: Vec<TypeId>) -> TypeId {
        self.insert(symbol, 0, 1, NumberClass::None, AccessModel::Value, TypeKind::Generic { constraints })
    }

    /// Builds (or extends, if `existing` names a prior family) a
    /// union-of-types family, deduplicating alternatives.
    pub fn make_family_type(&mut self, existing: Option<TypeId>, mut alternatives: Vec<TypeId>) -> TypeId {
        if let Some(existing_id) = existing {
            if let Some(Type { kind: TypeKind::Family { alternatives: prior }, .. }) = self.find(existing_id) {
                let mut merged = prior.clone();
                merged.append(&mut alternatives);
                merged.dedup();
                if let Some(ty) = self.find_mut(existing_id) {
                    if let TypeKind::Family { alternatives: slot } = &mut ty.kind {
                        *slot = merged;
                    }
                }
                return existing_id;
            }
        }
        alternatives.dedup();
        self.insert(Symbol::new(QualifiedSymbol::simple("family"), false), 0, 1, NumberClass::None, AccessModel::Value, TypeKind::Family { alternatives })
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

fn align_up(value: u32, align: u32) -> u32 {
    if align <= 1 {
        return value;
    }
    (value + align - 1) / align * align
}
