//! Type variants and the type table (spec §2.5, §3.3).
//!
//! Every type carries a symbol, an optional parent scope, a
//! size-in-bytes, an alignment, a number-class and an access model
//! (spec §3.3) — those common fields live on [`Type`] directly, with
//! variant-specific data in [`TypeKind`], mirroring how
//! `basecode-arena::Element`/`ElementData` separate the common
//! envelope from the per-kind payload.

use crate::numeric::NumericKind;
use basecode_arena::Symbol;
use basecode_common::{ElementId, TypeId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberClass {
    None,
    Integer,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessModel {
    Value,
    Pointer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompositeKind {
    Struct,
    Union,
    Enum,
}

/// Field layout within a composite, keyed by declaration order
/// (`IndexMap` so that `Display`/debug output and offset iteration
/// follow source order, same rationale as `basecode_arena::scope::Block`).
pub type FieldMap = IndexMap<String, ElementId, FxBuildHasher>;

#[derive(Clone, Debug)]
pub enum TypeKind {
    Numeric(NumericKind),
    Bool,
    Rune,
    /// `nil`, `void`, the type of an unresolved reference while the
    /// resolver is still running (spec §4.4 fix-point pass).
    Unknown,

    Pointer {
        base: TypeId,
    },
    /// `subscripts` holds one element per dimension, each either a
    /// literal-valued `declaration` (size known up front) or an
    /// unresolved expression the final resolver pass must settle (spec
    /// §9 Open Question: array subscript sizing).
    Array {
        base: TypeId,
        subscripts: Vec<ElementId>,
        /// Total element count once every subscript is a known
        /// constant; `None` until then.
        element_count: Option<u64>,
    },
    Tuple {
        elements: Vec<TypeId>,
    },
    Composite {
        kind: CompositeKind,
        scope: ElementId,
        fields: FieldMap,
        /// Only meaningful for `CompositeKind::Enum`: the underlying
        /// storage type of the discriminant.
        enum_base: Option<TypeId>,
    },
    Procedure {
        header_scope: ElementId,
        return_types: Vec<TypeId>,
        parameter_types: Vec<TypeId>,
        is_foreign: bool,
        is_variadic: bool,
        instances: Vec<ElementId>,
    },
    Namespace {
        scope: ElementId,
    },
    Module {
        scope: ElementId,
    },
    /// An unconstrained or constrained generic parameter, e.g. `T` in
    /// `Box<T>`. Empty `constraints` means an open generic.
    Generic {
        constraints: Vec<TypeId>,
    },
    /// A union-of-types family produced when a name resolves to more
    /// than one plausible type during inference, narrowed by the
    /// checker once enough context has accumulated.
    Family {
        alternatives: Vec<TypeId>,
    },
}

#[derive(Clone, Debug)]
pub struct Type {
    pub id: TypeId,
    pub symbol: Symbol,
    pub parent_scope: Option<ElementId>,
    pub size_in_bytes: u32,
    pub alignment: u32,
    pub number_class: NumberClass,
    pub access_model: AccessModel,
    pub kind: TypeKind,
}

impl Type {
    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, TypeKind::Unknown)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TypeKind::Composite { .. })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.number_class, NumberClass::Integer | NumberClass::Float)
    }
}
