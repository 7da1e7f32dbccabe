//! The CodeDOM element: the atomic unit of the compiler's typed graph
//! (spec §3.1, §3.4). Modeled as a tagged sum per the re-architecture
//! guidance in spec §9 ("Polymorphic hierarchy rooted at `element`") —
//! one variant per kind, dispatch is a `match`, no downcasting.

use crate::symbol::{QualifiedSymbol, Symbol};
use basecode_common::{ElementId, SourceLocation, TypeId};
use basecode_ast::{BinaryOp, Literal as AstLiteral, UnaryOp};
use smallvec::SmallVec;

pub type ElementList = SmallVec<[ElementId; 4]>;

/// The coarse kind tag used for the arena's kind-indexed lookup
/// (`find_by_kind`, spec §4.1). Finer distinctions (e.g. which binary
/// operator) live inside [`ElementData`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Nil,
    Bool,
    Int,
    Float,
    StringLiteral,
    Character,
    Uninitialized,
    ValueSink,
    TypeLiteral,

    Identifier,
    Declaration,
    Field,
    Namespace,
    Module,
    Import,

    TypeReference,

    Unary,
    Binary,
    Spread,
    Cast,
    Transmute,
    Subscript,
    MemberAccess,

    If,
    While,
    For,
    Switch,
    Case,
    Fallthrough,
    Break,
    Continue,
    Return,
    Defer,
    With,
    Yield,
    Block,
    Statement,
    Label,
    LabelReference,

    ArgumentList,
    ArgumentPair,
    ProcedureCall,
    ProcedureInstance,
    Intrinsic,

    Program,
    Expression,
    Initializer,
    Attribute,
    Directive,
    Comment,
    RawBlock,
    Symbol,
    IdentifierReference,
    ModuleReference,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Literal {
    Nil,
    Uninitialized,
    Bool(bool),
    Int(i64),
    Float(u64),
    Char(char),
}

impl From<AstLiteral> for Literal {
    fn from(lit: AstLiteral) -> Self {
        match lit {
            AstLiteral::Nil => Literal::Nil,
            AstLiteral::Uninitialized => Literal::Uninitialized,
            AstLiteral::Bool(b) => Literal::Bool(b),
            AstLiteral::Int(i) => Literal::Int(i),
            AstLiteral::Float(bits) => Literal::Float(bits),
            AstLiteral::Char(c) => Literal::Char(c),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Argument {
    pub name: Option<String>,
    pub value: ElementId,
}

/// Per-field byte layout, computed by `add_composite_type_fields` (spec
/// §4.3) and consumed by the emitter's subscript/member-access lowering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldOffset {
    pub offset: u32,
    pub size_in_bytes: u32,
}

#[derive(Clone, Debug)]
pub enum ElementData {
    Literal(Literal),
    StringLiteral { value: String },
    ValueSink,
    TypeLiteral { type_id: Option<TypeId> },

    /// A declared name: `declare_identifier` (spec §4.3) fills in
    /// `type_ref` either from an explicit annotation or by inference, and
    /// `initializer` holds either the literal initializer element or a
    /// synthetic assignment binary operator so that later passes see one
    /// shape regardless of surface syntax.
    Identifier { symbol: Symbol, type_ref: Option<ElementId>, initializer: Option<ElementId> },
    /// A `type_reference` element: syntax pointing at a (possibly
    /// still-unresolved) type.
    TypeReference { symbol: QualifiedSymbol, type_id: Option<TypeId>, is_inferred: bool },
    Field { name: String, type_ref: ElementId, initializer: Option<ElementId>, offset: FieldOffset },
    Namespace { expression: ElementId },
    Module { name: String, scope: ElementId, is_root: bool },
    Import { path: QualifiedSymbol, items: Vec<String>, imported_module: Option<ElementId> },

    Unary { op: UnaryOp, operand: ElementId },
    Binary { op: BinaryOp, lhs: ElementId, rhs: ElementId },
    Spread { operand: ElementId },
    Cast { type_ref: ElementId, expr: ElementId },
    Transmute { type_ref: ElementId, expr: ElementId },
    Subscript { base: ElementId, index: ElementId, is_assign_target: bool },
    MemberAccess { base: ElementId, member: String },

    If { predicate: ElementId, true_branch: ElementId, false_branch: Option<ElementId> },
    While { predicate: ElementId, body: ElementId },
    /// Already desugared by `for_in` expansion (spec §4.3) into an
    /// init/predicate/step/body skeleton — `init` declares the loop
    /// variable, `step` advances it.
    For { init: ElementId, predicate: ElementId, step: ElementId, body: ElementId },
    Switch { expr: ElementId, cases: ElementList },
    Case { value: Option<ElementId>, body: ElementId, falls_through: bool },
    Fallthrough,
    Break { label: Option<String> },
    Continue { label: Option<String> },
    Return { values: ElementList },
    Defer { expr: ElementId },
    With { expr: ElementId, body: ElementId },
    Yield { value: Option<ElementId> },
    Block { scope: crate::scope::Block },
    Statement { expr: ElementId },
    Label { name: String },
    LabelReference { name: String, target: Option<ElementId> },

    ArgumentList { args: Vec<Argument> },
    /// `procedure_call` carries every overload candidate found during
    /// name resolution; overload resolution (spec §4.5) narrows this to
    /// one and records it in `resolved`.
    ProcedureCall { callee: QualifiedSymbol, candidates: ElementList, args: ElementId, resolved: Option<ElementId> },
    /// One concrete body for a `procedure_type` (the type itself lives in
    /// the type table; spec §3.3 "procedure types own ... a set of
    /// procedure-instances").
    ProcedureInstance { type_id: TypeId, header_scope: ElementId, body: ElementId },
    Intrinsic { name: String, args: Vec<Argument> },

    Program { statements: ElementList },
    Expression { inner: ElementId },
    Initializer { expression: ElementId },
    Attribute { name: String, value: Option<ElementId> },
    Directive { name: String, args: Vec<Argument> },
    Comment { text: String },
    RawBlock { text: String },
    Symbol(Symbol),
    IdentifierReference { symbol: QualifiedSymbol, resolved: ElementList },
    ModuleReference { reference: ElementId },
}

impl ElementData {
    pub fn kind(&self) -> ElementKind {
        use ElementData as D;
        match self {
            D::Literal(Literal::Nil) => ElementKind::Nil,
            D::Literal(Literal::Uninitialized) => ElementKind::Uninitialized,
            D::Literal(Literal::Bool(_)) => ElementKind::Bool,
            D::Literal(Literal::Int(_)) => ElementKind::Int,
            D::Literal(Literal::Float(_)) => ElementKind::Float,
            D::Literal(Literal::Char(_)) => ElementKind::Character,
            D::StringLiteral { .. } => ElementKind::StringLiteral,
            D::ValueSink => ElementKind::ValueSink,
            D::TypeLiteral { .. } => ElementKind::TypeLiteral,
            D::Identifier { .. } => ElementKind::Identifier,
            D::TypeReference { .. } => ElementKind::TypeReference,
            D::Field { .. } => ElementKind::Field,
            D::Namespace { .. } => ElementKind::Namespace,
            D::Module { .. } => ElementKind::Module,
            D::Import { .. } => ElementKind::Import,
            D::Unary { .. } => ElementKind::Unary,
            D::Binary { .. } => ElementKind::Binary,
            D::Spread { .. } => ElementKind::Spread,
            D::Cast { .. } => ElementKind::Cast,
            D::Transmute { .. } => ElementKind::Transmute,
            D::Subscript { .. } => ElementKind::Subscript,
            D::MemberAccess { .. } => ElementKind::MemberAccess,
            D::If { .. } => ElementKind::If,
            D::While { .. } => ElementKind::While,
            D::For { .. } => ElementKind::For,
            D::Switch { .. } => ElementKind::Switch,
            D::Case { .. } => ElementKind::Case,
            D::Fallthrough => ElementKind::Fallthrough,
            D::Break { .. } => ElementKind::Break,
            D::Continue { .. } => ElementKind::Continue,
            D::Return { .. } => ElementKind::Return,
            D::Defer { .. } => ElementKind::Defer,
            D::With { .. } => ElementKind::With,
            D::Yield { .. } => ElementKind::Yield,
            D::Block { .. } => ElementKind::Block,
            D::Statement { .. } => ElementKind::Statement,
            D::Label { .. } => ElementKind::Label,
            D::LabelReference { .. } => ElementKind::LabelReference,
            D::ArgumentList { .. } => ElementKind::ArgumentList,
            D::ProcedureCall { .. } => ElementKind::ProcedureCall,
            D::ProcedureInstance { .. } => ElementKind::ProcedureInstance,
            D::Intrinsic { .. } => ElementKind::Intrinsic,
            D::Program { .. } => ElementKind::Program,
            D::Expression { .. } => ElementKind::Expression,
            D::Initializer { .. } => ElementKind::Initializer,
            D::Attribute { .. } => ElementKind::Attribute,
            D::Directive { .. } => ElementKind::Directive,
            D::Comment { .. } => ElementKind::Comment,
            D::RawBlock { .. } => ElementKind::RawBlock,
            D::Symbol(_) => ElementKind::Symbol,
            D::IdentifierReference { .. } => ElementKind::IdentifierReference,
            D::ModuleReference { .. } => ElementKind::ModuleReference,
        }
    }

    /// The elements this one owns (spec §3.1 ownership invariant). Used
    /// by `ElementMap::remove` to cascade-delete a subtree.
    pub fn owned_elements(&self) -> ElementList {
        use ElementData as D;
        let mut owned = ElementList::new();
        match self {
            D::Identifier { type_ref, initializer, .. } => {
                owned.extend(*type_ref);
                owned.extend(*initializer);
            }
            D::TypeReference { .. } => {}
            D::Field { type_ref, initializer, .. } => {
                owned.push(*type_ref);
                owned.extend(*initializer);
            }
            D::Namespace { expression } => owned.push(*expression),
            D::Module { scope, .. } => owned.push(*scope),
            D::Import { imported_module, .. } => owned.extend(*imported_module),
            D::Unary { operand, .. } => owned.push(*operand),
            D::Binary { lhs, rhs, .. } => {
                owned.push(*lhs);
                owned.push(*rhs);
            }
            D::Spread { operand } => owned.push(*operand),
            D::Cast { type_ref, expr } | D::Transmute { type_ref, expr } => {
                owned.push(*type_ref);
                owned.push(*expr);
            }
            D::Subscript { base, index, .. } => {
                owned.push(*base);
                owned.push(*index);
            }
            D::MemberAccess { base, .. } => owned.push(*base),
            D::If { predicate, true_branch, false_branch } => {
                owned.push(*predicate);
                owned.push(*true_branch);
                owned.extend(*false_branch);
            }
            D::While { predicate, body } => {
                owned.push(*predicate);
                owned.push(*body);
            }
            D::For { init, predicate, step, body } => {
                owned.push(*init);
                owned.push(*predicate);
                owned.push(*step);
                owned.push(*body);
            }
            D::Switch { expr, cases } => {
                owned.push(*expr);
                owned.extend(cases.iter().copied());
            }
            D::Case { value, body, .. } => {
                owned.extend(*value);
                owned.push(*body);
            }
            D::Return { values } => owned.extend(values.iter().copied()),
            D::Defer { expr } => owned.push(*expr),
            D::With { expr, body } => {
                owned.push(*expr);
                owned.push(*body);
            }
            D::Yield { value } => owned.extend(*value),
            D::Statement { expr } => owned.push(*expr),
            D::ArgumentList { args } => owned.extend(args.iter().map(|a| a.value)),
            D::ProcedureCall { args, .. } => owned.push(*args),
            D::ProcedureInstance { body, .. } => owned.push(*body),
            D::Intrinsic { args, .. } => owned.extend(args.iter().map(|a| a.value)),
            D::Program { statements } => owned.extend(statements.iter().copied()),
            D::Expression { inner } => owned.push(*inner),
            D::Initializer { expression } => owned.push(*expression),
            D::Attribute { value, .. } => owned.extend(*value),
            D::Directive { args, .. } => owned.extend(args.iter().map(|a| a.value)),
            D::ModuleReference { reference } => owned.push(*reference),
            D::Literal(_)
            | D::StringLiteral { .. }
            | D::ValueSink
            | D::TypeLiteral { .. }
            | D::Fallthrough
            | D::Break { .. }
            | D::Continue { .. }
            | D::Label { .. }
            | D::LabelReference { .. }
            | D::Block { .. }
            | D::Comment { .. }
            | D::RawBlock { .. }
            | D::Symbol(_)
            | D::IdentifierReference { .. } => {}
        }
        owned
    }
}

/// An element: the atomic CodeDOM unit (spec §3.1). `parent_element` and
/// `parent_scope` are weak back-references used only for upward queries —
/// never followed to decide ownership (spec §5).
#[derive(Clone, Debug)]
pub struct Element {
    pub id: ElementId,
    pub data: ElementData,
    pub parent_element: Option<ElementId>,
    pub parent_scope: Option<ElementId>,
    pub attributes: ElementList,
    pub comments: ElementList,
    pub location: SourceLocation,
    pub is_singleton: bool,
    pub non_owning: bool,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn owned_elements(&self) -> ElementList {
        self.data.owned_elements()
    }
}
