//! Source spans - byte-range location tracking for CodeDOM elements and diagnostics.
//!
//! Spans are small (8 bytes) and cheap to copy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A span of source code, represented as a byte range.
///
/// Spans use half-open intervals: `[start, end)`. An empty span has
/// `start == end`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn at(pos: u32) -> Self {
        Span { start: pos, end: pos }
    }

    /// Dummy span for synthetic elements (e.g. the implicit `expr == true`
    /// wrapper built by `convert_predicate`).
    #[inline]
    pub const fn synthetic() -> Self {
        Span { start: u32::MAX, end: u32::MAX }
    }

    #[inline]
    pub const fn is_synthetic(&self) -> bool {
        self.start == u32::MAX
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub const fn merge(&self, other: Span) -> Span {
        let start = if self.start < other.start { self.start } else { other.start };
        let end = if self.end > other.end { self.end } else { other.end };
        Span { start, end }
    }
}

/// A resolved source location: which module, plus line/column derived from
/// a span. Modules are referenced by id rather than path so this stays
/// `Copy`; the session's module table owns the path string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub module: ModuleId,
    pub span: Span,
}

impl SourceLocation {
    pub const fn new(module: ModuleId, span: Span) -> Self {
        Self { module, span }
    }
}

/// Identifies a source module (translation unit) by its position in the
/// session's module table. `NONE` is used for synthetic locations that
/// have no originating file (builder-constructed singletons, folded
/// constants).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub const NONE: ModuleId = ModuleId(u32::MAX);
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::NONE { write!(f, "<synthetic>") } else { write!(f, "module#{}", self.0) }
    }
}
