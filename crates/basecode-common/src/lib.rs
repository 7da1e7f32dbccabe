//! Common types and utilities for the Basecode bootstrap compiler.
//!
//! This crate provides foundational types used across all `basecode-*`
//! crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans and locations (`Span`, `SourceLocation`)
//! - The stable diagnostic catalogue (`diagnostics`)
//! - Centralized limits (`limits`)
//! - The cross-crate id newtypes (`ids`) that keep `basecode-arena` and
//!   `basecode-types` from needing a circular dependency on each other's
//!   payload types.

pub mod diagnostics;
pub mod ids;
pub mod interner;
pub mod limits;
pub mod span;

pub use diagnostics::{Category, Code, Diagnostic, ResultMessage};
pub use ids::{ElementId, TypeId};
pub use interner::{Atom, Interner};
pub use span::{ModuleId, SourceLocation, Span};
