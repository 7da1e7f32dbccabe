//! The CodeDOM element arena, symbol table, and lexical scope graph.
//!
//! Covers spec §2.1 (Element Arena & Identity), §2.2 (Symbol & Scope
//! Graph), and §2.3 (Element Builder) — the leaves of the dependency
//! order in spec §2, mirroring how the teacher workspace puts
//! `tsz-binder` (name binding + symbol table) directly above
//! `tsz-common`.

pub mod arena;
pub mod builder;
pub mod element;
pub mod lookup;
pub mod scope;
pub mod scope_manager;
pub mod symbol;

pub use arena::ElementMap;
pub use builder::{append_statement, declare_in_scope, ElementBuilder};
pub use element::{Argument, Element, ElementData, ElementKind, ElementList, FieldOffset, Literal};
pub use lookup::find_identifier;
pub use scope::{Block, IdentifierMap};
pub use scope_manager::ScopeManager;
pub use symbol::{QualifiedSymbol, Symbol};
