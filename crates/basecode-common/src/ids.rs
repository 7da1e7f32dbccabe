//! Cross-crate id newtypes.
//!
//! `basecode-arena` owns the element graph and `basecode-types` owns the
//! type table, but an element can carry a `TypeId` (a `type_reference`
//! element's resolved type) and a type carries back-reference ids into
//! the element arena (its symbol's owning scope). Defining both id types
//! here — rather than in whichever crate happens to "own" the concept —
//! keeps the dependency graph a line (`arena -> types -> eval -> resolve
//! -> emit`) instead of a cycle.

use std::fmt;

macro_rules! id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

id_type!(ElementId, "Stable, process-wide, monotonically increasing id for a CodeDOM element (spec §3.1, §5 ordering guarantee).");
id_type!(TypeId, "Id into the type table owned by `basecode-types` (spec §3.3).");

/// A scope is itself an element (every `block`/`module`/`namespace` is an
/// `Element::Block`), so a scope handle is just the owning element's id.
pub type ScopeId = ElementId;
