//! The AST evaluator (spec §2.4, §4.3): walks the parsed tree and
//! builds the CodeDOM element graph, one handler per [`AstKind`].
//! Corresponds to the first half of the teacher's `tsz-binder` crate —
//! the part that turns syntax into a bound graph, before type inference
//! takes over.

mod context;
mod declare;
mod dispatch;
mod procs;

pub use context::{EvalOutcome, Evaluator};

#[cfg(test)]
mod tests;
