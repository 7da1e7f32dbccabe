//! The byte-code emitter crate (spec §4.7, §4.8): variable classification,
//! three-address instructions, basic blocks, call-graph reachability, and
//! section layout for a resolved CodeDOM module.

pub mod blocks;
pub mod emitter;
pub mod instr;
pub mod reachability;
pub mod sections;
pub mod variables;

pub use blocks::{BasicBlock, BlockGraph, BlockId, FlowStack, FlowTarget};
pub use emitter::Emitter;
pub use instr::{Instruction, Opcode, Operand, OperandSize};
pub use reachability::CallGraph;
pub use sections::{SectionEntry, SectionKind, SectionTable};
pub use variables::{group_variables, module_section_of, ModuleSection, Offset, TempPool, UseFlags, Variable, VariableGroup, VariableKind, VariableMap};

#[cfg(test)]
mod tests;
