//! Basic blocks and the control-flow graph they form (spec §4.8): each
//! block owns an ordered list of three-address instructions and can
//! carry a label, a section directive, alignment, and inline comments.
//! Predecessor/successor edges between blocks form the graph the
//! assembler linearizes in block order.

use crate::instr::Instruction;
use basecode_common::ElementId;
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Clone, Debug)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: Option<String>,
    pub instructions: Vec<Instruction>,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
}

impl BasicBlock {
    fn new(id: BlockId) -> Self {
        Self { id, label: None, instructions: Vec::new(), predecessors: Vec::new(), successors: Vec::new() }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// The owning container for a single procedure's (or the module's
/// top-level) control-flow graph, plus the labels attached to loop and
/// switch constructs so `break`/`continue`/`fallthrough` can resolve
/// to the right exit block (spec §4.8 "flow-control stack").
pub struct BlockGraph {
    blocks: Vec<BasicBlock>,
    entry: BlockId,
    by_element: FxHashMap<ElementId, BlockId>,
}

impl Default for BlockGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockGraph {
    pub fn new() -> Self {
        let entry = BlockId(0);
        Self { blocks: vec![BasicBlock::new(entry)], entry, by_element: FxHashMap::default() }
    }

    pub fn entry(&self) -> BlockId {
        self.entry
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id));
        id
    }

    pub fn get(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0 as usize]
    }

    pub fn push(&mut self, id: BlockId, instruction: Instruction) {
        self.blocks[id.0 as usize].push(instruction);
    }

    pub fn set_label(&mut self, id: BlockId, label: impl Into<String>) {
        self.blocks[id.0 as usize].label = Some(label.into());
    }

    /// Records a CFG edge and its mirror predecessor link.
    pub fn connect(&mut self, from: BlockId, to: BlockId) {
        if !self.blocks[from.0 as usize].successors.contains(&to) {
            self.blocks[from.0 as usize].successors.push(to);
        }
        if !self.blocks[to.0 as usize].predecessors.contains(&from) {
            self.blocks[to.0 as usize].predecessors.push(from);
        }
    }

    /// Associates `element` (e.g. a `while`'s enclosing statement) with
    /// the block its lowering begins at, so later passes can re-find
    /// entry points without re-walking the whole graph.
    pub fn bind(&mut self, element: ElementId, block: BlockId) {
        self.by_element.insert(element, block);
    }

    pub fn block_of(&self, element: ElementId) -> Option<BlockId> {
        self.by_element.get(&element).copied()
    }

    /// Blocks in allocation order, the order the assembler linearizes
    /// them in.
    pub fn iter(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// One entry in the flow-control stack (spec §4.8): the blocks that
/// `break`, `continue`, and `fallthrough` jump to from inside a loop or
/// switch body.
#[derive(Clone, Copy, Debug)]
pub struct FlowTarget {
    pub break_block: BlockId,
    pub continue_block: Option<BlockId>,
    pub fallthrough_block: Option<BlockId>,
}

#[derive(Default)]
pub struct FlowStack(Vec<FlowTarget>);

impl FlowStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: FlowTarget) {
        self.0.push(target);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn top(&self) -> Option<&FlowTarget> {
        self.0.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::{Opcode, OperandSize};

    #[test]
    fn new_block_gets_the_next_sequential_id() {
        let mut graph = BlockGraph::new();
        let a = graph.new_block();
        let b = graph.new_block();
        assert_eq!(a, BlockId(1));
        assert_eq!(b, BlockId(2));
    }

    #[test]
    fn connect_links_both_directions() {
        let mut graph = BlockGraph::new();
        let body = graph.new_block();
        graph.connect(graph.entry(), body);
        assert_eq!(graph.get(graph.entry()).successors, vec![body]);
        assert_eq!(graph.get(body).predecessors, vec![graph.entry()]);
    }

    #[test]
    fn flow_stack_pop_uncovers_the_enclosing_target() {
        let mut stack = FlowStack::new();
        stack.push(FlowTarget { break_block: BlockId(1), continue_block: None, fallthrough_block: None });
        stack.push(FlowTarget { break_block: BlockId(2), continue_block: Some(BlockId(0)), fallthrough_block: None });
        assert_eq!(stack.top().unwrap().break_block, BlockId(2));
        stack.pop();
        assert_eq!(stack.top().unwrap().break_block, BlockId(1));
    }

    #[test]
    fn push_appends_an_instruction_to_the_named_block() {
        let mut graph = BlockGraph::new();
        graph.push(graph.entry(), Instruction::new(Opcode::Move, OperandSize::Dword));
        assert_eq!(graph.get(graph.entry()).instructions.len(), 1);
    }
}
