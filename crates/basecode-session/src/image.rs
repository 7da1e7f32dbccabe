//! The byte-code image (spec §6.3): the assembled output of a
//! successful compile. The VM terp/assembler are explicit non-goals
//! (spec §1), so there is no actual byte encoding here — `Image` is the
//! logical section/block layout the assembler would encode, which is
//! as far as this port's "assemble" phase goes.

use basecode_emit::{BlockGraph, SectionTable};

pub struct Image {
    pub blocks: BlockGraph,
    pub sections: SectionTable,
}

impl Image {
    /// A `verbose`-flag listing (spec §6.1): one line per instruction,
    /// grouped by block, the way the original's `session::disassemble`
    /// dumps the assembled program.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for block in self.blocks.iter() {
            out.push_str(&format!("{}:\n", block.label.as_deref().unwrap_or("<block>")));
            for instr in &block.instructions {
                out.push_str(&format!("    {instr:?}\n"));
            }
        }
        out
    }

    /// Total reserved size across `ro_data`/`data`/`bss` (spec §6.3).
    /// `text` has no `SectionTable` entries of its own — its size is the
    /// sum of every emitted block's instruction count, which isn't a
    /// byte size without an assembler (a non-goal), so it's excluded.
    pub fn size_in_bytes(&self) -> u64 {
        basecode_emit::SectionTable::size_of(&self.sections.ro_data)
            + basecode_emit::SectionTable::size_of(&self.sections.data)
            + basecode_emit::SectionTable::size_of(&self.sections.bss)
    }
}
