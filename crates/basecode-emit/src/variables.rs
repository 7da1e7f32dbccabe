//! The variable map (spec §4.7): classifies every variable reachable
//! from a block, tracks a per-use state machine, and hands out
//! temporary-register names.

use basecode_arena::{ElementMap, FieldOffset};
use basecode_common::ElementId;
use basecode_types::NumberClass;
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableKind {
    Local,
    Parameter,
    ReturnParameter,
    Module,
    Temporary,
}

/// Where a kind's offset counts from (spec §4.7 table).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Offset {
    /// Negative displacement from the frame pointer.
    FrameLocal(i64),
    /// Positive displacement from the frame pointer.
    FrameIncoming(i64),
    /// A symbolic module-section label; the assembler resolves the
    /// concrete address.
    Label(String),
    /// No storage location — lives only in a synthetic register.
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UseFlags {
    pub must_init: bool,
    pub used: bool,
    pub initialized: bool,
    pub filled: bool,
    pub spilled: bool,
    pub in_block: bool,
    pub pointer: bool,
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub declaration: ElementId,
    pub kind: VariableKind,
    pub label: String,
    pub offset: Offset,
    pub number_class: NumberClass,
    pub field_offset: Option<FieldOffset>,
    /// The composite-valued variable this one is a field path into, when
    /// `field_offset` is `Some` (spec §4.7 "`base_ref`, `from_start`").
    pub base_ref: Option<ElementId>,
    pub flags: UseFlags,
    /// The register currently holding a filled copy of this variable's
    /// value, if any. Cleared whenever `flags.filled` goes back to
    /// `false` (a fresh read or a fill is then required).
    pub cached_register: Option<String>,
    /// Set for struct/union/enum-typed variables, distinct from
    /// `flags.pointer` (which also covers plain pointer-typed scalars):
    /// only a composite assignment needs `CopyBytes` instead of a single
    /// `Store` of the written value.
    pub is_composite: bool,
}

/// Which image section a module-scope variable groups into (spec §4.7
/// "Module-scope grouping").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleSection {
    Bss,
    Data,
    RoData,
}

pub fn module_section_of(is_constant: bool, has_initializer: bool) -> ModuleSection {
    if is_constant {
        ModuleSection::RoData
    } else if has_initializer {
        ModuleSection::Data
    } else {
        ModuleSection::Bss
    }
}

/// Classifies and lays out every variable reachable from a block, and
/// runs the read/write state machine while the emitter walks elements.
pub struct VariableMap {
    by_declaration: FxHashMap<ElementId, Variable>,
    order: Vec<ElementId>,
    next_local_offset: i64,
    next_incoming_offset: i64,
}

impl Default for VariableMap {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableMap {
    pub fn new() -> Self {
        Self { by_declaration: FxHashMap::default(), order: Vec::new(), next_local_offset: 0, next_incoming_offset: 0 }
    }

    /// Classifies `declaration` (an `identifier` element) as the given
    /// kind and computes its offset from previously classified variables
    /// of the same frame side (spec §4.7's "sum of preceding sizes").
    pub fn classify(&mut self, declaration: ElementId, kind: VariableKind, size_in_bytes: u32, number_class: NumberClass, is_pointer: bool, is_composite: bool, label: String) -> &Variable {
        let offset = match kind {
            VariableKind::Local => {
                self.next_local_offset -= size_in_bytes as i64;
                Offset::FrameLocal(self.next_local_offset)
            }
            VariableKind::Parameter | VariableKind::ReturnParameter => {
                let at = self.next_incoming_offset;
                self.next_incoming_offset += size_in_bytes as i64;
                Offset::FrameIncoming(at)
            }
            VariableKind::Module => Offset::Label(label.clone()),
            VariableKind::Temporary => Offset::None,
        };
        let variable = Variable {
            declaration,
            kind,
            label,
            offset,
            number_class,
            field_offset: None,
            base_ref: None,
            flags: UseFlags { pointer: is_pointer, ..Default::default() },
            cached_register: None,
            is_composite,
        };
        self.order.push(declaration);
        self.by_declaration.insert(declaration, variable);
        self.by_declaration.get(&declaration).unwrap()
    }

    /// Registers `declaration` as a field path into `base`, with the
    /// given byte offset into the composite (spec §4.7 "field-offset
    /// record when the variable is a field of a composite").
    pub fn classify_field(&mut self, base: ElementId, declaration: ElementId, field_offset: FieldOffset, number_class: NumberClass, label: String) {
        let base_var = self.by_declaration.get(&base);
        let kind = base_var.map(|v| v.kind).unwrap_or(VariableKind::Local);
        let offset = base_var.map(|v| v.offset.clone()).unwrap_or(Offset::None);
        self.order.push(declaration);
        self.by_declaration.insert(
            declaration,
            Variable { declaration, kind, label, offset, number_class, field_offset: Some(field_offset), base_ref: Some(base), flags: UseFlags::default(), cached_register: None, is_composite: false },
        );
    }

    pub fn get(&self, declaration: ElementId) -> Option<&Variable> {
        self.by_declaration.get(&declaration)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.order.iter().filter_map(|id| self.by_declaration.get(id))
    }

    pub fn cached_register(&self, declaration: ElementId) -> Option<&str> {
        self.by_declaration.get(&declaration)?.cached_register.as_deref()
    }

    pub fn cache_register(&mut self, declaration: ElementId, register: String) {
        if let Some(variable) = self.by_declaration.get_mut(&declaration) {
            variable.cached_register = Some(register);
        }
    }

    /// Runs the per-use state machine (spec §4.7) for one reference to
    /// `declaration`. Returns `true` when the emitter must emit a
    /// `fill` (reload) before using the variable's value.
    pub fn record_use(&mut self, declaration: ElementId, is_assign_target: bool) -> bool {
        let Some(variable) = self.by_declaration.get_mut(&declaration) else { return false };
        if is_assign_target {
            variable.flags.must_init = false;
            variable.flags.initialized = true;
            variable.flags.filled = true;
            return false;
        }
        if !variable.flags.used {
            variable.flags.used = true;
            variable.flags.must_init = false;
            variable.flags.filled = true;
            false
        } else {
            !variable.flags.filled
        }
    }

    /// On a scalar write: record the spill and clear nothing else (the
    /// variable that was just written is, by definition, filled).
    pub fn record_spill(&mut self, declaration: ElementId) {
        if let Some(variable) = self.by_declaration.get_mut(&declaration) {
            variable.flags.spilled = true;
            variable.flags.filled = true;
            variable.flags.initialized = true;
        }
    }

    /// On a composite write: every variable that aliases the
    /// destination base must be re-read from memory (spec §4.7 "clear
    /// `filled` on every variable that aliases the destination base").
    pub fn invalidate_aliases_of(&mut self, base: ElementId) {
        for variable in self.by_declaration.values_mut() {
            if variable.declaration == base || variable.base_ref == Some(base) {
                variable.flags.filled = false;
                variable.cached_register = None;
            }
        }
    }
}

/// The temporary-register pool (spec §4.7 "`retain_temp`/`release_temp`").
#[derive(Default)]
pub struct TempPool {
    free: Vec<String>,
    next_id: u32,
}

impl TempPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retain_temp(&mut self, _number_class: NumberClass) -> String {
        if let Some(name) = self.free.pop() {
            return name;
        }
        let name = format!("t{}", self.next_id);
        self.next_id += 1;
        name
    }

    pub fn release_temp(&mut self, name: String) {
        self.free.push(name);
    }
}

/// A save/restore group around a call site (spec §4.7 "`group_variables`").
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VariableGroup {
    pub integer_class: Vec<ElementId>,
    pub float_class: Vec<ElementId>,
}

/// Partitions every currently-live, filled variable into integer-class
/// and float-class save groups, splitting at each excluded (still-live
/// through the call) variable so it is never pushed/popped.
pub fn group_variables(variables: &VariableMap, excluded: &[ElementId]) -> Vec<VariableGroup> {
    let mut groups = vec![VariableGroup::default()];
    for variable in variables.iter() {
        if !variable.flags.filled || variable.kind == VariableKind::Temporary {
            continue;
        }
        if excluded.contains(&variable.declaration) {
            groups.push(VariableGroup::default());
            continue;
        }
        let current = groups.last_mut().unwrap();
        if variable.number_class == NumberClass::Float {
            current.float_class.push(variable.declaration);
        } else {
            current.integer_class.push(variable.declaration);
        }
    }
    groups.retain(|g| !g.integer_class.is_empty() || !g.float_class.is_empty());
    groups
}
