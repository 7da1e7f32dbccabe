//! Centralized limits and thresholds.
//!
//! Centralizing these avoids duplicate hard-coded constants scattered
//! across the resolver, evaluator, and emitter, and documents why each
//! exists.

/// Fix-point resolver: number of type-resolution phases (spec §4.4,
/// "the resolver loops at most three times for types"). Phase 3 is final
/// — anything still unresolved there is fatal.
pub const TYPE_RESOLUTION_PHASES: u32 = 3;

/// Maximum constant-folding passes before giving up and treating
/// remaining foldable elements as already-fixed. Folding drives toward a
/// fix-point (spec §4.4.3); this bounds pathological self-referential
/// folds (e.g. a corrupted substitution that keeps producing a new
/// foldable node).
pub const MAX_FOLD_PASSES: u32 = 64;

/// Default FFI scratch heap size in bytes (spec §6.1 `ffi_heap_size`).
pub const DEFAULT_FFI_HEAP_SIZE: usize = 4096;

/// Default VM heap size in bytes, used when `SessionOptions::heap_size`
/// is left at its default.
pub const DEFAULT_HEAP_SIZE: usize = 1024 * 1024;

/// Default VM stack size in bytes.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Alignment (in bytes) the byte-code image uses for each section, per
/// spec §6.3: "strings are dword-aligned, type-info entries
/// qword-aligned, composite data respects the composite's own alignment."
pub const STRING_TABLE_ALIGN: u64 = 4;
pub const TYPE_INFO_ALIGN: u64 = 8;

/// Byte size of one type-info table record: two name-length dwords plus
/// one qword pointer to the name's interned data (spec §6.3), mirroring
/// `byte_code_emitter::emit_type_info`'s `dwords({len, len}); qwords({name_ref})`.
pub const TYPE_INFO_RECORD_SIZE: u64 = 16;
