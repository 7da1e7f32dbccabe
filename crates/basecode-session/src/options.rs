//! The session-options CLI surface (spec §6.1). Grounded on `tsz-cli`'s
//! `CliArgs` (`clap::Parser` derive) for the derive shape, and on
//! `original_source/basecode/compiler/compiler_types.h`'s
//! `session_options_t` for the field set and defaults.

use std::path::PathBuf;

use basecode_common::limits::{DEFAULT_FFI_HEAP_SIZE, DEFAULT_HEAP_SIZE, DEFAULT_STACK_SIZE};
use clap::Parser;

/// What phase of a module's compilation `compile_callback` is firing
/// for (spec §6.1 `compile_callback`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModulePhase {
    Start,
    Success,
    Failed,
}

#[derive(Clone, Debug)]
pub struct ModuleEvent {
    pub phase: ModulePhase,
    pub path: String,
}

/// `key=value` parser for the repeatable `--definitions` flag.
fn parse_definition(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected `key=value`, got `{raw}`"))?;
    Ok((key.to_string(), value.to_string()))
}

/// The session's CLI surface (spec §6.1). `compile_callback` has no
/// `clap` flag counterpart — Rust has no nullable function-pointer
/// idiom for it, so it is wired programmatically by a library caller
/// via [`SessionOptions::with_compile_callback`], mirroring how the
/// original passes it inside `session_options_t` when embedding the
/// compiler rather than driving it from argv.
#[derive(Parser)]
#[command(name = "basecode", version, about = "Basecode bootstrap compiler session driver")]
pub struct SessionOptions {
    /// Print the assembled listing after encoding.
    #[arg(short, long)]
    pub verbose: bool,

    /// VM heap size in bytes.
    #[arg(long = "heapSize", alias = "heap-size", default_value_t = DEFAULT_HEAP_SIZE)]
    pub heap_size: usize,

    /// VM stack size in bytes.
    #[arg(long = "stackSize", alias = "stack-size", default_value_t = DEFAULT_STACK_SIZE)]
    pub stack_size: usize,

    /// FFI scratch heap size in bytes.
    #[arg(long = "ffiHeapSize", alias = "ffi-heap-size", default_value_t = DEFAULT_FFI_HEAP_SIZE)]
    pub ffi_heap_size: usize,

    /// Emit a graphviz AST next to each source file.
    #[arg(long = "outputAstGraphs", alias = "output-ast-graphs")]
    pub output_ast_graphs: bool,

    /// If non-empty, write the full CodeDOM graphviz here at end of compile.
    #[arg(long = "domGraphFile", alias = "dom-graph-file")]
    pub dom_graph_file: Option<PathBuf>,

    /// Root for relative module lookup.
    #[arg(long = "compilerPath", alias = "compiler-path")]
    pub compiler_path: Option<PathBuf>,

    /// Ordered search list for `import` resolution.
    #[arg(long = "modulePaths", alias = "module-paths", value_delimiter = ',')]
    pub module_paths: Vec<PathBuf>,

    /// `key=value` constants injected as compile-time definitions.
    #[arg(long, value_parser = parse_definition)]
    pub definitions: Vec<(String, String)>,

    /// Source files to compile.
    #[arg(value_name = "FILE")]
    pub source_files: Vec<PathBuf>,

    #[arg(skip)]
    pub compile_callback: Option<Box<dyn FnMut(ModuleEvent)>>,
}

impl SessionOptions {
    pub fn with_compile_callback(mut self, callback: impl FnMut(ModuleEvent) + 'static) -> Self {
        self.compile_callback = Some(Box::new(callback));
        self
    }

    pub fn definition(&self, key: &str) -> Option<&str> {
        self.definitions.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("verbose", &self.verbose)
            .field("heap_size", &self.heap_size)
            .field("stack_size", &self.stack_size)
            .field("ffi_heap_size", &self.ffi_heap_size)
            .field("output_ast_graphs", &self.output_ast_graphs)
            .field("dom_graph_file", &self.dom_graph_file)
            .field("compiler_path", &self.compiler_path)
            .field("module_paths", &self.module_paths)
            .field("definitions", &self.definitions)
            .field("source_files", &self.source_files)
            .field("compile_callback", &self.compile_callback.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_parse_as_key_value_pairs() {
        let options = SessionOptions::try_parse_from(["basecode", "--definitions", "DEBUG=1", "main.bc"]).unwrap();
        assert_eq!(options.definition("DEBUG"), Some("1"));
        assert_eq!(options.source_files, vec![PathBuf::from("main.bc")]);
    }

    #[test]
    fn defaults_match_the_spec_table() {
        let options = SessionOptions::try_parse_from(["basecode"]).unwrap();
        assert_eq!(options.heap_size, DEFAULT_HEAP_SIZE);
        assert_eq!(options.stack_size, DEFAULT_STACK_SIZE);
        assert_eq!(options.ffi_heap_size, DEFAULT_FFI_HEAP_SIZE);
        assert!(!options.verbose);
    }
}
