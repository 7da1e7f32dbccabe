//! The session driver (spec §4.9, §6.1): the 11-phase compile sequence,
//! from core-type registration through directive execution. Grounded on
//! `original_source/basecode/compiler/session.cpp`'s `compile()` and
//! `initialize_core_types()`.

use basecode_arena::{ElementBuilder, ElementData, ElementKind, ElementMap, Literal, QualifiedSymbol, Symbol};
use basecode_ast::{AstArena, NodeId};
use basecode_common::{Code, ElementId, ModuleId, ResultMessage, SourceLocation, Span};
use basecode_emit::Emitter;
use basecode_eval::Evaluator;
use basecode_resolve::Resolver;
use basecode_types::{NumericKind, TypeTable};

use crate::image::Image;
use crate::options::{ModuleEvent, ModulePhase, SessionOptions};
use crate::task::{TaskCategory, TaskTree};

/// One compilation unit handed to [`Session::compile`]. The lexer/parser
/// is out of scope for this port, so callers bring their own
/// already-parsed `AstArena` rather than a raw path or source string.
pub struct ModuleSource {
    pub path: String,
    pub ast: AstArena,
    pub root: NodeId,
}

/// Owns the element arena and type table for one compile run, plus the
/// running diagnostic aggregate and task tree. A `Session` is single-use:
/// build one, call `compile` once, read `diagnostics`/`tasks` off it.
pub struct Session {
    pub options: SessionOptions,
    arena: ElementMap,
    types: TypeTable,
    diagnostics: ResultMessage,
    pub tasks: TaskTree,
    core_scope: ElementId,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let mut arena = ElementMap::new();
        let core_scope = ElementBuilder::new(&mut arena).make_block(None, true, SourceLocation::new(ModuleId::NONE, Span::synthetic()));
        Self { options, arena, types: TypeTable::new(), diagnostics: ResultMessage::new(), tasks: TaskTree::new(), core_scope }
    }

    pub fn diagnostics(&self) -> &[basecode_common::Diagnostic] {
        self.diagnostics.diagnostics()
    }

    pub fn is_failed(&self) -> bool {
        self.diagnostics.is_failed()
    }

    /// `initialize_core_types` (spec §4.9 phase 1): the numeric ladder,
    /// one pointer type per numeric, `bool`, `rune`, `module`,
    /// `namespace`, and an unconstrained `generic`, all owned by a
    /// synthetic core scope that outlives any one source module.
    fn register_core_types(&mut self) {
        for kind in NumericKind::ALL {
            let base = self.types.find_numeric_type(kind);
            self.types.find_pointer_type(base);
        }
        self.types.find_bool_type();
        self.types.find_rune_type();
        self.types.make_module_type(Symbol::new(QualifiedSymbol::simple("module"), false), self.core_scope);
        self.types.make_namespace_type(Symbol::new(QualifiedSymbol::simple("namespace"), false), self.core_scope);
        self.types.make_generic_type(Symbol::new(QualifiedSymbol::simple("any"), false), Vec::new());
    }

    /// Runs the full 11-phase sequence over `modules` in order, returning
    /// the assembled [`Image`] on success. On the first phase that fails,
    /// compilation stops and `Err(())` is returned; accumulated
    /// diagnostics are always available via [`Session::diagnostics`]
    /// regardless of outcome.
    pub fn compile(&mut self, modules: Vec<ModuleSource>) -> Result<Image, ()> {
        {
            let start = std::time::Instant::now();
            self.register_core_types();
            self.tasks.record("core types", TaskCategory::Compiler, start.elapsed());
        }

        let mut module_ids = Vec::new();
        let generate_model_ok = {
            let _t = self.tasks.start("generate model", TaskCategory::Compiler);
            let mut evaluator = Evaluator::new(&mut self.arena, &mut self.types);
            let mut ok = true;
            for (index, module) in modules.iter().enumerate() {
                if let Some(cb) = self.options.compile_callback.as_mut() {
                    cb(ModuleEvent { phase: ModulePhase::Start, path: module.path.clone() });
                }
                let module_id = ModuleId(index as u32);
                match evaluator.evaluate_module(&module.ast, module.root, &module.path, module_id) {
                    Some(id) => {
                        module_ids.push(id);
                        if let Some(cb) = self.options.compile_callback.as_mut() {
                            cb(ModuleEvent { phase: ModulePhase::Success, path: module.path.clone() });
                        }
                    }
                    None => {
                        let loc = SourceLocation::new(module_id, Span::synthetic());
                        evaluator.error(Code::ModuleNotFound, format!("module `{}` failed to compile", module.path), loc);
                        if let Some(cb) = self.options.compile_callback.as_mut() {
                            cb(ModuleEvent { phase: ModulePhase::Failed, path: module.path.clone() });
                        }
                        ok = false;
                    }
                }
            }
            self.diagnostics.extend(std::mem::take(&mut evaluator.diagnostics));
            ok && !self.diagnostics.is_failed()
        };
        if !generate_model_ok {
            return Err(());
        }

        // Spec phases 3-8 (identifier resolution, two folding passes,
        // type-check, final pass) collapse into one `Resolver::run` call
        // — its sub-phase methods are private, so this is the finest
        // granularity the session can time.
        let strings;
        {
            let _t = self.tasks.start("resolve", TaskCategory::Compiler);
            let mut resolver = Resolver::new(&mut self.arena, &mut self.types);
            resolver.run();
            strings = resolver.strings;
            self.diagnostics.extend(resolver.diagnostics);
        }
        if self.diagnostics.is_failed() {
            return Err(());
        }

        let image = {
            let mut emitter = Emitter::new(&self.arena, &mut self.types, &strings);
            let emit_ok = {
                let _t = self.tasks.start("emit byte-code", TaskCategory::ByteCodeEmitter);
                for &module in &module_ids {
                    emitter.emit_module(module);
                }
                emitter.emit_tables();
                !emitter.diagnostics.is_failed()
            };
            self.diagnostics.extend(std::mem::take(&mut emitter.diagnostics));
            if !emit_ok {
                None
            } else {
                let _t = self.tasks.start("assemble", TaskCategory::Assembler);
                let image = Image { blocks: emitter.blocks, sections: emitter.sections };
                if self.options.verbose {
                    println!("{}", image.listing());
                }
                Some(image)
            }
        };
        let Some(image) = image else {
            return Err(());
        };

        {
            let start = std::time::Instant::now();
            self.execute_directives();
            self.tasks.record("execute directives", TaskCategory::Compiler, start.elapsed());
        }
        if self.diagnostics.is_failed() {
            return Err(());
        }

        Ok(image)
    }

    /// Phase 11 (spec §4.9): `assert` directives are checkable at compile
    /// time against constant-folded boolean literals; `type` is
    /// informational; `run` would hand off to the VM, which is out of
    /// scope for this port, so it logs and does nothing.
    fn execute_directives(&mut self) {
        let directive_ids: Vec<ElementId> = self.arena.find_by_kind(ElementKind::Directive).to_vec();
        for id in directive_ids {
            let Some(element) = self.arena.find(id) else { continue };
            let ElementData::Directive { name, args } = &element.data else { continue };
            let name = name.clone();
            let args = args.clone();
            let loc = element.location;
            match name.as_str() {
                "assert" => match args.first() {
                    None => {
                        self.diagnostics.error(Code::DirectiveFailed, "assert requires a condition argument", Some(loc));
                    }
                    Some(arg) => match self.arena.find(arg.value).map(|e| &e.data) {
                        Some(ElementData::Literal(Literal::Bool(true))) => {}
                        Some(ElementData::Literal(Literal::Bool(false))) => {
                            self.diagnostics.error(Code::DirectiveFailed, "assertion failed", Some(loc));
                        }
                        _ => {
                            self.diagnostics.error(Code::DirectiveFailed, "assert condition must fold to a compile-time boolean", Some(loc));
                        }
                    },
                },
                "type" => {
                    tracing::info!(?loc, "type directive (informational, no VM to evaluate against)");
                }
                "run" => {
                    tracing::warn!("`run` directive requested post-assembly execution; no virtual machine is wired into this session, skipping");
                }
                other => {
                    self.diagnostics.error(Code::DirectiveFailed, format!("unknown directive `{other}`"), Some(loc));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basecode_ast::{AstKind, NodeList};
    use clap::Parser;

    fn empty_module(name: &str) -> ModuleSource {
        let mut ast = AstArena::new();
        let root = ast.add(AstKind::Module { name: name.to_string(), statements: NodeList::new() }, Span::new(0, 0));
        ModuleSource { path: format!("{name}.bc"), ast, root }
    }

    #[test]
    fn an_empty_module_compiles_to_an_empty_image() {
        let options = SessionOptions::try_parse_from(["basecode"]).unwrap();
        let mut session = Session::new(options);
        let image = session.compile(vec![empty_module("main")]).unwrap();
        assert!(image.blocks.iter().next().is_none() || image.size_in_bytes() == 0);
        assert!(!session.is_failed());
    }

    #[test]
    fn core_types_and_generate_model_phases_are_recorded() {
        let options = SessionOptions::try_parse_from(["basecode"]).unwrap();
        let mut session = Session::new(options);
        session.compile(vec![empty_module("main")]).unwrap();
        let names: Vec<&str> = session.tasks.tasks().iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"core types"));
        assert!(names.contains(&"generate model"));
        assert!(names.contains(&"resolve"));
        assert!(names.contains(&"emit byte-code"));
        assert!(names.contains(&"assemble"));
        assert!(names.contains(&"execute directives"));
    }
}
