//! The builder façade: two variants, diagnostics-only and emit+diagnostics, sharing
//! a common base contract via composition over [`BuilderCore`] rather than subtype
//! polymorphism, so each variant's distinct operations stay on its own type.

use crate::diagnostics::semantic_diagnostics_for;
use crate::graph::BuilderState;
use crate::host::{Host, WriteFile};
use crate::iterator::Affected;
use crate::path::CanonicalPath;
use crate::program::{CancellationToken, CompilerOptions, CustomTransformers, Diagnostic, EmitResult, Program, SourceFile};
use crate::state::{construct_state, BuilderProgramState};

/// The state shared by both façade variants: the program, the builder-state
/// sub-layer, the host, and the mutable `BuilderProgramState`.
pub struct BuilderCore {
    program: Box<dyn Program>,
    builder_state: Box<dyn BuilderState>,
    host: Box<dyn Host>,
    state: BuilderProgramState,
}

impl BuilderCore {
    pub fn new(program: Box<dyn Program>, builder_state: Box<dyn BuilderState>, host: Box<dyn Host>) -> Self {
        Self::with_old_state(program, builder_state, host, None)
    }

    /// Rebuilds from a fresh program, carrying forward cached diagnostics and
    /// signatures from `old` wherever the diff engine finds them still valid.
    pub fn with_old_state(
        program: Box<dyn Program>,
        builder_state: Box<dyn BuilderState>,
        host: Box<dyn Host>,
        old: Option<BuilderProgramState>,
    ) -> Self {
        let state = construct_state(program.as_ref(), host.as_ref(), builder_state.as_ref(), old);
        Self { program, builder_state, host, state }
    }

    /// Consumes the façade, handing back the underlying state so a subsequent
    /// rebuild can reuse it via [`Self::with_old_state`].
    pub fn into_state(self) -> BuilderProgramState {
        self.state
    }

    pub fn state(&self) -> &BuilderProgramState {
        &self.state
    }

    fn resolve_writer<'a>(&'a self, override_writer: Option<&'a dyn WriteFile>) -> Option<&'a dyn WriteFile> {
        override_writer.or_else(|| self.host.writer())
    }

    pub(crate) fn semantic_diagnostics_for_file(
        &mut self,
        file: &CanonicalPath,
        cancellation: &dyn CancellationToken,
    ) -> Vec<Diagnostic> {
        semantic_diagnostics_for(&mut self.state, self.program.as_ref(), file, cancellation)
    }

    pub(crate) fn next_affected(&mut self, cancellation: &dyn CancellationToken) -> Option<Affected> {
        self.state.next_affected(self.program.as_ref(), self.builder_state.as_ref(), cancellation)
    }

    pub(crate) fn done_with(&mut self, affected: Affected) {
        self.state.done_with(affected);
    }
}

/// Operations common to both builder variants.
pub trait BaseBuilderProgram {
    fn core(&self) -> &BuilderCore;
    fn core_mut(&mut self) -> &mut BuilderCore;

    fn compiler_options(&self) -> CompilerOptions {
        self.core().program.compiler_options()
    }

    fn source_file(&self, file: &CanonicalPath) -> Option<&SourceFile> {
        self.core().program.source_file(file)
    }

    fn source_files(&self) -> Vec<CanonicalPath> {
        self.core().program.source_files()
    }

    fn options_diagnostics(&self) -> Vec<Diagnostic> {
        self.core().program.options_diagnostics()
    }

    fn global_diagnostics(&self) -> Vec<Diagnostic> {
        self.core().program.global_diagnostics()
    }

    fn syntactic_diagnostics(&self, file: Option<&CanonicalPath>) -> Vec<Diagnostic> {
        self.core().program.syntactic_diagnostics(file)
    }

    /// Variants differ only in how they handle `file == None`, so that path is left
    /// to each impl; `Some(file)` always goes through the shared cache.
    fn semantic_diagnostics(&mut self, file: Option<&CanonicalPath>, cancellation: &dyn CancellationToken) -> Vec<Diagnostic>;

    fn all_dependencies(&self, file: &CanonicalPath) -> Vec<CanonicalPath> {
        let core = self.core();
        core.builder_state.get_all_dependencies(&core.state.graph, core.program.as_ref(), file)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &mut self,
        target_file: Option<&CanonicalPath>,
        write_file_override: Option<&dyn WriteFile>,
        cancellation: &dyn CancellationToken,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> EmitResult;
}

/// Diagnostics-only variant: `emit` is a plain pass-through, never driven by the
/// iterator. Adds [`Self::semantic_diagnostics_of_next_affected`].
pub struct DiagnosticsBuilderProgram {
    core: BuilderCore,
}

impl DiagnosticsBuilderProgram {
    pub fn new(core: BuilderCore) -> Self {
        Self { core }
    }

    pub fn into_core(self) -> BuilderCore {
        self.core
    }

    /// Yields the next affected file's diagnostics tagged with which file (or the
    /// whole-program sentinel) produced them. Files for which `ignore_predicate`
    /// returns `true` are committed without analysis and the iterator continues.
    /// Returns `None` once the iterator is exhausted.
    pub fn semantic_diagnostics_of_next_affected(
        &mut self,
        cancellation: &dyn CancellationToken,
        ignore_predicate: Option<&dyn Fn(&CanonicalPath) -> bool>,
    ) -> Option<(Affected, Vec<Diagnostic>)> {
        loop {
            let affected = self.core.next_affected(cancellation)?;
            if let Affected::SourceFile(path) = &affected {
                if ignore_predicate.is_some_and(|predicate| predicate(path)) {
                    self.core.done_with(affected);
                    continue;
                }
            }
            let diagnostics = match &affected {
                Affected::SourceFile(path) => self.core.semantic_diagnostics_for_file(path, cancellation),
                Affected::WholeProgram => self.core.program.semantic_diagnostics(None, cancellation),
            };
            self.core.done_with(affected.clone());
            return Some((affected, diagnostics));
        }
    }
}

impl BaseBuilderProgram for DiagnosticsBuilderProgram {
    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn semantic_diagnostics(&mut self, file: Option<&CanonicalPath>, cancellation: &dyn CancellationToken) -> Vec<Diagnostic> {
        match file {
            Some(file) => self.core.semantic_diagnostics_for_file(file, cancellation),
            None => {
                // Exhaust the iterator first so the cache reflects the new program,
                // then concatenate every file's cached diagnostics.
                while let Some(affected) = self.core.next_affected(cancellation) {
                    if let Affected::SourceFile(path) = &affected {
                        self.core.semantic_diagnostics_for_file(path, cancellation);
                    }
                    self.core.done_with(affected);
                }
                concat_all_diagnostics(&mut self.core, cancellation)
            }
        }
    }

    fn emit(
        &mut self,
        target_file: Option<&CanonicalPath>,
        write_file_override: Option<&dyn WriteFile>,
        cancellation: &dyn CancellationToken,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> EmitResult {
        let writer = self.core.resolve_writer(write_file_override);
        self.core.program.emit(target_file, writer, cancellation, emit_only_declarations, custom_transformers)
    }
}

/// Emit+diagnostics variant: `emit` with no target drives the iterator via
/// [`Self::emit_next_affected`]; adds [`Self::get_current_directory`].
pub struct EmitAndDiagnosticsBuilderProgram {
    core: BuilderCore,
}

impl EmitAndDiagnosticsBuilderProgram {
    pub fn new(core: BuilderCore) -> Self {
        Self { core }
    }

    pub fn into_core(self) -> BuilderCore {
        self.core
    }

    pub fn get_current_directory(&self) -> &std::path::Path {
        self.core.program.current_directory()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn emit_next_affected(
        &mut self,
        write_file_override: Option<&dyn WriteFile>,
        cancellation: &dyn CancellationToken,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> Option<(Affected, EmitResult)> {
        let affected = self.core.next_affected(cancellation)?;
        let target = match &affected {
            Affected::SourceFile(path) => Some(path.clone()),
            Affected::WholeProgram => None,
        };
        let writer = self.core.resolve_writer(write_file_override);
        let result = self.core.program.emit(target.as_ref(), writer, cancellation, emit_only_declarations, custom_transformers);
        self.core.done_with(affected.clone());
        Some((affected, result))
    }
}

impl BaseBuilderProgram for EmitAndDiagnosticsBuilderProgram {
    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn semantic_diagnostics(&mut self, file: Option<&CanonicalPath>, cancellation: &dyn CancellationToken) -> Vec<Diagnostic> {
        match file {
            Some(file) => self.core.semantic_diagnostics_for_file(file, cancellation),
            // No forced drain here; just read every file's diagnostics.
            None => concat_all_diagnostics(&mut self.core, cancellation),
        }
    }

    fn emit(
        &mut self,
        target_file: Option<&CanonicalPath>,
        write_file_override: Option<&dyn WriteFile>,
        cancellation: &dyn CancellationToken,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> EmitResult {
        if let Some(target) = target_file {
            assert!(
                self.core.state.pending_affected_file() != Some(target),
                "cannot emit {target} directly: it is the currently yielded, uncommitted affected file"
            );
            let writer = self.core.resolve_writer(write_file_override);
            return self.core.program.emit(Some(target), writer, cancellation, emit_only_declarations, custom_transformers);
        }

        let mut merged = EmitResult::default();
        while let Some((_, result)) =
            self.emit_next_affected(write_file_override, cancellation, emit_only_declarations, custom_transformers)
        {
            merged.emit_skipped |= result.emit_skipped;
            merged.diagnostics.extend(result.diagnostics);
            merged.emitted_files.extend(result.emitted_files);
            merged.source_maps.extend(result.source_maps);
        }
        merged
    }
}

/// Shared by both variants' `file == None` diagnostics path when not bundled: walk
/// every program file and read its (cache-or-program) diagnostics. In bundled-output
/// mode the program's diagnostics are returned directly; the cache is bypassed.
fn concat_all_diagnostics(core: &mut BuilderCore, cancellation: &dyn CancellationToken) -> Vec<Diagnostic> {
    if core.state.bundled_output() {
        return core.program.semantic_diagnostics(None, cancellation);
    }
    let files = core.program.source_files();
    let mut out = Vec::new();
    for file in files {
        out.extend(core.semantic_diagnostics_for_file(&file, cancellation));
    }
    out
}
