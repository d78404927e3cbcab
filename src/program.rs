//! The compiler `Program` contract — an external collaborator. This crate never
//! parses or type-checks; it only calls through this trait.

use std::path::{Path, PathBuf};

use crate::host::WriteFile;
use crate::path::CanonicalPath;

/// Polled by the program during a suspension point (diagnostics, emit). The iterator
/// itself never performs I/O and never checks cancellation.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

/// A token that never trips, for callers that don't need cooperative cancellation.
pub struct NoCancellation;

impl CancellationToken for NoCancellation {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// The subset of compiler configuration this core cares about: whether emit is
/// bundled into a single output, which collapses the affected unit to the whole
/// program and disables the per-file diagnostics cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub bundled_output: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: CanonicalPath,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<CanonicalPath>,
    pub code: u32,
    pub message: String,
}

/// Opaque transformer bag passed through to `emit`. This core never inspects its
/// contents; it is carried only so the façade's `emit` signature matches the
/// underlying program's.
#[derive(Clone, Copy, Debug, Default)]
pub struct CustomTransformers;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmitResult {
    pub emit_skipped: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub emitted_files: Vec<PathBuf>,
    pub source_maps: Vec<PathBuf>,
}

pub trait Program {
    fn compiler_options(&self) -> CompilerOptions;

    fn current_directory(&self) -> &Path;

    /// All source files in the program, in a stable order.
    fn source_files(&self) -> Vec<CanonicalPath>;

    fn source_file(&self, path: &CanonicalPath) -> Option<&SourceFile>;

    fn options_diagnostics(&self) -> Vec<Diagnostic>;

    fn global_diagnostics(&self) -> Vec<Diagnostic>;

    fn syntactic_diagnostics(&self, file: Option<&CanonicalPath>) -> Vec<Diagnostic>;

    fn semantic_diagnostics(
        &self,
        file: Option<&CanonicalPath>,
        cancellation: &dyn CancellationToken,
    ) -> Vec<Diagnostic>;

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        target_file: Option<&CanonicalPath>,
        write_file: Option<&dyn WriteFile>,
        cancellation: &dyn CancellationToken,
        emit_only_declarations: bool,
        custom_transformers: Option<&CustomTransformers>,
    ) -> EmitResult;
}
