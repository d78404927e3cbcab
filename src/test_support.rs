//! In-memory `Program`/`Host` test harness for building throwaway projects in
//! tests without touching the filesystem. Not part of the public API; shared
//! across this crate's `#[cfg(test)]` modules and the integration tests in
//! `tests/`.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::host::{CaseSensitivity, Host, WriteFile};
use crate::path::CanonicalPath;
use crate::program::{
    CancellationToken, CompilerOptions, CustomTransformers, Diagnostic, EmitResult, NoCancellation, Program,
    SourceFile,
};

#[derive(Default)]
pub(crate) struct InMemoryHost {
    case_sensitivity: CaseSensitivity,
}

impl InMemoryHost {
    pub(crate) fn canonicalize_for_test(&self, path: &str) -> CanonicalPath {
        self.canonicalize(Path::new(path))
    }
}

impl Host for InMemoryHost {
    fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }
}

pub(crate) struct InMemoryProgram {
    sources: BTreeMap<CanonicalPath, SourceFile>,
    bundled_output: bool,
    semantic_diagnostics_calls: Cell<usize>,
}

impl InMemoryProgram {
    pub(crate) fn new(files: Vec<(&str, &str)>, bundled_output: bool) -> Self {
        let host = InMemoryHost::default();
        let sources = files
            .into_iter()
            .map(|(path, content)| {
                let canonical = host.canonicalize(Path::new(path));
                (canonical.clone(), SourceFile { path: canonical, content: content.to_string() })
            })
            .collect();
        Self { sources, bundled_output, semantic_diagnostics_calls: Cell::new(0) }
    }

    pub(crate) fn semantic_diagnostics_call_count(&self) -> usize {
        self.semantic_diagnostics_calls.get()
    }
}

fn diagnostic_for(path: &CanonicalPath, content: &str) -> Diagnostic {
    Diagnostic { file: Some(path.clone()), code: content.len() as u32, message: format!("semantic:{path}") }
}

impl Program for InMemoryProgram {
    fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions { bundled_output: self.bundled_output }
    }

    fn current_directory(&self) -> &Path {
        Path::new(".")
    }

    fn source_files(&self) -> Vec<CanonicalPath> {
        self.sources.keys().cloned().collect()
    }

    fn source_file(&self, path: &CanonicalPath) -> Option<&SourceFile> {
        self.sources.get(path)
    }

    fn options_diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn global_diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn syntactic_diagnostics(&self, _file: Option<&CanonicalPath>) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn semantic_diagnostics(&self, file: Option<&CanonicalPath>, _cancellation: &dyn CancellationToken) -> Vec<Diagnostic> {
        self.semantic_diagnostics_calls.set(self.semantic_diagnostics_calls.get() + 1);
        match file {
            Some(path) => self
                .sources
                .get(path)
                .map(|source| vec![diagnostic_for(path, &source.content)])
                .unwrap_or_default(),
            None => self.sources.iter().map(|(path, source)| diagnostic_for(path, &source.content)).collect(),
        }
    }

    fn emit(
        &self,
        target_file: Option<&CanonicalPath>,
        write_file: Option<&dyn WriteFile>,
        cancellation: &dyn CancellationToken,
        _emit_only_declarations: bool,
        _custom_transformers: Option<&CustomTransformers>,
    ) -> EmitResult {
        let targets: Vec<CanonicalPath> = match target_file {
            Some(path) => vec![path.clone()],
            None => self.sources.keys().cloned().collect(),
        };
        let mut emitted_files = Vec::new();
        for path in &targets {
            let Some(source) = self.sources.get(path) else { continue };
            let out = PathBuf::from(format!("{}.out", path.as_str()));
            if let Some(writer) = write_file {
                let _ = writer.write_file(&out, &source.content);
            }
            emitted_files.push(out);
        }
        EmitResult {
            emit_skipped: false,
            diagnostics: self.semantic_diagnostics(target_file, cancellation),
            emitted_files,
            source_maps: Vec::new(),
        }
    }
}

pub(crate) fn no_cancellation() -> NoCancellation {
    NoCancellation
}
