//! Shared in-memory `Program`/`Host` harness for the integration tests: builds
//! throwaway projects without touching the filesystem.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ibuild_core::host::{CaseSensitivity, Host, WriteFile};
use ibuild_core::path::CanonicalPath;
use ibuild_core::program::{
    CancellationToken, CompilerOptions, CustomTransformers, Diagnostic, EmitResult, NoCancellation, Program, SourceFile,
};

#[derive(Default)]
pub struct TestHost {
    case_sensitivity: CaseSensitivity,
}

impl TestHost {
    pub fn path(&self, path: &str) -> CanonicalPath {
        self.canonicalize(Path::new(path))
    }
}

impl Host for TestHost {
    fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }
}

pub struct TestProgram {
    sources: BTreeMap<CanonicalPath, SourceFile>,
    bundled_output: bool,
    semantic_diagnostics_calls: Cell<usize>,
}

impl TestProgram {
    pub fn new(files: &[(&str, &str)], bundled_output: bool) -> Self {
        let host = TestHost::default();
        let sources = files
            .iter()
            .map(|(path, content)| {
                let canonical = host.canonicalize(Path::new(path));
                (canonical.clone(), SourceFile { path: canonical, content: content.to_string() })
            })
            .collect();
        Self { sources, bundled_output, semantic_diagnostics_calls: Cell::new(0) }
    }

    pub fn semantic_diagnostics_call_count(&self) -> usize {
        self.semantic_diagnostics_calls.get()
    }
}

fn diagnostic_for(path: &CanonicalPath, content: &str) -> Diagnostic {
    Diagnostic { file: Some(path.clone()), code: content.len() as u32, message: format!("semantic:{path}") }
}

impl Program for TestProgram {
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
            Some(path) => {
                self.sources.get(path).map(|source| vec![diagnostic_for(path, &source.content)]).unwrap_or_default()
            }
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
        let targets: Vec<CanonicalPath> =
            match target_file { Some(path) => vec![path.clone()], None => self.sources.keys().cloned().collect() };
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

pub fn no_cancellation() -> NoCancellation {
    NoCancellation
}
