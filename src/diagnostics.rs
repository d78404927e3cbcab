//! Per-file semantic-diagnostics cache.

use crate::path::CanonicalPath;
use crate::program::{CancellationToken, Diagnostic, Program};
use crate::state::BuilderProgramState;

/// Returns `file`'s semantic diagnostics, consulting then populating the cache.
///
/// Asserts that `file` is not the most recently yielded but not yet committed
/// affected file: querying it early would cache a result that a subsequent
/// cancellation could leave stale relative to the file's real, re-analyzed shape.
pub(crate) fn semantic_diagnostics_for(
    state: &mut BuilderProgramState,
    program: &dyn Program,
    file: &CanonicalPath,
    cancellation: &dyn CancellationToken,
) -> Vec<Diagnostic> {
    assert!(
        state.pending_affected_file() != Some(file),
        "cannot query diagnostics of {file}: it is the currently yielded, uncommitted affected file"
    );

    if state.bundled_output() {
        return program.semantic_diagnostics(Some(file), cancellation);
    }

    if let Some(cached) = state.diagnostics_cache().and_then(|cache| cache.get(file)) {
        return cached.clone();
    }

    let diagnostics = program.semantic_diagnostics(Some(file), cancellation);
    if let Some(cache) = state.diagnostics_cache.as_mut() {
        cache.insert(file.clone(), diagnostics.clone());
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DefaultBuilderState;
    use crate::state::construct_state;
    use crate::test_support::{no_cancellation, InMemoryHost, InMemoryProgram};

    #[test]
    fn second_query_hits_cache() {
        let host = InMemoryHost::default();
        let bs = DefaultBuilderState;
        let program = InMemoryProgram::new(vec![("a.x", "fn a() {}")], false);
        let mut state = construct_state(&program, &host, &bs, None);
        let path = host.canonicalize_for_test("a.x");
        let cancellation = no_cancellation();

        let first = semantic_diagnostics_for(&mut state, &program, &path, &cancellation);
        let calls_after_first = program.semantic_diagnostics_call_count();
        let second = semantic_diagnostics_for(&mut state, &program, &path, &cancellation);
        assert_eq!(first, second);
        assert_eq!(program.semantic_diagnostics_call_count(), calls_after_first);
    }

    #[test]
    #[should_panic(expected = "currently yielded, uncommitted")]
    fn querying_the_pending_affected_file_panics() {
        let host = InMemoryHost::default();
        let bs = DefaultBuilderState;
        let program = InMemoryProgram::new(vec![("a.x", "fn a() {}")], false);
        let mut state = construct_state(&program, &host, &bs, None);
        let cancellation = no_cancellation();

        let affected = state.next_affected(&program, &bs, &cancellation).unwrap();
        let path = match &affected {
            crate::iterator::Affected::SourceFile(p) => p.clone(),
            crate::iterator::Affected::WholeProgram => unreachable!(),
        };
        let _ = semantic_diagnostics_for(&mut state, &program, &path, &cancellation);
    }
}
