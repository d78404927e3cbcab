//! `BuilderProgramState` and the state constructor / diff engine.

use std::collections::BTreeSet;

use tracing::{instrument, trace};

use crate::graph::{reference_sets_equal, BuilderState, ReferenceGraph, Signature};
use crate::host::Host;
use crate::path::CanonicalPath;
use crate::program::{Diagnostic, Program};

/// The "batch in progress" sub-object: the root that triggered it, the files it
/// expanded to, how far iteration has gotten, and the signatures recomputed so far.
///
/// Bundling these into one `Option<Batch>` rather than five separate optional fields
/// makes the illegal state — affected files present while there's no changed root —
/// unrepresentable, so that invariant holds by construction and needs no runtime
/// check.
#[derive(Debug)]
pub(crate) struct Batch {
    pub(crate) changed_root: CanonicalPath,
    pub(crate) affected_files: Vec<CanonicalPath>,
    pub(crate) index: usize,
    pub(crate) seen: BTreeSet<CanonicalPath>,
    pub(crate) pending_signatures: std::collections::BTreeMap<CanonicalPath, Signature>,
}

pub struct BuilderProgramState {
    pub(crate) graph: ReferenceGraph,
    pub(crate) changed_files: BTreeSet<CanonicalPath>,
    pub(crate) batch: Option<Batch>,
    /// `None` iff the compiler is in bundled-output mode, where there is no
    /// per-file diagnostics to cache.
    pub(crate) diagnostics_cache: Option<std::collections::BTreeMap<CanonicalPath, Vec<Diagnostic>>>,
    pub(crate) bundled_output: bool,
}

impl BuilderProgramState {
    pub fn bundled_output(&self) -> bool {
        self.bundled_output
    }

    pub fn changed_files(&self) -> &BTreeSet<CanonicalPath> {
        &self.changed_files
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    pub(crate) fn diagnostics_cache(&self) -> Option<&std::collections::BTreeMap<CanonicalPath, Vec<Diagnostic>>> {
        self.diagnostics_cache.as_ref()
    }

    /// The file currently yielded but not yet confirmed via `done_with`, if any.
    pub(crate) fn pending_affected_file(&self) -> Option<&CanonicalPath> {
        self.batch.as_ref().and_then(|batch| batch.affected_files.get(batch.index))
    }
}

/// State constructor / diff engine. Consumes the old state by value so it is dropped
/// before this function returns — there is no lingering reference to the old program
/// or old graph for a caller to accidentally retain past the rebuild.
#[instrument(skip_all, name = "construct_state")]
pub fn construct_state(
    program: &dyn Program,
    host: &dyn Host,
    builder_state: &dyn BuilderState,
    old: Option<BuilderProgramState>,
) -> BuilderProgramState {
    let bundled_output = program.compiler_options().bundled_output;

    let old_graph_ref = old.as_ref().map(|state| &state.graph);
    let graph = builder_state.create(program, host, old_graph_ref);
    let can_reuse = builder_state.can_reuse_old_state(&graph.referenced_map, old_graph_ref);

    let can_copy_diagnostics =
        can_reuse && !bundled_output && old.as_ref().is_some_and(|state| state.diagnostics_cache.is_some());

    if can_copy_diagnostics {
        let old = old.as_ref().expect("can_copy_diagnostics implies old is Some");
        let old_cache = old.diagnostics_cache.as_ref().expect("checked above");
        for path in &old.changed_files {
            assert!(
                !old_cache.contains_key(path),
                "invariant violation: changed file {path} has cached semantic diagnostics in the old state"
            );
        }
    }

    let mut changed_files = BTreeSet::new();
    if can_reuse {
        if let Some(old) = &old {
            changed_files.extend(old.changed_files.iter().cloned());
        }
    }

    for (path, new_info) in &graph.file_infos {
        let mut mark_changed = !can_reuse;
        if can_reuse {
            if let Some(old) = &old {
                match old.graph.file_infos.get(path) {
                    None => mark_changed = true,
                    Some(old_info) => {
                        if old_info.version != new_info.version {
                            mark_changed = true;
                        }
                        if !reference_sets_equal(old.graph.referenced_set(path), graph.referenced_set(path)) {
                            mark_changed = true;
                        }
                        if let Some(new_refs) = graph.referenced_set(path) {
                            for referenced in new_refs {
                                if old.graph.file_infos.contains_key(referenced)
                                    && !graph.file_infos.contains_key(referenced)
                                {
                                    mark_changed = true;
                                }
                            }
                        }
                    }
                }
            }
        }
        if mark_changed {
            changed_files.insert(path.clone());
        }
    }

    // When module-resolution tracking is disabled there is no reference graph to
    // propagate through, so any change must be treated as whole-program.
    if graph.referenced_map.is_none() && !changed_files.is_empty() {
        changed_files = graph.file_infos.keys().cloned().collect();
    }

    let mut diagnostics_cache = if bundled_output { None } else { Some(std::collections::BTreeMap::new()) };
    if can_copy_diagnostics {
        let old = old.as_ref().expect("can_copy_diagnostics implies old is Some");
        let old_cache = old.diagnostics_cache.as_ref().expect("checked above");
        let new_cache = diagnostics_cache.as_mut().expect("bundled_output is false when can_copy_diagnostics");
        for path in graph.file_infos.keys() {
            if changed_files.contains(path) {
                continue;
            }
            if let Some(diagnostics) = old_cache.get(path) {
                new_cache.insert(path.clone(), diagnostics.clone());
            }
        }
    }

    drop(old);

    trace!(changed = changed_files.len(), files = graph.file_infos.len(), bundled_output, "constructed builder state");

    BuilderProgramState { graph, changed_files, batch: None, diagnostics_cache, bundled_output }
}
