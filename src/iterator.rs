//! The affected-file iterator: `next_affected` / `done_with`.
//!
//! This is the two-phase-commit protocol the whole crate exists to get right: a
//! caller may perform a cancellable operation between `next_affected` and
//! `done_with`; if it's cancelled, no state mutation beyond the evicted diagnostics
//! cache entry has occurred, so retrying `next_affected` yields the same file again.

use std::collections::BTreeMap;

use tracing::trace;

use crate::graph::{update_signatures_from_cache, BuilderState};
use crate::path::CanonicalPath;
use crate::program::{CancellationToken, Program};
use crate::state::{Batch, BuilderProgramState};

/// The tagged yield of `next_affected`: either a concrete file or the sentinel
/// meaning "bundled-output mode requires reprocessing the whole program as a unit".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Affected {
    SourceFile(CanonicalPath),
    WholeProgram,
}

impl BuilderProgramState {
    /// Returns the next file (or the whole-program sentinel) requiring work, or
    /// `None` when iteration is complete. Re-yields the same item until the caller
    /// confirms completion via [`Self::done_with`].
    pub fn next_affected(
        &mut self,
        program: &dyn Program,
        builder_state: &dyn BuilderState,
        cancellation: &dyn CancellationToken,
    ) -> Option<Affected> {
        loop {
            if let Some(batch) = &mut self.batch {
                while batch.index < batch.affected_files.len() {
                    let path = batch.affected_files[batch.index].clone();
                    if batch.seen.contains(&path) {
                        batch.index += 1;
                        continue;
                    }
                    if let Some(cache) = self.diagnostics_cache.as_mut() {
                        cache.remove(&path);
                    }
                    return Some(Affected::SourceFile(path));
                }

                // Batch exhausted: commit its root and pending signatures, then fall
                // through to pick the next changed root.
                let batch = self.batch.take().expect("checked Some above");
                self.changed_files.remove(&batch.changed_root);
                update_signatures_from_cache(&mut self.graph, &batch.pending_signatures);
                continue;
            }

            let Some(next_root) = self.changed_files.iter().next().cloned() else {
                return None;
            };

            if self.bundled_output {
                return Some(Affected::WholeProgram);
            }

            let mut pending_signatures = BTreeMap::new();
            let affected_files =
                builder_state.get_files_affected_by(&self.graph, program, &next_root, &mut pending_signatures, cancellation);

            if let Some(cache) = self.diagnostics_cache.as_mut() {
                cache.remove(&next_root);
            }

            trace!(root = %next_root, affected = affected_files.len(), "expanded changed root into affected batch");

            self.batch = Some(Batch {
                changed_root: next_root,
                affected_files,
                index: 0,
                seen: Default::default(),
                pending_signatures,
            });
        }
    }

    /// Commits progress on the item most recently returned by `next_affected`.
    pub fn done_with(&mut self, affected: Affected) {
        match affected {
            Affected::WholeProgram => {
                self.changed_files.clear();
            }
            Affected::SourceFile(path) => {
                if let Some(batch) = &mut self.batch {
                    debug_assert_eq!(
                        batch.affected_files.get(batch.index),
                        Some(&path),
                        "done_with called with a file other than the one most recently yielded"
                    );
                    batch.seen.insert(path);
                    batch.index += 1;
                }
            }
        }
    }
}
