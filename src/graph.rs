//! The `ReferenceGraph` / `FileInfo` store and the `BuilderState` contract.
//!
//! This sub-layer — computing shape signatures and tracking which files reference
//! which — is deliberately kept behind a trait rather than baked into the core:
//! a real frontend has its own parser and resolver and should supply its own
//! implementation. [`DefaultBuilderState`] is one concrete, intentionally simple
//! implementation (content-hash signatures over a declaration-only projection of the
//! source, line-oriented import scanning) so the crate is runnable end to end.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::host::{Host, Version};
use crate::path::CanonicalPath;
use crate::program::{CancellationToken, Program};

/// A hash summarizing a file's externally observable declarations. Unlike `Version`,
/// two files with different content can share a `Signature` (e.g. a comment-only
/// edit), which is exactly what lets downstream invalidation stop early.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature(String);

/// Per-file record owned by the graph. `signature` is `None` until the file has been
/// analyzed at least once in this or an ancestor state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub version: Version,
    pub signature: Option<Signature>,
}

pub type ReferencedSet = BTreeSet<CanonicalPath>;
pub type ReferenceMap = BTreeMap<CanonicalPath, ReferencedSet>;

/// A snapshot of `fileInfos` plus the optional `referencedMap`. `referencedMap` is
/// absent exactly when the compiler configuration disables module-resolution
/// tracking, in which case any change forces whole-program invalidation.
#[derive(Clone, Debug, Default)]
pub struct ReferenceGraph {
    pub file_infos: BTreeMap<CanonicalPath, FileInfo>,
    pub referenced_map: Option<ReferenceMap>,
}

impl ReferenceGraph {
    pub(crate) fn referenced_set(&self, path: &CanonicalPath) -> Option<&ReferencedSet> {
        self.referenced_map.as_ref().and_then(|m| m.get(path))
    }
}

/// Reference-set equality: identical cardinality and matching key membership. Treats
/// a missing entry as the empty set, so an untracked file compares equal to one with
/// no references.
pub(crate) fn reference_sets_equal(a: Option<&ReferencedSet>, b: Option<&ReferencedSet>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(s)) | (Some(s), None) => s.is_empty(),
        (Some(a), Some(b)) => a == b,
    }
}

/// The signature-and-reference-tracking contract this core relies on but leaves
/// pluggable, so a real frontend can back it with its own parser and resolver.
pub trait BuilderState {
    /// Builds fresh `fileInfos` and (if applicable) `referencedMap` from the program.
    fn create(&self, program: &dyn Program, host: &dyn Host, old: Option<&ReferenceGraph>) -> ReferenceGraph;

    /// True iff `new_referenced_map`'s presence matches the old graph's and whatever
    /// other structural preconditions this implementation requires.
    fn can_reuse_old_state(&self, new_referenced_map: &Option<ReferenceMap>, old: Option<&ReferenceGraph>) -> bool;

    /// Computes the transitive affected set from one changed root: the root plus any
    /// file whose shape signature was affected by transitive re-analysis, in order.
    /// Writes recomputed signatures into `out_signatures` without committing them to
    /// `graph.file_infos` — that commit only happens when the caller's batch drains,
    /// so a cancelled traversal leaves the graph's committed signatures untouched.
    fn get_files_affected_by(
        &self,
        graph: &ReferenceGraph,
        program: &dyn Program,
        changed: &CanonicalPath,
        out_signatures: &mut BTreeMap<CanonicalPath, Signature>,
        cancellation: &dyn CancellationToken,
    ) -> Vec<CanonicalPath>;

    fn get_all_dependencies(&self, graph: &ReferenceGraph, program: &dyn Program, file: &CanonicalPath) -> Vec<CanonicalPath>;
}

/// Flushes pending signatures into the graph once a batch has fully drained.
pub(crate) fn update_signatures_from_cache(graph: &mut ReferenceGraph, signatures: &BTreeMap<CanonicalPath, Signature>) {
    for (path, signature) in signatures {
        if let Some(info) = graph.file_infos.get_mut(path) {
            info.signature = Some(signature.clone());
        }
    }
}

/// Declaration-only projection used for the default signature: strips the contents
/// of every brace-delimited body, keeping top-level declarations and signatures.
/// A body-only edit (renaming a local, reformatting, adding a comment) leaves this
/// projection unchanged, so it doesn't propagate a signature change to dependents.
fn declaration_projection(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut depth = 0i32;
    for ch in content.chars() {
        match ch {
            '{' => {
                if depth == 0 {
                    out.push(ch);
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    out.push(ch);
                }
            }
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

fn compute_signature(content: &str) -> Signature {
    Signature(crate::hashutil::sha256_hex(&declaration_projection(content)))
}

/// Naive line-oriented `import "path";` / `import 'path';` scanner. Good enough to
/// exercise the affected-file algorithm; a real frontend should supply its own
/// `BuilderState` grounded in its actual resolver.
fn extract_imports(content: &str, host: &dyn Host) -> ReferencedSet {
    let mut set = ReferencedSet::new();
    for line in content.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("import ") else { continue };
        let Some(start) = rest.find(['"', '\'']) else { continue };
        let quote = rest.as_bytes()[start] as char;
        let Some(end) = rest[start + 1..].find(quote) else { continue };
        let target = &rest[start + 1..start + 1 + end];
        set.insert(host.canonicalize(std::path::Path::new(target)));
    }
    set
}

fn dependents_of(graph: &ReferenceGraph, target: &CanonicalPath) -> Vec<CanonicalPath> {
    let Some(map) = &graph.referenced_map else { return Vec::new() };
    map.iter().filter(|(_, refs)| refs.contains(target)).map(|(path, _)| path.clone()).collect()
}

/// The default, intentionally simple `BuilderState`. See the module docs.
#[derive(Default)]
pub struct DefaultBuilderState;

impl BuilderState for DefaultBuilderState {
    fn create(&self, program: &dyn Program, host: &dyn Host, _old: Option<&ReferenceGraph>) -> ReferenceGraph {
        let mut file_infos = BTreeMap::new();
        let mut referenced_map = ReferenceMap::new();
        for path in program.source_files() {
            let Some(source) = program.source_file(&path) else { continue };
            let version = host.content_version(&source.content);
            file_infos.insert(path.clone(), FileInfo { version, signature: None });
            referenced_map.insert(path, extract_imports(&source.content, host));
        }
        ReferenceGraph { file_infos, referenced_map: Some(referenced_map) }
    }

    fn can_reuse_old_state(&self, new_referenced_map: &Option<ReferenceMap>, old: Option<&ReferenceGraph>) -> bool {
        match old {
            None => false,
            Some(old) => old.referenced_map.is_some() == new_referenced_map.is_some(),
        }
    }

    fn get_files_affected_by(
        &self,
        graph: &ReferenceGraph,
        program: &dyn Program,
        changed: &CanonicalPath,
        out_signatures: &mut BTreeMap<CanonicalPath, Signature>,
        cancellation: &dyn CancellationToken,
    ) -> Vec<CanonicalPath> {
        let mut result = Vec::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(changed.clone());
        visited.insert(changed.clone());

        while let Some(path) = queue.pop_front() {
            if cancellation.is_cancelled() {
                break;
            }
            let Some(source) = program.source_file(&path) else { continue };
            let new_signature = compute_signature(&source.content);
            let old_signature = graph.file_infos.get(&path).and_then(|info| info.signature.clone());
            let shape_changed = old_signature.as_ref() != Some(&new_signature);
            out_signatures.insert(path.clone(), new_signature);
            result.push(path.clone());

            if shape_changed {
                for dependent in dependents_of(graph, &path) {
                    if visited.insert(dependent.clone()) {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        result
    }

    fn get_all_dependencies(&self, graph: &ReferenceGraph, _program: &dyn Program, file: &CanonicalPath) -> Vec<CanonicalPath> {
        graph.referenced_set(file).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }
}
