//! The host contract: case sensitivity, content hashing, and the optional
//! `writeFile` override, supplied by whatever embeds this crate (a CLI, watch-mode
//! orchestrator, or test harness). None of that orchestration lives here.

use std::path::Path;

use path_slash::PathExt as _;

use crate::error::Result;
use crate::path::CanonicalPath;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

/// Opaque content identity for a `FileInfo`. Two files with the same `Version` are
/// assumed to have identical content; this crate never inspects the bytes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(String);

impl Version {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A `writeFile` override. Precedence when emitting is: per-call override > host
/// writer > program default.
pub trait WriteFile {
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;
}

pub struct FsWriteFile;

impl WriteFile for FsWriteFile {
    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| crate::error::BuildError::WriteFile { path: path.to_path_buf(), source })?;
        }
        std::fs::write(path, content)
            .map_err(|source| crate::error::BuildError::WriteFile { path: path.to_path_buf(), source })
    }
}

pub trait Host {
    fn case_sensitivity(&self) -> CaseSensitivity {
        CaseSensitivity::Sensitive
    }

    /// Canonicalizes a path per the configured case-sensitivity policy. The default
    /// normalizes separators to `/` (so the same file referenced via `a\b` and `a/b`
    /// on Windows collides) and lower-cases the result when case-insensitive.
    fn canonicalize(&self, path: &Path) -> CanonicalPath {
        let mut slashed = path.to_slash_lossy().into_owned();
        if self.case_sensitivity() == CaseSensitivity::Insensitive {
            slashed = slashed.to_lowercase();
        }
        CanonicalPath::from_canonical_string(slashed)
    }

    /// Content-identity token for `FileInfo::version`. The contract's default is the
    /// identity of the source text; we hash it so `Version` stays cheap to store and
    /// compare. Override to use e.g. an mtime-derived token instead.
    fn content_version(&self, content: &str) -> Version {
        Version(crate::hashutil::sha256_hex(content))
    }

    /// Host-provided `writeFile`, used when no per-call override is given. `None`
    /// means "fall through to the program's own default writer".
    fn writer(&self) -> Option<&dyn WriteFile> {
        None
    }
}

/// A host with no writer override and platform-default case sensitivity.
#[derive(Default)]
pub struct DefaultHost {
    case_sensitivity: Option<CaseSensitivity>,
}

impl DefaultHost {
    pub fn new(case_sensitivity: CaseSensitivity) -> Self {
        Self { case_sensitivity: Some(case_sensitivity) }
    }
}

impl Host for DefaultHost {
    fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity.unwrap_or(CaseSensitivity::Sensitive)
    }
}
