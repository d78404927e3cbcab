//! Recoverable errors only. Invariant violations are fail-fast `assert!`s at their
//! call sites, not part of this enum — see the module docs on [`crate::state`] and
//! [`crate::diagnostics`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to write file at {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;
