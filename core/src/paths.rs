//! Local path resolution for user-supplied paths.

use std::path::{Component, Path, PathBuf};

use crate::errors::FsError;

/// Outcome of resolving a user-supplied local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute form with `.`/`..` collapsed.
    pub canonical: PathBuf,
    /// Whether the input was already absolute.
    pub was_absolute: bool,
}

/// Resolve a local path to an absolute, canonical form.
///
/// Relative inputs are prefixed with the current working directory.
/// Canonicalization (which follows symlinks and requires the path to
/// exist) is only invoked when a `.` or `..` component is present, so an
/// already-canonical absolute path resolves to itself even when it does
/// not exist yet.
pub fn resolve_path(path: impl AsRef<Path>) -> Result<ResolvedPath, FsError> {
    let path = path.as_ref();
    let was_absolute = path.is_absolute();

    let absolute = if was_absolute {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let needs_canonicalization = absolute
        .components()
        .any(|c| matches!(c, Component::CurDir | Component::ParentDir));

    let canonical = if needs_canonicalization {
        absolute.canonicalize()?
    } else {
        absolute
    };

    Ok(ResolvedPath {
        canonical,
        was_absolute,
    })
}
