//! Confinement of caller-supplied paths to a project root.
//!
//! Containment is decided by component-wise path decomposition, never by
//! string-prefix comparison: `/home/user/proj2/x` must not pass for a
//! root of `/home/user/proj` even though one string is a prefix of the
//! other. Normalization is purely lexical so paths that do not exist yet
//! can still be validated; symlinks inside the root are not resolved
//! further, a known limitation of this scheme.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve `candidate` against `root` and return its path relative to the
/// root, or a `Validation` error when it escapes.
pub fn confine(root: &Path, candidate: &Path) -> Result<PathBuf> {
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };

    let root = normalize(root);
    let joined = normalize(&joined);

    match joined.strip_prefix(&root) {
        Ok(relative) if !relative.as_os_str().is_empty() => Ok(relative.to_path_buf()),
        Ok(_) => Err(Error::Validation(format!(
            "path resolves to the project root itself: {}",
            candidate.display()
        ))),
        Err(_) => Err(Error::Validation(format!(
            "path is outside the project root: {}",
            candidate.display()
        ))),
    }
}

/// Lexically collapse `.` and `..` components. `..` at the root of an
/// absolute path stays at the root, matching OS path resolution.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    // Relative paths keep leading `..`; absolute paths
                    // cannot go above the root.
                    if !path.is_absolute() {
                        out.push("..");
                    } else {
                        out.push(Component::RootDir);
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}
