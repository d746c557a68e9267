//! Mapping of opaque project identifiers to repository roots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// In-memory registry of known projects. Resolution happens once per
/// logical operation; callers thread the resolved root through sub-calls
/// instead of resolving again.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: HashMap<String, PathBuf>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, root: impl Into<PathBuf>) {
        self.projects.insert(id.into(), root.into());
    }

    /// Resolve a project id to its absolute root path.
    pub fn root_of(&self, id: &str) -> Result<PathBuf> {
        self.projects
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("project not found: {id}")))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl FromIterator<(String, PathBuf)> for ProjectRegistry {
    fn from_iter<T: IntoIterator<Item = (String, PathBuf)>>(iter: T) -> Self {
        Self {
            projects: iter.into_iter().collect(),
        }
    }
}

/// Register a single project rooted at `root` under an id derived from
/// its directory name. Convenience for the CLI, which always operates on
/// one local repository.
pub fn single_project(root: &Path) -> ProjectRegistry {
    let id = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "default".to_string());
    let mut registry = ProjectRegistry::new();
    registry.insert(id, root);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_known_project_resolves() {
        let mut registry = ProjectRegistry::new();
        registry.insert("demo", "/srv/repos/demo");
        assert_eq!(
            registry.root_of("demo").unwrap(),
            PathBuf::from("/srv/repos/demo")
        );
    }

    #[test]
    fn test_unknown_project_is_not_found() {
        let registry = ProjectRegistry::new();
        let err = registry.root_of("missing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_single_project_uses_directory_name() {
        let registry = single_project(Path::new("/home/user/proj"));
        assert_eq!(
            registry.root_of("proj").unwrap(),
            PathBuf::from("/home/user/proj")
        );
    }
}
