pub mod diff;
pub mod log;
pub mod refs;
pub mod serve;
pub mod show;
pub mod status;

use anyhow::{bail, Context, Result};
use gitscope_core::{DiffFilter, GitScope, ProjectRegistry};
use std::path::PathBuf;

/// Resolve the repository to operate on: an explicit `--repo` path or
/// the current directory. Fails early when it is not a repository.
pub fn repo_root(custom_path: Option<PathBuf>) -> Result<PathBuf> {
    let root = match custom_path {
        Some(path) => path,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    if !root.join(".git").exists() {
        bail!("not a git repository: {}", root.display());
    }
    Ok(root)
}

pub fn engine() -> GitScope {
    GitScope::new(ProjectRegistry::new())
}

pub fn parse_filter(raw: &str) -> Result<DiffFilter> {
    DiffFilter::parse(raw)
        .ok_or_else(|| anyhow::anyhow!("invalid filter: {raw} (expected all, staged, or unstaged)"))
}
