//! Per-commit and ref-range diffs and structured change lists.
//!
//! Changed-files computation joins two independent git outputs by path:
//! numstat supplies line counts, name-status supplies the change kind
//! and rename/copy origins. The two queries are independent reads and
//! run concurrently.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::ChangedFile;
use crate::parse::{self, NameStatusEntry, NumstatEntry};
use crate::repo::{validate_refname, GitScope};

impl GitScope {
    /// Raw unified diff introduced by a single commit, unparsed.
    pub async fn commit_diff(&self, root: &Path, sha: &str) -> Result<String> {
        validate_sha(sha)?;
        let output = self
            .runner()
            .run(root, &["show", "--format=", "--patch", sha])
            .await?;
        Ok(output.into_stdout())
    }

    /// Raw unified diff between two refs, unparsed.
    pub async fn range_diff(&self, root: &Path, from: &str, to: &str) -> Result<String> {
        validate_refname(from)?;
        validate_refname(to)?;
        let output = self.runner().run(root, &["diff", from, to]).await?;
        Ok(output.into_stdout())
    }

    /// Structured change list for a single commit.
    pub async fn commit_changed_files(&self, root: &Path, sha: &str) -> Result<Vec<ChangedFile>> {
        validate_sha(sha)?;
        let numstat_args = ["show", "--format=", "--numstat", sha];
        let name_status_args = ["show", "--format=", "--name-status", sha];
        let (numstat, name_status) = tokio::join!(
            self.runner().run(root, &numstat_args),
            self.runner().run(root, &name_status_args),
        );
        Ok(join_changed_files(
            parse::parse_numstat(&numstat?.into_stdout()),
            parse::parse_name_status(&name_status?.into_stdout()),
        ))
    }

    /// Structured change list between two refs.
    pub async fn range_changed_files(
        &self,
        root: &Path,
        from: &str,
        to: &str,
    ) -> Result<Vec<ChangedFile>> {
        validate_refname(from)?;
        validate_refname(to)?;
        let numstat_args = ["diff", "--numstat", from, to];
        let name_status_args = ["diff", "--name-status", from, to];
        let (numstat, name_status) = tokio::join!(
            self.runner().run(root, &numstat_args),
            self.runner().run(root, &name_status_args),
        );
        Ok(join_changed_files(
            parse::parse_numstat(&numstat?.into_stdout()),
            parse::parse_name_status(&name_status?.into_stdout()),
        ))
    }
}

/// Join numstat and name-status listings by path, preserving the
/// name-status ordering. For renames and copies the stats are keyed by
/// the new path in recent git versions, so that is tried first with the
/// old path as fallback, defaulting to zero counts if neither matches.
pub(crate) fn join_changed_files(
    numstat: Vec<NumstatEntry>,
    name_status: Vec<NameStatusEntry>,
) -> Vec<ChangedFile> {
    let stats: HashMap<String, (u64, u64)> = numstat
        .into_iter()
        .map(|entry| (entry.path, (entry.additions, entry.deletions)))
        .collect();

    name_status
        .into_iter()
        .map(|entry| {
            let (additions, deletions) = stats
                .get(&entry.path)
                .or_else(|| entry.old_path.as_ref().and_then(|old| stats.get(old)))
                .copied()
                .unwrap_or((0, 0));
            ChangedFile {
                path: entry.path,
                status: entry.status,
                additions,
                deletions,
                old_path: entry.old_path,
            }
        })
        .collect()
}

/// Accept 4 to 40 hex characters, the shapes git itself accepts for an
/// abbreviated or full object name. Anything else fails fast before a
/// subprocess is spawned.
pub(crate) fn validate_sha(sha: &str) -> Result<()> {
    let len = sha.len();
    if (4..=40).contains(&len) && sha.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(Error::Validation(format!("malformed commit sha: {sha}")))
    }
}
