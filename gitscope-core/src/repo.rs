//! The engine type and repository metadata queries.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::exec::{CommandLog, GitRunner, GIT_DIR};
use crate::models::{Branch, Commit, Limits, Tag};
use crate::parse;
use crate::paths;
use crate::registry::ProjectRegistry;

/// Default number of commits returned by a listing. Callers can raise it;
/// the transport layer owns the hard upper bound.
pub const DEFAULT_COMMIT_LIMIT: usize = 50;

/// Stateless git introspection engine.
///
/// Every operation is a fresh query against an external `git` process;
/// nothing is cached between calls. Operations take an already-resolved
/// repository root, and [`GitScope::resolve_project`] turns a project id
/// into one, so a logical operation resolves the root exactly once and
/// threads it through its sub-calls.
#[derive(Debug, Clone)]
pub struct GitScope {
    runner: GitRunner,
    limits: Limits,
    registry: ProjectRegistry,
}

impl GitScope {
    pub fn new(registry: ProjectRegistry) -> Self {
        Self::with_limits(registry, Limits::default())
    }

    pub fn with_limits(registry: ProjectRegistry, limits: Limits) -> Self {
        Self {
            runner: GitRunner::new(limits.max_buffer_bytes),
            limits,
            registry,
        }
    }

    /// Record every git invocation into `log`. Used by tests asserting on
    /// subprocess call counts.
    pub fn with_command_log(mut self, log: CommandLog) -> Self {
        self.runner = self.runner.with_command_log(log);
        self
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    pub(crate) fn runner(&self) -> &GitRunner {
        &self.runner
    }

    /// Resolve a project id to its repository root.
    pub fn resolve_project(&self, id: &str) -> Result<PathBuf> {
        self.registry.root_of(id)
    }

    /// Whether `root` looks like a repository. A pure presence probe.
    pub fn is_repository(&self, root: &Path) -> bool {
        root.join(GIT_DIR).exists()
    }

    /// Project-level presence probe. Never fails: an unknown project id
    /// collapses to `false` like any other failure.
    pub fn project_is_repository(&self, id: &str) -> bool {
        match self.resolve_project(id) {
            Ok(root) => self.is_repository(&root),
            Err(_) => false,
        }
    }

    /// Resolve a ref name to its full commit SHA.
    pub async fn resolve_ref(&self, root: &Path, refname: &str) -> Result<String> {
        validate_refname(refname)?;
        match self
            .runner
            .run(root, &["rev-parse", "--verify", refname])
            .await
        {
            Ok(output) => Ok(output.into_stdout().trim().to_string()),
            Err(Error::GitCommand { .. }) => {
                Err(Error::NotFound(format!("ref not found: {refname}")))
            }
            Err(other) => Err(other),
        }
    }

    /// Name of the currently checked-out branch, or `None` for a detached
    /// HEAD. Best-effort: any failure also collapses to `None`.
    pub async fn current_branch(&self, root: &Path) -> Option<String> {
        let output = self
            .runner
            .run(root, &["symbolic-ref", "--short", "HEAD"])
            .await
            .ok()?;
        let name = output.into_stdout().trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// List commits reachable from `refname` (default: current HEAD),
    /// newest first, capped at `limit` (default 50).
    pub async fn list_commits(
        &self,
        root: &Path,
        refname: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Commit>> {
        let limit = limit.unwrap_or(DEFAULT_COMMIT_LIMIT);
        let max_count = format!("--max-count={limit}");
        let format = format!("--format={}", parse::LOG_FORMAT);
        let mut args = vec!["log", max_count.as_str(), format.as_str()];
        if let Some(refname) = refname {
            validate_refname(refname)?;
            args.push(refname);
        }
        let output = self.runner.run(root, &args).await?;
        Ok(parse::parse_log(&output.into_stdout()))
    }

    /// List local branches, marking the one HEAD points at.
    pub async fn list_branches(&self, root: &Path) -> Result<Vec<Branch>> {
        let format = format!("--format={}", parse::BRANCH_FORMAT);
        let output = self
            .runner
            .run(root, &["for-each-ref", format.as_str(), "refs/heads"])
            .await?;
        Ok(parse::parse_refs(&output.into_stdout())
            .into_iter()
            .map(|entry| Branch {
                name: entry.name,
                sha: entry.sha,
                is_current: entry.is_head,
            })
            .collect())
    }

    /// List tags.
    pub async fn list_tags(&self, root: &Path) -> Result<Vec<Tag>> {
        let format = format!("--format={}", parse::TAG_FORMAT);
        let output = self
            .runner
            .run(root, &["for-each-ref", format.as_str(), "refs/tags"])
            .await?;
        Ok(parse::parse_refs(&output.into_stdout())
            .into_iter()
            .map(|entry| Tag {
                name: entry.name,
                sha: entry.sha,
            })
            .collect())
    }

    /// Content of one file at a revision. The path is confined to the
    /// repository root before git ever sees it.
    pub async fn get_file_at_ref(&self, root: &Path, refname: &str, path: &Path) -> Result<String> {
        validate_refname(refname)?;
        let relative = paths::confine(root, path)?;
        let object = format!("{}:{}", refname, relative.display());
        match self.runner.run(root, &["show", object.as_str()]).await {
            Ok(output) => Ok(output.into_stdout()),
            Err(Error::GitCommand { .. }) => Err(Error::NotFound(format!(
                "no file {} at revision {refname}",
                relative.display()
            ))),
            Err(other) => Err(other),
        }
    }
}

/// Reject ref names that are empty or could be parsed as git options.
pub(crate) fn validate_refname(refname: &str) -> Result<()> {
    if refname.is_empty() {
        return Err(Error::Validation("empty ref name".into()));
    }
    if refname.starts_with('-') {
        return Err(Error::Validation(format!(
            "invalid ref name: {refname}"
        )));
    }
    Ok(())
}
