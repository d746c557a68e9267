//! # gitscope-sdk
//!
//! Blocking client for the gitscope server API, for review tooling that
//! wants typed access to commits, refs, diffs, and working-tree state.
//!
//! ## Example
//!
//! ```no_run
//! use gitscope_sdk::GitScopeClient;
//!
//! let client = GitScopeClient::new("http://localhost:3030", "backend");
//!
//! for commit in client.commits(Some(10)).unwrap() {
//!     println!("{} {}", &commit.sha[..8], commit.message);
//! }
//! let view = client.worktree().unwrap();
//! println!("{} untracked files", view.changes.untracked.len());
//! ```

use anyhow::{bail, Result};
use gitscope_core::{
    Branch, ChangedFile, Commit, Tag, WorktreeChanges, WorktreeDiff, WorktreeView,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Clone)]
pub struct GitScopeClient {
    base_url: String,
    project: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct ResolvedRef {
    sha: String,
}

#[derive(Deserialize)]
pub struct RepositoryInfo {
    pub is_repository: bool,
    pub current_branch: Option<String>,
}

impl GitScopeClient {
    /// Create a client bound to one project on a gitscope server.
    pub fn new(base_url: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            project: project.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn project_url(&self, suffix: &str) -> String {
        format!("{}/projects/{}{}", self.base_url, self.project, suffix)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("server returned {status}: {body}");
        }
        Ok(response.json()?)
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            bail!("server returned {status}: {body}");
        }
        Ok(response.text()?)
    }

    pub fn repository(&self) -> Result<RepositoryInfo> {
        self.get_json(&self.project_url("/repository"))
    }

    pub fn commits(&self, limit: Option<usize>) -> Result<Vec<Commit>> {
        let url = match limit {
            Some(limit) => self.project_url(&format!("/commits?limit={limit}")),
            None => self.project_url("/commits"),
        };
        self.get_json(&url)
    }

    pub fn branches(&self) -> Result<Vec<Branch>> {
        self.get_json(&self.project_url("/branches"))
    }

    pub fn tags(&self) -> Result<Vec<Tag>> {
        self.get_json(&self.project_url("/tags"))
    }

    pub fn resolve_ref(&self, refname: &str) -> Result<String> {
        let resolved: ResolvedRef =
            self.get_json(&self.project_url(&format!("/resolve?ref={refname}")))?;
        Ok(resolved.sha)
    }

    pub fn commit_diff(&self, sha: &str) -> Result<String> {
        self.get_text(&self.project_url(&format!("/commits/{sha}/diff")))
    }

    pub fn commit_changed_files(&self, sha: &str) -> Result<Vec<ChangedFile>> {
        self.get_json(&self.project_url(&format!("/commits/{sha}/changed-files")))
    }

    pub fn range_diff(&self, from: &str, to: &str) -> Result<String> {
        self.get_text(&self.project_url(&format!("/diff?from={from}&to={to}")))
    }

    pub fn range_changed_files(&self, from: &str, to: &str) -> Result<Vec<ChangedFile>> {
        self.get_json(&self.project_url(&format!("/diff/changed-files?from={from}&to={to}")))
    }

    /// Combined changes+diff view of the working tree.
    pub fn worktree(&self) -> Result<WorktreeView> {
        self.get_json(&self.project_url("/worktree"))
    }

    pub fn worktree_changes(&self, filter: &str) -> Result<WorktreeChanges> {
        self.get_json(&self.project_url(&format!("/worktree/changes?filter={filter}")))
    }

    pub fn worktree_diff(&self, filter: &str) -> Result<WorktreeDiff> {
        self.get_json(&self.project_url(&format!("/worktree/diff?filter={filter}")))
    }
}
