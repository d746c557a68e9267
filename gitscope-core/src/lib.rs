//! # gitscope-core
//!
//! Git repository introspection and diff computation for review UIs.
//!
//! The engine is a disciplined client of the external `git` binary: it
//! confines caller-supplied paths to a project root, interprets git's
//! exit codes as a signal protocol rather than uniform success/failure,
//! parses its NUL/tab-delimited output formats into typed records, and
//! bounds the inherently unbounded untracked-file workload with explicit
//! caps and per-file failure isolation. Every call is a fresh, stateless
//! query; the engine persists nothing.

pub mod commits;
pub mod error;
pub mod exec;
pub mod models;
pub mod parse;
pub mod paths;
pub mod registry;
pub mod repo;
pub mod worktree;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, ErrorKind, Result};
pub use exec::{CommandLog, GitOutput, GitRunner, RunOpts};
pub use models::{
    Branch, ChangedFile, Commit, DiffFilter, FileStatus, Limits, Tag, WorktreeChanges,
    WorktreeDiff, WorktreeView,
};
pub use registry::ProjectRegistry;
pub use repo::{GitScope, DEFAULT_COMMIT_LIMIT};
