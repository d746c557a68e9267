//! Subprocess gateway for the `git` binary.
//!
//! Exit codes from git are a signal protocol, not a binary pass/fail:
//! `git diff --no-index` exits 1 when the inputs differ, which for our
//! callers is the expected success outcome. The gateway makes that
//! explicit with a three-way result instead of hiding it in error
//! handling.

use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Marker directory (or file, for worktrees) that identifies a repository root.
pub const GIT_DIR: &str = ".git";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Per-invocation options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOpts {
    /// Treat exit code 1 with stdout present as success carrying stdout.
    pub allow_diff_signal: bool,
}

impl RunOpts {
    pub fn diff_signal() -> Self {
        Self {
            allow_diff_signal: true,
        }
    }
}

/// Outcome of a successful git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOutput {
    /// Exit 0.
    Clean(String),
    /// Exit 1 under the diff-signal convention: differences were found.
    DiffSignal(String),
}

impl GitOutput {
    pub fn into_stdout(self) -> String {
        match self {
            GitOutput::Clean(s) | GitOutput::DiffSignal(s) => s,
        }
    }
}

/// What an exit status means for a given invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    Clean,
    DiffSignal,
    Failure,
}

/// Pure exit-code policy, kept separate from process plumbing so the
/// signal protocol is testable without spawning anything.
pub fn interpret_exit(code: Option<i32>, has_stdout: bool, opts: RunOpts) -> ExitDisposition {
    match code {
        Some(0) => ExitDisposition::Clean,
        Some(1) if opts.allow_diff_signal && has_stdout => ExitDisposition::DiffSignal,
        _ => ExitDisposition::Failure,
    }
}

/// Shared log of issued git invocations, for tests that assert on
/// subprocess call counts (e.g. the single-listing guarantee of the
/// working-tree aggregator).
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<Vec<String>>>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, args: &[&str]) {
        let mut entries = self.entries.lock().unwrap();
        entries.push(args.iter().map(|s| s.to_string()).collect());
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of recorded invocations whose argv starts with `subcommand`.
    pub fn count_subcommand(&self, subcommand: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args.first().map(String::as_str) == Some(subcommand))
            .count()
    }
}

/// Executes git with a working directory, an output buffer cap, a
/// timeout, and the exit-code tolerance policy above.
#[derive(Debug, Clone)]
pub struct GitRunner {
    max_buffer_bytes: usize,
    timeout: Duration,
    log: Option<CommandLog>,
}

impl GitRunner {
    pub fn new(max_buffer_bytes: usize) -> Self {
        Self {
            max_buffer_bytes,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_command_log(mut self, log: CommandLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Run git under `root` with default options.
    pub async fn run(&self, root: &Path, args: &[&str]) -> Result<GitOutput> {
        self.run_with(root, args, RunOpts::default()).await
    }

    /// Run git under `root`.
    ///
    /// Fails with a `Validation` error before spawning when `root` does
    /// not contain the git marker directory. Calls are read-only and
    /// idempotent; retry policy is a caller concern, so there is none here.
    pub async fn run_with(&self, root: &Path, args: &[&str], opts: RunOpts) -> Result<GitOutput> {
        if !root.join(GIT_DIR).exists() {
            return Err(Error::Validation(format!(
                "not a git repository: {}",
                root.display()
            )));
        }

        if let Some(log) = &self.log {
            log.record(args);
        }

        let command_line = format!("git {}", args.join(" "));
        debug!(command = %command_line, root = %root.display(), "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Timeout {
                    command: command_line,
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        if output.stdout.len() > self.max_buffer_bytes {
            return Err(Error::GitCommand {
                command: command_line,
                code: output.status.code(),
                stderr: format!(
                    "stdout exceeded the {}-byte buffer cap",
                    self.max_buffer_bytes
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        match interpret_exit(output.status.code(), !stdout.is_empty(), opts) {
            ExitDisposition::Clean => Ok(GitOutput::Clean(stdout)),
            ExitDisposition::DiffSignal => Ok(GitOutput::DiffSignal(stdout)),
            ExitDisposition::Failure => Err(Error::GitCommand {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }
}
