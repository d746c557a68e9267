//! Working-tree state aggregation.
//!
//! Three phases gated by a [`DiffFilter`]: staged (index vs HEAD),
//! unstaged (worktree vs index), and untracked. Untracked files are an
//! unbounded input, so they are the only phase with caps: at most
//! `max_untracked_diffs` files are diffed per call, files above
//! `max_untracked_file_size` get a placeholder block, binary files get a
//! placeholder block, and any per-file failure skips that file without
//! aborting the batch. A combined changes+diff call lists untracked
//! files exactly once and feeds both views from that single listing.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::error::Result;
use crate::exec::{GitRunner, RunOpts};
use crate::models::{ChangedFile, DiffFilter, WorktreeChanges, WorktreeDiff, WorktreeView};
use crate::parse;
use crate::repo::GitScope;

/// Bound on concurrently running per-untracked-file git invocations.
const UNTRACKED_DIFF_CONCURRENCY: usize = 8;

impl GitScope {
    /// Structured staged/unstaged/untracked listing. Lists each phase
    /// only when the filter requests it.
    pub async fn worktree_changes(
        &self,
        root: &Path,
        filter: DiffFilter,
    ) -> Result<WorktreeChanges> {
        let (staged, unstaged, untracked) = tokio::join!(
            self.phase_files(root, Phase::Staged, filter.includes_staged()),
            self.phase_files(root, Phase::Unstaged, filter.includes_unstaged()),
            self.untracked_listing_if(root, filter.includes_untracked()),
        );
        Ok(WorktreeChanges {
            staged: staged?,
            unstaged: unstaged?,
            untracked: untracked?,
        })
    }

    /// Concatenated unified diff for the working tree: staged, then
    /// unstaged, then untracked blocks, non-empty blocks joined by a
    /// single newline.
    pub async fn worktree_diff(&self, root: &Path, filter: DiffFilter) -> Result<WorktreeDiff> {
        let (staged, unstaged) = tokio::join!(
            self.phase_patch(root, Phase::Staged, filter.includes_staged()),
            self.phase_patch(root, Phase::Unstaged, filter.includes_unstaged()),
        );
        let untracked = self.untracked_listing_if(root, filter.includes_untracked()).await?;
        Ok(self
            .assemble_diff(root, staged?, unstaged?, &untracked)
            .await)
    }

    /// Changes and diff in one pass. The untracked listing is issued
    /// exactly once and reused for both views.
    pub async fn worktree_view(&self, root: &Path, filter: DiffFilter) -> Result<WorktreeView> {
        let (staged_files, staged_patch, unstaged_files, unstaged_patch, untracked) = tokio::join!(
            self.phase_files(root, Phase::Staged, filter.includes_staged()),
            self.phase_patch(root, Phase::Staged, filter.includes_staged()),
            self.phase_files(root, Phase::Unstaged, filter.includes_unstaged()),
            self.phase_patch(root, Phase::Unstaged, filter.includes_unstaged()),
            self.untracked_listing_if(root, filter.includes_untracked()),
        );
        let untracked = untracked?;
        let diff = self
            .assemble_diff(root, staged_patch?, unstaged_patch?, &untracked)
            .await;
        Ok(WorktreeView {
            changes: WorktreeChanges {
                staged: staged_files?,
                unstaged: unstaged_files?,
                untracked,
            },
            diff,
        })
    }

    async fn phase_files(
        &self,
        root: &Path,
        phase: Phase,
        active: bool,
    ) -> Result<Vec<ChangedFile>> {
        if !active {
            return Ok(Vec::new());
        }
        let numstat_args = phase.args(&["--numstat"]);
        let name_status_args = phase.args(&["--name-status"]);
        let (numstat, name_status) = tokio::join!(
            self.runner().run(root, &numstat_args),
            self.runner().run(root, &name_status_args),
        );
        Ok(crate::commits::join_changed_files(
            parse::parse_numstat(&numstat?.into_stdout()),
            parse::parse_name_status(&name_status?.into_stdout()),
        ))
    }

    async fn phase_patch(&self, root: &Path, phase: Phase, active: bool) -> Result<String> {
        if !active {
            return Ok(String::new());
        }
        let output = self.runner().run(root, &phase.args(&[])).await?;
        Ok(output.into_stdout())
    }

    async fn untracked_listing_if(&self, root: &Path, active: bool) -> Result<Vec<String>> {
        if !active {
            return Ok(Vec::new());
        }
        let output = self
            .runner()
            .run(root, &["ls-files", "--others", "--exclude-standard"])
            .await?;
        Ok(parse::parse_path_list(&output.into_stdout()))
    }

    async fn assemble_diff(
        &self,
        root: &Path,
        staged_patch: String,
        unstaged_patch: String,
        untracked: &[String],
    ) -> WorktreeDiff {
        let (untracked_block, total, processed, capped) =
            self.untracked_diff_blocks(root, untracked).await;

        let mut sections = Vec::new();
        for section in [staged_patch, unstaged_patch, untracked_block] {
            if !section.is_empty() {
                sections.push(section);
            }
        }
        WorktreeDiff {
            diff: sections.join("\n"),
            untracked_diffs_capped: capped,
            untracked_total: total,
            untracked_processed: processed,
        }
    }

    /// Fan out per-file diff generation over an index-ordered task list,
    /// bounded by a semaphore, and reassemble the output by original
    /// index so the result is deterministic regardless of completion
    /// order. A failing file is skipped; it still counts toward the
    /// processed total but contributes no text.
    async fn untracked_diff_blocks(
        &self,
        root: &Path,
        listing: &[String],
    ) -> (String, usize, usize, bool) {
        let total = listing.len();
        let cap = self.limits().max_untracked_diffs;
        let processed = total.min(cap);
        let max_file_size = self.limits().max_untracked_file_size;

        let mut slots: Vec<Option<String>> = vec![None; processed];
        let semaphore = Arc::new(Semaphore::new(UNTRACKED_DIFF_CONCURRENCY));
        let mut tasks = JoinSet::new();

        for (index, path) in listing.iter().take(cap).enumerate() {
            let runner = self.runner().clone();
            let root = root.to_path_buf();
            let path = path.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, None),
                };
                let block = match untracked_file_diff(&runner, &root, &path, max_file_size).await {
                    Ok(block) => block,
                    Err(err) => {
                        warn!(path = %path, %err, "skipping untracked file");
                        None
                    }
                };
                (index, block)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            // A panicked task is treated like any other per-file failure.
            if let Ok((index, block)) = joined {
                slots[index] = block;
            }
        }

        let blocks: Vec<String> = slots
            .into_iter()
            .flatten()
            .filter(|block| !block.is_empty())
            .collect();
        (blocks.join("\n"), total, processed, total > cap)
    }
}

#[derive(Clone, Copy)]
enum Phase {
    /// Index vs HEAD.
    Staged,
    /// Worktree vs index.
    Unstaged,
}

impl Phase {
    fn args<'a>(&self, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec!["diff"];
        if matches!(self, Phase::Staged) {
            args.push("--cached");
        }
        args.extend_from_slice(extra);
        args
    }
}

/// Diff one untracked file against an empty baseline.
///
/// Returns `Ok(None)` when the file vanished between listing and
/// processing. Oversized and binary files get synthetic placeholder
/// blocks instead of real content.
async fn untracked_file_diff(
    runner: &GitRunner,
    root: &Path,
    path: &str,
    max_file_size: u64,
) -> Result<Option<String>> {
    let absolute = root.join(path);
    let metadata = match tokio::fs::metadata(&absolute).await {
        Ok(metadata) => metadata,
        Err(_) => return Ok(None),
    };

    if metadata.len() > max_file_size {
        let size_mb = metadata.len() as f64 / (1024.0 * 1024.0);
        return Ok(Some(placeholder_block(
            path,
            &format!("File too large ({size_mb:.2}MB) - content not shown"),
        )));
    }

    // Probe for binary content first: numstat against an empty input
    // reports `-` in both numeric columns for binary files.
    let probe = runner
        .run_with(
            root,
            &["diff", "--no-index", "--numstat", "--", "/dev/null", path],
            RunOpts::diff_signal(),
        )
        .await?;
    let entries = parse::parse_numstat(&probe.into_stdout());
    if entries.first().map(|entry| entry.is_binary).unwrap_or(false) {
        return Ok(Some(placeholder_block(
            path,
            "Binary file (content not shown)",
        )));
    }

    // Exit code 1 is the expected success signal here: the file differs
    // from the empty baseline by definition.
    let diff = runner
        .run_with(
            root,
            &["diff", "--no-index", "--", "/dev/null", path],
            RunOpts::diff_signal(),
        )
        .await?;
    Ok(Some(diff.into_stdout()))
}

fn placeholder_block(path: &str, note: &str) -> String {
    format!("diff --git a/{path} b/{path}\nnew file mode 100644\n--- /dev/null\n+++ b/{path}\n@@ {note} @@\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandLog;
    use crate::models::{FileStatus, Limits};
    use crate::registry::ProjectRegistry;
    use crate::testutil;

    fn engine() -> GitScope {
        GitScope::new(ProjectRegistry::new())
    }

    fn engine_with(limits: Limits) -> GitScope {
        GitScope::with_limits(ProjectRegistry::new(), limits)
    }

    fn small_limits() -> Limits {
        Limits::default()
    }

    #[tokio::test]
    async fn test_clean_tree_is_empty() {
        let repo = testutil::init_repo();
        let view = engine()
            .worktree_view(repo.path(), DiffFilter::All)
            .await
            .unwrap();
        assert!(view.changes.staged.is_empty());
        assert!(view.changes.unstaged.is_empty());
        assert!(view.changes.untracked.is_empty());
        assert_eq!(view.diff.diff, "");
        assert_eq!(view.diff.untracked_total, 0);
        assert!(!view.diff.untracked_diffs_capped);
    }

    #[tokio::test]
    async fn test_phases_separated_and_ordered() {
        let repo = testutil::init_repo();
        let root = repo.path();
        // Staged: new file added to the index.
        testutil::write_file(root, "staged.rs", "fn staged() {}\n");
        testutil::git(root, &["add", "staged.rs"]);
        // Unstaged: modify a committed file without staging.
        testutil::write_file(root, "README.md", "# test repo\nunstaged edit\n");
        // Untracked: never added.
        testutil::write_file(root, "untracked.rs", "fn untracked() {}\n");

        let view = engine()
            .worktree_view(root, DiffFilter::All)
            .await
            .unwrap();

        assert_eq!(view.changes.staged.len(), 1);
        assert_eq!(view.changes.staged[0].path, "staged.rs");
        assert_eq!(view.changes.staged[0].status, FileStatus::Added);

        assert_eq!(view.changes.unstaged.len(), 1);
        assert_eq!(view.changes.unstaged[0].path, "README.md");
        assert_eq!(view.changes.unstaged[0].status, FileStatus::Modified);

        assert_eq!(view.changes.untracked, vec!["untracked.rs".to_string()]);

        // Ordering: staged before unstaged before untracked.
        let diff = &view.diff.diff;
        let staged_at = diff.find("staged.rs").unwrap();
        let unstaged_at = diff.find("README.md").unwrap();
        let untracked_at = diff.find("untracked.rs").unwrap();
        assert!(staged_at < unstaged_at);
        assert!(unstaged_at < untracked_at);
        assert_eq!(view.diff.untracked_total, 1);
        assert_eq!(view.diff.untracked_processed, 1);
    }

    #[tokio::test]
    async fn test_staged_filter_excludes_other_phases() {
        let repo = testutil::init_repo();
        let root = repo.path();
        testutil::write_file(root, "staged.rs", "fn staged() {}\n");
        testutil::git(root, &["add", "staged.rs"]);
        testutil::write_file(root, "README.md", "edited\n");
        testutil::write_file(root, "untracked.rs", "x\n");

        let view = engine()
            .worktree_view(root, DiffFilter::Staged)
            .await
            .unwrap();
        assert_eq!(view.changes.staged.len(), 1);
        assert!(view.changes.unstaged.is_empty());
        assert!(view.changes.untracked.is_empty());
        assert!(!view.diff.diff.contains("untracked.rs"));
        assert_eq!(view.diff.untracked_total, 0);
        assert_eq!(view.diff.untracked_processed, 0);
        assert!(!view.diff.untracked_diffs_capped);
    }

    #[tokio::test]
    async fn test_combined_view_lists_untracked_exactly_once() {
        let repo = testutil::init_repo();
        testutil::write_file(repo.path(), "a.txt", "a\n");
        testutil::write_file(repo.path(), "b.txt", "b\n");

        let log = CommandLog::new();
        let scope = engine().with_command_log(log.clone());
        scope
            .worktree_view(repo.path(), DiffFilter::All)
            .await
            .unwrap();
        assert_eq!(log.count_subcommand("ls-files"), 1);
    }

    #[tokio::test]
    async fn test_untracked_cap_counters() {
        let repo = testutil::init_repo();
        for i in 0..5 {
            testutil::write_file(repo.path(), &format!("file{i}.txt"), "content\n");
        }

        let limits = Limits {
            max_untracked_diffs: 3,
            ..small_limits()
        };
        let diff = engine_with(limits)
            .worktree_diff(repo.path(), DiffFilter::All)
            .await
            .unwrap();
        assert_eq!(diff.untracked_total, 5);
        assert_eq!(diff.untracked_processed, 3);
        assert!(diff.untracked_diffs_capped);
        // Listing order is preserved: only the first three are diffed.
        assert!(diff.diff.contains("file0.txt"));
        assert!(diff.diff.contains("file2.txt"));
        assert!(!diff.diff.contains("file3.txt"));
    }

    #[tokio::test]
    async fn test_untracked_blocks_keep_listing_order() {
        let repo = testutil::init_repo();
        for name in ["alpha.txt", "beta.txt", "gamma.txt"] {
            testutil::write_file(repo.path(), name, "line\n");
        }

        let diff = engine()
            .worktree_diff(repo.path(), DiffFilter::All)
            .await
            .unwrap();
        let alpha = diff.diff.find("alpha.txt").unwrap();
        let beta = diff.diff.find("beta.txt").unwrap();
        let gamma = diff.diff.find("gamma.txt").unwrap();
        assert!(alpha < beta);
        assert!(beta < gamma);
    }

    #[tokio::test]
    async fn test_oversized_untracked_file_gets_placeholder() {
        let repo = testutil::init_repo();
        testutil::write_file(repo.path(), "big.txt", &"x".repeat(64));

        let limits = Limits {
            max_untracked_file_size: 16,
            ..small_limits()
        };
        let diff = engine_with(limits)
            .worktree_diff(repo.path(), DiffFilter::All)
            .await
            .unwrap();
        assert!(diff.diff.contains("File too large"));
        assert!(diff.diff.contains("content not shown"));
        assert!(diff.diff.contains("big.txt"));
        // The real content must not leak into the placeholder.
        assert!(!diff.diff.contains(&"x".repeat(64)));
    }

    #[tokio::test]
    async fn test_binary_untracked_file_gets_placeholder() {
        let repo = testutil::init_repo();
        std::fs::write(repo.path().join("blob.bin"), [0u8, 159, 146, 150, 0, 7]).unwrap();

        let diff = engine()
            .worktree_diff(repo.path(), DiffFilter::All)
            .await
            .unwrap();
        assert!(diff.diff.contains("Binary file"));
        assert!(diff.diff.contains("blob.bin"));
        assert_eq!(diff.untracked_total, 1);
        assert_eq!(diff.untracked_processed, 1);
    }

    #[tokio::test]
    async fn test_vanished_file_is_skipped_not_fatal() {
        let repo = testutil::init_repo();
        testutil::write_file(repo.path(), "present.txt", "still here\n");

        // A file that disappeared between listing and processing: it
        // still counts toward the totals but contributes no text, and
        // the batch completes.
        let listing = vec!["present.txt".to_string(), "vanished.txt".to_string()];
        let (block, total, processed, capped) = engine()
            .untracked_diff_blocks(repo.path(), &listing)
            .await;
        assert!(block.contains("present.txt"));
        assert!(!block.contains("vanished.txt"));
        assert_eq!(total, 2);
        assert_eq!(processed, 2);
        assert!(!capped);
    }

    #[tokio::test]
    async fn test_changes_only_call_also_lists_once() {
        let repo = testutil::init_repo();
        testutil::write_file(repo.path(), "new.txt", "n\n");

        let log = CommandLog::new();
        let scope = engine().with_command_log(log.clone());
        let changes = scope
            .worktree_changes(repo.path(), DiffFilter::All)
            .await
            .unwrap();
        assert_eq!(changes.untracked, vec!["new.txt".to_string()]);
        assert_eq!(log.count_subcommand("ls-files"), 1);
    }
}
