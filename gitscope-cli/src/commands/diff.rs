use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

pub async fn run(filter: &str, repo: Option<PathBuf>) -> Result<()> {
    let root = super::repo_root(repo)?;
    let filter = super::parse_filter(filter)?;
    let engine = super::engine();

    let result = engine.worktree_diff(&root, filter).await?;

    if result.diff.is_empty() {
        println!("{}", "No differences".green());
        return Ok(());
    }

    print_colored_diff(&result.diff);

    if result.untracked_diffs_capped {
        println!();
        println!(
            "{}",
            format!(
                "Showing {} of {} untracked files; the rest were skipped",
                result.untracked_processed, result.untracked_total
            )
            .yellow()
        );
    }

    Ok(())
}

pub fn print_colored_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("diff --git") || line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') && !line.starts_with("+++") {
            println!("{}", line.green());
        } else if line.starts_with('-') && !line.starts_with("---") {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}
