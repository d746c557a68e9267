use anyhow::Result;
use colored::Colorize;
use gitscope_core::{ChangedFile, FileStatus};
use std::path::PathBuf;

pub async fn run(filter: &str, repo: Option<PathBuf>) -> Result<()> {
    let root = super::repo_root(repo)?;
    let filter = super::parse_filter(filter)?;
    let engine = super::engine();

    let branch = engine.current_branch(&root).await;
    let changes = engine.worktree_changes(&root, filter).await?;

    println!("{}", "Working Tree Status".bold().cyan());
    println!("  {}: {}", "Root".bold(), root.display());
    match branch {
        Some(name) => println!("  {}: {}", "Branch".bold(), name.green()),
        None => println!("  {}: {}", "Branch".bold(), "(detached HEAD)".dimmed()),
    }
    println!();

    if changes.staged.is_empty() && changes.unstaged.is_empty() && changes.untracked.is_empty() {
        println!("{}", "Nothing to review: working tree clean".green());
        return Ok(());
    }

    print_phase("Staged changes", &changes.staged);
    print_phase("Unstaged changes", &changes.unstaged);

    if !changes.untracked.is_empty() {
        println!(
            "{} {}",
            "Untracked files:".bold(),
            format!("({})", changes.untracked.len()).yellow()
        );
        for path in &changes.untracked {
            println!("  {} {}", "?".bright_black(), path);
        }
        println!();
    }

    Ok(())
}

fn print_phase(label: &str, files: &[ChangedFile]) {
    if files.is_empty() {
        return;
    }
    println!(
        "{} {}",
        format!("{label}:").bold(),
        format!("({})", files.len()).yellow()
    );
    for file in files {
        let icon = match file.status {
            FileStatus::Added => "+".green(),
            FileStatus::Modified => "~".yellow(),
            FileStatus::Deleted => "-".red(),
            FileStatus::Renamed => ">".blue(),
            FileStatus::Copied => "=".blue(),
        };
        let counts = format!("+{} -{}", file.additions, file.deletions);
        match &file.old_path {
            Some(old) => println!("  {} {} -> {} {}", icon, old, file.path, counts.dimmed()),
            None => println!("  {} {} {}", icon, file.path, counts.dimmed()),
        }
    }
    println!();
}
