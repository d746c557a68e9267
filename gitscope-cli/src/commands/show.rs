use anyhow::Result;
use colored::Colorize;
use gitscope_core::FileStatus;
use std::path::PathBuf;

pub async fn run(sha: &str, repo: Option<PathBuf>) -> Result<()> {
    let root = super::repo_root(repo)?;
    let engine = super::engine();

    let (files, diff) = tokio::join!(
        engine.commit_changed_files(&root, sha),
        engine.commit_diff(&root, sha),
    );
    let files = files?;
    let diff = diff?;

    println!("{} {}", "commit".yellow().bold(), sha.yellow());
    println!();

    for file in &files {
        let status = match file.status {
            FileStatus::Added => "NEW".green(),
            FileStatus::Modified => "MOD".yellow(),
            FileStatus::Deleted => "DEL".red(),
            FileStatus::Renamed => "REN".blue(),
            FileStatus::Copied => "CPY".blue(),
        };
        println!(
            "{} {} {}",
            status,
            file.path.white().bold(),
            format!("+{} -{}", file.additions, file.deletions).dimmed()
        );
    }
    println!();

    super::diff::print_colored_diff(&diff);

    Ok(())
}
