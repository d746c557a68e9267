use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

pub async fn run(refname: Option<String>, limit: Option<usize>, repo: Option<PathBuf>) -> Result<()> {
    let root = super::repo_root(repo)?;
    let engine = super::engine();

    let commits = engine
        .list_commits(&root, refname.as_deref(), limit)
        .await?;

    if commits.is_empty() {
        println!("{}", "No commits".yellow());
        return Ok(());
    }

    println!("{}", "Commit History".bold().cyan());
    println!();

    for commit in &commits {
        println!("{} {}", "commit".yellow().bold(), commit.sha.yellow());
        println!(
            "{}: {} <{}>",
            "Author".bold(),
            commit.author,
            commit.author_email
        );
        println!(
            "{}: {}",
            "Date".bold(),
            commit.date.format("%Y-%m-%d %H:%M:%S %z")
        );
        println!();
        println!("    {}", commit.message);
        println!();
    }

    Ok(())
}
