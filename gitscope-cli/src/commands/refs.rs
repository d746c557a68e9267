use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

pub async fn branches(repo: Option<PathBuf>) -> Result<()> {
    let root = super::repo_root(repo)?;
    let branches = super::engine().list_branches(&root).await?;

    if branches.is_empty() {
        println!("{}", "No branches".yellow());
        return Ok(());
    }

    for branch in &branches {
        let marker = if branch.is_current { "*" } else { " " };
        let name = if branch.is_current {
            branch.name.green().bold()
        } else {
            branch.name.normal()
        };
        println!("{} {} {}", marker, name, short_sha(&branch.sha).dimmed());
    }

    Ok(())
}

pub async fn tags(repo: Option<PathBuf>) -> Result<()> {
    let root = super::repo_root(repo)?;
    let tags = super::engine().list_tags(&root).await?;

    if tags.is_empty() {
        println!("{}", "No tags".yellow());
        return Ok(());
    }

    for tag in &tags {
        println!("{} {}", tag.name, short_sha(&tag.sha).dimmed());
    }

    Ok(())
}

fn short_sha(sha: &str) -> &str {
    &sha[..sha.len().min(8)]
}
