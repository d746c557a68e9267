use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{diff, log, refs, serve, show, status};

#[derive(Parser)]
#[command(name = "gitscope")]
#[command(version, about = "Repository introspection for review workflows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API over one or more repositories
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port override for the listen address
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show commit history
    Log {
        /// Ref to walk (defaults to the current head)
        #[arg(short, long)]
        r#ref: Option<String>,

        /// Number of commits to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Repository path (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// Show working-tree status
    Status {
        /// Phase filter: all, staged, or unstaged
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Repository path (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// Show the working-tree diff
    Diff {
        /// Phase filter: all, staged, or unstaged
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Repository path (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// Show one commit: changed files plus its diff
    Show {
        /// Commit SHA (4 to 40 hex characters)
        sha: String,

        /// Repository path (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// List branches
    Branches {
        /// Repository path (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },

    /// List tags
    Tags {
        /// Repository path (defaults to the current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port } => serve::run(config, port).await,
        Commands::Log { r#ref, limit, repo } => log::run(r#ref, limit, repo).await,
        Commands::Status { filter, repo } => status::run(&filter, repo).await,
        Commands::Diff { filter, repo } => diff::run(&filter, repo).await,
        Commands::Show { sha, repo } => show::run(&sha, repo).await,
        Commands::Branches { repo } => refs::branches(repo).await,
        Commands::Tags { repo } => refs::tags(repo).await,
    }
}
