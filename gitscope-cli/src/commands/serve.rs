use anyhow::Result;
use colored::Colorize;
use gitscope_server::{GitScopeServer, ServerConfig};
use std::path::PathBuf;

pub async fn run(config_path: Option<PathBuf>, port: Option<u16>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ServerConfig::load(&path)?,
        None => {
            let default_path = PathBuf::from("gitscope.toml");
            if default_path.exists() {
                ServerConfig::load(&default_path)?
            } else {
                // No config: serve the current directory as a single project.
                let root = std::env::current_dir()?;
                let id = root
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "default".to_string());
                let mut config = ServerConfig::default();
                config.projects.insert(id, root);
                config
            }
        }
    };

    if let Some(port) = port {
        config.listen_addr.set_port(port);
    }

    println!("{}", "Starting gitscope server".bold().cyan());
    println!("  {}: {}", "Address".bold(), config.listen_addr);
    for (id, root) in &config.projects {
        println!("  {}: {} -> {}", "Project".bold(), id.cyan(), root.display());
    }
    println!();

    GitScopeServer::new(config).serve().await
}
