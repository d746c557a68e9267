//! Server configuration: listen address plus the project registry.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use gitscope_core::ProjectRegistry;
use serde::Deserialize;

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:3030".parse().expect("valid default address")
}

/// TOML server configuration.
///
/// ```toml
/// listen_addr = "127.0.0.1:3030"
///
/// [projects]
/// backend = "/srv/repos/backend"
/// frontend = "/srv/repos/frontend"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default)]
    pub projects: HashMap<String, PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            projects: HashMap::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    pub fn registry(&self) -> ProjectRegistry {
        self.projects
            .iter()
            .map(|(id, root)| (id.clone(), root.clone()))
            .collect()
    }
}
