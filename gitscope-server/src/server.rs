use std::sync::Arc;

use gitscope_core::{GitScope, Limits};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::ServerConfig;

pub struct GitScopeServer {
    config: ServerConfig,
    engine: Arc<GitScope>,
}

impl GitScopeServer {
    pub fn new(config: ServerConfig) -> Self {
        let engine = Arc::new(GitScope::new(config.registry()));
        Self { config, engine }
    }

    pub fn with_limits(config: ServerConfig, limits: Limits) -> Self {
        let engine = Arc::new(GitScope::with_limits(config.registry(), limits));
        Self { config, engine }
    }

    pub fn engine(&self) -> Arc<GitScope> {
        Arc::clone(&self.engine)
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let state = AppState {
            engine: self.engine,
        };

        let app = create_router(state).layer(CorsLayer::permissive());

        info!("Server listening on {}", self.config.listen_addr);
        for id in self.config.projects.keys() {
            info!("Serving project: {}", id);
        }

        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
