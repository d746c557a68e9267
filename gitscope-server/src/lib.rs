//! # gitscope-server
//!
//! HTTP transport over the gitscope engine: per-project routes for
//! commits, refs, diffs, and working-tree state, with domain errors
//! mapped to status codes (Validation → 400, NotFound → 404, IO → 500).

pub mod api;
pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::GitScopeServer;
