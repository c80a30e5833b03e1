//! ws-axum: Axum adapter for the workspace service.
//!
//! Exposes the workspace app as `/api/workspaces` and maps `WsError` to
//! Feathers-style JSON responses.

pub mod app;
pub mod hooks;
pub mod params;
pub mod rest;
pub mod state;
mod error;

use std::sync::Arc;

use anyhow::Result;
use ws_core::{MemoryWorkspaceStore, WorkspaceApp, WorkspaceService};

pub use app::{axum, WsAxumApp};
pub use error::WsAxumError;
pub use state::WsAxumState;

pub const WORKSPACES_PATH: &str = "/api/workspaces";

/// Env prefix for server config: `WS__HTTP__PORT` → `http.port`.
pub const ENV_PREFIX: &str = "WS__";

/// Router over an arbitrary service; server-side hooks are registered.
pub fn build_with(service: Arc<dyn WorkspaceService>) -> Result<WsAxumApp> {
    let app = WorkspaceApp::new(service);
    app.set("http.host", "127.0.0.1");
    app.set("http.port", "3030");

    ws_core::workspace_hooks::register(&app);
    hooks::global_hooks(&app);

    let ax = axum(app)
        .use_workspaces(WORKSPACES_PATH)
        .use_get("/health", || async { "ok" })
        .with_http_layers();

    Ok(ax)
}

/// The default server: an empty in-memory store.
pub fn build() -> Result<WsAxumApp> {
    build_with(Arc::new(MemoryWorkspaceStore::new()))
}
