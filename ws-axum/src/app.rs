use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use ws_core::WorkspaceApp;

use crate::rest;
use crate::WsAxumState;

pub struct WsAxumApp {
    pub app: WorkspaceApp,
    pub router: Router<()>,
}

impl Clone for WsAxumApp {
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            router: self.router.clone(),
        }
    }
}

impl WsAxumApp {
    pub fn new(app: WorkspaceApp) -> Self {
        Self {
            app,
            router: Router::new(),
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Mount the workspace REST routes under `path`.
    pub fn use_workspaces(self, path: &str) -> Self {
        let router = rest::workspace_router(WsAxumState::new(self.app.clone()));
        self.use_router(path, router)
    }

    /// Trace spans plus `x-request-id`: kept when the caller sent one,
    /// generated otherwise, and echoed on every response.
    pub fn with_http_layers(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener (tests bind `127.0.0.1:0`).
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        tracing::info!(addr = ?listener.local_addr().ok(), "workspace server listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn axum(app: WorkspaceApp) -> WsAxumApp {
    WsAxumApp::new(app)
}
