use ws_core::WorkspaceApp;

#[derive(Clone)]
pub struct WsAxumState {
    pub app: WorkspaceApp,
}

impl WsAxumState {
    pub fn new(app: WorkspaceApp) -> Self {
        Self { app }
    }
}
