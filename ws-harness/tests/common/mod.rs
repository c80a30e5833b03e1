#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use ws_core::model::{FEATURE_OVERVIEW, FEATURE_UPDATE, ME_ALIAS};
use ws_core::{NewWorkspace, Role};
use ws_harness::{HarnessConfig, Scenario, WorkspaceLifecycleManager};

pub const ADMIN: &str = "admin";
pub const FIXTURE_NAME: &str = "test_workspace_320sdfouAz";
pub const USE_CASE: &str = "use-case-observability";

/// A fresh in-memory server on an ephemeral port.
pub async fn spawn_server() -> String {
    let ax = ws_axum::build().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        ax.serve(listener).await.unwrap();
    });

    format!("http://{addr}")
}

pub fn config(base_url: &str) -> HarnessConfig {
    HarnessConfig {
        request_timeout: Duration::from_secs(5),
        page_load_timeout: Duration::from_secs(5),
        navigation_timeout: Duration::from_secs(2),
        ..HarnessConfig::default()
    }
    .with_base_url(base_url)
    .with_username(ADMIN)
}

/// The workspace every update scenario starts from.
pub fn fixture(name: &str) -> NewWorkspace {
    NewWorkspace::named(name)
        .with_features([FEATURE_OVERVIEW, FEATURE_UPDATE, USE_CASE])
        .grant(Role::LibraryWrite, ME_ALIAS)
        .grant(Role::Write, ME_ALIAS)
}

pub struct Harness {
    pub config: HarnessConfig,
    pub manager: Arc<WorkspaceLifecycleManager>,
}

impl Harness {
    pub async fn start() -> Self {
        let base_url = spawn_server().await;
        let config = config(&base_url);
        let manager = Arc::new(WorkspaceLifecycleManager::from_config(&config).unwrap());
        Self { config, manager }
    }

    pub fn scenario(&self, name: &str, workspace: &str) -> Scenario {
        Scenario::new(
            name,
            self.config.clone(),
            Arc::clone(&self.manager),
            fixture(workspace),
        )
    }
}
