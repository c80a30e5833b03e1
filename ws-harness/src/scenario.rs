use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{error, info, warn};
use uuid::Uuid;
use ws_core::NewWorkspace;

use crate::assertion::StateAssertionEngine;
use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::form::WorkspaceUpdateForm;
use crate::lifecycle::WorkspaceLifecycleManager;
use crate::pipeline::UpdatePipeline;

/// `prefix_` plus 12 random hex digits; stays inside the name rules.
pub fn unique_workspace_name(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &suffix[..12])
}

/// State one scenario body works with.
#[derive(Clone)]
pub struct ScenarioContext {
    pub config: HarnessConfig,
    pub manager: Arc<WorkspaceLifecycleManager>,
    pub engine: StateAssertionEngine,
    pub workspace_name: String,
    pub workspace_id: String,
    /// The acting user, who owns the fixture.
    pub owner: String,
}

impl ScenarioContext {
    pub async fn open_form(&self) -> HarnessResult<WorkspaceUpdateForm> {
        WorkspaceUpdateForm::open(
            Arc::clone(&self.manager),
            &self.workspace_id,
            self.config.page_load_timeout,
        )
        .await
    }

    pub fn pipeline(&self) -> UpdatePipeline {
        UpdatePipeline::new(self.engine.clone(), &self.config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome<T> {
    Ran(T),
    Skipped(&'static str),
}

impl<T> ScenarioOutcome<T> {
    pub fn ran(self) -> Option<T> {
        match self {
            Self::Ran(v) => Some(v),
            Self::Skipped(_) => None,
        }
    }
}

/// A fixture workspace plus a body run against it.
///
/// Setup removes leftovers carrying the fixture's name, then creates it.
/// Teardown deletes it whether the body returned an error or panicked.
pub struct Scenario {
    name: String,
    config: HarnessConfig,
    manager: Arc<WorkspaceLifecycleManager>,
    engine: StateAssertionEngine,
    fixture: NewWorkspace,
    needs_permissions: bool,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        config: HarnessConfig,
        manager: Arc<WorkspaceLifecycleManager>,
        fixture: NewWorkspace,
    ) -> Self {
        let engine = StateAssertionEngine::new(Arc::clone(&manager));
        Self {
            name: name.into(),
            config,
            manager,
            engine,
            fixture,
            needs_permissions: false,
        }
    }

    /// Replace the default (exact) assertion engine.
    pub fn with_engine(mut self, engine: StateAssertionEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Skip unless permission checks are enabled.
    pub fn requires_permissions(mut self) -> Self {
        self.needs_permissions = true;
        self
    }

    fn skip_reason(&self) -> Option<&'static str> {
        if !self.config.workspace_enabled {
            return Some("workspace feature disabled");
        }
        if self.needs_permissions && !self.config.permissions_enabled {
            return Some("permission checks disabled");
        }
        None
    }

    async fn setup(&self) -> HarnessResult<ScenarioContext> {
        self.manager.delete_by_name(&self.fixture.name).await?;
        let id = self.manager.create(self.fixture.clone()).await?;

        Ok(ScenarioContext {
            config: self.config.clone(),
            manager: Arc::clone(&self.manager),
            engine: self.engine.clone(),
            workspace_name: self.fixture.name.clone(),
            workspace_id: id,
            owner: self.config.username.clone(),
        })
    }

    /// Setup, body, teardown. The body's error wins over a teardown error;
    /// a body panic resumes after teardown.
    pub async fn run<F, Fut, T>(&self, body: F) -> HarnessResult<ScenarioOutcome<T>>
    where
        F: FnOnce(ScenarioContext) -> Fut,
        Fut: Future<Output = HarnessResult<T>>,
    {
        if let Some(reason) = self.skip_reason() {
            info!(scenario = %self.name, reason, "scenario skipped");
            return Ok(ScenarioOutcome::Skipped(reason));
        }

        info!(scenario = %self.name, workspace = %self.fixture.name, "scenario setup");
        let ctx = self.setup().await?;
        let id = ctx.workspace_id.clone();

        let result = AssertUnwindSafe(body(ctx)).catch_unwind().await;

        let teardown = self.manager.delete(&id).await;
        info!(scenario = %self.name, id = %id, "scenario teardown");

        match result {
            Err(panic) => {
                if let Err(e) = &teardown {
                    warn!(scenario = %self.name, error = %e, "teardown failed after panic");
                }
                std::panic::resume_unwind(panic)
            }
            Ok(Err(e)) => {
                error!(scenario = %self.name, error = %e, "scenario failed");
                if let Err(te) = &teardown {
                    warn!(scenario = %self.name, error = %te, "teardown also failed");
                }
                Err(e)
            }
            Ok(Ok(value)) => {
                teardown?;
                Ok(ScenarioOutcome::Ran(value))
            }
        }
    }
}
