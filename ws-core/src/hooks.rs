use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::config::WsConfigSnapshot;
use crate::model::{NewWorkspace, Workspace, WorkspacePatch};
use crate::service::{FindQuery, ServiceMethodKind, WorkspaceService};
use crate::tenant::TenantContext;

/// What a service call produced.
#[derive(Debug, Clone)]
pub enum HookResult {
    One(Workspace),
    Many(Vec<Workspace>),
}

/// Context passed to hooks.
///
/// Before hooks may rewrite `create` / `patch`; after hooks see `result`.
pub struct HookContext {
    pub tenant: TenantContext,
    pub method: ServiceMethodKind,
    pub id: Option<String>,
    pub query: FindQuery,
    pub create: Option<NewWorkspace>,
    pub patch: Option<WorkspacePatch>,
    pub result: Option<HookResult>,
    pub config: WsConfigSnapshot,
    pub service: Arc<dyn WorkspaceService>,
    existing: Option<Workspace>,
}

impl HookContext {
    pub fn new(
        tenant: TenantContext,
        method: ServiceMethodKind,
        service: Arc<dyn WorkspaceService>,
        config: WsConfigSnapshot,
    ) -> Self {
        Self {
            tenant,
            method,
            id: None,
            query: FindQuery::default(),
            create: None,
            patch: None,
            result: None,
            config,
            service,
            existing: None,
        }
    }

    /// The stored record targeted by a get/patch/remove, loaded once per call.
    pub async fn existing(&mut self) -> Result<&Workspace> {
        if self.existing.is_none() {
            let id = self
                .id
                .clone()
                .ok_or_else(|| anyhow!("{} has no target id", self.method.as_str()))?;
            let ws = self.service.get(&self.tenant, &id).await?;
            self.existing = Some(ws);
        }
        self.existing
            .as_ref()
            .ok_or_else(|| anyhow!("existing record not loaded"))
    }
}

#[async_trait::async_trait]
pub trait BeforeHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

#[async_trait::async_trait]
pub trait AfterHook: Send + Sync {
    async fn run(&self, ctx: &mut HookContext) -> Result<()>;
}

/// Hooks registered on the workspace service, run in registration order.
#[derive(Default)]
pub struct ServiceHooks {
    before_by_method: HashMap<ServiceMethodKind, Vec<Arc<dyn BeforeHook>>>,
    after_all: Vec<Arc<dyn AfterHook>>,
}

impl ServiceHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_create(&mut self, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before(ServiceMethodKind::Create, hook)
    }

    pub fn before_patch(&mut self, hook: Arc<dyn BeforeHook>) -> &mut Self {
        self.before(ServiceMethodKind::Patch, hook)
    }

    pub fn after_all(&mut self, hook: Arc<dyn AfterHook>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub(crate) fn collect_before(&self, method: ServiceMethodKind) -> Vec<Arc<dyn BeforeHook>> {
        self.before_by_method.get(&method).cloned().unwrap_or_default()
    }

    /// After-hooks apply to every method.
    pub(crate) fn collect_after(&self) -> Vec<Arc<dyn AfterHook>> {
        self.after_all.clone()
    }
}
