use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::config::{WsConfig, WsConfigSnapshot};
use crate::hooks::{HookContext, HookResult, ServiceHooks};
use crate::model::{NewWorkspace, Workspace, WorkspacePatch};
use crate::service::{FindQuery, ServiceCapabilities, ServiceMethodKind, WorkspaceService};
use crate::tenant::TenantContext;

struct WorkspaceAppInner {
    service: Arc<dyn WorkspaceService>,
    hooks: RwLock<ServiceHooks>,
    config: RwLock<WsConfig>,
}

/// Application container for the workspace service.
///
/// Transport-agnostic. Holds:
/// - the service
/// - its hooks
/// - config
///
/// Every call runs `before hooks → service → after hooks`.
pub struct WorkspaceApp {
    inner: Arc<WorkspaceAppInner>,
}

impl Clone for WorkspaceApp {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl WorkspaceApp {
    pub fn new(service: Arc<dyn WorkspaceService>) -> Self {
        Self {
            inner: Arc::new(WorkspaceAppInner {
                service,
                hooks: RwLock::new(ServiceHooks::new()),
                config: RwLock::new(WsConfig::new()),
            }),
        }
    }

    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks),
    {
        let mut hooks = self.inner.hooks.write();
        f(&mut hooks);
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn config_get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    /// Merge `PREFIX`-ed environment variables into the config.
    pub fn load_env(&self, prefix: &str) -> usize {
        self.inner.config.write().load_env(prefix)
    }

    pub fn config_snapshot(&self) -> WsConfigSnapshot {
        self.inner.config.read().snapshot()
    }

    pub fn capabilities(&self) -> ServiceCapabilities {
        self.inner.service.capabilities()
    }

    fn context(&self, tenant: TenantContext, method: ServiceMethodKind) -> Result<HookContext> {
        if !self.capabilities().allows(method) {
            crate::bail_ws!(method_not_allowed, "Method not allowed: {}", method.as_str());
        }
        Ok(HookContext::new(
            tenant,
            method,
            Arc::clone(&self.inner.service),
            self.config_snapshot(),
        ))
    }

    async fn call_service(ctx: &mut HookContext) -> Result<()> {
        let svc = Arc::clone(&ctx.service);
        let result = match ctx.method {
            ServiceMethodKind::Find => HookResult::Many(svc.find(&ctx.tenant, ctx.query.clone()).await?),
            ServiceMethodKind::Get => {
                let id = ctx.id.clone().ok_or_else(|| anyhow!("get() requires an id"))?;
                HookResult::One(svc.get(&ctx.tenant, &id).await?)
            }
            ServiceMethodKind::Create => {
                let data = ctx
                    .create
                    .take()
                    .ok_or_else(|| anyhow!("create() requires data"))?;
                HookResult::One(svc.create(&ctx.tenant, data).await?)
            }
            ServiceMethodKind::Patch => {
                let id = ctx.id.clone().ok_or_else(|| anyhow!("patch() requires an id"))?;
                let data = ctx
                    .patch
                    .take()
                    .ok_or_else(|| anyhow!("patch() requires data"))?;
                HookResult::One(svc.patch(&ctx.tenant, &id, data).await?)
            }
            ServiceMethodKind::Remove => {
                let id = ctx.id.clone().ok_or_else(|| anyhow!("remove() requires an id"))?;
                HookResult::One(svc.remove(&ctx.tenant, &id).await?)
            }
        };
        ctx.result = Some(result);
        Ok(())
    }

    async fn run_pipeline(&self, mut ctx: HookContext) -> Result<HookResult> {
        let (before, after) = {
            let hooks = self.inner.hooks.read();
            (hooks.collect_before(ctx.method), hooks.collect_after())
        };

        for h in &before {
            h.run(&mut ctx).await?;
        }

        Self::call_service(&mut ctx).await?;

        for h in &after {
            h.run(&mut ctx).await?;
        }

        debug!(method = ctx.method.as_str(), "workspace call completed");
        ctx.result
            .take()
            .ok_or_else(|| anyhow!("{}() produced no result", ctx.method.as_str()))
    }

    fn one(method: ServiceMethodKind, res: HookResult) -> Result<Workspace> {
        match res {
            HookResult::One(v) => Ok(v),
            HookResult::Many(_) => Err(anyhow!("{}() produced many results unexpectedly", method.as_str())),
        }
    }

    #[instrument(skip(self, tenant), fields(tenant = %tenant.tenant()))]
    pub async fn find(&self, tenant: TenantContext, query: FindQuery) -> Result<Vec<Workspace>> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Find)?;
        ctx.query = query;

        match self.run_pipeline(ctx).await? {
            HookResult::Many(v) => Ok(v),
            HookResult::One(v) => Ok(vec![v]),
        }
    }

    #[instrument(skip(self, tenant), fields(tenant = %tenant.tenant()))]
    pub async fn get(&self, tenant: TenantContext, id: &str) -> Result<Workspace> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Get)?;
        ctx.id = Some(id.to_string());
        Self::one(ServiceMethodKind::Get, self.run_pipeline(ctx).await?)
    }

    #[instrument(skip(self, tenant, data), fields(tenant = %tenant.tenant(), name = %data.name))]
    pub async fn create(&self, tenant: TenantContext, data: NewWorkspace) -> Result<Workspace> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Create)?;
        ctx.create = Some(data);
        Self::one(ServiceMethodKind::Create, self.run_pipeline(ctx).await?)
    }

    #[instrument(skip(self, tenant, data), fields(tenant = %tenant.tenant()))]
    pub async fn patch(&self, tenant: TenantContext, id: &str, data: WorkspacePatch) -> Result<Workspace> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Patch)?;
        ctx.id = Some(id.to_string());
        ctx.patch = Some(data);
        Self::one(ServiceMethodKind::Patch, self.run_pipeline(ctx).await?)
    }

    #[instrument(skip(self, tenant), fields(tenant = %tenant.tenant()))]
    pub async fn remove(&self, tenant: TenantContext, id: &str) -> Result<Workspace> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Remove)?;
        ctx.id = Some(id.to_string());
        Self::one(ServiceMethodKind::Remove, self.run_pipeline(ctx).await?)
    }
}
