use anyhow::Result;
use async_trait::async_trait;

use crate::errors::WsError;
use crate::model::{NewWorkspace, Workspace, WorkspacePatch};
use crate::tenant::TenantContext;

/// Service methods exposed by the workspace API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Patch,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// Which methods a service wants reachable from outside (HTTP, harness).
///
/// `ws-axum` answers `405 MethodNotAllowed` for anything not listed.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Patch, Remove],
        }
    }

    /// Lookups only.
    pub fn read_only() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get],
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }
}

/// Filters accepted by `find`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    /// Exact name match.
    pub name: Option<String>,
}

impl FindQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }
}

fn not_implemented(method: ServiceMethodKind) -> anyhow::Error {
    WsError::method_not_allowed(format!("Method not implemented: {}", method.as_str())).into_anyhow()
}

/// The workspace service:
///
/// - `find`   → list workspaces of the tenant
/// - `get`    → fetch one by id
/// - `create` → create one, owner = calling user
/// - `patch`  → partial merge
/// - `remove` → delete one
///
/// Defaults answer "not implemented" so a service overrides only what it supports.
#[async_trait]
pub trait WorkspaceService: Send + Sync {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::standard_crud()
    }

    async fn find(&self, _ctx: &TenantContext, _query: FindQuery) -> Result<Vec<Workspace>> {
        Err(not_implemented(ServiceMethodKind::Find))
    }

    async fn get(&self, _ctx: &TenantContext, _id: &str) -> Result<Workspace> {
        Err(not_implemented(ServiceMethodKind::Get))
    }

    async fn create(&self, _ctx: &TenantContext, _data: NewWorkspace) -> Result<Workspace> {
        Err(not_implemented(ServiceMethodKind::Create))
    }

    async fn patch(&self, _ctx: &TenantContext, _id: &str, _data: WorkspacePatch) -> Result<Workspace> {
        Err(not_implemented(ServiceMethodKind::Patch))
    }

    async fn remove(&self, _ctx: &TenantContext, _id: &str) -> Result<Workspace> {
        Err(not_implemented(ServiceMethodKind::Remove))
    }
}
