use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::WsError;
use crate::model::{NewWorkspace, Workspace, WorkspacePatch};
use crate::service::{FindQuery, ServiceCapabilities, WorkspaceService};
use crate::tenant::TenantContext;

type TenantMap = HashMap<String, HashMap<String, Workspace>>;

/// Authoritative, tenant-scoped workspace state held in memory.
///
/// Name uniqueness is checked and the record inserted under one write lock,
/// so two racing creates of the same name can never both succeed.
pub struct MemoryWorkspaceStore {
    by_tenant: RwLock<TenantMap>,
    capabilities: ServiceCapabilities,
}

impl Default for MemoryWorkspaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorkspaceStore {
    pub fn new() -> Self {
        Self::with_capabilities(ServiceCapabilities::standard_crud())
    }

    pub fn with_capabilities(capabilities: ServiceCapabilities) -> Self {
        Self {
            by_tenant: RwLock::new(HashMap::new()),
            capabilities,
        }
    }

    fn not_found(id: &str) -> anyhow::Error {
        WsError::not_found(format!("Workspace not found: {id}")).into_anyhow()
    }

    fn duplicate(name: &str) -> anyhow::Error {
        WsError::conflict(format!("Workspace name already exists: {name}")).into_anyhow()
    }

    fn name_taken(map: &HashMap<String, Workspace>, name: &str, except: Option<&str>) -> bool {
        map.values()
            .any(|ws| ws.name == name && Some(ws.id.as_str()) != except)
    }
}

#[async_trait]
impl WorkspaceService for MemoryWorkspaceStore {
    fn capabilities(&self) -> ServiceCapabilities {
        self.capabilities.clone()
    }

    async fn find(&self, ctx: &TenantContext, query: FindQuery) -> Result<Vec<Workspace>> {
        let by_tenant = self.by_tenant.read().await;
        let mut out: Vec<Workspace> = by_tenant
            .get(ctx.tenant())
            .into_iter()
            .flat_map(|m| m.values())
            .filter(|ws| query.name.as_deref().map_or(true, |n| ws.name == n))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get(&self, ctx: &TenantContext, id: &str) -> Result<Workspace> {
        let by_tenant = self.by_tenant.read().await;
        by_tenant
            .get(ctx.tenant())
            .and_then(|m| m.get(id))
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, ctx: &TenantContext, data: NewWorkspace) -> Result<Workspace> {
        let mut by_tenant = self.by_tenant.write().await;
        let map = by_tenant.entry(ctx.tenant().to_string()).or_default();

        if Self::name_taken(map, &data.name, None) {
            return Err(Self::duplicate(&data.name));
        }

        let ws = Workspace {
            id: Uuid::new_v4().simple().to_string(),
            name: data.name,
            description: data.description,
            color: data.color,
            features: data.features,
            permissions: data.settings.permissions,
            owner: ctx.user().to_string(),
            revision: 1,
            last_updated_time: Utc::now(),
        };

        info!(tenant = ctx.tenant(), id = %ws.id, name = %ws.name, "workspace created");
        map.insert(ws.id.clone(), ws.clone());
        Ok(ws)
    }

    async fn patch(&self, ctx: &TenantContext, id: &str, data: WorkspacePatch) -> Result<Workspace> {
        let mut by_tenant = self.by_tenant.write().await;
        let map = by_tenant.entry(ctx.tenant().to_string()).or_default();

        if !map.contains_key(id) {
            return Err(Self::not_found(id));
        }
        if let Some(name) = data.name.as_deref() {
            if Self::name_taken(map, name, Some(id)) {
                return Err(Self::duplicate(name));
            }
        }

        let ws = map.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        if data.apply_to(ws) {
            ws.revision += 1;
            ws.last_updated_time = Utc::now();
            info!(tenant = ctx.tenant(), id, revision = ws.revision, "workspace updated");
        }
        Ok(ws.clone())
    }

    async fn remove(&self, ctx: &TenantContext, id: &str) -> Result<Workspace> {
        let mut by_tenant = self.by_tenant.write().await;
        let removed = by_tenant
            .get_mut(ctx.tenant())
            .and_then(|m| m.remove(id))
            .ok_or_else(|| Self::not_found(id))?;
        info!(tenant = ctx.tenant(), id, "workspace deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::model::{Acl, Role};

    fn alice() -> TenantContext {
        TenantContext::new("t1", "alice")
    }

    fn kind(err: &anyhow::Error) -> Option<ErrorKind> {
        WsError::find(err).map(|e| e.kind)
    }

    #[tokio::test]
    async fn create_sets_owner_and_first_revision() {
        let store = MemoryWorkspaceStore::new();
        let ws = store.create(&alice(), NewWorkspace::named("alpha")).await.unwrap();

        assert_eq!(ws.owner, "alice");
        assert_eq!(ws.revision, 1);
        assert_eq!(store.get(&alice(), &ws.id).await.unwrap(), ws);
    }

    #[tokio::test]
    async fn duplicate_names_conflict_within_a_tenant_only() {
        let store = MemoryWorkspaceStore::new();
        store.create(&alice(), NewWorkspace::named("alpha")).await.unwrap();

        let err = store.create(&alice(), NewWorkspace::named("alpha")).await.unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::Conflict));

        let other = TenantContext::new("t2", "alice");
        assert!(store.create(&other, NewWorkspace::named("alpha")).await.is_ok());
    }

    #[tokio::test]
    async fn racing_creates_leave_one_workspace() {
        let store = std::sync::Arc::new(MemoryWorkspaceStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(&alice(), NewWorkspace::named("race")).await.is_ok()
            }));
        }

        let mut created = 0;
        for h in handles {
            if h.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.find(&alice(), FindQuery::by_name("race")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn identical_patch_twice_does_not_bump_revision() {
        let store = MemoryWorkspaceStore::new();
        let ws = store.create(&alice(), NewWorkspace::named("alpha")).await.unwrap();
        let patch = WorkspacePatch {
            description: Some("d.+~!".into()),
            color: Some("#D36086".into()),
            ..WorkspacePatch::default()
        };

        let once = store.patch(&alice(), &ws.id, patch.clone()).await.unwrap();
        let twice = store.patch(&alice(), &ws.id, patch).await.unwrap();

        assert_eq!(once.revision, 2);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn rename_onto_existing_name_conflicts() {
        let store = MemoryWorkspaceStore::new();
        store.create(&alice(), NewWorkspace::named("alpha")).await.unwrap();
        let beta = store.create(&alice(), NewWorkspace::named("beta")).await.unwrap();

        let patch = WorkspacePatch {
            name: Some("alpha".into()),
            ..WorkspacePatch::default()
        };
        let err = store.patch(&alice(), &beta.id, patch).await.unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::Conflict));

        let keep = WorkspacePatch {
            name: Some("beta".into()),
            permissions: Some(Acl::new().with(Role::Read, "bob")),
            ..WorkspacePatch::default()
        };
        assert!(store.patch(&alice(), &beta.id, keep).await.is_ok());
    }

    #[tokio::test]
    async fn remove_then_get_is_not_found() {
        let store = MemoryWorkspaceStore::new();
        let ws = store.create(&alice(), NewWorkspace::named("alpha")).await.unwrap();

        store.remove(&alice(), &ws.id).await.unwrap();
        let err = store.get(&alice(), &ws.id).await.unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::NotFound));

        let err = store.remove(&alice(), &ws.id).await.unwrap_err();
        assert_eq!(kind(&err), Some(ErrorKind::NotFound));
    }
}
