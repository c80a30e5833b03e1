use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use ws_core::{NewWorkspace, Workspace, WorkspacePatch};

use crate::client::{Ack, HttpWorkspaceApi, WorkspaceApi};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// Where a workspace is in `NonExistent -> Created -> {Updated}* -> Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkspaceState {
    NonExistent,
    Created,
    Updated,
    Deleted,
}

/// Create, update and delete workspaces, one awaited request at a time.
///
/// Tracks the state of every workspace it touched so an update after
/// delete fails locally, and counts the requests it issued.
pub struct WorkspaceLifecycleManager {
    api: Arc<dyn WorkspaceApi>,
    request_timeout: Duration,
    states: Mutex<HashMap<String, WorkspaceState>>,
    requests: AtomicUsize,
}

impl WorkspaceLifecycleManager {
    pub fn new(api: Arc<dyn WorkspaceApi>, request_timeout: Duration) -> Self {
        Self {
            api,
            request_timeout,
            states: Mutex::new(HashMap::new()),
            requests: AtomicUsize::new(0),
        }
    }

    /// HTTP-backed manager for the configured server.
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let api = HttpWorkspaceApi::new(config)?;
        Ok(Self::new(Arc::new(api), config.request_timeout))
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Requests sent so far, successful or not.
    pub fn requests_issued(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn state(&self, id: &str) -> WorkspaceState {
        self.states
            .lock()
            .get(id)
            .copied()
            .unwrap_or(WorkspaceState::NonExistent)
    }

    fn transition(&self, id: &str, to: WorkspaceState) {
        let from = self.states.lock().insert(id.to_string(), to);
        debug!(id, ?from, ?to, "workspace state");
    }

    async fn call<T, F>(&self, op: &str, fut: F) -> HarnessResult<T>
    where
        F: Future<Output = HarnessResult<T>>,
    {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(res) => res,
            Err(_) => {
                warn!(op, after = ?self.request_timeout, "workspace request timed out");
                Err(HarnessError::timeout(op, self.request_timeout))
            }
        }
    }

    /// Create after checking the name is free.
    ///
    /// The server re-checks atomically, so a racing create still surfaces
    /// as `DuplicateName`.
    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create(&self, data: NewWorkspace) -> HarnessResult<String> {
        let existing = self.find_by_name(&data.name).await?;
        if !existing.is_empty() {
            return Err(HarnessError::DuplicateName(data.name));
        }

        let id = self.call("create", self.api.create(&data)).await?;
        self.transition(&id, WorkspaceState::Created);
        info!(id = %id, "workspace created");
        Ok(id)
    }

    /// One partial-update request; success only on a 2xx status.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: &WorkspacePatch) -> HarnessResult<Ack> {
        if self.state(id) == WorkspaceState::Deleted {
            return Err(HarnessError::NotFound(id.to_string()));
        }

        let ack = self.call("update", self.api.update(id, patch)).await?;
        if !ack.is_success() {
            return Err(HarnessError::transport(
                Some(ack.status),
                format!("update of {id} was not acknowledged"),
            ));
        }
        self.transition(id, WorkspaceState::Updated);
        Ok(ack)
    }

    /// Delete; a workspace that is already gone is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> HarnessResult<Ack> {
        if self.state(id) == WorkspaceState::Deleted {
            return Ok(Ack::gone());
        }

        let ack = match self.call("delete", self.api.delete(id)).await {
            Err(e) if e.is_not_found() => Ack::gone(),
            other => other?,
        };
        self.transition(id, WorkspaceState::Deleted);
        info!(status = ack.status, "workspace deleted");
        Ok(ack)
    }

    /// Delete every workspace carrying `name`; returns how many were removed.
    #[instrument(skip(self))]
    pub async fn delete_by_name(&self, name: &str) -> HarnessResult<usize> {
        let found = self.find_by_name(name).await?;

        let mut removed = 0;
        for ws in found {
            if self.delete(&ws.id).await?.is_success() {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "stale workspaces removed");
        }
        Ok(removed)
    }

    pub async fn find_by_name(&self, name: &str) -> HarnessResult<Vec<Workspace>> {
        self.call("find by name", self.api.find_by_name(name)).await
    }

    /// Current stored record.
    pub async fn fetch(&self, id: &str) -> HarnessResult<Workspace> {
        if self.state(id) == WorkspaceState::Deleted {
            return Err(HarnessError::NotFound(id.to_string()));
        }
        self.call("fetch", self.api.get(id)).await
    }
}
