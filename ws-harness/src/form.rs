//! The workspace update page, reduced to the primitives a scenario drives.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use ws_core::model::{is_use_case, use_case_tag};
use ws_core::{
    reconcile, validate, FormField, PermissionChange, PermissionDelta, ValidationError, Workspace,
    WorkspaceForm, WorkspacePatch,
};

use crate::client::Ack;
use crate::error::{HarnessError, HarnessResult};
use crate::lifecycle::WorkspaceLifecycleManager;

pub const OVERVIEW_APP: &str = "app/workspace_overview";
pub const UPDATE_APP: &str = "app/workspace_update";

/// `/w/{id}/app/...`
pub fn workspace_url(id: &str, app: &str) -> String {
    format!("/w/{id}/{app}")
}

/// What clicking "update" did.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Violations are shown inline; nothing was sent.
    Blocked(Vec<ValidationError>),
    /// The request is in flight.
    Sent(WorkspacePatch),
}

#[async_trait]
pub trait FormDriver: Send {
    fn fill(&mut self, field: FormField, value: &str);

    /// Empty a field. The color picker always holds a value, so clearing it
    /// restores the stored color.
    fn clear(&mut self, field: FormField);

    /// Select a use case by bare name (`observability`) or full tag.
    fn set_use_case(&mut self, use_case: &str);

    /// Permission panel "add user": read access by default.
    fn add_user(&mut self, user: &str);

    async fn click_update(&mut self) -> HarnessResult<Submission>;

    /// Wait for the response of the in-flight update.
    async fn wait_for_update(&mut self, timeout: Duration) -> HarnessResult<Ack>;

    fn visible_errors(&self) -> Vec<String>;

    fn location(&self) -> String;

    /// Poll until the location ends with `suffix`.
    async fn wait_for_location(&mut self, suffix: &str, timeout: Duration) -> HarnessResult<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let here = self.location();
            if here.ends_with(suffix) {
                return Ok(here);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(HarnessError::timeout(format!("navigation to {suffix}"), timeout));
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

/// In-process update page for one workspace.
///
/// Holds the record it was opened with; a successful update reloads it from
/// the response and navigates to the overview.
pub struct WorkspaceUpdateForm {
    manager: Arc<WorkspaceLifecycleManager>,
    workspace: Workspace,
    fields: WorkspaceForm,
    delta: PermissionDelta,
    errors: Vec<ValidationError>,
    pending: Option<JoinHandle<HarnessResult<Ack>>>,
    location: String,
}

impl WorkspaceUpdateForm {
    /// Load the page for `id`, bounded by `page_load`.
    pub async fn open(
        manager: Arc<WorkspaceLifecycleManager>,
        id: &str,
        page_load: Duration,
    ) -> HarnessResult<Self> {
        let workspace = tokio::time::timeout(page_load, manager.fetch(id))
            .await
            .map_err(|_| HarnessError::timeout("page load", page_load))??;

        debug!(id, name = %workspace.name, "update page loaded");
        Ok(Self {
            manager,
            fields: WorkspaceForm::from(&workspace),
            location: workspace_url(id, UPDATE_APP),
            workspace,
            delta: PermissionDelta::new(),
            errors: Vec::new(),
            pending: None,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn fields(&self) -> &WorkspaceForm {
        &self.fields
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Partial payload for the current field values.
    ///
    /// Features are always sent: the record's non-use-case flags plus the
    /// selected use case. Permissions only when the panel was touched.
    pub fn build_patch(&self) -> WorkspacePatch {
        let ws = &self.workspace;
        let changed = |now: &str, before: &str| (now != before).then(|| now.to_string());

        WorkspacePatch {
            name: changed(&self.fields.name, &ws.name),
            description: changed(&self.fields.description, &ws.description),
            color: if self.fields.color != ws.color {
                self.fields.color.clone()
            } else {
                None
            },
            features: Some(self.fields.features.clone()),
            permissions: (!self.delta.is_empty())
                .then(|| reconcile(&ws.permissions, &self.delta, &ws.owner)),
        }
    }
}

#[async_trait]
impl FormDriver for WorkspaceUpdateForm {
    fn fill(&mut self, field: FormField, value: &str) {
        match field {
            FormField::Name => self.fields.name = value.to_string(),
            FormField::Description => self.fields.description = value.to_string(),
            FormField::Color => self.fields.color = Some(value.to_string()),
            FormField::UseCase => self.set_use_case(value),
        }
    }

    fn clear(&mut self, field: FormField) {
        match field {
            FormField::Name => self.fields.name.clear(),
            FormField::Description => self.fields.description.clear(),
            FormField::Color => self.fields.color = self.workspace.color.clone(),
            FormField::UseCase => self.fields.features.retain(|f| !is_use_case(f)),
        }
    }

    fn set_use_case(&mut self, use_case: &str) {
        let tag = if is_use_case(use_case) {
            use_case.to_string()
        } else {
            use_case_tag(use_case)
        };
        self.fields.features.retain(|f| !is_use_case(f));
        self.fields.features.insert(tag);
    }

    fn add_user(&mut self, user: &str) {
        self.delta.push(PermissionChange::AddUser {
            user: user.to_string(),
        });
    }

    async fn click_update(&mut self) -> HarnessResult<Submission> {
        if self.pending.is_some() {
            return Err(HarnessError::UpdateInFlight);
        }

        let report = validate(&self.fields);
        self.errors = report.violations.clone();
        if !report.is_valid() {
            debug!(errors = ?report.messages(), "update blocked by validation");
            return Ok(Submission::Blocked(report.violations));
        }

        let patch = self.build_patch();
        let manager = Arc::clone(&self.manager);
        let id = self.workspace.id.clone();
        let body = patch.clone();
        self.pending = Some(tokio::spawn(async move { manager.update(&id, &body).await }));

        info!(id = %self.workspace.id, "update submitted");
        Ok(Submission::Sent(patch))
    }

    async fn wait_for_update(&mut self, timeout: Duration) -> HarnessResult<Ack> {
        let mut handle = self.pending.take().ok_or(HarnessError::NothingPending)?;

        let joined = match tokio::time::timeout(timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(HarnessError::timeout("update response", timeout));
            }
        };
        let ack = joined.map_err(|e| HarnessError::transport(None, e.to_string()))??;

        if ack.is_success() {
            if let Some(ws) = ack.workspace.clone() {
                self.fields = WorkspaceForm::from(&ws);
                self.workspace = ws;
            }
            self.delta = PermissionDelta::new();
            self.location = workspace_url(&self.workspace.id, OVERVIEW_APP);
        }
        Ok(ack)
    }

    fn visible_errors(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message().to_string()).collect()
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}
