use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use ws_core::{Acl, Role, Workspace};

use crate::error::{HarnessError, HarnessResult};
use crate::lifecycle::WorkspaceLifecycleManager;

/// The fields a check cares about; `None` means "not compared".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedWorkspace {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub features: Option<BTreeSet<String>>,
    /// Compared role by role, all four roles.
    pub permissions: Option<Acl>,
}

impl ExpectedWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn permissions(mut self, acl: Acl) -> Self {
        self.permissions = Some(acl);
        self
    }

    /// Expect `users` (and only them) in `role`.
    pub fn role<I, S>(mut self, role: Role, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let acl = self.permissions.get_or_insert_with(Acl::new);
        let set = acl.users_mut(role);
        set.clear();
        set.extend(users.into_iter().map(Into::into));
        self
    }
}

/// How owner grants on `write` / `library_write` are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerGrantMode {
    /// Expected and actual sets must be equal.
    #[default]
    Exact,
    /// Actual may also equal expected ∪ {owner}.
    AllowOwnerSuperset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Every difference found in one comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionReport {
    pub workspace_id: String,
    pub mismatches: Vec<Mismatch>,
}

impl AssertionReport {
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.mismatches.iter().map(|m| m.field.as_str()).collect()
    }

    pub fn into_result(self) -> HarnessResult<()> {
        if self.is_match() {
            Ok(())
        } else {
            Err(HarnessError::Assertion(self))
        }
    }
}

impl fmt::Display for AssertionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "workspace {} differs in {} field(s)",
            self.workspace_id,
            self.mismatches.len()
        )?;
        for m in &self.mismatches {
            write!(f, "; {m}")?;
        }
        Ok(())
    }
}

fn show_set(set: &BTreeSet<String>) -> String {
    format!("{:?}", set.iter().collect::<Vec<_>>())
}

/// Diffs stored workspaces against expected projections.
#[derive(Clone)]
pub struct StateAssertionEngine {
    manager: Arc<WorkspaceLifecycleManager>,
    mode: OwnerGrantMode,
}

impl StateAssertionEngine {
    pub fn new(manager: Arc<WorkspaceLifecycleManager>) -> Self {
        Self {
            manager,
            mode: OwnerGrantMode::Exact,
        }
    }

    pub fn with_mode(mut self, mode: OwnerGrantMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> OwnerGrantMode {
        self.mode
    }

    pub fn manager(&self) -> &Arc<WorkspaceLifecycleManager> {
        &self.manager
    }

    /// Pure comparison; the expected side is taken as given.
    pub fn diff(&self, actual: &Workspace, expected: &ExpectedWorkspace) -> AssertionReport {
        let mut mismatches = Vec::new();
        let mut scalar = |field: &str, want: &Option<String>, got: Option<&str>| {
            if let Some(want) = want {
                if Some(want.as_str()) != got {
                    mismatches.push(Mismatch {
                        field: field.to_string(),
                        expected: format!("{want:?}"),
                        actual: format!("{got:?}"),
                    });
                }
            }
        };

        scalar("name", &expected.name, Some(actual.name.as_str()));
        scalar("description", &expected.description, Some(actual.description.as_str()));
        scalar("color", &expected.color, actual.color.as_deref());

        if let Some(want) = &expected.features {
            if want != &actual.features {
                mismatches.push(Mismatch {
                    field: "features".to_string(),
                    expected: show_set(want),
                    actual: show_set(&actual.features),
                });
            }
        }

        if let Some(want) = &expected.permissions {
            for role in Role::ALL {
                let want_users = want.users(role);
                let got_users = actual.permissions.users(role);
                if !self.role_matches(role, want_users, got_users, &actual.owner) {
                    mismatches.push(Mismatch {
                        field: format!("permissions.{role}"),
                        expected: show_set(want_users),
                        actual: show_set(got_users),
                    });
                }
            }
        }

        AssertionReport {
            workspace_id: actual.id.clone(),
            mismatches,
        }
    }

    fn role_matches(
        &self,
        role: Role,
        want: &BTreeSet<String>,
        got: &BTreeSet<String>,
        owner: &str,
    ) -> bool {
        if want == got {
            return true;
        }
        if self.mode == OwnerGrantMode::AllowOwnerSuperset && Role::OWNER.contains(&role) {
            let mut with_owner = want.clone();
            with_owner.insert(owner.to_string());
            return &with_owner == got;
        }
        false
    }

    /// Fetch `id` and compare; returns the record on a match.
    #[instrument(skip(self, expected))]
    pub async fn assert_matches(&self, id: &str, expected: &ExpectedWorkspace) -> HarnessResult<Workspace> {
        let actual = self.manager.fetch(id).await?;
        let report = self.diff(&actual, expected);
        debug!(mismatches = report.mismatches.len(), "state compared");
        report.into_result()?;
        Ok(actual)
    }
}
