//! Workspace records, payloads and the per-role access-control list.
//!
//! Wire format follows the dashboard API: camelCase fields, and permissions
//! shaped as `{"write": {"users": ["alice"]}}`.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder user id resolved server-side to the calling user.
pub const ME_ALIAS: &str = "%me%";

/// Prefix shared by every use-case feature tag.
pub const USE_CASE_PREFIX: &str = "use-case-";

pub const FEATURE_OVERVIEW: &str = "workspace_overview";
pub const FEATURE_UPDATE: &str = "workspace_update";

/// Whether a feature flag is a use-case tag.
pub fn is_use_case(feature: &str) -> bool {
    feature.starts_with(USE_CASE_PREFIX) && feature.len() > USE_CASE_PREFIX.len()
}

/// `observability` -> `use-case-observability`
pub fn use_case_tag(use_case: &str) -> String {
    format!("{USE_CASE_PREFIX}{use_case}")
}

/// All use-case tags present in a feature set.
pub fn use_cases(features: &BTreeSet<String>) -> impl Iterator<Item = &str> {
    features.iter().map(|f| f.as_str()).filter(|f| is_use_case(f))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Read,
    Write,
    LibraryRead,
    LibraryWrite,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Read, Role::Write, Role::LibraryRead, Role::LibraryWrite];

    /// Roles the owner can never lose.
    pub const OWNER: [Role; 2] = [Role::Write, Role::LibraryWrite];

    /// Roles granted by the "add user" action when no role is picked.
    pub const DEFAULT_GRANT: [Role; 2] = [Role::Read, Role::LibraryRead];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::Write => "write",
            Role::LibraryRead => "library_read",
            Role::LibraryWrite => "library_write",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principals holding one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grantees {
    #[serde(default)]
    pub users: BTreeSet<String>,
}

impl Grantees {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Per-role user sets. Ordered sets keep every derived value deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    #[serde(default, skip_serializing_if = "Grantees::is_empty")]
    pub read: Grantees,
    #[serde(default, skip_serializing_if = "Grantees::is_empty")]
    pub write: Grantees,
    #[serde(default, skip_serializing_if = "Grantees::is_empty")]
    pub library_read: Grantees,
    #[serde(default, skip_serializing_if = "Grantees::is_empty")]
    pub library_write: Grantees,
}

impl Acl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Acl::grant`].
    pub fn with(mut self, role: Role, user: impl Into<String>) -> Self {
        self.grant(role, user);
        self
    }

    pub fn users(&self, role: Role) -> &BTreeSet<String> {
        match role {
            Role::Read => &self.read.users,
            Role::Write => &self.write.users,
            Role::LibraryRead => &self.library_read.users,
            Role::LibraryWrite => &self.library_write.users,
        }
    }

    pub fn users_mut(&mut self, role: Role) -> &mut BTreeSet<String> {
        match role {
            Role::Read => &mut self.read.users,
            Role::Write => &mut self.write.users,
            Role::LibraryRead => &mut self.library_read.users,
            Role::LibraryWrite => &mut self.library_write.users,
        }
    }

    /// Returns true if the grant was new.
    pub fn grant(&mut self, role: Role, user: impl Into<String>) -> bool {
        self.users_mut(role).insert(user.into())
    }

    /// Returns true if the grant existed.
    pub fn revoke(&mut self, role: Role, user: &str) -> bool {
        self.users_mut(role).remove(user)
    }

    pub fn has(&self, role: Role, user: &str) -> bool {
        self.users(role).contains(user)
    }

    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|r| self.users(*r).is_empty())
    }

    /// Replace every occurrence of `alias` by `user`.
    pub fn resolve_alias(&mut self, alias: &str, user: &str) {
        for role in Role::ALL {
            let users = self.users_mut(role);
            if users.remove(alias) {
                users.insert(user.to_string());
            }
        }
    }
}

/// Stored workspace record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub permissions: Acl,
    pub owner: String,
    pub revision: u64,
    pub last_updated_time: DateTime<Utc>,
}

impl Workspace {
    pub fn use_case(&self) -> Option<&str> {
        use_cases(&self.features).next()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    #[serde(default)]
    pub permissions: Acl,
}

/// Body of `POST /api/workspaces`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkspace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub settings: WorkspaceSettings,
}

impl NewWorkspace {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn grant(mut self, role: Role, user: impl Into<String>) -> Self {
        self.settings.permissions.grant(role, user);
        self
    }
}

/// Response of `POST /api/workspaces`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedWorkspace {
    pub id: String,
}

/// Body of `PUT /api/workspaces/{id}`: a partial merge, absent fields untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Acl>,
}

impl WorkspacePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.features.is_none()
            && self.permissions.is_none()
    }

    /// Merge into `workspace`; returns whether anything changed.
    pub fn apply_to(&self, workspace: &mut Workspace) -> bool {
        let before = workspace.clone();

        if let Some(name) = &self.name {
            workspace.name = name.clone();
        }
        if let Some(description) = &self.description {
            workspace.description = description.clone();
        }
        if let Some(color) = &self.color {
            workspace.color = Some(color.clone());
        }
        if let Some(features) = &self.features {
            workspace.features = features.clone();
        }
        if let Some(permissions) = &self.permissions {
            workspace.permissions = permissions.clone();
        }

        *workspace != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn acl_wire_shape_matches_dashboard_api() {
        let acl = Acl::new()
            .with(Role::Write, "alice")
            .with(Role::LibraryWrite, "alice");

        let value = serde_json::to_value(&acl).unwrap();
        assert_eq!(
            value,
            json!({"write": {"users": ["alice"]}, "library_write": {"users": ["alice"]}})
        );

        let back: Acl = serde_json::from_value(value).unwrap();
        assert_eq!(back, acl);
    }

    #[test]
    fn resolve_alias_rewrites_every_role() {
        let mut acl = Acl::new().with(Role::Write, ME_ALIAS).with(Role::Read, "bob");
        acl.resolve_alias(ME_ALIAS, "alice");
        assert!(acl.has(Role::Write, "alice"));
        assert!(!acl.has(Role::Write, ME_ALIAS));
        assert!(acl.has(Role::Read, "bob"));
    }

    #[test]
    fn use_case_detection_requires_a_suffix() {
        assert!(is_use_case("use-case-observability"));
        assert!(!is_use_case("use-case-"));
        assert!(!is_use_case(FEATURE_OVERVIEW));
    }

    #[test]
    fn patch_merge_leaves_absent_fields() {
        let mut ws = Workspace {
            id: "w1".into(),
            name: "one".into(),
            description: "old".into(),
            color: None,
            features: [FEATURE_OVERVIEW.to_string()].into(),
            permissions: Acl::new(),
            owner: "alice".into(),
            revision: 1,
            last_updated_time: Utc::now(),
        };

        let patch = WorkspacePatch {
            description: Some("new".into()),
            ..WorkspacePatch::default()
        };

        assert!(patch.apply_to(&mut ws));
        assert_eq!(ws.name, "one");
        assert_eq!(ws.description, "new");
        assert!(!patch.apply_to(&mut ws));
    }

    #[test]
    fn create_body_reads_nested_settings() {
        let body: NewWorkspace = serde_json::from_value(json!({
            "name": "test_workspace_320sdfouAz",
            "features": ["workspace_overview", "workspace_update", "use-case-observability"],
            "settings": {"permissions": {"write": {"users": ["%me%"]}}}
        }))
        .unwrap();

        assert_eq!(body.features.len(), 3);
        assert!(body.settings.permissions.has(Role::Write, ME_ALIAS));
        assert_eq!(body.description, "");
    }
}
