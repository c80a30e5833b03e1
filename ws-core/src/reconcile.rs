//! Permission reconciliation.
//!
//! An update never edits the ACL in place: the caller describes what it
//! wants as a [`PermissionDelta`] and [`reconcile`] computes the resulting
//! ACL, re-adding the owner's write grants afterwards.

use serde::{Deserialize, Serialize};

use crate::model::{Acl, Role};

/// One requested ACL edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PermissionChange {
    Grant { role: Role, user: String },
    Revoke { role: Role, user: String },
    /// The form's "add user" action with no role picked.
    AddUser { user: String },
    /// Drop a user from every role.
    RemoveUser { user: String },
}

/// Ordered list of changes, applied first to last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionDelta(pub Vec<PermissionChange>);

impl PermissionDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, change: PermissionChange) {
        self.0.push(change);
    }

    pub fn grant(mut self, role: Role, user: impl Into<String>) -> Self {
        self.push(PermissionChange::Grant { role, user: user.into() });
        self
    }

    pub fn revoke(mut self, role: Role, user: impl Into<String>) -> Self {
        self.push(PermissionChange::Revoke { role, user: user.into() });
        self
    }

    pub fn add_user(mut self, user: impl Into<String>) -> Self {
        self.push(PermissionChange::AddUser { user: user.into() });
        self
    }

    pub fn remove_user(mut self, user: impl Into<String>) -> Self {
        self.push(PermissionChange::RemoveUser { user: user.into() });
        self
    }

    /// Delta that turns `from` into exactly `to`: revokes first, then grants.
    pub fn between(from: &Acl, to: &Acl) -> Self {
        let mut delta = Self::new();
        for role in Role::ALL {
            for user in from.users(role).difference(to.users(role)) {
                delta.push(PermissionChange::Revoke { role, user: user.clone() });
            }
        }
        for role in Role::ALL {
            for user in to.users(role).difference(from.users(role)) {
                delta.push(PermissionChange::Grant { role, user: user.clone() });
            }
        }
        delta
    }
}

impl FromIterator<PermissionChange> for PermissionDelta {
    fn from_iter<T: IntoIterator<Item = PermissionChange>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn apply(acl: &mut Acl, change: &PermissionChange) {
    match change {
        PermissionChange::Grant { role, user } => {
            acl.grant(*role, user.clone());
        }
        PermissionChange::Revoke { role, user } => {
            acl.revoke(*role, user);
        }
        PermissionChange::AddUser { user } => {
            for role in Role::DEFAULT_GRANT {
                acl.grant(role, user.clone());
            }
        }
        PermissionChange::RemoveUser { user } => {
            for role in Role::ALL {
                acl.revoke(role, user);
            }
        }
    }
}

/// Force the owner's `write` and `library_write` grants.
pub fn retain_owner(mut acl: Acl, owner: &str) -> Acl {
    for role in Role::OWNER {
        acl.grant(role, owner.to_string());
    }
    acl
}

/// Apply `delta` to `existing`, then restore the owner's write grants.
pub fn reconcile(existing: &Acl, delta: &PermissionDelta, owner: &str) -> Acl {
    let mut acl = existing.clone();
    for change in &delta.0 {
        apply(&mut acl, change);
    }
    retain_owner(acl, owner)
}
