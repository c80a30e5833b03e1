//! Core multi-tenant types.

/// A simple tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantId(pub String);

/// Identifier of the user performing a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

/// Context carried with every workspace operation.
///
/// Services, hooks and the store only ever see workspaces of `tenant_id`;
/// `user_id` is the actor (and becomes the owner on create).
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub user_id: UserId,
}

impl TenantContext {
    pub fn new<T: Into<String>, U: Into<String>>(tenant: T, user: U) -> Self {
        Self {
            tenant_id: TenantId(tenant.into()),
            user_id: UserId(user.into()),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant_id.0
    }

    pub fn user(&self) -> &str {
        &self.user_id.0
    }
}
