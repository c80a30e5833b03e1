//! ws-core: workspace domain model and the authoritative workspace service.
//!
//! - [`model`]: records, payloads, per-role ACL
//! - [`validate`]: form validation with contractual messages
//! - [`reconcile`]: permission deltas and owner retention
//! - [`store`]: in-memory, tenant-scoped store
//! - [`app`] + [`hooks`]: the hook pipeline every call runs through

pub mod app;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod model;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod tenant;
pub mod validate;
pub mod workspace_hooks;

pub use app::WorkspaceApp;
pub use config::{WsConfig, WsConfigSnapshot};
pub use errors::{ErrorKind, WsError};
pub use hooks::{AfterHook, BeforeHook, HookContext, HookResult, ServiceHooks};
pub use model::{Acl, CreatedWorkspace, NewWorkspace, Role, Workspace, WorkspacePatch};
pub use reconcile::{reconcile, retain_owner, PermissionChange, PermissionDelta};
pub use service::{FindQuery, ServiceCapabilities, ServiceMethodKind, WorkspaceService};
pub use store::MemoryWorkspaceStore;
pub use tenant::{TenantContext, TenantId, UserId};
pub use validate::{validate, FormField, ValidationError, ValidationReport, WorkspaceForm};
