//! Server-side invariants of the workspace service, expressed as before-hooks.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::app::WorkspaceApp;
use crate::errors::WsError;
use crate::hooks::{BeforeHook, HookContext};
use crate::model::ME_ALIAS;
use crate::reconcile::retain_owner;
use crate::validate::{validate, WorkspaceForm};

/// `%me%` in a payload's ACL becomes the calling user.
pub struct ResolveMeAlias;

#[async_trait]
impl BeforeHook for ResolveMeAlias {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let user = ctx.tenant.user().to_string();

        if let Some(data) = ctx.create.as_mut() {
            data.settings.permissions.resolve_alias(ME_ALIAS, &user);
        }
        if let Some(acl) = ctx.patch.as_mut().and_then(|p| p.permissions.as_mut()) {
            acl.resolve_alias(ME_ALIAS, &user);
        }
        Ok(())
    }
}

fn rejected(form: &WorkspaceForm) -> Result<()> {
    let report = validate(form);
    if report.is_valid() {
        return Ok(());
    }
    Err(WsError::unprocessable("Workspace validation failed")
        .with_errors(report.to_json())
        .into_anyhow())
}

/// Validates the record as it would be stored: the create payload, or the
/// existing record with the patch merged in.
pub struct ValidateWorkspace;

#[async_trait]
impl BeforeHook for ValidateWorkspace {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if let Some(data) = ctx.create.as_ref() {
            return rejected(&WorkspaceForm {
                name: data.name.clone(),
                description: data.description.clone(),
                color: data.color.clone(),
                features: data.features.clone(),
            });
        }

        let Some(patch) = ctx.patch.clone() else {
            return Ok(());
        };
        if patch.is_empty() {
            crate::bail_ws!(bad_request, "Update requires at least one field");
        }

        let mut merged = ctx.existing().await?.clone();
        patch.apply_to(&mut merged);
        rejected(&WorkspaceForm::from(&merged))
    }
}

/// The owner keeps `write` and `library_write` whatever the payload says.
pub struct RetainOwnerGrants;

#[async_trait]
impl BeforeHook for RetainOwnerGrants {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        if let Some(data) = ctx.create.as_mut() {
            let owner = ctx.tenant.user().to_string();
            let acl = std::mem::take(&mut data.settings.permissions);
            data.settings.permissions = retain_owner(acl, &owner);
            return Ok(());
        }

        let has_acl = ctx.patch.as_ref().is_some_and(|p| p.permissions.is_some());
        if !has_acl {
            return Ok(());
        }

        let owner = ctx.existing().await?.owner.clone();
        if let Some(patch) = ctx.patch.as_mut() {
            if let Some(acl) = patch.permissions.take() {
                debug!(%owner, "restoring owner grants on patched ACL");
                patch.permissions = Some(retain_owner(acl, &owner));
            }
        }
        Ok(())
    }
}

pub fn register(app: &WorkspaceApp) {
    app.hooks(|h| {
        h.before_create(Arc::new(ResolveMeAlias));
        h.before_create(Arc::new(ValidateWorkspace));
        h.before_create(Arc::new(RetainOwnerGrants));

        h.before_patch(Arc::new(ResolveMeAlias));
        h.before_patch(Arc::new(ValidateWorkspace));
        h.before_patch(Arc::new(RetainOwnerGrants));
    });
}
