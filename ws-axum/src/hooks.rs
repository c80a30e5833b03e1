use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;
use ws_core::hooks::{AfterHook, HookContext, HookResult};
use ws_core::WorkspaceApp;

/// Logs every completed workspace call.
pub struct LogAfter;

#[async_trait]
impl AfterHook for LogAfter {
    async fn run(&self, ctx: &mut HookContext) -> Result<()> {
        let (id, revision, count) = match &ctx.result {
            Some(HookResult::One(ws)) => (Some(ws.id.as_str()), Some(ws.revision), 1),
            Some(HookResult::Many(list)) => (None, None, list.len()),
            None => (None, None, 0),
        };

        info!(
            method = ctx.method.as_str(),
            tenant = ctx.tenant.tenant(),
            user = ctx.tenant.user(),
            id = ?id,
            revision = ?revision,
            count,
            "workspace call ok"
        );
        Ok(())
    }
}

pub fn global_hooks(app: &WorkspaceApp) {
    app.hooks(|h| {
        h.after_all(Arc::new(LogAfter));
    });
}
