use std::time::Duration;

use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use ws_core::{WsConfig, WsConfigSnapshot};

use crate::error::{HarnessError, HarnessResult};

/// Env prefix shared with the server: `WS__HARNESS__BASE_URL` → `harness.base_url`.
pub const ENV_PREFIX: &str = "WS__";

/// Typed view of the harness settings.
///
/// Durations are humantime strings (`30s`, `1m`) both in JSON and in the
/// key/value config.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Root of the workspace API, without the `/api/workspaces` suffix.
    pub base_url: String,
    pub tenant: String,
    /// The acting user; owner of every fixture workspace.
    pub username: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub page_load_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub navigation_timeout: Duration,
    /// Gate for every workspace scenario.
    pub workspace_enabled: bool,
    /// Gate for scenarios that touch the permission panel.
    pub permissions_enabled: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3030".to_string(),
            tenant: "default".to_string(),
            username: "admin".to_string(),
            request_timeout: Duration::from_secs(30),
            page_load_timeout: Duration::from_secs(60),
            navigation_timeout: Duration::from_secs(6),
            workspace_enabled: true,
            permissions_enabled: true,
        }
    }
}

fn duration(snap: &WsConfigSnapshot, key: &str, fallback: Duration) -> HarnessResult<Duration> {
    match snap.get(key) {
        None => Ok(fallback),
        Some(raw) => humantime::parse_duration(raw.trim())
            .map_err(|e| HarnessError::Config(format!("{key}: {e}"))),
    }
}

impl HarnessConfig {
    /// Read `harness.*`, `workspace.enabled` and `permissions.enabled`; missing
    /// keys keep their defaults.
    pub fn from_snapshot(snap: &WsConfigSnapshot) -> HarnessResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            base_url: snap
                .get_string("harness.base_url")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            tenant: snap.get_string("harness.tenant").unwrap_or(defaults.tenant),
            username: snap.get_string("harness.username").unwrap_or(defaults.username),
            request_timeout: duration(snap, "harness.request_timeout", defaults.request_timeout)?,
            page_load_timeout: duration(snap, "harness.page_load_timeout", defaults.page_load_timeout)?,
            navigation_timeout: duration(snap, "harness.navigation_timeout", defaults.navigation_timeout)?,
            workspace_enabled: snap
                .get_bool("workspace.enabled")
                .unwrap_or(defaults.workspace_enabled),
            permissions_enabled: snap
                .get_bool("permissions.enabled")
                .unwrap_or(defaults.permissions_enabled),
        })
    }

    /// `.env` (when present) then `WS__*` variables.
    pub fn from_env() -> HarnessResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = WsConfig::new();
        let loaded = config.load_env(ENV_PREFIX);
        tracing::debug!(loaded, "harness config loaded from env");

        Self::from_snapshot(&config.snapshot())
    }

    pub fn from_json(raw: &str) -> HarnessResult<Self> {
        serde_json::from_str(raw).map_err(|e| HarnessError::Config(e.to_string()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }
}
