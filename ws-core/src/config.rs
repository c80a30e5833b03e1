//! # Configuration
//!
//! A minimal key/value configuration store. Keys are dotted
//! (`http.port`, `timeouts.request`) and values are strings; typed
//! views (see `ws-harness`'s `HarnessConfig`) parse them on demand.
//!
//! ## Environment overrides
//! [`WsConfig::load_env`] copies every variable carrying a prefix into the
//! store, lowercasing it and turning `__` into `.`:
//!
//! ```rust
//! use ws_core::WsConfig;
//!
//! std::env::set_var("WSDOC__PAGINATE__DEFAULT", "25");
//! let mut config = WsConfig::new();
//! config.load_env("WSDOC__");
//! assert_eq!(config.get("paginate.default"), Some("25"));
//! ```

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct WsConfig {
    values: HashMap<String, String>,
}

impl WsConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copy `PREFIX` + `A__B` environment variables into `a.b` keys.
    ///
    /// Returns the number of keys written.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        let mut loaded = 0;
        for (key, value) in std::env::vars() {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.values.insert(normalized, value);
                loaded += 1;
            }
        }
        loaded
    }

    pub fn snapshot(&self) -> WsConfigSnapshot {
        WsConfigSnapshot::new(self.values.clone())
    }
}

/// Immutable copy of the config handed to hooks and typed loaders.
#[derive(Debug, Clone, Default)]
pub struct WsConfigSnapshot {
    map: HashMap<String, String>,
}

impl WsConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    /// Accepts `true`/`false` as well as `1`/`0`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| match v.trim() {
            "1" => Some(true),
            "0" => Some(false),
            other => other.parse::<bool>().ok(),
        })
    }
}
