use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModuleInitError;

/// Opaque handle to a resolved remote module.
pub type ModuleHandle = Arc<dyn RemoteModule>;

/// A single route definition exported by a remote. Component identifiers are
/// opaque strings the host's renderer maps to actual views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    /// Path relative to the app's base, e.g. `/` or `/items/:id`.
    pub path: String,
    pub component: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteEntry>,
}

/// Route configuration a remote must expose to be mountable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub routes: Vec<RouteEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_boundary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_component: Option<String>,
}

/// Props passed to a module's init hook when it is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitProps {
    /// Base path where the app is mounted, e.g. `/apps/calendar`.
    pub base_path: String,
}

/// Shape contract for a resolved remote module. Adapters produce these; the
/// mount layer validates the route configuration and runs the init hook.
#[async_trait]
pub trait RemoteModule: std::fmt::Debug + Send + Sync {
    /// The exported route configuration, if the module carries a valid one.
    fn route_config(&self) -> Option<RouteConfig>;

    /// Optional post-load initialization hook, awaited before the module is
    /// considered mounted.
    async fn init(&self, _props: InitProps) -> Result<(), ModuleInitError> {
        Ok(())
    }
}

/// Remote module backed by a JSON export map, the shape manifest-style
/// remotes resolve to: `{ "routeConfig": { "routes": [...] }, ... }`.
#[derive(Debug, Clone)]
pub struct JsonModule {
    exports: Value,
}

impl JsonModule {
    pub fn new(exports: Value) -> Self {
        Self { exports }
    }

    pub fn exports(&self) -> &Value {
        &self.exports
    }

    pub fn into_handle(self) -> ModuleHandle {
        Arc::new(self)
    }
}

#[async_trait]
impl RemoteModule for JsonModule {
    fn route_config(&self) -> Option<RouteConfig> {
        let raw = self.exports.get("routeConfig")?;
        serde_json::from_value(raw.clone()).ok()
    }
}
