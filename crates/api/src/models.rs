use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Exposed module loaded when a descriptor does not name one.
pub const DEFAULT_MODULE: &str = "./routes";

/// Which federation protocol a remote speaks. Determines the entry-file URL
/// shape and the registration call shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bundler {
    #[default]
    Vite,
    Webpack,
}

impl Bundler {
    /// Build the remote entry URL from a base URL. Vite serves the entry at
    /// the root, webpack under `/assets/`.
    pub fn entry_url(self, base_url: &str) -> String {
        let clean = base_url.strip_suffix('/').unwrap_or(base_url);
        match self {
            Bundler::Vite => format!("{clean}/remoteEntry.js"),
            Bundler::Webpack => format!("{clean}/assets/remoteEntry.js"),
        }
    }
}

/// Unified module identifier, e.g. scope `demoApp` + module `./routes` ->
/// `demoApp/routes`.
pub fn module_id(scope: &str, module: &str) -> String {
    match module.strip_prefix("./") {
        Some(rest) => format!("{scope}/{rest}"),
        None => format!("{scope}/{module}"),
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Connection descriptor for a loadable remote unit.
///
/// `(scope, module)` is the cache key; multiple names may alias the same
/// pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDescriptor {
    /// Unique registry key. May be synthesized for ad-hoc loads.
    pub name: String,
    /// Base network location hosting the remote's entry artifact.
    pub url: String,
    /// The remote's federation namespace.
    pub scope: String,
    /// Exposed sub-path to load from that scope.
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default)]
    pub bundler: Bundler,
}

fn default_module() -> String {
    DEFAULT_MODULE.to_string()
}

impl RemoteDescriptor {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            scope: scope.into(),
            module: default_module(),
            bundler: Bundler::default(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn with_bundler(mut self, bundler: Bundler) -> Self {
        self.bundler = bundler;
        self
    }

    /// Descriptor for a caller with no prior registration, with a synthesized
    /// unique name.
    pub fn ephemeral(
        url: impl Into<String>,
        scope: impl Into<String>,
        module: impl Into<String>,
        bundler: Bundler,
    ) -> Self {
        let scope = scope.into();
        Self {
            name: format!("dynamic_{scope}_{}", now_unix_ms()),
            url: url.into(),
            scope,
            module: module.into(),
            bundler,
        }
    }

    /// Module-cache key shared by every name aliasing this `(scope, module)`.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.scope, self.module)
    }

    pub fn entry_url(&self) -> String {
        self.bundler.entry_url(&self.url)
    }

    pub fn module_id(&self) -> String {
        module_id(&self.scope, &self.module)
    }
}

/// Lifecycle status of a registered remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Mutable lifecycle record, one per registered name. Mutated only by the
/// loader during a load attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteState {
    pub status: RemoteStatus,
    /// Present only when `status` is [`RemoteStatus::Error`].
    pub error: Option<String>,
    /// Stamped on transition into [`RemoteStatus::Loaded`].
    pub loaded_at: Option<u64>,
}

/// Options for a single load operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Per-attempt timeout, not cumulative across retries.
    pub timeout_ms: u64,
    /// Additional attempts after the first failure.
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retries: 0,
            retry_delay_ms: 1_000,
        }
    }
}

/// Record shape returned by the descriptor-supplying REST collaborator. The
/// loader depends only on `url`, `scope`, `module` and `bundler`; the rest is
/// admin metadata passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAppRecord {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub url: String,
    pub scope: String,
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default)]
    pub bundler: Bundler,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RemoteAppRecord {
    /// Ephemeral descriptor for loading straight from an API record.
    pub fn to_descriptor(&self) -> RemoteDescriptor {
        RemoteDescriptor::ephemeral(&self.url, &self.scope, &self.module, self.bundler)
    }
}
