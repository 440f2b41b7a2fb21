use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::AdapterResult;
use crate::models::Bundler;
use crate::module::ModuleHandle;

/// Share scope a container is initialized against so remote and host agree on
/// shared dependency instances.
pub const DEFAULT_SHARE_SCOPE: &str = "default";

/// Minimal interface the loader needs from a federation runtime, regardless
/// of which concrete protocol is active. Selected per descriptor by its
/// bundler tag, never by inheritance.
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    /// Declare a remote's entry URL with the runtime. Idempotent per
    /// `scope` + `entry_url`; a changed URL re-registers.
    fn register_if_needed(
        &self,
        scope: &str,
        entry_url: &str,
        bundler: Bundler,
    ) -> AdapterResult<()>;

    /// Resolve the final usable module value. `Ok(None)` means the runtime
    /// resolved successfully but the remote exported nothing at that path;
    /// the caller treats that as failure. The token is checked cooperatively
    /// at suspension points, it does not abort in-flight network activity.
    async fn resolve_module(
        &self,
        scope: &str,
        module_path: &str,
        cancel: CancellationToken,
    ) -> AdapterResult<Option<ModuleHandle>>;
}

/// Factory returned by a container's `get`; invoking it yields the module.
pub type ModuleFactory = Box<dyn FnOnce() -> ModuleHandle + Send>;

/// A global-container remote: one entry artifact exposing `init(shareScope)`
/// and `get(module) -> factory`.
#[async_trait]
pub trait RemoteContainer: Send + Sync {
    async fn init(&self, share_scope: &str) -> AdapterResult<()>;

    async fn get(&self, module_path: &str) -> AdapterResult<Option<ModuleFactory>>;
}

/// Host-supplied dynamic import of a container's entry artifact.
#[async_trait]
pub trait EntryFetcher: Send + Sync {
    async fn fetch(
        &self,
        entry_url: &str,
        cancel: &CancellationToken,
    ) -> AdapterResult<Arc<dyn RemoteContainer>>;
}

/// Entry format declared to a virtual-module runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFormat {
    /// ESM entry, served by vite-style remotes.
    Esm,
    /// Global-variable entry, served by webpack-style remotes.
    Var,
}

impl RemoteFormat {
    pub fn for_bundler(bundler: Bundler) -> Self {
        match bundler {
            Bundler::Vite => RemoteFormat::Esm,
            Bundler::Webpack => RemoteFormat::Var,
        }
    }
}

/// Remote declaration passed to [`VirtualRuntime::set_remote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRemoteConfig {
    pub url: String,
    pub format: RemoteFormat,
}

/// Raw export handed back by a virtual-module runtime before the
/// default-export boundary is unwrapped.
pub type RawExport = Box<dyn Any + Send + Sync>;

/// Primitives of a virtual-module federation runtime, supplied by the host at
/// startup: declare the remote, ensure its share scope is initialized, fetch
/// the raw export, normalize it.
#[async_trait]
pub trait VirtualRuntime: Send + Sync {
    fn set_remote(&self, name: &str, config: VirtualRemoteConfig) -> AdapterResult<()>;

    async fn ensure(&self, name: &str) -> AdapterResult<()>;

    async fn get_remote(&self, scope: &str, module_path: &str)
    -> AdapterResult<Option<RawExport>>;

    fn unwrap_default(&self, raw: RawExport) -> AdapterResult<Option<ModuleHandle>>;
}
