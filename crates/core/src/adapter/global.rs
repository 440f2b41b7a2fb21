use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use microfed_api::{
    AdapterError, AdapterResult, Bundler, DEFAULT_SHARE_SCOPE, EntryFetcher, ModuleHandle,
    RemoteContainer, RuntimeAdapter,
};

struct ScopeSlot {
    entry_url: String,
    /// Initialized container, filled on first resolve. The mutex serializes
    /// fetch + init so `init(shareScope)` runs at most once per scope.
    container: Mutex<Option<Arc<dyn RemoteContainer>>>,
}

impl ScopeSlot {
    fn new(entry_url: String) -> Arc<Self> {
        Arc::new(Self {
            entry_url,
            container: Mutex::new(None),
        })
    }
}

/// Adapter for remotes that publish a single entry artifact exposing
/// `init(shareScope)` and `get(module) -> factory`.
///
/// The entry artifact is dynamically imported on first use via the
/// host-supplied [`EntryFetcher`]; containers are cached per scope for the
/// process lifetime. Re-registering a scope under a different entry URL drops
/// the cached container.
pub struct GlobalContainerAdapter {
    fetcher: Arc<dyn EntryFetcher>,
    scopes: DashMap<String, Arc<ScopeSlot>>,
}

impl GlobalContainerAdapter {
    pub fn new(fetcher: Arc<dyn EntryFetcher>) -> Self {
        Self {
            fetcher,
            scopes: DashMap::new(),
        }
    }

    fn slot(&self, scope: &str) -> AdapterResult<Arc<ScopeSlot>> {
        self.scopes
            .get(scope)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AdapterError::UnknownScope {
                scope: scope.to_string(),
            })
    }

    async fn container(
        &self,
        scope: &str,
        slot: &ScopeSlot,
        cancel: &CancellationToken,
    ) -> AdapterResult<Arc<dyn RemoteContainer>> {
        let mut guard = slot.container.lock().await;
        if let Some(container) = guard.as_ref() {
            return Ok(container.clone());
        }
        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }

        debug!(
            target: "microfed_core::adapter",
            scope,
            entry_url = %slot.entry_url,
            "fetching remote container"
        );
        let container = self.fetcher.fetch(&slot.entry_url, cancel).await?;
        container.init(DEFAULT_SHARE_SCOPE).await?;
        *guard = Some(container.clone());
        Ok(container)
    }
}

#[async_trait]
impl RuntimeAdapter for GlobalContainerAdapter {
    fn register_if_needed(
        &self,
        scope: &str,
        entry_url: &str,
        _bundler: Bundler,
    ) -> AdapterResult<()> {
        match self.scopes.entry(scope.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().entry_url != entry_url {
                    occupied.insert(ScopeSlot::new(entry_url.to_string()));
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ScopeSlot::new(entry_url.to_string()));
            }
        }
        Ok(())
    }

    async fn resolve_module(
        &self,
        scope: &str,
        module_path: &str,
        cancel: CancellationToken,
    ) -> AdapterResult<Option<ModuleHandle>> {
        let slot = self.slot(scope)?;
        let container = self.container(scope, &slot, &cancel).await?;

        if cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let factory = container.get(module_path).await?;
        Ok(factory.map(|build| build()))
    }
}
